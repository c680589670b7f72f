use base64::{engine::general_purpose, Engine as _};
use lazy_static::lazy_static;
use regex::Regex;
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

lazy_static! {
    static ref EMAIL_REGEX: Regex =
        Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").unwrap();
}

// 0 = off, 1 = masked, 2 = hashed
static ACCOUNT_MODE: AtomicU8 = AtomicU8::new(2);

/// Redaction configuration
#[derive(Debug, Clone)]
pub struct RedactionConfig {
    pub redact_emails: bool,
    pub hash_for_correlation: bool,
    pub custom_patterns: Vec<(Regex, String)>,
}

impl Default for RedactionConfig {
    fn default() -> Self {
        Self {
            redact_emails: true,
            hash_for_correlation: true,
            custom_patterns: Vec::new(),
        }
    }
}

/// Scrubs account identifiers out of free-form log text
pub struct PiiRedactor {
    config: RedactionConfig,
}

impl PiiRedactor {
    pub fn new(config: RedactionConfig) -> Self {
        Self { config }
    }

    pub fn redact(&self, text: &str) -> String {
        let mut result = text.to_string();

        if self.config.redact_emails {
            result = EMAIL_REGEX
                .replace_all(&result, |caps: &regex::Captures| {
                    redact_email(&caps[0], self.config.hash_for_correlation)
                })
                .to_string();
        }

        for (pattern, replacement) in &self.config.custom_patterns {
            result = pattern.replace_all(&result, replacement.as_str()).to_string();
        }

        result
    }
}

fn redact_email(email: &str, hash: bool) -> String {
    if hash {
        return format!("EMAIL[{}]", hash_value(email));
    }

    match email.split_once('@') {
        Some((user, domain)) => {
            let first_user = user.chars().next().map(String::from).unwrap_or_default();
            let first_domain = domain.chars().next().map(String::from).unwrap_or_default();
            format!("{first_user}***@{first_domain}***")
        }
        None => "***@***".to_string(),
    }
}

fn hash_value(value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    let result = hasher.finalize();
    general_purpose::STANDARD.encode(&result[..8])
}

/// Configure how [`account`] renders identifiers. Called by `init`.
pub fn set_account_redaction(enabled: bool, hash_for_correlation: bool) {
    let mode = match (enabled, hash_for_correlation) {
        (false, _) => 0,
        (true, false) => 1,
        (true, true) => 2,
    };
    ACCOUNT_MODE.store(mode, Ordering::Relaxed);
}

/// Replace every e-mail address in `text` the way [`account`] renders one.
///
/// `init` installs this as the error-text filter of `error_common::log_error`.
pub fn redact_text(text: &str) -> String {
    let hash = match ACCOUNT_MODE.load(Ordering::Relaxed) {
        0 => return text.to_string(),
        1 => false,
        _ => true,
    };
    EMAIL_REGEX
        .replace_all(text, |caps: &regex::Captures| redact_email(&caps[0], hash))
        .into_owned()
}

/// Display wrapper for an account identifier in tracing fields.
///
/// ```rust
/// tracing::info!(account = %logger_redacted::account("ana@example.com"), "habit created");
/// ```
pub fn account(id: &str) -> RedactedAccount<'_> {
    RedactedAccount(id)
}

pub struct RedactedAccount<'a>(&'a str);

impl fmt::Display for RedactedAccount<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match ACCOUNT_MODE.load(Ordering::Relaxed) {
            0 => f.write_str(self.0),
            1 => f.write_str(&redact_email(self.0, false)),
            _ => f.write_str(&redact_email(self.0, true)),
        }
    }
}

impl fmt::Debug for RedactedAccount<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_masking() {
        let redactor = PiiRedactor::new(RedactionConfig {
            hash_for_correlation: false,
            ..Default::default()
        });

        let redacted = redactor.redact("Invite sent to john.doe@example.com for Run");
        assert!(redacted.contains("j***@e***"));
        assert!(!redacted.contains("john.doe"));
    }

    #[test]
    fn test_email_hash_is_stable() {
        let redactor = PiiRedactor::new(RedactionConfig::default());
        let a = redactor.redact("ana@example.com");
        let b = redactor.redact("ana@example.com");
        assert_eq!(a, b);
        assert!(a.starts_with("EMAIL["));
    }

    #[test]
    fn test_custom_pattern() {
        let redactor = PiiRedactor::new(RedactionConfig {
            custom_patterns: vec![(Regex::new(r"secret-\d+").unwrap(), "[TOKEN]".to_string())],
            ..Default::default()
        });
        assert_eq!(redactor.redact("key secret-42"), "key [TOKEN]");
    }

    #[test]
    fn test_redact_text_hides_accounts() {
        let text = redact_text("Account is not a collaborator: ben@example.com");
        assert!(text.starts_with("Account is not a collaborator: EMAIL["));
        assert!(!text.contains("ben@example.com"));
    }

    #[test]
    fn test_non_email_text_untouched() {
        let redactor = PiiRedactor::new(RedactionConfig::default());
        assert_eq!(redactor.redact("Daily Check-In synced"), "Daily Check-In synced");
    }
}
