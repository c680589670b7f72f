use config_engine::SessionConfig;
use std::fmt;

/// Who is acting: decides whether an operation targets the local cache or
/// the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Session {
    /// Not signed in; everything stays in the local cache
    Anonymous,
    Authenticated { account: String },
}

impl Session {
    /// Empty ids and the configured anonymous marker resolve to `Anonymous`.
    /// Account ids are compared lower-cased.
    pub fn resolve(account: &str, config: &SessionConfig) -> Self {
        let account = account.trim();
        if account.is_empty() || account.eq_ignore_ascii_case(&config.anonymous_account) {
            Self::Anonymous
        } else {
            Self::Authenticated {
                account: account.to_lowercase(),
            }
        }
    }

    pub fn authenticated(account: impl Into<String>) -> Self {
        Self::Authenticated {
            account: account.into().to_lowercase(),
        }
    }

    pub fn is_anonymous(&self) -> bool {
        matches!(self, Self::Anonymous)
    }

    pub fn account(&self) -> Option<&str> {
        match self {
            Self::Anonymous => None,
            Self::Authenticated { account } => Some(account),
        }
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Anonymous => f.write_str("anonymous"),
            Self::Authenticated { account } => write!(f, "{}", logger_redacted::account(account)),
        }
    }
}
