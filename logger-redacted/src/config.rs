// Logger configuration
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// Replace account identifiers and e-mail addresses in log output
    pub redaction_enabled: bool,
    /// Hash redacted values so the same account can be correlated across lines
    pub hash_for_correlation: bool,
    /// Default filter directive when `RUST_LOG` is not set
    pub log_level: String,
    /// Emit JSON lines instead of the human readable format
    pub json: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            redaction_enabled: true,
            hash_for_correlation: true,
            log_level: "info".to_string(),
            json: false,
        }
    }
}
