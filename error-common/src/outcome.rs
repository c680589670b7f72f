//! Uniform `{ ok, message, code, data }` result shape returned by the public
//! coordinator operations.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{Categorized, ErrorCategory};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome<T> {
    pub ok: bool,
    pub message: String,
    /// Error code, set only on failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Category, set only on failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<ErrorCategory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> Outcome<T> {
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            ok: true,
            message: message.into(),
            code: None,
            category: None,
            data: Some(data),
        }
    }

    pub fn failure(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
            code: Some(category.default_code().to_string()),
            category: Some(category),
            data: None,
        }
    }

    /// Build a failure from a categorized error, keeping its message verbatim
    pub fn from_error<E>(error: &E) -> Self
    where
        E: Categorized + fmt::Display,
    {
        Self {
            ok: false,
            message: error.to_string(),
            code: Some(error.code().to_string()),
            category: Some(error.category()),
            data: None,
        }
    }

    /// Convert an internal `Result` into an outcome. The error is logged.
    pub fn from_result<E>(result: Result<T, E>, message: impl Into<String>, context: &str) -> Self
    where
        E: Categorized + fmt::Display,
    {
        match result {
            Ok(data) => Self::success(message, data),
            Err(err) => {
                crate::types::log_error(context, &err);
                Self::from_error(&err)
            }
        }
    }

    pub fn map<U, F>(self, f: F) -> Outcome<U>
    where
        F: FnOnce(T) -> U,
    {
        Outcome {
            ok: self.ok,
            message: self.message,
            code: self.code,
            category: self.category,
            data: self.data.map(f),
        }
    }

    pub fn into_data(self) -> Option<T> {
        self.data
    }
}

impl Outcome<()> {
    pub fn done(message: impl Into<String>) -> Self {
        Self::success(message, ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EngineError;

    #[test]
    fn test_failure_carries_code_and_category() {
        let err = EngineError::Validation("habit list is not an array".into());
        let outcome: Outcome<()> = Outcome::from_error(&err);
        assert!(!outcome.ok);
        assert_eq!(outcome.category, Some(ErrorCategory::Validation));
        assert_eq!(outcome.code.as_deref(), Some("VALIDATION_2001"));
        assert!(outcome.message.contains("not an array"));
    }

    #[test]
    fn test_from_result_success() {
        let result: Result<u32, EngineError> = Ok(3);
        let outcome = Outcome::from_result(result, "counted", "test");
        assert!(outcome.ok);
        assert_eq!(outcome.data, Some(3));
        assert!(outcome.code.is_none());
    }

    #[test]
    fn test_serialized_shape_omits_empty_fields() {
        let outcome = Outcome::done("saved");
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["ok"], true);
        assert_eq!(json["message"], "saved");
        assert!(json.get("code").is_none());
    }
}
