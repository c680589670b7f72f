//! Common error handling utilities for the HabitShare engine
//!
//! This crate provides the error taxonomy, error codes and the uniform
//! result shape shared by every crate in the workspace.
//!
//! # Error Categories
//!
//! - **NotFound**: entity or document absent; callers usually recover with an
//!   empty default (empty role set, zero counts)
//! - **Validation**: malformed input such as an unparseable date or a habit
//!   list that is not an array
//! - **Persistence**: document store or local cache failure, surfaced with the
//!   underlying message
//! - **InvariantViolation**: a domain invariant could not be upheld
//!
//! # Example
//!
//! ```rust
//! use error_common::{EngineError, Outcome};
//!
//! let result: Result<u32, EngineError> = Err(EngineError::NotFound("habit Run".into()));
//! let outcome = Outcome::from_result(result, "loaded", "example");
//! assert!(!outcome.ok);
//! assert_eq!(outcome.code.as_deref(), Some("NOT_FOUND_1001"));
//! ```

pub mod codes;
pub mod outcome;
pub mod types;

pub use outcome::Outcome;
pub use types::*;
