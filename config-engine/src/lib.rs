//! Configuration for the HabitShare engine
//!
//! Values are layered with `figment`:
//!
//! 1. built-in defaults ([`EngineConfig::default`])
//! 2. YAML files, in the order added
//! 3. `HABITSHARE_`-prefixed environment variables, `__` separating sections
//!
//! The merged result is validated before it is returned.
//!
//! # Example
//!
//! ```rust,no_run
//! use config_engine::{ConfigLoader, ConfigSource};
//!
//! let config = ConfigLoader::new()
//!     .add_source(ConfigSource::optional_file("habitshare.yaml"))
//!     .add_source(ConfigSource::env())
//!     .load()?;
//! assert_eq!(config.tasks.expiry_days, 14);
//! # Ok::<(), config_engine::ConfigError>(())
//! ```

pub mod engine;
pub mod error;
pub mod providers;
pub mod validation;

pub use engine::*;
pub use error::*;
pub use providers::*;
