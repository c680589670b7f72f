// Configuration sources, merged in the order they are added
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use std::path::PathBuf;
use tracing::debug;

use crate::engine::EngineConfig;
use crate::error::{ConfigError, Result};
use crate::validation::validate;

/// Environment prefix; nested keys use `__`, e.g. `HABITSHARE_TASKS__EXPIRY_DAYS`
pub const ENV_PREFIX: &str = "HABITSHARE_";

#[derive(Debug, Clone)]
pub enum ConfigSource {
    /// YAML file; a missing file is an error
    File(PathBuf),
    /// YAML file that may be absent
    OptionalFile(PathBuf),
    /// Environment variables with the given prefix
    Env(String),
}

impl ConfigSource {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File(path.into())
    }

    pub fn optional_file(path: impl Into<PathBuf>) -> Self {
        Self::OptionalFile(path.into())
    }

    pub fn env() -> Self {
        Self::Env(ENV_PREFIX.to_string())
    }
}

/// Builds an [`EngineConfig`] from defaults plus the added sources
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    sources: Vec<ConfigSource>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_source(mut self, source: ConfigSource) -> Self {
        self.sources.push(source);
        self
    }

    fn figment(&self) -> Result<Figment> {
        let mut figment = Figment::from(Serialized::defaults(EngineConfig::default()));

        for source in &self.sources {
            figment = match source {
                ConfigSource::File(path) => {
                    if !path.exists() {
                        return Err(ConfigError::SourceNotFound(path.display().to_string()));
                    }
                    figment.merge(Yaml::file(path))
                }
                ConfigSource::OptionalFile(path) => {
                    if !path.exists() {
                        debug!(path = %path.display(), "optional config file absent");
                    }
                    figment.merge(Yaml::file(path))
                }
                ConfigSource::Env(prefix) => figment.merge(Env::prefixed(prefix).split("__")),
            };
        }

        Ok(figment)
    }

    /// Extract and validate
    pub fn load(&self) -> Result<EngineConfig> {
        let config: EngineConfig = self.figment()?.extract()?;
        validate(&config)?;
        debug!(sources = self.sources.len(), "configuration loaded");
        Ok(config)
    }
}
