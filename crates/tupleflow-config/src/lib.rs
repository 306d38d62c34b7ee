//! Configuration system for TupleFlow.
//!
//! Load engine configuration from TOML or YAML to switch assert modes and
//! override constraint weights without code changes.
//!
//! # Examples
//!
//! ```
//! use tupleflow_config::{EngineConfig, EnvironmentMode};
//!
//! let config = EngineConfig::from_toml_str(r#"
//!     environment_mode = "full_assert"
//!
//!     [constraint_weights]
//!     "Row conflict" = "-2hard/0soft"
//! "#).unwrap();
//!
//! assert_eq!(config.environment_mode, EnvironmentMode::FullAssert);
//! assert_eq!(config.constraint_weights.len(), 1);
//! ```
//!
//! Use default config when file is missing:
//!
//! ```
//! use tupleflow_config::EngineConfig;
//!
//! let config = EngineConfig::load("engine.toml").unwrap_or_default();
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tupleflow_core::ParseableScore;

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl From<ConfigError> for tupleflow_core::TupleFlowError {
    fn from(err: ConfigError) -> Self {
        tupleflow_core::TupleFlowError::Config(err.to_string())
    }
}

/// Main engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct EngineConfig {
    /// Environment mode affecting runtime assertions.
    #[serde(default)]
    pub environment_mode: EnvironmentMode,

    /// Constraint weight overrides, keyed by constraint name.
    ///
    /// Values use the textual score format, e.g. `"-1hard/0soft"`.
    #[serde(default)]
    pub constraint_weights: BTreeMap<String, String>,
}

impl EngineConfig {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a file, parsed as YAML for `.yaml`/`.yml`
    /// paths and as TOML otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file can't be read, or a parse
    /// error for malformed contents.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml" | "yml") => Self::from_yaml_file(path),
            _ => Self::from_toml_file(path),
        }
    }

    /// Loads configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Loads configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// Parses configuration from a YAML string.
    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(s)?)
    }

    /// Sets the environment mode.
    pub fn with_environment_mode(mut self, mode: EnvironmentMode) -> Self {
        self.environment_mode = mode;
        self
    }

    /// Overrides the weight of the named constraint.
    pub fn with_constraint_weight(
        mut self,
        name: impl Into<String>,
        weight: impl Into<String>,
    ) -> Self {
        self.constraint_weights.insert(name.into(), weight.into());
        self
    }

    /// Parses every weight override into a score.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first constraint whose
    /// weight does not parse as `Sc`.
    pub fn parsed_weights<Sc: ParseableScore>(&self) -> Result<Vec<(String, Sc)>, ConfigError> {
        self.constraint_weights
            .iter()
            .map(|(name, text)| {
                Sc::parse(text)
                    .map(|weight| (name.clone(), weight))
                    .map_err(|e| ConfigError::Invalid(format!("weight of '{}': {}", name, e)))
            })
            .collect()
    }
}

/// Environment mode affecting runtime assertions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvironmentMode {
    /// Deterministic propagation without extra checks.
    #[default]
    Reproducible,

    /// Verifies the network is quiescent after every change.
    FastAssert,

    /// Additionally rebuilds from scratch on every score calculation and
    /// compares against the incremental score.
    FullAssert,
}

impl EnvironmentMode {
    /// Returns true if per-change quiescence checks run.
    pub fn is_asserted(&self) -> bool {
        matches!(self, EnvironmentMode::FastAssert | EnvironmentMode::FullAssert)
    }

    /// Returns true if score calculation is cross-checked by a rebuild.
    pub fn is_fully_asserted(&self) -> bool {
        matches!(self, EnvironmentMode::FullAssert)
    }
}
