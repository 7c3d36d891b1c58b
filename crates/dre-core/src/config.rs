//! DRE Configuration
//!
//! Defines runtime limits and defaults for the dialogue runtime.
//! Configuration specifies constraints only; enforcement is handled by the machine.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{DreError, DreResult};

/// Start node used when neither the caller nor the configuration names one
pub const DEFAULT_START_NODE: &str = "Start";

/// Runtime configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeConfig {
    /// Maximum expression stack depth
    pub max_stack_size: usize,

    /// Node used by `run(None)`
    pub default_start_node: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        RuntimeConfig {
            max_stack_size: 1024,
            default_start_node: DEFAULT_START_NODE.to_string(),
        }
    }
}

impl RuntimeConfig {
    /// Create a new configuration with default limits
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a configuration from TOML text. Missing keys keep their defaults.
    pub fn from_toml_str(text: &str) -> DreResult<Self> {
        let config: RuntimeConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML configuration file
    pub fn load(path: &Path) -> DreResult<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    fn validate(&self) -> DreResult<()> {
        if self.max_stack_size == 0 {
            return Err(DreError::Config("max_stack_size must be at least 1".into()));
        }
        if self.default_start_node.is_empty() {
            return Err(DreError::Config("default_start_node must not be empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg = RuntimeConfig::from_toml_str("max_stack_size = 8").expect("parse failed");
        assert_eq!(cfg.max_stack_size, 8);
        assert_eq!(cfg.default_start_node, "Start");
    }

    #[test]
    fn zero_stack_rejected() {
        let res = RuntimeConfig::from_toml_str("max_stack_size = 0");
        assert!(matches!(res, Err(DreError::Config(_))));
    }

    #[test]
    fn unknown_key_rejected() {
        assert!(RuntimeConfig::from_toml_str("max_locals = 3").is_err());
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        writeln!(file, "default_start_node = \"Intro\"").expect("write");
        let cfg = RuntimeConfig::load(file.path()).expect("load failed");
        assert_eq!(cfg.default_start_node, "Intro");
        assert_eq!(cfg.max_stack_size, 1024);
    }
}
