//! Engine configuration loaded from YAML.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::types::IntakeDuration;

/// Errors that can occur when loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Tunable engine behavior. Every field has a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Duration assumed when a request does not state one
    pub default_duration: IntakeDuration,

    /// Skip pregnancy and breastfeeding questions for male patients
    pub gender_aware_unknown_context: bool,

    /// Override rule tables (YAML or JSON); compiled-in tables when absent
    pub rules_file: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_duration: IntakeDuration::LongTerm,
            gender_aware_unknown_context: true,
            rules_file: None,
        }
    }
}

impl EngineConfig {
    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a YAML file.
    ///
    /// A relative `rules_file` is resolved against the config file's
    /// directory.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        let mut config = Self::from_yaml(&contents)?;

        if let (Some(rules), Some(dir)) = (&config.rules_file, path.parent()) {
            if rules.is_relative() {
                config.rules_file = Some(dir.join(rules));
            }
        }

        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(rules) = &self.rules_file {
            let supported = rules
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| matches!(e.to_ascii_lowercase().as_str(), "yaml" | "yml" | "json"))
                .unwrap_or(false);
            if !supported {
                return Err(ConfigError::Invalid(format!(
                    "rules_file must be a .yaml, .yml or .json file: {}",
                    rules.display()
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = EngineConfig::from_yaml("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_parse_full_config() {
        let config = EngineConfig::from_yaml(
            r#"
default_duration: short-term
gender_aware_unknown_context: false
rules_file: tables.yaml
"#,
        )
        .unwrap();
        assert_eq!(config.default_duration, IntakeDuration::ShortTerm);
        assert!(!config.gender_aware_unknown_context);
        assert_eq!(config.rules_file, Some(PathBuf::from("tables.yaml")));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result = EngineConfig::from_yaml("strict_mode: true");
        assert!(matches!(result, Err(ConfigError::Yaml(_))));
    }

    #[test]
    fn test_unsupported_rules_extension() {
        let result = EngineConfig::from_yaml("rules_file: tables.txt");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }
}
