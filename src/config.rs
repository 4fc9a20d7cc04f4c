// Engine configuration
// Event vocabulary, regime thresholds, and live cooldown, loadable from JSON

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

use crate::acceptance::CooldownConfig;
use crate::clustering::RegimeConfig;

/// Errors that can occur while loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid config JSON: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Top-level configuration for one deployment of the counting engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Detector labels that count as events
    pub event_classes: Vec<String>,

    /// Batch regime boundaries and thresholds
    pub regime: RegimeConfig,

    /// Live-mode cooldown gate
    pub cooldown: CooldownConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            event_classes: vec![
                "straight".to_string(),
                "hook".to_string(),
                "uppercut".to_string(),
            ],
            regime: RegimeConfig::default(),
            cooldown: CooldownConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Deserialize and validate config from JSON bytes
    /// Missing fields take their default values
    pub fn from_json_bytes(data: &[u8]) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_slice(data)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize config to pretty JSON bytes
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec_pretty(self)
    }

    /// Load config from a JSON file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let data = std::fs::read(path)?;
        let config = Self::from_json_bytes(&data)?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Reject configurations the engine cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.event_classes.iter().all(|c| c.trim().is_empty()) {
            return Err(ConfigError::Invalid(
                "event_classes must name at least one class".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for class in &self.event_classes {
            let key = class.trim().to_ascii_lowercase();
            if key.is_empty() {
                return Err(ConfigError::Invalid(
                    "event class labels must not be blank".to_string(),
                ));
            }
            if key == "total" {
                return Err(ConfigError::Invalid(
                    "\"total\" is reserved and cannot be an event class".to_string(),
                ));
            }
            if !seen.insert(key) {
                return Err(ConfigError::Invalid(format!("duplicate event class: {}", class)));
            }
        }

        if self.regime.frame_stride == 0 {
            return Err(ConfigError::Invalid(
                "regime.frame_stride must be at least 1".to_string(),
            ));
        }

        let thresholds = [
            ("regime.sparse_max_run", self.regime.sparse_max_run),
            ("regime.sparse.min_cluster_length", self.regime.sparse.min_cluster_length),
            ("regime.sparse.min_majority_count", self.regime.sparse.min_majority_count),
            ("regime.dense.min_cluster_length", self.regime.dense.min_cluster_length),
            ("regime.dense.min_majority_count", self.regime.dense.min_majority_count),
        ];
        for (name, value) in thresholds {
            if value == 0 {
                return Err(ConfigError::Invalid(format!("{} must be at least 1", name)));
            }
        }

        if i64::try_from(self.cooldown.cooldown_ms).is_err() {
            return Err(ConfigError::Invalid("cooldown.cooldown_ms is too large".to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_are_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.event_classes.len(), 3);
        assert_eq!(config.regime.sparse_max_run, 6);
        assert_eq!(config.cooldown.cooldown_ms, 900);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let json = br#"{ "event_classes": ["punch"], "cooldown": { "cooldown_ms": 800 } }"#;
        let config = EngineConfig::from_json_bytes(json).unwrap();

        assert_eq!(config.event_classes, vec!["punch".to_string()]);
        assert_eq!(config.cooldown.cooldown_ms, 800);
        assert_eq!(config.regime, RegimeConfig::default());
    }

    #[test]
    fn test_empty_vocabulary_rejected() {
        let result = EngineConfig::from_json_bytes(br#"{ "event_classes": [] }"#);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_duplicate_classes_rejected() {
        let result = EngineConfig::from_json_bytes(br#"{ "event_classes": ["hook", "Hook"] }"#);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_reserved_class_rejected() {
        let result = EngineConfig::from_json_bytes(br#"{ "event_classes": ["hook", "Total"] }"#);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_zero_stride_rejected() {
        let mut config = EngineConfig::default();
        config.regime.frame_stride = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_threshold_rejected() {
        let mut config = EngineConfig::default();
        config.regime.dense.min_majority_count = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_json() {
        let result = EngineConfig::from_json_bytes(b"{ not json");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("engine.json");

        let mut config = EngineConfig::default();
        config.regime.frame_stride = 5;
        std::fs::write(&path, config.to_json_bytes().unwrap()).unwrap();

        let loaded = EngineConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let result = EngineConfig::load(&temp_dir.path().join("missing.json"));
        assert!(matches!(result, Err(ConfigError::IoError(_))));
    }
}
