//! Configuration system for the insight engine
//!
//! Supports loading configuration from:
//! 1. An explicit path
//! 2. ~/.config/insight-engine/config.{INSIGHT_ENV}.json
//! 3. Default values
//!
//! Where INSIGHT_ENV can be: production (default), development, test
//!
//! Environment variables override config file values:
//! - INSIGHT_CLUSTER_THRESHOLD
//! - INSIGHT_EMBED_MODEL
//! - INSIGHT_OFFLINE

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse config JSON: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Embedding provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Model name understood by the FastEmbed backend
    #[serde(default = "default_embed_model")]
    pub model: String,

    /// Vector dimension produced by the model
    #[serde(default = "default_dimension")]
    pub dimension: usize,

    /// Number of embeddings held in the LRU cache
    #[serde(default = "default_cache_size")]
    pub cache_size: usize,

    /// Use the deterministic hash embedder instead of real inference
    #[serde(default)]
    pub offline: bool,
}

fn default_embed_model() -> String {
    "all-MiniLM-L6-v2".to_string()
}

fn default_dimension() -> usize {
    384
}

fn default_cache_size() -> usize {
    1000
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: default_embed_model(),
            dimension: default_dimension(),
            cache_size: default_cache_size(),
            offline: false,
        }
    }
}

/// Main engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Similarity threshold for joining an existing cluster, in (0, 1]
    #[serde(default = "default_cluster_threshold")]
    pub cluster_threshold: f32,

    /// Embedding provider settings
    #[serde(default)]
    pub embedding: EmbeddingConfig,
}

fn default_cluster_threshold() -> f32 {
    crate::cluster::DEFAULT_CLUSTER_THRESHOLD
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cluster_threshold: default_cluster_threshold(),
            embedding: EmbeddingConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: EngineConfig = serde_json::from_str(&content)?;

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Load configuration with standard priority:
    /// 1. Explicit path
    /// 2. ~/.config/insight-engine/config.{INSIGHT_ENV}.json
    /// 3. Defaults
    pub fn load(explicit_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit_path {
            if path.exists() {
                tracing::info!("Loading config from: {:?}", path);
                return Self::from_file(path);
            } else {
                return Err(ConfigError::ValidationError(format!(
                    "Config file not found: {:?}",
                    path
                )));
            }
        }

        let env = std::env::var("INSIGHT_ENV").unwrap_or_else(|_| "production".to_string());

        if let Some(config_dir) = dirs::config_dir() {
            let config_path = config_dir
                .join("insight-engine")
                .join(format!("config.{}.json", env));

            if config_path.exists() {
                tracing::info!("Loading config from: {:?}", config_path);
                return Self::from_file(&config_path);
            }
        }

        tracing::info!("Using default configuration with environment overrides");
        let mut config = Self::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        if let Ok(threshold) = std::env::var("INSIGHT_CLUSTER_THRESHOLD") {
            if let Ok(value) = threshold.parse::<f32>() {
                self.cluster_threshold = value;
            }
        }

        if let Ok(model) = std::env::var("INSIGHT_EMBED_MODEL") {
            self.embedding.model = model;
        }

        if let Ok(offline) = std::env::var("INSIGHT_OFFLINE") {
            self.embedding.offline = offline.eq_ignore_ascii_case("true")
                || offline == "1"
                || offline.eq_ignore_ascii_case("yes");
        }
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.cluster_threshold > 0.0 && self.cluster_threshold <= 1.0) {
            return Err(ConfigError::ValidationError(format!(
                "cluster_threshold must be in (0, 1], got {}",
                self.cluster_threshold
            )));
        }

        if self.embedding.model.is_empty() {
            return Err(ConfigError::ValidationError(
                "embedding.model cannot be empty".to_string(),
            ));
        }

        if self.embedding.dimension == 0 {
            return Err(ConfigError::ValidationError(
                "embedding.dimension must be greater than 0".to_string(),
            ));
        }

        if self.embedding.cache_size == 0 {
            return Err(ConfigError::ValidationError(
                "embedding.cache_size must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_validate() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.cluster_threshold, 0.65);
        assert_eq!(config.embedding.dimension, 384);
    }

    #[test]
    fn test_threshold_out_of_range_rejected() {
        let mut config = EngineConfig::default();
        config.cluster_threshold = 0.0;
        assert!(config.validate().is_err());

        config.cluster_threshold = 1.5;
        assert!(config.validate().is_err());

        config.cluster_threshold = 1.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_dimension_rejected() {
        let mut config = EngineConfig::default();
        config.embedding.dimension = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_file_round_trip() {
        let config = EngineConfig {
            cluster_threshold: 0.7,
            embedding: EmbeddingConfig {
                model: "all-MiniLM-L6-v2".to_string(),
                dimension: 384,
                cache_size: 50,
                offline: true,
            },
        };

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", serde_json::to_string_pretty(&config).unwrap()).unwrap();

        let loaded = EngineConfig::from_file(file.path()).unwrap();
        assert_eq!(loaded.cluster_threshold, 0.7);
        assert_eq!(loaded.embedding.cache_size, 50);
        assert!(loaded.embedding.offline);
    }

    #[test]
    fn test_partial_file_gets_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{\"cluster_threshold\": 0.8}}").unwrap();

        let loaded = EngineConfig::from_file(file.path()).unwrap();
        assert_eq!(loaded.cluster_threshold, 0.8);
        assert_eq!(loaded.embedding.model, "all-MiniLM-L6-v2");
    }

    #[test]
    fn test_env_override_applies() {
        std::env::set_var("INSIGHT_OFFLINE", "1");

        let mut config = EngineConfig::default();
        config.apply_env_overrides();
        assert!(config.embedding.offline);

        std::env::remove_var("INSIGHT_OFFLINE");
    }

    #[test]
    fn test_missing_explicit_path_rejected() {
        let result = EngineConfig::load(Some(Path::new("/nonexistent/config.json")));
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }
}
