//! Configuration system for archer.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::context::ModelConfig;
use crate::traits::SearchConfig;
use crate::usage::QuotaConfig;

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArcherConfig {
    /// Model identifiers per turn type.
    pub models: ModelConfig,
    /// Search quota thresholds and pricing.
    pub quota: QuotaConfig,
    /// Web search backend credentials.
    pub search: SearchConfig,
    /// Path to the facts database.
    pub facts_db_path: PathBuf,
    /// Path to the usage log database.
    pub usage_db_path: PathBuf,
}

impl Default for ArcherConfig {
    fn default() -> Self {
        let archer_dir = dirs::home_dir()
            .map(|h| h.join(".archer"))
            .unwrap_or_else(|| PathBuf::from(".archer"));

        Self {
            models: ModelConfig::default(),
            quota: QuotaConfig::default(),
            search: SearchConfig::default(),
            facts_db_path: archer_dir.join("facts.db"),
            usage_db_path: archer_dir.join("usage.db"),
        }
    }
}

impl ArcherConfig {
    /// Load configuration from a file (TOML, JSON, or YAML).
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::error::ArcherResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let ext = path.as_ref().extension().and_then(|e| e.to_str());

        match ext {
            Some("toml") => toml::from_str(&content)
                .map_err(|e| crate::error::ArcherError::Configuration(e.to_string())),
            Some("json") => serde_json::from_str(&content)
                .map_err(|e| crate::error::ArcherError::Configuration(e.to_string())),
            Some("yaml" | "yml") => serde_yaml::from_str(&content)
                .map_err(|e| crate::error::ArcherError::Configuration(e.to_string())),
            _ => Err(crate::error::ArcherError::Configuration(
                "Unsupported config file format. Use .toml, .json, or .yaml".to_string(),
            )),
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(model) = std::env::var("ARCHER_MAIN_MODEL") {
            config.models.main = model;
        }
        if let Ok(model) = std::env::var("ARCHER_IMAGE_MODEL") {
            config.models.image = model;
        }

        if let Ok(key) = std::env::var("GOOGLE_SEARCH_API_KEY") {
            config.search.api_key = Some(key);
        }
        if let Ok(id) = std::env::var("GOOGLE_SEARCH_ENGINE_ID") {
            config.search.engine_id = Some(id);
        }

        if let Ok(limit) = std::env::var("ARCHER_DAILY_SEARCH_LIMIT") {
            if let Ok(limit) = limit.parse() {
                config.quota.daily_limit = limit;
            }
        }

        if let Ok(path) = std::env::var("ARCHER_FACTS_DB_PATH") {
            config.facts_db_path = PathBuf::from(path);
        }
        if let Ok(path) = std::env::var("ARCHER_USAGE_DB_PATH") {
            config.usage_db_path = PathBuf::from(path);
        }

        config
    }

    /// Build configuration using builder pattern.
    pub fn builder() -> ArcherConfigBuilder {
        ArcherConfigBuilder::default()
    }
}

/// Builder for ArcherConfig.
#[derive(Default)]
pub struct ArcherConfigBuilder {
    config: ArcherConfig,
}

impl ArcherConfigBuilder {
    /// Set model identifiers.
    pub fn models(mut self, models: ModelConfig) -> Self {
        self.config.models = models;
        self
    }

    /// Set quota thresholds.
    pub fn quota(mut self, quota: QuotaConfig) -> Self {
        self.config.quota = quota;
        self
    }

    /// Set search credentials.
    pub fn search(mut self, search: SearchConfig) -> Self {
        self.config.search = search;
        self
    }

    /// Set the facts database path.
    pub fn facts_db_path(mut self, path: PathBuf) -> Self {
        self.config.facts_db_path = path;
        self
    }

    /// Set the usage log database path.
    pub fn usage_db_path(mut self, path: PathBuf) -> Self {
        self.config.usage_db_path = path;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> ArcherConfig {
        self.config
    }
}
