//! Fastener Search Configuration Management
//!
//! Provides configuration loading with support for:
//! - Global config: `~/.fastener/config.toml`
//! - Local config: `.fastener/config.toml` (in workspace)
//! - CLI overrides via `ConfigOverrides`
//!
//! Configuration is merged in order: global → local → CLI overrides.

mod error;
mod loader;

pub use error::ConfigError;
pub use loader::ConfigLoader;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration for fastener search.
///
/// Represents the fully merged configuration from all sources.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct FastenerConfig {
    /// Vector database connection
    pub qdrant: QdrantSettings,

    /// Embedding endpoint
    pub embedding: EmbeddingSettings,

    /// Retrieval policy
    pub search: SearchSettings,

    /// Reranking boosts
    pub scoring: ScoringSettings,

    /// Standard equivalence table
    pub standards: StandardsSettings,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Qdrant vector database configuration.
///
/// # Example TOML
///
/// ```toml
/// [qdrant]
/// url = "http://localhost:6334"
/// api_key_env = "QDRANT_API_KEY"
/// collection = "product_chunks"
/// vector_dimension = 1536
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct QdrantSettings {
    /// Qdrant gRPC URL
    pub url: String,

    /// Environment variable holding the API key (optional)
    pub api_key_env: Option<String>,

    /// Collection holding product chunks
    pub collection: String,

    /// Vector dimension (must match the embedding model)
    pub vector_dimension: u64,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for QdrantSettings {
    fn default() -> Self {
        Self {
            url: "http://localhost:6334".to_string(),
            api_key_env: None,
            collection: "product_chunks".to_string(),
            vector_dimension: 1536, // text-embedding-3-small
            timeout_secs: 10,
        }
    }
}

impl QdrantSettings {
    /// Resolve the API key from the configured environment variable.
    pub fn api_key(&self) -> Option<String> {
        self.api_key_env
            .as_deref()
            .and_then(|name| std::env::var(name).ok())
            .filter(|key| !key.is_empty())
    }
}

/// OpenAI-compatible embedding endpoint settings.
///
/// # Example TOML
///
/// ```toml
/// [embedding]
/// url = "https://api.openai.com/v1"
/// api_key_env = "OPENAI_API_KEY"
/// model = "text-embedding-3-small"
/// azure_mode = false
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// API base URL (e.g., "https://api.openai.com/v1")
    pub url: String,

    /// Environment variable name containing API key
    pub api_key_env: Option<String>,

    /// Embedding model
    pub model: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Maximum retry attempts
    pub max_retries: u32,

    /// Use Azure OpenAI authentication (api-key header)
    pub azure_mode: bool,

    /// Texts per embedding request when indexing
    pub batch_size: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            url: "https://api.openai.com/v1".to_string(),
            api_key_env: Some("OPENAI_API_KEY".to_string()),
            model: "text-embedding-3-small".to_string(),
            timeout_secs: 30,
            max_retries: 3,
            azure_mode: false,
            batch_size: 64,
        }
    }
}

/// Retrieval policy settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SearchSettings {
    /// Results returned when the caller gives no limit
    pub default_limit: usize,

    /// Similarity threshold when the caller gives none
    pub default_threshold: f32,

    /// Threshold ceiling for exact-standard queries
    pub exact_match_threshold: f32,

    /// Exact results needed before non-exact ones are dropped
    pub min_exact_matches: usize,

    /// Candidates fetched per requested result
    pub pool_multiplier: usize,

    /// Smallest candidate pool
    pub min_pool: usize,

    /// Retry without payload filters when the filtered search finds nothing
    pub fallback_unfiltered: bool,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            default_limit: 10,
            default_threshold: 0.5,
            exact_match_threshold: 0.25,
            min_exact_matches: 3,
            pool_multiplier: 4,
            min_pool: 20,
            fallback_unfiltered: true,
        }
    }
}

/// Reranking boosts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScoringSettings {
    /// Added when a result carries the requested standard
    pub exact_match_boost: f32,

    /// Added when a result carries an equivalent standard
    pub equivalent_match_boost: f32,

    /// Added when the thread matches (non-exact queries)
    pub thread_match_boost: f32,

    /// Added when the material matches (non-exact queries)
    pub material_match_boost: f32,
}

impl Default for ScoringSettings {
    fn default() -> Self {
        Self {
            exact_match_boost: 2.0,
            equivalent_match_boost: 1.0,
            thread_match_boost: 0.05,
            material_match_boost: 0.05,
        }
    }
}

/// Standard equivalence table settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct StandardsSettings {
    /// TOML file with extra `[[group]]` equivalence groups, merged over
    /// the built-in table
    pub extra_table: Option<PathBuf>,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// JSON structured logging
    Json,
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "pretty" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(ConfigError::invalid_value(
                "logging.format",
                format!("unknown format '{}'. Valid values: text, json", s),
            )),
        }
    }
}

/// CLI overrides for configuration values.
///
/// Used to apply command-line arguments over file-based config.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Override Qdrant URL
    pub qdrant_url: Option<String>,

    /// Override collection name
    pub collection: Option<String>,

    /// Override embedding endpoint
    pub embedding_url: Option<String>,

    /// Override embedding model
    pub embedding_model: Option<String>,

    /// Override extra equivalence table
    pub extra_table: Option<PathBuf>,

    /// Override log level
    pub log_level: Option<String>,
}

impl FastenerConfig {
    /// Apply CLI overrides to this configuration.
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(ref url) = overrides.qdrant_url {
            self.qdrant.url = url.clone();
        }

        if let Some(ref collection) = overrides.collection {
            self.qdrant.collection = collection.clone();
        }

        if let Some(ref url) = overrides.embedding_url {
            self.embedding.url = url.clone();
        }

        if let Some(ref model) = overrides.embedding_model {
            self.embedding.model = model.clone();
        }

        if let Some(ref path) = overrides.extra_table {
            self.standards.extra_table = Some(path.clone());
        }

        if let Some(ref level) = overrides.log_level {
            self.logging.level = level.clone();
        }
    }

    /// Validate the configuration.
    ///
    /// Exact results must outrank every non-exact result, so both standard
    /// boosts are at least 1.0 (a vector score never exceeds 1.0) and the
    /// direct boost is at least the equivalent boost.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.qdrant.url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "qdrant.url is required".to_string(),
            ));
        }
        if self.qdrant.collection.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "qdrant.collection is required".to_string(),
            ));
        }
        if self.qdrant.vector_dimension == 0 {
            return Err(ConfigError::invalid_value(
                "qdrant.vector_dimension",
                "must be greater than 0",
            ));
        }
        if self.embedding.url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "embedding.url is required".to_string(),
            ));
        }
        if self.embedding.model.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "embedding.model is required".to_string(),
            ));
        }
        if self.embedding.batch_size == 0 {
            return Err(ConfigError::invalid_value(
                "embedding.batch_size",
                "must be greater than 0",
            ));
        }

        for (key, value) in [
            ("search.default_threshold", self.search.default_threshold),
            ("search.exact_match_threshold", self.search.exact_match_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::invalid_value(
                    key,
                    format!("{} is outside [0, 1]", value),
                ));
            }
        }
        if self.search.pool_multiplier == 0 {
            return Err(ConfigError::invalid_value(
                "search.pool_multiplier",
                "must be greater than 0",
            ));
        }

        for (key, value) in [
            ("scoring.exact_match_boost", self.scoring.exact_match_boost),
            ("scoring.equivalent_match_boost", self.scoring.equivalent_match_boost),
            ("scoring.thread_match_boost", self.scoring.thread_match_boost),
            ("scoring.material_match_boost", self.scoring.material_match_boost),
        ] {
            if value.is_nan() || value < 0.0 {
                return Err(ConfigError::invalid_value(key, "must not be negative"));
            }
        }
        if self.scoring.equivalent_match_boost < 1.0 {
            return Err(ConfigError::invalid_value(
                "scoring.equivalent_match_boost",
                "must be at least 1.0 so exact results outrank non-exact ones",
            ));
        }
        if self.scoring.exact_match_boost < self.scoring.equivalent_match_boost {
            return Err(ConfigError::invalid_value(
                "scoring.exact_match_boost",
                "must not be lower than scoring.equivalent_match_boost",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = FastenerConfig::default();
        assert_eq!(config.qdrant.url, "http://localhost:6334");
        assert_eq!(config.qdrant.collection, "product_chunks");
        assert_eq!(config.qdrant.vector_dimension, 1536);
        assert_eq!(config.embedding.model, "text-embedding-3-small");
        assert_eq!(config.search.default_limit, 10);
        assert_eq!(config.search.min_exact_matches, 3);
        assert_eq!(config.scoring.exact_match_boost, 2.0);
        assert_eq!(config.logging.format, LogFormat::Text);
        assert!(config.standards.extra_table.is_none());
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(FastenerConfig::default().validate().is_ok());
    }

    #[test]
    fn test_apply_overrides() {
        let mut config = FastenerConfig::default();
        let overrides = ConfigOverrides {
            qdrant_url: Some("http://remote:6334".to_string()),
            collection: Some("catalog_2026".to_string()),
            log_level: Some("debug".to_string()),
            ..Default::default()
        };

        config.apply_overrides(&overrides);

        assert_eq!(config.qdrant.url, "http://remote:6334");
        assert_eq!(config.qdrant.collection, "catalog_2026");
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.embedding.url, "https://api.openai.com/v1");
    }

    #[test]
    fn test_validate_rejects_threshold_out_of_range() {
        let mut config = FastenerConfig::default();
        config.search.default_threshold = 1.5;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("search.default_threshold"));

        let mut config = FastenerConfig::default();
        config.search.exact_match_threshold = -0.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_weak_equivalent_boost() {
        let mut config = FastenerConfig::default();
        config.scoring.equivalent_match_boost = 0.5;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("equivalent_match_boost"));
    }

    #[test]
    fn test_validate_rejects_inverted_boosts() {
        let mut config = FastenerConfig::default();
        config.scoring.exact_match_boost = 1.0;
        config.scoring.equivalent_match_boost = 1.5;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("exact_match_boost"));
    }

    #[test]
    fn test_validate_rejects_negative_boost() {
        let mut config = FastenerConfig::default();
        config.scoring.thread_match_boost = -0.05;
        assert!(config.validate().is_err());

        config.scoring.thread_match_boost = f32::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_fields() {
        let mut config = FastenerConfig::default();
        config.embedding.model = "  ".to_string();
        assert!(config.validate().unwrap_err().to_string().contains("embedding.model"));

        let mut config = FastenerConfig::default();
        config.qdrant.url = String::new();
        assert!(config.validate().unwrap_err().to_string().contains("qdrant.url"));

        let mut config = FastenerConfig::default();
        config.search.pool_multiplier = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_log_format_from_str() {
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("TEXT".parse::<LogFormat>().unwrap(), LogFormat::Text);
        assert!("yaml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: FastenerConfig = toml::from_str(
            r#"
            [search]
            default_limit = 25

            [scoring]
            exact_match_boost = 3.0
            "#,
        )
        .unwrap();

        assert_eq!(config.search.default_limit, 25);
        assert_eq!(config.search.min_pool, 20);
        assert_eq!(config.scoring.exact_match_boost, 3.0);
        assert_eq!(config.scoring.equivalent_match_boost, 1.0);
    }

    #[test]
    fn test_config_toml_roundtrip() {
        let mut config = FastenerConfig::default();
        config.embedding.azure_mode = true;
        config.standards.extra_table = Some(PathBuf::from("/etc/fastener/groups.toml"));
        config.logging.format = LogFormat::Json;

        let toml_str = toml::to_string(&config).unwrap();
        let parsed: FastenerConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(parsed, config);
    }
}
