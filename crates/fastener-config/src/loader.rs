//! Configuration loader with inheritance support.
//!
//! Loads configuration from multiple sources and merges them:
//! 1. Global config: `~/.fastener/config.toml`
//! 2. Local config: `.fastener/config.toml` (in workspace)
//! 3. CLI overrides
//!
//! Later sources override earlier ones. A value equal to its default in a
//! later file does not override an earlier one.

use crate::error::ConfigError;
use crate::{
    ConfigOverrides, EmbeddingSettings, FastenerConfig, LogFormat, LoggingConfig, QdrantSettings,
    ScoringSettings, SearchSettings, StandardsSettings,
};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Global configuration directory name.
const GLOBAL_CONFIG_DIR: &str = ".fastener";

/// Local configuration directory name.
const LOCAL_CONFIG_DIR: &str = ".fastener";

/// Configuration loader with caching and inheritance support.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Global config directory (e.g., `~/.fastener`)
    global_config_dir: Option<PathBuf>,

    /// Cached global config
    global_config: Option<FastenerConfig>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a new configuration loader.
    ///
    /// Automatically detects the global config directory (`~/.fastener`).
    pub fn new() -> Self {
        let global_config_dir = dirs::home_dir().map(|h| h.join(GLOBAL_CONFIG_DIR));

        Self {
            global_config_dir,
            global_config: None,
        }
    }

    /// Create a loader with a custom global config directory.
    pub fn with_global_dir(global_dir: impl Into<PathBuf>) -> Self {
        Self {
            global_config_dir: Some(global_dir.into()),
            global_config: None,
        }
    }

    pub fn global_config_path(&self) -> Option<PathBuf> {
        self.global_config_dir
            .as_ref()
            .map(|d| d.join(CONFIG_FILE_NAME))
    }

    pub fn local_config_path(&self, workspace_root: &Path) -> PathBuf {
        workspace_root.join(LOCAL_CONFIG_DIR).join(CONFIG_FILE_NAME)
    }

    /// Load configuration for a workspace with optional CLI overrides.
    ///
    /// Merges config in order: global → local → overrides, then validates.
    pub fn load(
        &mut self,
        workspace_root: &Path,
        overrides: Option<&ConfigOverrides>,
    ) -> Result<FastenerConfig, ConfigError> {
        let mut config = FastenerConfig::default();

        if let Some(global_config) = self.load_global()? {
            config = merge_configs(config, global_config);
        }

        if let Some(local_config) = self.load_local(workspace_root)? {
            config = merge_configs(config, local_config);
        }

        if let Some(ovr) = overrides {
            config.apply_overrides(ovr);
        }

        config.validate()?;
        Ok(config)
    }

    /// Load only the global configuration.
    pub fn load_global(&mut self) -> Result<Option<FastenerConfig>, ConfigError> {
        if let Some(ref config) = self.global_config {
            return Ok(Some(config.clone()));
        }

        let Some(global_path) = self.global_config_path() else {
            debug!("No home directory found, skipping global config");
            return Ok(None);
        };

        if !global_path.exists() {
            trace!("Global config not found at {:?}", global_path);
            return Ok(None);
        }

        debug!("Loading global config from {:?}", global_path);
        let config = load_config_file(&global_path)?;

        self.global_config = Some(config.clone());

        Ok(Some(config))
    }

    /// Load only the local configuration for a workspace.
    pub fn load_local(&self, workspace_root: &Path) -> Result<Option<FastenerConfig>, ConfigError> {
        let local_path = self.local_config_path(workspace_root);

        if !local_path.exists() {
            trace!("Local config not found at {:?}", local_path);
            return Ok(None);
        }

        debug!("Loading local config from {:?}", local_path);
        load_config_file(&local_path).map(Some)
    }

    pub fn save_global(&self, config: &FastenerConfig) -> Result<(), ConfigError> {
        let Some(ref global_dir) = self.global_config_dir else {
            return Err(ConfigError::NoHomeDir);
        };

        save_config_file(&global_dir.join(CONFIG_FILE_NAME), config)
    }

    pub fn save_local(
        &self,
        workspace_root: &Path,
        config: &FastenerConfig,
    ) -> Result<(), ConfigError> {
        save_config_file(&self.local_config_path(workspace_root), config)
    }

    /// Initialize local configuration for a workspace.
    ///
    /// Creates `.fastener/config.toml` with default configuration unless
    /// one already exists.
    pub fn init_local(&self, workspace_root: &Path) -> Result<PathBuf, ConfigError> {
        let local_dir = workspace_root.join(LOCAL_CONFIG_DIR);

        if !local_dir.exists() {
            std::fs::create_dir_all(&local_dir)
                .map_err(|e| ConfigError::create_dir(&local_dir, e))?;
        }

        let config_path = local_dir.join(CONFIG_FILE_NAME);
        if !config_path.exists() {
            save_config_file(&config_path, &FastenerConfig::default())?;
        }

        Ok(config_path)
    }

    /// Clear cached global configuration.
    ///
    /// Forces reload on next `load_global()` call.
    pub fn clear_cache(&mut self) {
        self.global_config = None;
    }
}

fn load_config_file(path: &Path) -> Result<FastenerConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;

    toml::from_str(&content).map_err(|e| ConfigError::parse_toml(path, e))
}

fn save_config_file(path: &Path, config: &FastenerConfig) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))
}

/// Take `overlay` unless it equals the default, in which case keep `base`.
fn pick<T: PartialEq>(base: T, overlay: T, default: T) -> T {
    if overlay != default {
        overlay
    } else {
        base
    }
}

/// Merge two configurations, with `overlay` taking precedence.
///
/// This performs a field-by-field merge, allowing partial configs.
fn merge_configs(base: FastenerConfig, overlay: FastenerConfig) -> FastenerConfig {
    FastenerConfig {
        qdrant: merge_qdrant(base.qdrant, overlay.qdrant),
        embedding: merge_embedding(base.embedding, overlay.embedding),
        search: merge_search(base.search, overlay.search),
        scoring: merge_scoring(base.scoring, overlay.scoring),
        standards: merge_standards(base.standards, overlay.standards),
        logging: merge_logging(base.logging, overlay.logging),
    }
}

fn merge_qdrant(base: QdrantSettings, overlay: QdrantSettings) -> QdrantSettings {
    let d = QdrantSettings::default();
    QdrantSettings {
        url: pick(base.url, overlay.url, d.url),
        api_key_env: overlay.api_key_env.or(base.api_key_env),
        collection: pick(base.collection, overlay.collection, d.collection),
        vector_dimension: pick(base.vector_dimension, overlay.vector_dimension, d.vector_dimension),
        timeout_secs: pick(base.timeout_secs, overlay.timeout_secs, d.timeout_secs),
    }
}

fn merge_embedding(base: EmbeddingSettings, overlay: EmbeddingSettings) -> EmbeddingSettings {
    let d = EmbeddingSettings::default();
    EmbeddingSettings {
        url: pick(base.url, overlay.url, d.url),
        api_key_env: pick(base.api_key_env, overlay.api_key_env, d.api_key_env),
        model: pick(base.model, overlay.model, d.model),
        timeout_secs: pick(base.timeout_secs, overlay.timeout_secs, d.timeout_secs),
        max_retries: pick(base.max_retries, overlay.max_retries, d.max_retries),
        azure_mode: base.azure_mode || overlay.azure_mode,
        batch_size: pick(base.batch_size, overlay.batch_size, d.batch_size),
    }
}

fn merge_search(base: SearchSettings, overlay: SearchSettings) -> SearchSettings {
    let d = SearchSettings::default();
    SearchSettings {
        default_limit: pick(base.default_limit, overlay.default_limit, d.default_limit),
        default_threshold: pick(
            base.default_threshold,
            overlay.default_threshold,
            d.default_threshold,
        ),
        exact_match_threshold: pick(
            base.exact_match_threshold,
            overlay.exact_match_threshold,
            d.exact_match_threshold,
        ),
        min_exact_matches: pick(
            base.min_exact_matches,
            overlay.min_exact_matches,
            d.min_exact_matches,
        ),
        pool_multiplier: pick(base.pool_multiplier, overlay.pool_multiplier, d.pool_multiplier),
        min_pool: pick(base.min_pool, overlay.min_pool, d.min_pool),
        // Only an explicit `false` overrides
        fallback_unfiltered: base.fallback_unfiltered && overlay.fallback_unfiltered,
    }
}

fn merge_scoring(base: ScoringSettings, overlay: ScoringSettings) -> ScoringSettings {
    let d = ScoringSettings::default();
    ScoringSettings {
        exact_match_boost: pick(
            base.exact_match_boost,
            overlay.exact_match_boost,
            d.exact_match_boost,
        ),
        equivalent_match_boost: pick(
            base.equivalent_match_boost,
            overlay.equivalent_match_boost,
            d.equivalent_match_boost,
        ),
        thread_match_boost: pick(
            base.thread_match_boost,
            overlay.thread_match_boost,
            d.thread_match_boost,
        ),
        material_match_boost: pick(
            base.material_match_boost,
            overlay.material_match_boost,
            d.material_match_boost,
        ),
    }
}

fn merge_standards(base: StandardsSettings, overlay: StandardsSettings) -> StandardsSettings {
    StandardsSettings {
        extra_table: overlay.extra_table.or(base.extra_table),
    }
}

fn merge_logging(base: LoggingConfig, overlay: LoggingConfig) -> LoggingConfig {
    LoggingConfig {
        level: pick(base.level, overlay.level, "info".to_string()),
        format: pick(base.format, overlay.format, LogFormat::Text),
    }
}
