//! Configuration System
//!
//! Layered configuration: built-in defaults, then the global file
//! (`$XDG_CONFIG_HOME/labtrack/config.toml`), then `LABTRACK__*` environment
//! variables. Command-line flags are applied on top by the binary.

use crate::error::ApiError;
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

mod merge;
mod sources;

pub use sources::global_file::{config_home, global_config_path};

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Base folder holding `metadata.json` and the managed storage directories
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_folder: Option<PathBuf>,

    /// Directory receiving per-entity backups after each save
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracking_dir: Option<PathBuf>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];

impl TrackerConfig {
    /// Validate the configuration, collecting every problem.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if let Some(base) = &self.base_folder {
            if base.as_os_str().is_empty() {
                errors.push("base_folder cannot be empty".to_string());
            }
        }
        if let Some(dir) = &self.tracking_dir {
            if dir.as_os_str().is_empty() {
                errors.push("tracking_dir cannot be empty".to_string());
            }
        }
        if !LOG_LEVELS.contains(&self.logging.level.to_ascii_lowercase().as_str()) {
            errors.push(format!(
                "logging.level '{}' is not one of {}",
                self.logging.level,
                LOG_LEVELS.join(", ")
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Base folder, or `NoBaseFolder` when none is configured.
    pub fn require_base_folder(&self) -> Result<&Path, ApiError> {
        self.base_folder.as_deref().ok_or(ApiError::NoBaseFolder)
    }
}

/// Loads and persists `TrackerConfig`
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load from defaults, the global file and the environment.
    pub fn load() -> Result<TrackerConfig, ApiError> {
        let builder = merge::merge_policy::builder_with_defaults()?;
        let builder = sources::global_file::add_to_builder(builder);
        let builder = sources::environment::add_to_builder(builder);
        Self::finish(builder)
    }

    /// Load from defaults, an explicit file and the environment.
    pub fn load_from_file(path: &Path) -> Result<TrackerConfig, ApiError> {
        let builder = merge::merge_policy::builder_with_defaults()?.add_source(
            config::File::from(path)
                .format(config::FileFormat::Toml)
                .required(true),
        );
        let builder = sources::environment::add_to_builder(builder);
        Self::finish(builder)
    }

    /// Write `config` to the global config file, creating its directory.
    pub fn save_global(config: &TrackerConfig) -> Result<PathBuf, ApiError> {
        let path = global_config_path().ok_or_else(|| {
            ApiError::ConfigError("Neither XDG_CONFIG_HOME nor HOME is set".to_string())
        })?;
        Self::save_to_file(config, &path)?;
        Ok(path)
    }

    pub fn save_to_file(config: &TrackerConfig, path: &Path) -> Result<(), ApiError> {
        let rendered = toml::to_string_pretty(config)
            .map_err(|e| ApiError::ConfigError(format!("Failed to serialize config: {}", e)))?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                ApiError::ConfigError(format!("Failed to create {:?}: {}", parent, e))
            })?;
        }
        fs::write(path, rendered)
            .map_err(|e| ApiError::ConfigError(format!("Failed to write {:?}: {}", path, e)))?;
        info!(path = %path.display(), "Saved configuration");
        Ok(())
    }

    fn finish(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<TrackerConfig, ApiError> {
        let config: TrackerConfig = builder.build()?.try_deserialize()?;
        config
            .validate()
            .map_err(|errors| ApiError::ConfigError(errors.join("; ")))?;
        Ok(config)
    }
}
