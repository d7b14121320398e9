//! Global config file source: $XDG_CONFIG_HOME/labtrack/config.toml or ~/.config/labtrack/config.toml

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::File;
use config::FileFormat;
use std::path::PathBuf;
use tracing::debug;

/// User configuration root: `$XDG_CONFIG_HOME`, falling back to `~/.config`.
pub fn config_home() -> Option<PathBuf> {
    match std::env::var("XDG_CONFIG_HOME") {
        Ok(dir) if !dir.is_empty() => Some(PathBuf::from(dir)),
        _ => std::env::var("HOME")
            .ok()
            .map(|home| PathBuf::from(home).join(".config")),
    }
}

/// Path to global config file.
pub fn global_config_path() -> Option<PathBuf> {
    config_home().map(|dir| dir.join("labtrack").join("config.toml"))
}

/// Add the global config file to the builder if it exists.
pub fn add_to_builder(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
    match global_config_path() {
        Some(path) if path.exists() => {
            let path = dunce::canonicalize(&path).unwrap_or(path);
            debug!(config_path = %path.display(), "Using global configuration file");
            builder.add_source(File::from(path).format(FileFormat::Toml).required(false))
        }
        Some(path) => {
            debug!(config_path = %path.display(), "No global configuration file");
            builder
        }
        None => builder,
    }
}
