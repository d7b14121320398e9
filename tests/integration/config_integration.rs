//! Integration tests for Configuration System

use labtrack::config::{global_config_path, ConfigLoader, TrackerConfig};
use labtrack::logging::LogFormat;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

use crate::integration::with_xdg_env;

#[test]
fn test_load_without_global_file_uses_defaults() {
    let test_dir = TempDir::new().unwrap();
    with_xdg_env(&test_dir, || {
        let config = ConfigLoader::load().unwrap();
        assert_eq!(config, TrackerConfig::default());
    });
}

#[test]
fn test_global_path_follows_xdg_config_home() {
    let test_dir = TempDir::new().unwrap();
    with_xdg_env(&test_dir, || {
        let path = global_config_path().unwrap();
        assert_eq!(
            path,
            test_dir.path().join("config").join("labtrack").join("config.toml")
        );
    });
}

#[test]
fn test_global_file_is_loaded() {
    let test_dir = TempDir::new().unwrap();
    with_xdg_env(&test_dir, || {
        let path = global_config_path().unwrap();
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(
            &path,
            r#"
base_folder = "/data/lab"

[logging]
format = "json"
"#,
        )
        .unwrap();

        let config = ConfigLoader::load().unwrap();
        assert_eq!(config.base_folder, Some(PathBuf::from("/data/lab")));
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.level, "warn");
    });
}

#[test]
fn test_environment_overrides_global_file() {
    let test_dir = TempDir::new().unwrap();
    with_xdg_env(&test_dir, || {
        let path = global_config_path().unwrap();
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "base_folder = \"/from/file\"\n").unwrap();
        std::env::set_var("LABTRACK__BASE_FOLDER", "/from/env");
        std::env::set_var("LABTRACK__LOGGING__LEVEL", "debug");

        let config = ConfigLoader::load().unwrap();
        assert_eq!(config.base_folder, Some(PathBuf::from("/from/env")));
        assert_eq!(config.logging.level, "debug");
    });
}

#[test]
fn test_invalid_level_rejected() {
    let test_dir = TempDir::new().unwrap();
    with_xdg_env(&test_dir, || {
        std::env::set_var("LABTRACK__LOGGING__LEVEL", "chatty");
        assert!(ConfigLoader::load().is_err());
    });
}

#[test]
fn test_save_global_records_tracking_dir() {
    let test_dir = TempDir::new().unwrap();
    with_xdg_env(&test_dir, || {
        let config = TrackerConfig {
            tracking_dir: Some(PathBuf::from("/backups/lab")),
            ..Default::default()
        };
        let written = ConfigLoader::save_global(&config).unwrap();
        assert_eq!(written, global_config_path().unwrap());

        let loaded = ConfigLoader::load().unwrap();
        assert_eq!(loaded.tracking_dir, Some(PathBuf::from("/backups/lab")));
    });
}
