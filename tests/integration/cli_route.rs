//! CLI route integration: commands parsed by clap and executed against a temp base folder

use clap::Parser;
use labtrack::api::TrackerApi;
use labtrack::cli::{Cli, RunContext};
use labtrack::config::{ConfigLoader, TrackerConfig};
use labtrack::error::ApiError;
use labtrack::metadata::{ExperimentRecord, PrototypeRecord};
use labtrack::tree::node::find_item;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::integration::{with_xdg_env, write_file};

struct Harness {
    dir: TempDir,
    config_path: PathBuf,
}

impl Harness {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let base = dir.path().join("base");
        fs::create_dir_all(&base).unwrap();
        let config_path = dir.path().join("labtrack.toml");
        let config = TrackerConfig {
            base_folder: Some(base),
            ..Default::default()
        };
        ConfigLoader::save_to_file(&config, &config_path).unwrap();
        Self { dir, config_path }
    }

    fn base(&self) -> PathBuf {
        self.dir.path().join("base")
    }

    fn src(&self) -> PathBuf {
        self.dir.path().join("src")
    }

    fn run(&self, args: &[&str]) -> Result<String, ApiError> {
        let mut argv = vec![
            "labtrack".to_string(),
            "--config".to_string(),
            self.config_path.display().to_string(),
        ];
        argv.extend(args.iter().map(|a| a.to_string()));
        let cli = Cli::try_parse_from(argv).unwrap();
        with_xdg_env(&self.dir, || {
            RunContext::new(cli.base, cli.config)?.execute(&cli.command)
        })
    }
}

fn arg(path: &Path) -> String {
    path.display().to_string()
}

#[test]
fn test_init_creates_layout() {
    let h = Harness::new();
    let out = h.run(&["init"]).unwrap();
    assert!(out.contains("metadata.json"));
    assert!(h.base().join("metadata.json").exists());
    assert!(h.base().join("Experiment Files").is_dir());
}

#[test]
fn test_create_list_and_show() {
    let h = Harness::new();
    h.run(&["init"]).unwrap();
    let report = write_file(&h.src(), "report.docx", "draft one");

    let out = h
        .run(&[
            "create",
            "prototype",
            "P1",
            "--summary",
            "initial build",
            "--description",
            "bench rig",
            "--file",
            &arg(&report),
        ])
        .unwrap();
    assert!(out.contains("report.docx"));
    assert!(out.contains("version 1"));

    let listed = h.run(&["list", "prototypes", "--format", "json"]).unwrap();
    let rows: serde_json::Value = serde_json::from_str(&listed).unwrap();
    assert_eq!(rows[0]["name"], "P1");
    assert_eq!(rows[0]["latest_version"], 1);

    let shown = h.run(&["show", "prototype", "P1", "--format", "json"]).unwrap();
    let value: serde_json::Value = serde_json::from_str(&shown).unwrap();
    assert_eq!(value["record"]["description"], "bench rig");
    assert_eq!(value["record"]["version_summary"], "initial build");
}

#[test]
fn test_update_replace_and_remove() {
    let h = Harness::new();
    h.run(&["init"]).unwrap();
    let report = write_file(&h.src(), "report.docx", "draft one");
    let notes = write_file(&h.src(), "notes.txt", "n");
    h.run(&[
        "create",
        "prototype",
        "P1",
        "--summary",
        "initial",
        "--file",
        &arg(&report),
        "--file",
        &arg(&notes),
    ])
    .unwrap();

    let revised = write_file(&h.src(), "revised.docx", "draft two");
    let replace = format!("report.docx={}", revised.display());
    let out = h
        .run(&[
            "update",
            "prototype",
            "P1",
            "--summary",
            "revised report",
            "--replace",
            &replace,
            "--remove",
            "notes.txt",
        ])
        .unwrap();
    assert!(out.contains("version 2"));

    let api = TrackerApi::open(&h.base(), None).unwrap();
    let (id, latest) = api.show::<PrototypeRecord>("P1", None).unwrap();
    assert_eq!(id.get(), 2);
    assert_eq!(latest.uploaded_items.len(), 1);
    assert!(find_item(&latest.uploaded_items, &["notes.txt"]).is_none());
    let stored = latest.uploaded_items[0].path().unwrap();
    assert_eq!(fs::read_to_string(stored).unwrap(), "draft two");

    let history = h.run(&["history", "prototype", "P1"]).unwrap();
    assert!(history.contains("revised report"));
}

#[test]
fn test_update_without_changes_writes_nothing() {
    let h = Harness::new();
    h.run(&["init"]).unwrap();
    h.run(&["create", "user", "ana", "--summary", "joined"]).unwrap();

    let out = h.run(&["update", "user", "ana"]).unwrap();
    assert!(out.contains("nothing written"));

    let api = TrackerApi::open(&h.base(), None).unwrap();
    assert_eq!(api.history::<labtrack::metadata::UserRecord>("ana").unwrap().len(), 1);
}

#[test]
fn test_experiment_filters_and_validation() {
    let h = Harness::new();
    h.run(&["init"]).unwrap();
    h.run(&[
        "create",
        "experiment",
        "Trial1",
        "--summary",
        "planned",
        "--project",
        "Alpha",
        "--user",
        "ana",
        "--start-date",
        "2024-05-01",
        "--end-date",
        "2024-05-03",
    ])
    .unwrap();

    let listed = h
        .run(&["list", "experiments", "--project", "Alpha", "--format", "json"])
        .unwrap();
    let rows: serde_json::Value = serde_json::from_str(&listed).unwrap();
    assert_eq!(rows.as_array().unwrap().len(), 1);

    let none = h
        .run(&["list", "experiments", "--project", "Beta", "--format", "json"])
        .unwrap();
    let rows: serde_json::Value = serde_json::from_str(&none).unwrap();
    assert!(rows.as_array().unwrap().is_empty());

    assert!(h.run(&["list", "users", "--project", "Alpha"]).is_err());
    assert!(h
        .run(&["update", "experiment", "Trial1", "--summary", "x", "--end-date", "2024-04-01"])
        .is_err());

    let api = TrackerApi::open(&h.base(), None).unwrap();
    let (_, trial) = api.show::<ExperimentRecord>("Trial1", None).unwrap();
    assert_eq!(trial.associated_project, "Alpha");
}

#[test]
fn test_duplicate_create_rejected() {
    let h = Harness::new();
    h.run(&["init"]).unwrap();
    h.run(&["create", "project", "Alpha", "--summary", "kickoff"]).unwrap();
    let err = h
        .run(&["create", "project", "Alpha", "--summary", "again"])
        .unwrap_err();
    assert_eq!(labtrack::cli::exit_code(&err), 2);
}

#[test]
fn test_set_tracking_dir_writes_config_file() {
    let h = Harness::new();
    let tracking = h.dir.path().join("tracking");
    h.run(&["config", "set-tracking-dir", &arg(&tracking)]).unwrap();

    let config = ConfigLoader::load_from_file(&h.config_path).unwrap();
    assert_eq!(
        config.tracking_dir,
        Some(dunce::canonicalize(&tracking).unwrap())
    );
    assert_eq!(config.base_folder, Some(h.base()));
}
