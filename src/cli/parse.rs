//! CLI parse: clap types for labtrack. No behavior; definitions only.

use crate::types::{EntityKind, VersionId};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// labtrack CLI - versioned metadata for projects, prototypes, experiments and users
#[derive(Parser)]
#[command(name = "labtrack")]
#[command(about = "Versioned metadata store for R&D projects, prototypes, experiments and users")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Base folder (overrides base_folder from the config file)
    #[arg(long, global = true)]
    pub base: Option<PathBuf>,

    /// Configuration file path (overrides default config loading)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long, global = true)]
    pub log_format: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create metadata.json and the managed storage directories
    Init,
    /// List entities of one kind
    List {
        kind: EntityKind,
        #[command(flatten)]
        filter: ExperimentFilterArgs,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Show the version history of an entity, newest first
    History { kind: EntityKind, name: String },
    /// Show one version of an entity
    Show {
        kind: EntityKind,
        name: String,
        /// Version to show (default: latest)
        #[arg(long)]
        version: Option<VersionId>,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Create a new entity (version 1)
    Create {
        kind: EntityKind,
        name: String,
        /// Changelog summary of the first version
        #[arg(long)]
        summary: String,
        #[command(flatten)]
        fields: RecordArgs,
        /// File to upload (repeatable)
        #[arg(long = "file")]
        files: Vec<PathBuf>,
        /// Folder to upload recursively (repeatable)
        #[arg(long = "folder")]
        folders: Vec<PathBuf>,
        /// Folder whose image files are uploaded (repeatable)
        #[arg(long = "image-folder")]
        image_folders: Vec<PathBuf>,
    },
    /// Edit an entity; a new version is written only if something changed
    Update {
        kind: EntityKind,
        name: String,
        /// Changelog summary (required when something changed)
        #[arg(long, default_value = "")]
        summary: String,
        /// Version to start from (default: latest)
        #[arg(long)]
        from_version: Option<VersionId>,
        #[command(flatten)]
        fields: RecordArgs,
        /// File to upload at the top level (repeatable)
        #[arg(long = "add-file")]
        add_files: Vec<PathBuf>,
        /// Folder to upload at the top level (repeatable)
        #[arg(long = "add-folder")]
        add_folders: Vec<PathBuf>,
        /// Item to remove, as a slash-separated name path (repeatable)
        #[arg(long = "remove")]
        remove: Vec<String>,
        /// Replace a stored file's content: ITEM_PATH=LOCAL_FILE (repeatable)
        #[arg(long = "replace")]
        replace: Vec<String>,
    },
    /// Configuration commands
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Record the tracking directory used for backups in the global config
    SetTrackingDir { dir: PathBuf },
    /// Print the effective configuration
    Show,
}

/// Scalar record fields settable from the command line
#[derive(Args, Default, Debug, Clone)]
pub struct RecordArgs {
    /// Free-text description
    #[arg(long)]
    pub description: Option<String>,
    /// Experiment: associated project
    #[arg(long)]
    pub project: Option<String>,
    /// Experiment: associated node of the project tree
    #[arg(long)]
    pub node: Option<String>,
    /// Experiment: associated user (repeatable; replaces the set)
    #[arg(long = "user")]
    pub users: Vec<String>,
    /// Experiment: associated prototype (repeatable; replaces the set)
    #[arg(long = "prototype")]
    pub prototypes: Vec<String>,
    /// Experiment: category
    #[arg(long)]
    pub category: Option<String>,
    /// Experiment: start date (YYYY-MM-DD)
    #[arg(long)]
    pub start_date: Option<NaiveDate>,
    /// Experiment: end date (YYYY-MM-DD)
    #[arg(long)]
    pub end_date: Option<NaiveDate>,
    /// Project: organization node as a slash-separated path (repeatable; replaces the tree)
    #[arg(long = "tree-path")]
    pub tree_paths: Vec<String>,
}

/// Experiment listing filter flags
#[derive(Args, Default, Debug, Clone)]
pub struct ExperimentFilterArgs {
    /// Only experiments of this project
    #[arg(long = "project", id = "filter_project")]
    pub project: Option<String>,
    /// Only experiments on this project node
    #[arg(long = "node", id = "filter_node")]
    pub node: Option<String>,
    /// Experiments involving any of these users (repeatable)
    #[arg(long = "user", id = "filter_user")]
    pub users: Vec<String>,
    /// Experiments involving any of these prototypes (repeatable)
    #[arg(long = "prototype", id = "filter_prototype")]
    pub prototypes: Vec<String>,
    /// Only experiments of this category
    #[arg(long = "category", id = "filter_category")]
    pub category: Option<String>,
    /// Experiments starting on or after this date (YYYY-MM-DD)
    #[arg(long = "from")]
    pub from: Option<NaiveDate>,
    /// Experiments ending on or before this date (YYYY-MM-DD)
    #[arg(long = "to")]
    pub to: Option<NaiveDate>,
}
