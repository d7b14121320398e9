//! CLI route: single route table and run context. Dispatches to the tracker API and presentation.

use crate::api::TrackerApi;
use crate::change::EditSession;
use crate::cli::parse::{Commands, ConfigCommands, ExperimentFilterArgs, RecordArgs};
use crate::cli::presentation::{
    format_commit_outcome, format_config, format_entity_list, format_history,
    format_init_summary, format_record, format_upload_report,
};
use crate::config::{ConfigLoader, TrackerConfig};
use crate::error::{ApiError, StorageError};
use crate::metadata::{
    ExperimentRecord, ProjectRecord, PrototypeRecord, UserRecord, VersionRecord,
};
use crate::store::ExperimentFilter;
use crate::tree::codec::nodes_from_paths;
use crate::types::{EntityKind, VersionId};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

/// Record types whose scalar fields can be set from `RecordArgs`
pub trait ApplyArgs: VersionRecord {
    fn apply_args(&mut self, args: &RecordArgs) -> Result<(), ApiError>;
}

fn reject_experiment_fields(kind: EntityKind, args: &RecordArgs) -> Result<(), ApiError> {
    let experiment_only = args.project.is_some()
        || args.node.is_some()
        || !args.users.is_empty()
        || !args.prototypes.is_empty()
        || args.category.is_some()
        || args.start_date.is_some()
        || args.end_date.is_some();
    if experiment_only {
        return Err(StorageError::Validation(format!(
            "experiment fields do not apply to a {}",
            kind
        ))
        .into());
    }
    Ok(())
}

fn reject_tree_paths(kind: EntityKind, args: &RecordArgs) -> Result<(), ApiError> {
    if !args.tree_paths.is_empty() {
        return Err(StorageError::Validation(format!(
            "--tree-path only applies to projects, not a {}",
            kind
        ))
        .into());
    }
    Ok(())
}

impl ApplyArgs for ProjectRecord {
    fn apply_args(&mut self, args: &RecordArgs) -> Result<(), ApiError> {
        reject_experiment_fields(Self::KIND, args)?;
        if let Some(description) = &args.description {
            self.description = description.clone();
        }
        if !args.tree_paths.is_empty() {
            self.tree_structure = nodes_from_paths(&args.tree_paths);
        }
        Ok(())
    }
}

impl ApplyArgs for PrototypeRecord {
    fn apply_args(&mut self, args: &RecordArgs) -> Result<(), ApiError> {
        reject_experiment_fields(Self::KIND, args)?;
        reject_tree_paths(Self::KIND, args)?;
        if let Some(description) = &args.description {
            self.description = description.clone();
        }
        Ok(())
    }
}

impl ApplyArgs for UserRecord {
    fn apply_args(&mut self, args: &RecordArgs) -> Result<(), ApiError> {
        reject_experiment_fields(Self::KIND, args)?;
        reject_tree_paths(Self::KIND, args)?;
        if let Some(description) = &args.description {
            self.description = description.clone();
        }
        Ok(())
    }
}

impl ApplyArgs for ExperimentRecord {
    fn apply_args(&mut self, args: &RecordArgs) -> Result<(), ApiError> {
        reject_tree_paths(Self::KIND, args)?;
        if let Some(description) = &args.description {
            self.description = description.clone();
        }
        if let Some(project) = &args.project {
            self.associated_project = project.clone();
        }
        if let Some(node) = &args.node {
            self.associated_node = node.clone();
        }
        if !args.users.is_empty() {
            self.associated_users = args.users.iter().cloned().collect();
        }
        if !args.prototypes.is_empty() {
            self.associated_prototypes = args.prototypes.iter().cloned().collect();
        }
        if let Some(category) = &args.category {
            self.category = category.clone();
        }
        if let Some(start) = args.start_date {
            self.start_date = start;
            if args.end_date.is_none() && self.end_date < start {
                self.end_date = start;
            }
        }
        if let Some(end) = args.end_date {
            self.end_date = end;
        }
        if self.end_date < self.start_date {
            return Err(StorageError::Validation(format!(
                "end date {} is before start date {}",
                self.end_date, self.start_date
            ))
            .into());
        }
        Ok(())
    }
}

impl From<&ExperimentFilterArgs> for ExperimentFilter {
    fn from(args: &ExperimentFilterArgs) -> Self {
        ExperimentFilter {
            project: args.project.clone(),
            node: args.node.clone(),
            users: args.users.iter().cloned().collect(),
            prototypes: args.prototypes.iter().cloned().collect(),
            category: args.category.clone(),
            start_date: args.from,
            end_date: args.to,
        }
    }
}

/// Uploads requested by `create`
struct CreateUploads<'a> {
    files: &'a [PathBuf],
    folders: &'a [PathBuf],
    image_folders: &'a [PathBuf],
}

/// Edits requested by `update`
struct UpdateEdits<'a> {
    from_version: Option<VersionId>,
    add_files: &'a [PathBuf],
    add_folders: &'a [PathBuf],
    remove: &'a [String],
    replace: &'a [String],
}

/// Runtime context for CLI execution: effective config and config path.
pub struct RunContext {
    config: TrackerConfig,
    config_path: Option<PathBuf>,
}

impl RunContext {
    /// Load configuration; `base` overrides the configured base folder.
    pub fn new(base: Option<PathBuf>, config_path: Option<PathBuf>) -> Result<Self, ApiError> {
        let mut config = match &config_path {
            Some(path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load()?,
        };
        if base.is_some() {
            config.base_folder = base;
        }
        Ok(Self {
            config,
            config_path,
        })
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Execute a command and return its rendered output.
    pub fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        let start = Instant::now();
        let output = match command {
            Commands::Init => {
                let base = self.config.require_base_folder()?;
                let api = TrackerApi::init(base, self.config.tracking_dir.clone())?;
                Ok(format_init_summary(api.base_folder()))
            }
            Commands::List {
                kind,
                filter,
                format,
            } => self.handle_list(*kind, filter, format),
            Commands::History { kind, name } => {
                let api = self.open_api()?;
                match kind {
                    EntityKind::Project => history::<ProjectRecord>(&api, name),
                    EntityKind::Prototype => history::<PrototypeRecord>(&api, name),
                    EntityKind::Experiment => history::<ExperimentRecord>(&api, name),
                    EntityKind::User => history::<UserRecord>(&api, name),
                }
            }
            Commands::Show {
                kind,
                name,
                version,
                format,
            } => {
                let api = self.open_api()?;
                match kind {
                    EntityKind::Project => show::<ProjectRecord>(&api, name, *version, format),
                    EntityKind::Prototype => show::<PrototypeRecord>(&api, name, *version, format),
                    EntityKind::Experiment => show::<ExperimentRecord>(&api, name, *version, format),
                    EntityKind::User => show::<UserRecord>(&api, name, *version, format),
                }
            }
            Commands::Create {
                kind,
                name,
                summary,
                fields,
                files,
                folders,
                image_folders,
            } => {
                let mut api = self.open_api()?;
                let uploads = CreateUploads {
                    files,
                    folders,
                    image_folders,
                };
                match kind {
                    EntityKind::Project => {
                        create::<ProjectRecord>(&mut api, name, summary, fields, &uploads)
                    }
                    EntityKind::Prototype => {
                        create::<PrototypeRecord>(&mut api, name, summary, fields, &uploads)
                    }
                    EntityKind::Experiment => {
                        create::<ExperimentRecord>(&mut api, name, summary, fields, &uploads)
                    }
                    EntityKind::User => {
                        create::<UserRecord>(&mut api, name, summary, fields, &uploads)
                    }
                }
            }
            Commands::Update {
                kind,
                name,
                summary,
                from_version,
                fields,
                add_files,
                add_folders,
                remove,
                replace,
            } => {
                let mut api = self.open_api()?;
                let edits = UpdateEdits {
                    from_version: *from_version,
                    add_files,
                    add_folders,
                    remove,
                    replace,
                };
                match kind {
                    EntityKind::Project => {
                        update::<ProjectRecord>(&mut api, name, summary, fields, &edits)
                    }
                    EntityKind::Prototype => {
                        update::<PrototypeRecord>(&mut api, name, summary, fields, &edits)
                    }
                    EntityKind::Experiment => {
                        update::<ExperimentRecord>(&mut api, name, summary, fields, &edits)
                    }
                    EntityKind::User => {
                        update::<UserRecord>(&mut api, name, summary, fields, &edits)
                    }
                }
            }
            Commands::Config { command } => self.handle_config(command),
        };
        debug!(
            duration_ms = start.elapsed().as_millis(),
            ok = output.is_ok(),
            "Command finished"
        );
        output
    }

    fn open_api(&self) -> Result<TrackerApi, ApiError> {
        TrackerApi::from_config(&self.config)
    }

    fn handle_list(
        &self,
        kind: EntityKind,
        filter: &ExperimentFilterArgs,
        format: &str,
    ) -> Result<String, ApiError> {
        let api = self.open_api()?;
        let filter = ExperimentFilter::from(filter);
        if kind != EntityKind::Experiment && !filter.is_empty() {
            return Err(StorageError::Validation(
                "list filters only apply to experiments".to_string(),
            )
            .into());
        }
        match kind {
            EntityKind::Project => format_entity_list(&api.list::<ProjectRecord>(), format),
            EntityKind::Prototype => format_entity_list(&api.list::<PrototypeRecord>(), format),
            EntityKind::Experiment => format_entity_list(&api.experiments(&filter), format),
            EntityKind::User => format_entity_list(&api.list::<UserRecord>(), format),
        }
    }

    fn handle_config(&self, command: &ConfigCommands) -> Result<String, ApiError> {
        match command {
            ConfigCommands::SetTrackingDir { dir } => {
                fs::create_dir_all(dir)
                    .map_err(|e| StorageError::io("create directory", dir, e))?;
                let dir = crate::tree::path::canonicalize_path(dir)?;
                let mut config = self.config.clone();
                config.tracking_dir = Some(dir.clone());
                let written = match &self.config_path {
                    Some(path) => {
                        ConfigLoader::save_to_file(&config, path)?;
                        path.clone()
                    }
                    None => ConfigLoader::save_global(&config)?,
                };
                info!(tracking_dir = %dir.display(), "Tracking directory recorded");
                Ok(format!(
                    "Tracking directory set to {} ({})",
                    dir.display(),
                    written.display()
                ))
            }
            ConfigCommands::Show => format_config(&self.config),
        }
    }
}

fn history<R: VersionRecord>(api: &TrackerApi, name: &str) -> Result<String, ApiError> {
    let versions = api.history::<R>(name)?;
    Ok(format_history(name, &versions))
}

fn show<R: VersionRecord>(
    api: &TrackerApi,
    name: &str,
    version: Option<VersionId>,
    format: &str,
) -> Result<String, ApiError> {
    let (id, record) = api.show::<R>(name, version)?;
    format_record(name, id, record, format)
}

fn create<R: ApplyArgs + Default>(
    api: &mut TrackerApi,
    name: &str,
    summary: &str,
    fields: &RecordArgs,
    uploads: &CreateUploads<'_>,
) -> Result<String, ApiError> {
    let mut draft = R::default();
    draft.apply_args(fields)?;
    let mut session: EditSession<R> = api.create_session(name, draft)?;

    let mut lines = Vec::new();
    if !uploads.files.is_empty() {
        lines.push(format_upload_report(&session.upload_files(uploads.files)?));
    }
    for folder in uploads.folders {
        lines.push(format_upload_report(&session.upload_folder(folder)?));
    }
    for folder in uploads.image_folders {
        lines.push(format_upload_report(&session.upload_image_folder(folder)?));
    }

    let outcome = api.commit(&mut session, summary)?;
    lines.push(format_commit_outcome(R::KIND, session.name(), outcome));
    Ok(join_nonempty(lines))
}

fn update<R: ApplyArgs>(
    api: &mut TrackerApi,
    name: &str,
    summary: &str,
    fields: &RecordArgs,
    edits: &UpdateEdits<'_>,
) -> Result<String, ApiError> {
    let mut session: EditSession<R> = api.open_session(name, edits.from_version)?;
    session.draft_mut()?.apply_args(fields)?;

    let mut lines = Vec::new();
    for item in edits.remove {
        session.remove_item(&split_item_path(item))?;
        lines.push(format!("  - {}", item));
    }
    for spec in edits.replace {
        let (item, local) = parse_replace(spec)?;
        let temp = session.open_for_edit(&split_item_path(item))?;
        fs::copy(local, &temp).map_err(|e| StorageError::io("copy", local, e))?;
    }
    if !edits.add_files.is_empty() {
        lines.push(format_upload_report(&session.upload_files(edits.add_files)?));
    }
    for folder in edits.add_folders {
        lines.push(format_upload_report(&session.upload_folder(folder)?));
    }

    let outcome = api.commit(&mut session, summary)?;
    lines.push(format_commit_outcome(R::KIND, name, outcome));
    Ok(join_nonempty(lines))
}

/// Split `docs/report.docx` into its name path.
fn split_item_path(raw: &str) -> Vec<&str> {
    raw.split('/').filter(|part| !part.is_empty()).collect()
}

/// Parse `ITEM_PATH=LOCAL_FILE`.
fn parse_replace(spec: &str) -> Result<(&str, &Path), ApiError> {
    match spec.split_once('=') {
        Some((item, local)) if !item.is_empty() && !local.is_empty() => Ok((item, Path::new(local))),
        _ => Err(StorageError::Validation(format!(
            "--replace expects ITEM_PATH=LOCAL_FILE, got '{}'",
            spec
        ))
        .into()),
    }
}

fn join_nonempty(lines: Vec<String>) -> String {
    lines
        .into_iter()
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
