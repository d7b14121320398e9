//! CLI domain: parse, route, output, and presentation only.
//! No domain orchestration; single route table dispatches to the tracker API.

mod output;
mod parse;
mod presentation;
mod route;

pub use output::{exit_code, map_error};
pub use parse::{Cli, Commands, ConfigCommands, ExperimentFilterArgs, RecordArgs};
pub use presentation::{
    format_commit_outcome, format_entity_list, format_history, format_item_tree,
    format_record, format_upload_report,
};
pub use route::{ApplyArgs, RunContext};
