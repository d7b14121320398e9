//! CLI presentation: text and json formatters per command.

use crate::change::{CommitOutcome, UploadReport};
use crate::config::TrackerConfig;
use crate::error::ApiError;
use crate::metadata::{Entity, VersionRecord};
use crate::tree::node::{Item, Node};
use crate::types::{EntityKind, VersionId};
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;
use serde::Serialize;
use serde_json::Value;
use std::path::Path;

/// Fields rendered separately from the generic scalar listing
const STRUCTURED_FIELDS: &[&str] = &["uploaded_items", "tree_structure", "version_summary", "timestamp"];

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, ApiError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| ApiError::ConfigError(format!("Failed to render JSON: {}", e)))
}

/// Section heading with bold/underline.
pub fn format_section_heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}

pub fn format_init_summary(base_folder: &Path) -> String {
    let mut out = format!("Initialized {}\n", base_folder.display().bold());
    out.push_str("  metadata.json");
    for kind in EntityKind::ALL {
        out.push_str(&format!("\n  {}/", kind.files_dir_name()));
    }
    out
}

/// Table of entities with their latest version.
pub fn format_entity_list<R: VersionRecord>(
    entities: &[&Entity<R>],
    format: &str,
) -> Result<String, ApiError> {
    if format == "json" {
        let rows: Vec<Value> = entities
            .iter()
            .filter_map(|e| {
                e.latest().map(|(id, latest)| {
                    serde_json::json!({
                        "name": e.name,
                        "latest_version": id.get(),
                        "timestamp": latest.timestamp().to_string(),
                        "version_summary": latest.version_summary(),
                    })
                })
            })
            .collect();
        return to_json(&rows);
    }

    if entities.is_empty() {
        return Ok(format!("No {} entities.", R::KIND.label().to_lowercase()));
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Name", "Latest", "Updated", "Summary"]);
    for entity in entities {
        if let Some((id, latest)) = entity.latest() {
            table.add_row(vec![
                entity.name.clone(),
                id.to_string(),
                latest.timestamp().to_string(),
                latest.version_summary().to_string(),
            ]);
        }
    }
    Ok(format!(
        "{}\n{}",
        format_section_heading(R::KIND.document_key()),
        table
    ))
}

/// Table of versions, newest first.
pub fn format_history<R: VersionRecord>(name: &str, versions: &[(VersionId, &R)]) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Version", "Timestamp", "Files", "Summary"]);
    for (id, record) in versions {
        let files: usize = record.uploaded_items().iter().map(Item::file_count).sum();
        table.add_row(vec![
            id.to_string(),
            record.timestamp().to_string(),
            files.to_string(),
            record.version_summary().to_string(),
        ]);
    }
    format!(
        "{}\n{}",
        format_section_heading(&format!("{} '{}'", R::KIND, name)),
        table
    )
}

/// One version of an entity.
pub fn format_record<R: VersionRecord>(
    name: &str,
    version: VersionId,
    record: &R,
    format: &str,
) -> Result<String, ApiError> {
    if format == "json" {
        return to_json(&serde_json::json!({
            "kind": R::KIND.label(),
            "name": name,
            "version": version.get(),
            "record": record,
        }));
    }

    let mut out = format!(
        "{}\n",
        format_section_heading(&format!("{} '{}' v{}", R::KIND, name, version))
    );
    out.push_str(&format!(
        "  {} {}\n  {} {}\n",
        "timestamp:".dimmed(),
        record.timestamp(),
        "summary:".dimmed(),
        record.version_summary()
    ));

    let value = serde_json::to_value(record)
        .map_err(|e| ApiError::ConfigError(format!("Failed to render record: {}", e)))?;
    if let Value::Object(fields) = &value {
        for (key, field) in fields {
            if STRUCTURED_FIELDS.contains(&key.as_str()) {
                continue;
            }
            out.push_str(&format!("  {} {}\n", format!("{}:", key).dimmed(), scalar_text(field)));
        }
        if let Some(tree) = fields.get("tree_structure") {
            let nodes: Vec<Node> = serde_json::from_value(tree.clone()).unwrap_or_default();
            out.push_str(&format!("\n{}\n", format_section_heading("Tree structure")));
            out.push_str(&format_node_tree(&nodes));
        }
    }

    out.push_str(&format!("\n{}\n", format_section_heading("Uploaded items")));
    out.push_str(&format_item_tree(record.uploaded_items()));
    Ok(out.trim_end().to_string())
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(values) => values.iter().map(scalar_text).collect::<Vec<_>>().join(", "),
        other => other.to_string(),
    }
}

/// Indented listing of an item forest; folders end with `/`.
pub fn format_item_tree(items: &[Item]) -> String {
    fn walk(items: &[Item], depth: usize, out: &mut String) {
        for item in items {
            let indent = "  ".repeat(depth + 1);
            match item {
                Item::Folder(folder) => {
                    out.push_str(&format!("{}{}/\n", indent, folder.name.bold()));
                    walk(&folder.children, depth + 1, out);
                }
                Item::File(file) => {
                    out.push_str(&format!(
                        "{}{}  {}\n",
                        indent,
                        file.name,
                        file.path.display().dimmed()
                    ));
                }
            }
        }
    }
    if items.is_empty() {
        return "  (none)\n".to_string();
    }
    let mut out = String::new();
    walk(items, 0, &mut out);
    out
}

fn format_node_tree(nodes: &[Node]) -> String {
    fn walk(nodes: &[Node], depth: usize, out: &mut String) {
        for node in nodes {
            out.push_str(&format!("{}{}\n", "  ".repeat(depth + 1), node.name));
            walk(&node.children, depth + 1, out);
        }
    }
    if nodes.is_empty() {
        return "  (none)\n".to_string();
    }
    let mut out = String::new();
    walk(nodes, 0, &mut out);
    out
}

pub fn format_upload_report(report: &UploadReport) -> String {
    let mut lines = Vec::new();
    for name in &report.added {
        lines.push(format!("  {} {}", "+".green(), name));
    }
    for name in &report.skipped {
        lines.push(format!("  {} {} (already uploaded)", "=".yellow(), name));
    }
    lines.join("\n")
}

pub fn format_commit_outcome(kind: EntityKind, name: &str, outcome: CommitOutcome) -> String {
    match outcome {
        CommitOutcome::NoChange => format!("No changes to {} '{}'; nothing written.", kind, name),
        CommitOutcome::Written(id) => {
            format!("{} {} '{}' version {}", "Saved".green().bold(), kind, name, id)
        }
    }
}

pub fn format_config(config: &TrackerConfig) -> Result<String, ApiError> {
    toml::to_string_pretty(config)
        .map_err(|e| ApiError::ConfigError(format!("Failed to render config: {}", e)))
}
