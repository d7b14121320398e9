//! File-name and path helpers for managed storage

use crate::error::StorageError;
use crate::tree::hasher::{compute_content_hash, digest_hex};
use chrono::NaiveDateTime;
use std::path::{Path, PathBuf};

/// Format of the suffix appended to the stem of an edited file
pub const EDIT_SUFFIX_FORMAT: &str = "%Y%m%d%H%M%S";

/// Hex digits of the name digest appended by `entity_storage_name`
const STORAGE_DIGEST_LEN: usize = 16;

/// Image extensions recognized by image-only folder uploads
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "tiff", "webp"];

/// Canonicalize a user-supplied folder for consistent storage paths
pub fn canonicalize_path(path: &Path) -> Result<PathBuf, StorageError> {
    dunce::canonicalize(path)
        .map_err(|e| StorageError::InvalidPath(format!("Failed to canonicalize {:?}: {}", path, e)))
}

/// Split a file name into stem and extension (extension includes the dot).
///
/// A leading dot does not start an extension, so ".env" has no extension.
fn split_extension(file_name: &str) -> (&str, &str) {
    match file_name.rfind('.') {
        Some(0) | None => (file_name, ""),
        Some(idx) => file_name.split_at(idx),
    }
}

/// Strip a trailing numeric timestamp token from a file name.
///
/// `report_20240101120000.docx` becomes `report.docx`. Names whose last
/// `_`-separated stem token is not all digits are returned unchanged.
pub fn strip_timestamp(file_name: &str) -> String {
    let (stem, ext) = split_extension(file_name);
    match stem.rsplit_once('_') {
        Some((base, last)) if !last.is_empty() && last.bytes().all(|b| b.is_ascii_digit()) => {
            format!("{}{}", base, ext)
        }
        _ => file_name.to_string(),
    }
}

/// Name for a new revision of an edited file: stripped stem, `_`, timestamp, extension.
pub fn timestamped_name(file_name: &str, at: NaiveDateTime) -> String {
    let stripped = strip_timestamp(file_name);
    let (stem, ext) = split_extension(&stripped);
    format!("{}_{}{}", stem, at.format(EDIT_SUFFIX_FORMAT), ext)
}

/// Replace anything but ASCII alphanumerics, `_` and `-` with `_`.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// On-disk name for an entity: the name itself when it is already a safe
/// file name, otherwise the sanitized name plus `~` and a digest of the raw
/// name. Distinct entity names never share a directory or backup file.
pub fn entity_storage_name(name: &str) -> String {
    let sanitized = sanitize_filename(name);
    if sanitized == name {
        return sanitized;
    }
    let digest = digest_hex(&compute_content_hash(name.as_bytes()));
    format!("{}~{}", sanitized, &digest[..STORAGE_DIGEST_LEN])
}

/// Whether a file name carries an image extension (case-insensitive).
pub fn is_image_file(file_name: &str) -> bool {
    let (_, ext) = split_extension(file_name);
    let ext = ext.trim_start_matches('.').to_ascii_lowercase();
    IMAGE_EXTENSIONS.contains(&ext.as_str())
}

/// Final path component as an owned string.
pub fn file_name_of(path: &Path) -> Result<String, StorageError> {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| StorageError::InvalidPath(format!("{:?} has no file name", path)))
}
