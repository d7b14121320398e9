//! Folder scanner: copies a source directory into managed storage

use crate::error::StorageError;
use crate::tree::node::Item;
use crate::tree::path::{file_name_of, is_image_file};
use std::fs;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, instrument, trace};
use walkdir::WalkDir;

/// Which files a scan copies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EntryFilter {
    /// Copy every file
    #[default]
    All,
    /// Copy only files with an image extension; directories are still visited
    ImagesOnly,
}

/// Scanner configuration
#[derive(Debug, Clone, Default)]
pub struct ScannerConfig {
    pub filter: EntryFilter,
    /// Whether to follow symbolic links (default: false)
    pub follow_symlinks: bool,
}

/// Recursive folder copier.
///
/// Children are reported in directory-listing order, which is platform
/// dependent. A failed copy or directory creation aborts the scan; files
/// already copied stay on disk.
pub struct FolderScanner {
    config: ScannerConfig,
}

impl Default for FolderScanner {
    fn default() -> Self {
        Self::new(ScannerConfig::default())
    }
}

impl FolderScanner {
    pub fn new(config: ScannerConfig) -> Self {
        Self { config }
    }

    pub fn images_only() -> Self {
        Self::new(ScannerConfig {
            filter: EntryFilter::ImagesOnly,
            ..ScannerConfig::default()
        })
    }

    /// Copy `source_dir` into `dest_dir` and describe it as a folder item
    /// named after `source_dir`.
    #[instrument(skip(self), fields(source = %source_dir.display(), dest = %dest_dir.display()))]
    pub fn scan(&self, source_dir: &Path, dest_dir: &Path) -> Result<Item, StorageError> {
        let start = Instant::now();
        let name = file_name_of(source_dir)?;
        let children = self.scan_children(source_dir, dest_dir)?;
        let item = Item::folder(name, children);
        info!(
            files = item.file_count(),
            duration_ms = start.elapsed().as_millis(),
            "Folder scan completed"
        );
        Ok(item)
    }

    /// Copy the contents of `source_dir` into `dest_dir`, returning the child items.
    pub fn scan_children(
        &self,
        source_dir: &Path,
        dest_dir: &Path,
    ) -> Result<Vec<Item>, StorageError> {
        fs::create_dir_all(dest_dir).map_err(|e| StorageError::io("create directory", dest_dir, e))?;

        let listing = WalkDir::new(source_dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(self.config.follow_symlinks);

        let mut children = Vec::new();
        for entry in listing {
            let entry = entry.map_err(|e| {
                StorageError::IoError(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    format!("Failed to list directory {:?}: {}", source_dir, e),
                ))
            })?;

            let entry_name = entry.file_name().to_string_lossy().into_owned();
            let dest_path = dest_dir.join(&entry_name);

            if entry.file_type().is_dir() {
                let grandchildren = self.scan_children(entry.path(), &dest_path)?;
                children.push(Item::folder(entry_name, grandchildren));
            } else {
                if self.config.filter == EntryFilter::ImagesOnly && !is_image_file(&entry_name) {
                    trace!(file = %entry_name, "Skipping non-image file");
                    continue;
                }
                fs::copy(entry.path(), &dest_path)
                    .map_err(|e| StorageError::io("copy", entry.path(), e))?;
                debug!(file = %entry_name, "Copied file into managed storage");
                children.push(Item::file(entry_name, dest_path));
            }
        }

        Ok(children)
    }
}
