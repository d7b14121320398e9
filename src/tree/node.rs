//! Uploaded-item and organization-node types

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A stored file: display name plus its absolute path in managed storage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileItem {
    pub name: String,
    pub path: PathBuf,
}

/// A folder of uploaded items
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FolderItem {
    pub name: String,
    pub children: Vec<Item>,
}

/// Uploaded-content tree element.
///
/// Serialized by shape: `{name, path}` is a file and `{name, children}` a
/// folder. An object carrying both keys matches neither variant and is
/// rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Item {
    File(FileItem),
    Folder(FolderItem),
}

impl Item {
    pub fn file(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Item::File(FileItem {
            name: name.into(),
            path: path.into(),
        })
    }

    pub fn folder(name: impl Into<String>, children: Vec<Item>) -> Self {
        Item::Folder(FolderItem {
            name: name.into(),
            children,
        })
    }

    pub fn name(&self) -> &str {
        match self {
            Item::File(f) => &f.name,
            Item::Folder(d) => &d.name,
        }
    }

    pub fn is_folder(&self) -> bool {
        matches!(self, Item::Folder(_))
    }

    /// Managed path for files, `None` for folders.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Item::File(f) => Some(&f.path),
            Item::Folder(_) => None,
        }
    }

    /// Number of files in this subtree.
    pub fn file_count(&self) -> usize {
        match self {
            Item::File(_) => 1,
            Item::Folder(d) => d.children.iter().map(Item::file_count).sum(),
        }
    }
}

/// Find an item by its name path from the forest roots.
pub fn find_item<'a, S: AsRef<str>>(items: &'a [Item], name_path: &[S]) -> Option<&'a Item> {
    let (first, rest) = name_path.split_first()?;
    let item = items.iter().find(|i| i.name() == first.as_ref())?;
    if rest.is_empty() {
        return Some(item);
    }
    match item {
        Item::Folder(d) => find_item(&d.children, rest),
        Item::File(_) => None,
    }
}

/// Mutable lookup of the child list addressed by a folder name path.
///
/// An empty path addresses the forest itself.
pub fn children_at_mut<'a, S: AsRef<str>>(
    items: &'a mut Vec<Item>,
    folder_path: &[S],
) -> Option<&'a mut Vec<Item>> {
    let Some((first, rest)) = folder_path.split_first() else {
        return Some(items);
    };
    let item = items.iter_mut().find(|i| i.name() == first.as_ref())?;
    match item {
        Item::Folder(d) => children_at_mut(&mut d.children, rest),
        Item::File(_) => None,
    }
}

/// Remove the item addressed by a name path, returning it.
pub fn remove_item<S: AsRef<str>>(items: &mut Vec<Item>, name_path: &[S]) -> Option<Item> {
    let (last, parent) = name_path.split_last()?;
    let siblings = children_at_mut(items, parent)?;
    let index = siblings.iter().position(|i| i.name() == last.as_ref())?;
    Some(siblings.remove(index))
}

/// Collect every file item in the forest, depth-first.
pub fn collect_files(items: &[Item]) -> Vec<&FileItem> {
    let mut out = Vec::new();
    for item in items {
        match item {
            Item::File(f) => out.push(f),
            Item::Folder(d) => out.extend(collect_files(&d.children)),
        }
    }
    out
}

/// Project organization tree element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Node {
    pub name: String,
    pub children: Vec<Node>,
}

impl Node {
    pub fn leaf(name: impl Into<String>) -> Self {
        Node {
            name: name.into(),
            children: Vec::new(),
        }
    }

    pub fn with_children(name: impl Into<String>, children: Vec<Node>) -> Self {
        Node {
            name: name.into(),
            children,
        }
    }

    /// Whether this node or any descendant carries `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.name == name || self.children.iter().any(|c| c.contains(name))
    }
}
