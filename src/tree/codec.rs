//! Tree codec: stored `Node`/`Item` forests to and from an editable display tree
//!
//! Front ends hold a `DisplayTree` while the user edits a project's
//! organization chart or an upload hierarchy, then encode it back into the
//! serializable shape. Sibling names are never deduplicated or validated.

use crate::tree::node::{Item, Node};
use std::path::PathBuf;

/// Handle to an entry in a `DisplayTree`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryId(usize);

#[derive(Debug, Clone)]
struct Entry {
    name: String,
    path: Option<PathBuf>,
    parent: Option<EntryId>,
    children: Vec<EntryId>,
    removed: bool,
}

/// Arena-backed editable tree.
///
/// Removed entries stay in the arena as tombstones so existing handles never
/// point at a different entry.
#[derive(Debug, Clone, Default)]
pub struct DisplayTree {
    entries: Vec<Entry>,
    roots: Vec<EntryId>,
}

impl DisplayTree {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, name: String, path: Option<PathBuf>, parent: Option<EntryId>) -> EntryId {
        let id = EntryId(self.entries.len());
        self.entries.push(Entry {
            name,
            path,
            parent,
            children: Vec::new(),
            removed: false,
        });
        id
    }

    fn live(&self, id: EntryId) -> Option<&Entry> {
        self.entries.get(id.0).filter(|e| !e.removed)
    }

    pub fn add_root(&mut self, name: impl Into<String>) -> EntryId {
        let id = self.push(name.into(), None, None);
        self.roots.push(id);
        id
    }

    /// Add a child under `parent`. Returns `None` if `parent` is gone.
    pub fn add_child(&mut self, parent: EntryId, name: impl Into<String>) -> Option<EntryId> {
        self.live(parent)?;
        let id = self.push(name.into(), None, Some(parent));
        self.entries[parent.0].children.push(id);
        Some(id)
    }

    /// Attach a file path payload; entries with a path encode as files.
    pub fn set_path(&mut self, id: EntryId, path: Option<PathBuf>) -> bool {
        match self.entries.get_mut(id.0).filter(|e| !e.removed) {
            Some(entry) => {
                entry.path = path;
                true
            }
            None => false,
        }
    }

    pub fn rename(&mut self, id: EntryId, name: impl Into<String>) -> bool {
        match self.entries.get_mut(id.0).filter(|e| !e.removed) {
            Some(entry) => {
                entry.name = name.into();
                true
            }
            None => false,
        }
    }

    /// Remove an entry and its whole subtree.
    pub fn remove(&mut self, id: EntryId) -> bool {
        let Some(parent) = self.live(id).map(|e| e.parent) else {
            return false;
        };
        match parent {
            Some(parent) => self.entries[parent.0].children.retain(|c| *c != id),
            None => self.roots.retain(|r| *r != id),
        }
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let entry = &mut self.entries[current.0];
            entry.removed = true;
            stack.extend(entry.children.iter().copied());
        }
        true
    }

    pub fn roots(&self) -> &[EntryId] {
        &self.roots
    }

    pub fn children(&self, id: EntryId) -> &[EntryId] {
        self.live(id).map(|e| e.children.as_slice()).unwrap_or(&[])
    }

    pub fn name(&self, id: EntryId) -> Option<&str> {
        self.live(id).map(|e| e.name.as_str())
    }

    pub fn path(&self, id: EntryId) -> Option<&PathBuf> {
        self.live(id).and_then(|e| e.path.as_ref())
    }

    pub fn parent(&self, id: EntryId) -> Option<EntryId> {
        self.live(id).and_then(|e| e.parent)
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.entries.iter().filter(|e| !e.removed).count()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// First entry named `name`, depth-first in display order.
    pub fn find_by_name(&self, name: &str) -> Option<EntryId> {
        let mut stack: Vec<EntryId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            let entry = &self.entries[id.0];
            if entry.name == name {
                return Some(id);
            }
            stack.extend(entry.children.iter().rev().copied());
        }
        None
    }

    /// Names from the root down to `id`.
    pub fn path_of(&self, id: EntryId) -> Vec<String> {
        let mut names = Vec::new();
        let mut current = self.live(id).map(|_| id);
        while let Some(cur) = current {
            let entry = &self.entries[cur.0];
            names.push(entry.name.clone());
            current = entry.parent;
        }
        names.reverse();
        names
    }
}

/// Rebuild the stored organization forest from a display tree.
pub fn encode_nodes(tree: &DisplayTree) -> Vec<Node> {
    fn encode(tree: &DisplayTree, id: EntryId) -> Node {
        let entry = &tree.entries[id.0];
        Node {
            name: entry.name.clone(),
            children: entry.children.iter().map(|c| encode(tree, *c)).collect(),
        }
    }
    tree.roots.iter().map(|r| encode(tree, *r)).collect()
}

/// Hydrate a display tree from a stored organization forest.
pub fn decode_nodes(nodes: &[Node]) -> DisplayTree {
    fn decode(tree: &mut DisplayTree, parent: EntryId, node: &Node) {
        if let Some(id) = tree.add_child(parent, node.name.clone()) {
            for child in &node.children {
                decode(tree, id, child);
            }
        }
    }
    let mut tree = DisplayTree::new();
    for node in nodes {
        let root = tree.add_root(node.name.clone());
        for child in &node.children {
            decode(&mut tree, root, child);
        }
    }
    tree
}

/// Rebuild an item forest from a display tree.
///
/// Entries with a path payload become files; all others become folders,
/// including empty ones.
pub fn encode_items(tree: &DisplayTree) -> Vec<Item> {
    fn encode(tree: &DisplayTree, id: EntryId) -> Item {
        let entry = &tree.entries[id.0];
        match &entry.path {
            Some(path) => Item::file(entry.name.clone(), path.clone()),
            None => Item::folder(
                entry.name.clone(),
                entry.children.iter().map(|c| encode(tree, *c)).collect(),
            ),
        }
    }
    tree.roots.iter().map(|r| encode(tree, *r)).collect()
}

/// Hydrate a display tree from an item forest.
pub fn decode_items(items: &[Item]) -> DisplayTree {
    fn attach(tree: &mut DisplayTree, id: EntryId, item: &Item) {
        match item {
            Item::File(f) => {
                tree.set_path(id, Some(f.path.clone()));
            }
            Item::Folder(d) => {
                for child in &d.children {
                    if let Some(child_id) = tree.add_child(id, child.name()) {
                        attach(tree, child_id, child);
                    }
                }
            }
        }
    }
    let mut tree = DisplayTree::new();
    for item in items {
        let root = tree.add_root(item.name());
        attach(&mut tree, root, item);
    }
    tree
}

/// Build an organization forest from `/`-separated relative paths.
///
/// Shared prefixes merge into one node; order follows first appearance.
pub fn nodes_from_paths<S: AsRef<str>>(paths: &[S]) -> Vec<Node> {
    fn insert(level: &mut Vec<Node>, parts: &[&str]) {
        let Some((first, rest)) = parts.split_first() else {
            return;
        };
        let index = match level.iter().position(|n| n.name == *first) {
            Some(i) => i,
            None => {
                level.push(Node::leaf(*first));
                level.len() - 1
            }
        };
        insert(&mut level[index].children, rest);
    }

    let mut forest = Vec::new();
    for path in paths {
        let parts: Vec<&str> = path
            .as_ref()
            .split(['/', '\\'])
            .filter(|p| !p.is_empty())
            .collect();
        insert(&mut forest, &parts);
    }
    forest
}
