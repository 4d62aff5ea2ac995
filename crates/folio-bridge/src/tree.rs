//! File tree construction.
//!
//! Two shapes of the same data: a full eager tree for small folders, and
//! one-level expansion for lazy UIs. Both apply the same sort so repeated
//! builds are stable regardless of what order a capability enumerates in.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::capability::{ChildEntry, DirectoryHandle, EntryKind};
use crate::error::BridgeResult;
use crate::registry::TrackedFolder;
use crate::resolver::PathResolver;
use crate::vpath;

/// A node in a file tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileTreeNode {
    pub name: String,
    /// Absolute virtual path.
    pub path: String,
    pub kind: EntryKind,
    /// `None` means unexpanded; `Some(vec![])` means known empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<FileTreeNode>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// Unix seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<u64>,
}

/// Directories before files, each group ascending by case-sensitive name.
fn sort_entries(entries: &mut [ChildEntry]) {
    entries.sort_by(|a, b| {
        let rank = |kind: EntryKind| match kind {
            EntryKind::Directory => 0,
            EntryKind::File => 1,
        };
        rank(a.kind).cmp(&rank(b.kind)).then_with(|| a.name.cmp(&b.name))
    });
}

/// Builds file trees over resolved directories.
pub struct TreeBuilder {
    resolver: Arc<PathResolver>,
}

impl TreeBuilder {
    pub fn new(resolver: Arc<PathResolver>) -> Self {
        Self { resolver }
    }

    /// Build the complete tree for a tracked folder.
    ///
    /// The root is synthetic: named after the folder, always a directory,
    /// always expanded.
    pub async fn build_full(&self, folder: &TrackedFolder) -> BridgeResult<FileTreeNode> {
        let path = vpath::from_segments(&[folder.display_name.as_str()]);
        build_dir(
            Arc::clone(&folder.handle),
            folder.display_name.clone(),
            path,
        )
        .await
    }

    /// Expand one directory level at a virtual path.
    ///
    /// Returned subdirectories are unexpanded (`children: None`); calling
    /// again for the same path yields the same result as long as the folder
    /// contents haven't changed.
    pub async fn expand_one_level(&self, path: &str) -> BridgeResult<Vec<FileTreeNode>> {
        let dir = self.resolver.resolve_dir(path).await?;
        let base = vpath::from_segments(&vpath::segments(path));

        let mut entries = dir.list().await?;
        sort_entries(&mut entries);

        let mut children = Vec::with_capacity(entries.len());
        for entry in entries {
            let child_path = vpath::join(&base, &entry.name);
            match entry.kind {
                EntryKind::Directory => children.push(FileTreeNode {
                    name: entry.name,
                    path: child_path,
                    kind: EntryKind::Directory,
                    children: None,
                    size: None,
                    modified: None,
                }),
                EntryKind::File => match file_node(&dir, &entry.name, child_path).await {
                    Some(node) => children.push(node),
                    None => continue,
                },
            }
        }
        Ok(children)
    }
}

/// Build a file node, skipping entries that vanished since enumeration.
async fn file_node(
    dir: &Arc<dyn DirectoryHandle>,
    name: &str,
    path: String,
) -> Option<FileTreeNode> {
    let file = match dir.child_file(name).await {
        Ok(file) => file,
        Err(e) => {
            debug!(path = %path, error = %e, "skipping vanished file");
            return None;
        }
    };
    let meta = match file.metadata().await {
        Ok(meta) => meta,
        Err(e) => {
            debug!(path = %path, error = %e, "skipping unreadable file metadata");
            return None;
        }
    };
    Some(FileTreeNode {
        name: name.to_string(),
        path,
        kind: EntryKind::File,
        children: None,
        size: Some(meta.size),
        modified: meta.modified,
    })
}

/// Recursively build an expanded directory node.
async fn build_dir(
    dir: Arc<dyn DirectoryHandle>,
    name: String,
    path: String,
) -> BridgeResult<FileTreeNode> {
    let mut entries = dir.list().await?;
    sort_entries(&mut entries);

    let mut children = Vec::with_capacity(entries.len());
    for entry in entries {
        let child_path = vpath::join(&path, &entry.name);
        match entry.kind {
            EntryKind::Directory => {
                let child = match dir.child_dir(&entry.name).await {
                    Ok(child) => child,
                    Err(e) => {
                        debug!(path = %child_path, error = %e, "skipping vanished directory");
                        continue;
                    }
                };
                // A subtree that fails mid-walk costs only itself; the
                // siblings collected so far are kept.
                match Box::pin(build_dir(child, entry.name, child_path.clone())).await {
                    Ok(node) => children.push(node),
                    Err(e) => {
                        debug!(path = %child_path, error = %e, "skipping unreadable subtree");
                    }
                }
            }
            EntryKind::File => {
                if let Some(node) = file_node(&dir, &entry.name, child_path).await {
                    children.push(node);
                }
            }
        }
    }

    Ok(FileTreeNode {
        name,
        path,
        kind: EntryKind::Directory,
        children: Some(children),
        size: None,
        modified: None,
    })
}
