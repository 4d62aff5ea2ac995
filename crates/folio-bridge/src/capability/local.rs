//! Local filesystem capability implementation.
//!
//! Rooted at a real directory; every handle derived from the root stays
//! inside it because child names are validated to be bare names. Tokens
//! are the root path, so capabilities survive restarts as long as the
//! directory still exists.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use async_trait::async_trait;

use super::{
    CapabilityProvider, ChildEntry, DirectoryHandle, EntryKind, FileHandle, FileMeta,
};
use crate::error::{BridgeError, BridgeResult};

/// Reject names that could escape the directory.
fn validate_name(name: &str) -> BridgeResult<()> {
    if name.is_empty() || name == "." || name == ".." || name.contains('/') || name.contains('\\') {
        return Err(BridgeError::InvalidOperation(format!(
            "invalid child name: {name:?}"
        )));
    }
    Ok(())
}

fn modified_unix(meta: &std::fs::Metadata) -> Option<u64> {
    meta.modified()
        .ok()
        .and_then(|t| t.duration_since(SystemTime::UNIX_EPOCH).ok())
        .map(|d| d.as_secs())
}

/// A directory capability backed by a real directory.
pub struct LocalDirectory {
    root: PathBuf,
}

impl LocalDirectory {
    /// Create a handle rooted at `root`. The path is not checked here;
    /// operations fail naturally if it is missing.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The real path this handle is rooted at.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl DirectoryHandle for LocalDirectory {
    async fn list(&self) -> BridgeResult<Vec<ChildEntry>> {
        let display = self.root.display().to_string();
        let mut reader = tokio::fs::read_dir(&self.root)
            .await
            .map_err(|e| BridgeError::from_read_io(e, &display))?;

        let mut entries = Vec::new();
        while let Some(entry) = reader
            .next_entry()
            .await
            .map_err(|e| BridgeError::from_read_io(e, &display))?
        {
            let file_type = match entry.file_type().await {
                Ok(t) => t,
                // Entry vanished between readdir and stat; skip it.
                Err(_) => continue,
            };
            let kind = if file_type.is_dir() {
                EntryKind::Directory
            } else if file_type.is_file() {
                EntryKind::File
            } else {
                // Symlinks and specials are outside the capability model.
                continue;
            };
            entries.push(ChildEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                kind,
            });
        }
        Ok(entries)
    }

    async fn child_dir(&self, name: &str) -> BridgeResult<Arc<dyn DirectoryHandle>> {
        validate_name(name)?;
        let path = self.root.join(name);
        let display = path.display().to_string();
        let meta = tokio::fs::metadata(&path)
            .await
            .map_err(|e| BridgeError::from_read_io(e, &display))?;
        if !meta.is_dir() {
            return Err(BridgeError::InvalidOperation(format!(
                "not a directory: {display}"
            )));
        }
        Ok(Arc::new(LocalDirectory::new(path)))
    }

    async fn ensure_dir(&self, name: &str) -> BridgeResult<Arc<dyn DirectoryHandle>> {
        validate_name(name)?;
        let path = self.root.join(name);
        let display = path.display().to_string();
        tokio::fs::create_dir_all(&path)
            .await
            .map_err(|e| BridgeError::from_write_io(e, &display))?;
        Ok(Arc::new(LocalDirectory::new(path)))
    }

    async fn child_file(&self, name: &str) -> BridgeResult<Arc<dyn FileHandle>> {
        validate_name(name)?;
        let path = self.root.join(name);
        let display = path.display().to_string();
        let meta = tokio::fs::metadata(&path)
            .await
            .map_err(|e| BridgeError::from_read_io(e, &display))?;
        if !meta.is_file() {
            return Err(BridgeError::InvalidOperation(format!(
                "is a directory: {display}"
            )));
        }
        Ok(Arc::new(LocalFile { path }))
    }

    async fn ensure_file(&self, name: &str) -> BridgeResult<Arc<dyn FileHandle>> {
        validate_name(name)?;
        let path = self.root.join(name);
        let display = path.display().to_string();
        match tokio::fs::metadata(&path).await {
            Ok(meta) if !meta.is_file() => {
                return Err(BridgeError::InvalidOperation(format!(
                    "is a directory: {display}"
                )));
            }
            Ok(_) => {}
            Err(_) => {
                tokio::fs::write(&path, b"")
                    .await
                    .map_err(|e| BridgeError::from_write_io(e, &display))?;
            }
        }
        Ok(Arc::new(LocalFile { path }))
    }

    fn persist_token(&self) -> Option<String> {
        Some(self.root.to_string_lossy().into_owned())
    }
}

/// A file capability backed by a real file.
pub struct LocalFile {
    path: PathBuf,
}

#[async_trait]
impl FileHandle for LocalFile {
    async fn read(&self) -> BridgeResult<Vec<u8>> {
        let display = self.path.display().to_string();
        tokio::fs::read(&self.path)
            .await
            .map_err(|e| BridgeError::from_read_io(e, &display))
    }

    async fn write(&self, data: &[u8]) -> BridgeResult<()> {
        let display = self.path.display().to_string();
        tokio::fs::write(&self.path, data)
            .await
            .map_err(|e| BridgeError::from_write_io(e, &display))
    }

    async fn metadata(&self) -> BridgeResult<FileMeta> {
        let display = self.path.display().to_string();
        let meta = tokio::fs::metadata(&self.path)
            .await
            .map_err(|e| BridgeError::from_read_io(e, &display))?;
        Ok(FileMeta {
            size: meta.len(),
            modified: modified_unix(&meta),
        })
    }
}

/// Provider whose tokens are directory paths.
#[derive(Clone, Default)]
pub struct LocalCapabilityProvider;

impl LocalCapabilityProvider {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CapabilityProvider for LocalCapabilityProvider {
    async fn persist(&self, handle: &Arc<dyn DirectoryHandle>) -> BridgeResult<String> {
        handle.persist_token().ok_or_else(|| {
            BridgeError::InvalidOperation("capability is not persistable".to_string())
        })
    }

    async fn restore(&self, token: &str) -> Option<Arc<dyn DirectoryHandle>> {
        // A token for a directory that was deleted or unmounted is a lost
        // capability, not an error.
        match tokio::fs::metadata(token).await {
            Ok(meta) if meta.is_dir() => Some(Arc::new(LocalDirectory::new(token))),
            _ => None,
        }
    }
}
