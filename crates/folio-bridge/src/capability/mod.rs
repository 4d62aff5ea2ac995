//! Capability traits for folder and file access.
//!
//! A capability is an opaque handle granted from outside the bridge (a
//! platform picker, a sandbox broker, a test fixture). The bridge never
//! sees real paths unless an implementation chooses to expose one through
//! [`DirectoryHandle::persist_token`]. All access flows through these
//! traits, so scope is enforced structurally: there is no way to name a
//! file outside a granted directory tree.

pub mod local;
pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::BridgeResult;

/// What an operation intends to do with a capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionIntent {
    Read,
    ReadWrite,
}

/// Reported permission state for an intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionState {
    Granted,
    Denied,
    /// The platform would prompt the user before granting.
    Prompt,
}

/// Type of directory child.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
}

/// A directory entry returned by `list`.
#[derive(Debug, Clone)]
pub struct ChildEntry {
    /// Name of the entry (not a path).
    pub name: String,
    /// Kind of entry.
    pub kind: EntryKind,
}

/// Metadata for a file capability.
#[derive(Debug, Clone, Copy)]
pub struct FileMeta {
    /// Size in bytes.
    pub size: u64,
    /// Last modification time as unix seconds, if available.
    pub modified: Option<u64>,
}

/// A granted directory capability.
///
/// Child lookups take bare names, never paths. Traversal happens one
/// level at a time, which is what keeps every reachable node inside the
/// granted tree.
#[async_trait]
pub trait DirectoryHandle: Send + Sync {
    /// List the direct children of this directory.
    async fn list(&self) -> BridgeResult<Vec<ChildEntry>>;

    /// Get an existing child directory by name.
    async fn child_dir(&self, name: &str) -> BridgeResult<Arc<dyn DirectoryHandle>>;

    /// Get a child directory by name, creating it if absent.
    async fn ensure_dir(&self, name: &str) -> BridgeResult<Arc<dyn DirectoryHandle>>;

    /// Get an existing child file by name.
    async fn child_file(&self, name: &str) -> BridgeResult<Arc<dyn FileHandle>>;

    /// Get a child file by name, creating an empty one if absent.
    async fn ensure_file(&self, name: &str) -> BridgeResult<Arc<dyn FileHandle>>;

    /// Query the current permission state for an intent.
    ///
    /// Returns `None` when the backing platform has no permission model,
    /// which callers treat as an implicit grant.
    async fn query_permission(&self, intent: PermissionIntent) -> Option<PermissionState> {
        let _ = intent;
        None
    }

    /// A token from which this capability can later be rehydrated.
    ///
    /// Returns `Some` for handles backed by something durable (like a real
    /// directory path), or `None` for purely ephemeral handles.
    fn persist_token(&self) -> Option<String> {
        None
    }
}

/// A granted file capability.
#[async_trait]
pub trait FileHandle: Send + Sync {
    /// Read the entire contents.
    async fn read(&self) -> BridgeResult<Vec<u8>>;

    /// Replace the entire contents.
    async fn write(&self, data: &[u8]) -> BridgeResult<()>;

    /// Get size and modification time.
    async fn metadata(&self) -> BridgeResult<FileMeta>;
}

/// Turns directory handles into durable tokens and back.
///
/// The registry persists tokens in the capability store; on startup it asks
/// the provider to rehydrate each one. A token that no longer resolves is a
/// lost capability, not an error.
#[async_trait]
pub trait CapabilityProvider: Send + Sync {
    /// Produce a durable token for a handle.
    async fn persist(&self, handle: &Arc<dyn DirectoryHandle>) -> BridgeResult<String>;

    /// Rehydrate a handle from a token, if it still resolves.
    async fn restore(&self, token: &str) -> Option<Arc<dyn DirectoryHandle>>;
}
