//! In-memory capability implementation.
//!
//! Used by tests and as ephemeral scratch space. The tree is thread-safe
//! and lost when the last handle drops. Handles can be given an explicit
//! permission state to exercise revocation paths.

use std::collections::{BTreeMap, HashMap};
use std::hash::{BuildHasher, Hasher};
use std::sync::{Arc, Mutex, RwLock};
use std::time::SystemTime;

use async_trait::async_trait;

use super::{
    CapabilityProvider, ChildEntry, DirectoryHandle, EntryKind, FileHandle, FileMeta,
    PermissionIntent, PermissionState,
};
use crate::error::{BridgeError, BridgeResult};

fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[derive(Clone)]
enum Node {
    Dir(Arc<MemoryDirectory>),
    File(Arc<MemoryFile>),
}

/// An in-memory directory capability.
///
/// Children are kept in a `BTreeMap` so enumeration order is stable, though
/// consumers sort anyway.
pub struct MemoryDirectory {
    children: RwLock<BTreeMap<String, Node>>,
    permission: RwLock<Option<PermissionState>>,
}

impl MemoryDirectory {
    /// Create a new empty directory tree root.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            children: RwLock::new(BTreeMap::new()),
            permission: RwLock::new(None),
        })
    }

    /// Set the permission state reported by `query_permission`.
    ///
    /// `None` restores the implicit-grant default.
    pub fn set_permission(&self, state: Option<PermissionState>) {
        #[allow(clippy::expect_used)]
        let mut guard = self.permission.write().expect("memory directory poisoned");
        *guard = state;
    }

    /// Create a file at a slash-separated path, creating parent directories.
    ///
    /// Test convenience; the trait surface only deals in single names.
    pub fn seed_file(self: &Arc<Self>, path: &str, data: &[u8]) {
        let parts: Vec<&str> = path.split('/').filter(|p| !p.is_empty()).collect();
        let Some((file_name, dirs)) = parts.split_last() else {
            return;
        };

        let mut dir = Arc::clone(self);
        for name in dirs {
            dir = dir.ensure_dir_sync(name);
        }
        let file = dir.ensure_file_sync(file_name);
        file.write_sync(data);
    }

    fn ensure_dir_sync(&self, name: &str) -> Arc<MemoryDirectory> {
        #[allow(clippy::expect_used)]
        let mut children = self.children.write().expect("memory directory poisoned");
        match children.get(name) {
            Some(Node::Dir(dir)) => Arc::clone(dir),
            _ => {
                let dir = MemoryDirectory::new();
                children.insert(name.to_string(), Node::Dir(Arc::clone(&dir)));
                dir
            }
        }
    }

    fn ensure_file_sync(&self, name: &str) -> Arc<MemoryFile> {
        #[allow(clippy::expect_used)]
        let mut children = self.children.write().expect("memory directory poisoned");
        match children.get(name) {
            Some(Node::File(file)) => Arc::clone(file),
            _ => {
                let file = Arc::new(MemoryFile::empty());
                children.insert(name.to_string(), Node::File(Arc::clone(&file)));
                file
            }
        }
    }
}

#[async_trait]
impl DirectoryHandle for MemoryDirectory {
    async fn list(&self) -> BridgeResult<Vec<ChildEntry>> {
        #[allow(clippy::expect_used)]
        let children = self.children.read().expect("memory directory poisoned");
        Ok(children
            .iter()
            .map(|(name, node)| ChildEntry {
                name: name.clone(),
                kind: match node {
                    Node::Dir(_) => EntryKind::Directory,
                    Node::File(_) => EntryKind::File,
                },
            })
            .collect())
    }

    async fn child_dir(&self, name: &str) -> BridgeResult<Arc<dyn DirectoryHandle>> {
        #[allow(clippy::expect_used)]
        let children = self.children.read().expect("memory directory poisoned");
        match children.get(name) {
            Some(Node::Dir(dir)) => Ok(Arc::clone(dir) as Arc<dyn DirectoryHandle>),
            Some(Node::File(_)) => Err(BridgeError::InvalidOperation(format!(
                "not a directory: {name}"
            ))),
            None => Err(BridgeError::NotFound(name.to_string())),
        }
    }

    async fn ensure_dir(&self, name: &str) -> BridgeResult<Arc<dyn DirectoryHandle>> {
        {
            #[allow(clippy::expect_used)]
            let children = self.children.read().expect("memory directory poisoned");
            if let Some(Node::File(_)) = children.get(name) {
                return Err(BridgeError::InvalidOperation(format!(
                    "not a directory: {name}"
                )));
            }
        }
        Ok(self.ensure_dir_sync(name) as Arc<dyn DirectoryHandle>)
    }

    async fn child_file(&self, name: &str) -> BridgeResult<Arc<dyn FileHandle>> {
        #[allow(clippy::expect_used)]
        let children = self.children.read().expect("memory directory poisoned");
        match children.get(name) {
            Some(Node::File(file)) => Ok(Arc::clone(file) as Arc<dyn FileHandle>),
            Some(Node::Dir(_)) => Err(BridgeError::InvalidOperation(format!(
                "is a directory: {name}"
            ))),
            None => Err(BridgeError::NotFound(name.to_string())),
        }
    }

    async fn ensure_file(&self, name: &str) -> BridgeResult<Arc<dyn FileHandle>> {
        {
            #[allow(clippy::expect_used)]
            let children = self.children.read().expect("memory directory poisoned");
            if let Some(Node::Dir(_)) = children.get(name) {
                return Err(BridgeError::InvalidOperation(format!(
                    "is a directory: {name}"
                )));
            }
        }
        Ok(self.ensure_file_sync(name) as Arc<dyn FileHandle>)
    }

    async fn query_permission(&self, intent: PermissionIntent) -> Option<PermissionState> {
        let _ = intent;
        #[allow(clippy::expect_used)]
        let guard = self.permission.read().expect("memory directory poisoned");
        *guard
    }
}

/// An in-memory file capability.
pub struct MemoryFile {
    data: RwLock<Vec<u8>>,
    modified: RwLock<u64>,
}

impl MemoryFile {
    fn empty() -> Self {
        Self {
            data: RwLock::new(Vec::new()),
            modified: RwLock::new(now_unix()),
        }
    }

    fn write_sync(&self, data: &[u8]) {
        #[allow(clippy::expect_used)]
        let mut guard = self.data.write().expect("memory file poisoned");
        *guard = data.to_vec();
        #[allow(clippy::expect_used)]
        let mut modified = self.modified.write().expect("memory file poisoned");
        *modified = now_unix();
    }
}

#[async_trait]
impl FileHandle for MemoryFile {
    async fn read(&self) -> BridgeResult<Vec<u8>> {
        #[allow(clippy::expect_used)]
        let guard = self.data.read().expect("memory file poisoned");
        Ok(guard.clone())
    }

    async fn write(&self, data: &[u8]) -> BridgeResult<()> {
        self.write_sync(data);
        Ok(())
    }

    async fn metadata(&self) -> BridgeResult<FileMeta> {
        #[allow(clippy::expect_used)]
        let data = self.data.read().expect("memory file poisoned");
        #[allow(clippy::expect_used)]
        let modified = self.modified.read().expect("memory file poisoned");
        Ok(FileMeta {
            size: data.len() as u64,
            modified: Some(*modified),
        })
    }
}

/// Capability provider that keeps handles alive behind generated tokens.
///
/// Tokens only resolve within the provider instance that issued them, which
/// matches the ephemeral nature of the in-memory tree.
#[derive(Clone, Default)]
pub struct MemoryCapabilityProvider {
    handles: Arc<Mutex<HashMap<String, Arc<dyn DirectoryHandle>>>>,
}

impl MemoryCapabilityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop a token so later restores fail, simulating a lost capability.
    pub fn forget(&self, token: &str) {
        #[allow(clippy::expect_used)]
        let mut handles = self.handles.lock().expect("capability provider poisoned");
        handles.remove(token);
    }
}

#[async_trait]
impl CapabilityProvider for MemoryCapabilityProvider {
    async fn persist(&self, handle: &Arc<dyn DirectoryHandle>) -> BridgeResult<String> {
        let token = generate_token();
        #[allow(clippy::expect_used)]
        let mut handles = self.handles.lock().expect("capability provider poisoned");
        handles.insert(token.clone(), Arc::clone(handle));
        Ok(token)
    }

    async fn restore(&self, token: &str) -> Option<Arc<dyn DirectoryHandle>> {
        #[allow(clippy::expect_used)]
        let handles = self.handles.lock().expect("capability provider poisoned");
        handles.get(token).cloned()
    }
}

/// Generate an opaque token using RandomState + SystemTime.
fn generate_token() -> String {
    let hasher_state = std::collections::hash_map::RandomState::new();
    let mut hasher = hasher_state.build_hasher();

    let now = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default();
    hasher.write_u128(now.as_nanos());

    format!("mem-{:016x}", hasher.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn seed_and_list() {
        let root = MemoryDirectory::new();
        root.seed_file("src/main.rs", b"fn main() {}");
        root.seed_file("README.md", b"# hi");

        let entries = root.list().await.unwrap();
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["README.md", "src"]);

        let src = root.child_dir("src").await.unwrap();
        let entries = src.list().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "main.rs");
        assert_eq!(entries[0].kind, EntryKind::File);
    }

    #[tokio::test]
    async fn read_write_round_trip() {
        let root = MemoryDirectory::new();
        let file = root.ensure_file("notes.txt").await.unwrap();
        file.write(b"hello").await.unwrap();
        assert_eq!(file.read().await.unwrap(), b"hello");

        let meta = file.metadata().await.unwrap();
        assert_eq!(meta.size, 5);
        assert!(meta.modified.is_some());
    }

    #[tokio::test]
    async fn missing_children_not_found() {
        let root = MemoryDirectory::new();
        assert!(matches!(
            root.child_dir("nope").await,
            Err(BridgeError::NotFound(_))
        ));
        assert!(matches!(
            root.child_file("nope").await,
            Err(BridgeError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn kind_mismatch_is_invalid_operation() {
        let root = MemoryDirectory::new();
        root.seed_file("file.txt", b"x");
        root.seed_file("dir/inner.txt", b"x");

        assert!(matches!(
            root.child_dir("file.txt").await,
            Err(BridgeError::InvalidOperation(_))
        ));
        assert!(matches!(
            root.child_file("dir").await,
            Err(BridgeError::InvalidOperation(_))
        ));
        assert!(matches!(
            root.ensure_dir("file.txt").await,
            Err(BridgeError::InvalidOperation(_))
        ));
        assert!(matches!(
            root.ensure_file("dir").await,
            Err(BridgeError::InvalidOperation(_))
        ));
    }

    #[tokio::test]
    async fn ensure_is_idempotent() {
        let root = MemoryDirectory::new();
        let a = root.ensure_dir("sub").await.unwrap();
        a.ensure_file("f.txt").await.unwrap();

        // Second ensure returns the same directory, not a fresh one.
        let b = root.ensure_dir("sub").await.unwrap();
        assert!(b.child_file("f.txt").await.is_ok());
    }

    #[tokio::test]
    async fn permission_override() {
        let root = MemoryDirectory::new();
        assert_eq!(root.query_permission(PermissionIntent::Read).await, None);

        root.set_permission(Some(PermissionState::Denied));
        assert_eq!(
            root.query_permission(PermissionIntent::ReadWrite).await,
            Some(PermissionState::Denied)
        );
    }

    #[tokio::test]
    async fn provider_round_trip() {
        let provider = MemoryCapabilityProvider::new();
        let root = MemoryDirectory::new();
        root.seed_file("a.txt", b"a");

        let handle: Arc<dyn DirectoryHandle> = root;
        let token = provider.persist(&handle).await.unwrap();

        let restored = provider.restore(&token).await.unwrap();
        assert!(restored.child_file("a.txt").await.is_ok());

        provider.forget(&token);
        assert!(provider.restore(&token).await.is_none());
    }
}
