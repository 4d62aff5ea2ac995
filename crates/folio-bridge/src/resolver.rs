//! Virtual path resolution.
//!
//! The first segment of a virtual path selects a tracked folder by display
//! name; the remaining segments descend through directory capabilities one
//! level at a time. Resolution never touches anything outside a granted
//! tree because the only way down is `child_dir`/`child_file`.

use std::sync::Arc;

use crate::capability::{DirectoryHandle, FileHandle};
use crate::error::{BridgeError, BridgeResult};
use crate::registry::FolderRegistry;
use crate::vpath;

/// A resolved node, either kind.
pub enum ResolvedNode {
    Directory(Arc<dyn DirectoryHandle>),
    File(Arc<dyn FileHandle>),
}

impl std::fmt::Debug for ResolvedNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Directory(_) => f.write_str("Directory"),
            Self::File(_) => f.write_str("File"),
        }
    }
}

/// Resolves virtual paths against the registry.
pub struct PathResolver {
    registry: Arc<FolderRegistry>,
}

impl PathResolver {
    pub fn new(registry: Arc<FolderRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<FolderRegistry> {
        &self.registry
    }

    /// Resolve a path to whatever node it names.
    ///
    /// The last segment is tried as a directory first, then as a file.
    /// Callers that know the expected kind should use [`resolve_dir`] or
    /// [`resolve_file`] and skip the double attempt.
    ///
    /// [`resolve_dir`]: Self::resolve_dir
    /// [`resolve_file`]: Self::resolve_file
    pub async fn resolve(&self, path: &str) -> BridgeResult<ResolvedNode> {
        let parts = vpath::segments(path);
        let (dir, rest) = self.folder_root(&parts, path)?;

        let Some((last, mids)) = rest.split_last() else {
            return Ok(ResolvedNode::Directory(dir));
        };
        let dir = descend(dir, mids, path).await?;

        if let Ok(child) = dir.child_dir(last).await {
            return Ok(ResolvedNode::Directory(child));
        }
        match dir.child_file(last).await {
            Ok(file) => Ok(ResolvedNode::File(file)),
            Err(_) => Err(BridgeError::NotFound(path.to_string())),
        }
    }

    /// Resolve a path known to name a directory.
    pub async fn resolve_dir(&self, path: &str) -> BridgeResult<Arc<dyn DirectoryHandle>> {
        let parts = vpath::segments(path);
        let (dir, rest) = self.folder_root(&parts, path)?;
        descend(dir, rest, path).await
    }

    /// Resolve a path known to name a file.
    pub async fn resolve_file(&self, path: &str) -> BridgeResult<Arc<dyn FileHandle>> {
        let parts = vpath::segments(path);
        let (dir, rest) = self.folder_root(&parts, path)?;

        let Some((name, mids)) = rest.split_last() else {
            return Err(BridgeError::InvalidOperation(format!(
                "not a file: {path}"
            )));
        };
        let dir = descend(dir, mids, path).await?;
        dir.child_file(name).await.map_err(|e| at_path(e, path))
    }

    /// Resolve a file for writing, creating missing parents and the file
    /// itself. Returns the handle and whether the file already existed.
    pub async fn ensure_file(&self, path: &str) -> BridgeResult<(Arc<dyn FileHandle>, bool)> {
        let parts = vpath::segments(path);
        let (mut dir, rest) = self.folder_root(&parts, path)?;

        let Some((name, mids)) = rest.split_last() else {
            return Err(BridgeError::InvalidOperation(format!(
                "not a file: {path}"
            )));
        };
        for mid in mids {
            dir = dir.ensure_dir(mid).await.map_err(|e| at_path(e, path))?;
        }

        if let Ok(existing) = dir.child_file(name).await {
            return Ok((existing, true));
        }
        let file = dir.ensure_file(name).await.map_err(|e| at_path(e, path))?;
        Ok((file, false))
    }

    /// Select the folder root and return it with the remaining segments.
    fn folder_root<'a>(
        &self,
        parts: &'a [&'a str],
        path: &str,
    ) -> BridgeResult<(Arc<dyn DirectoryHandle>, &'a [&'a str])> {
        let Some((folder_name, rest)) = parts.split_first() else {
            return Err(BridgeError::NotFound(path.to_string()));
        };
        let folder = self
            .registry
            .find_by_name(folder_name)
            .ok_or_else(|| BridgeError::NotFound(path.to_string()))?;
        Ok((folder.handle, rest))
    }
}

/// Walk intermediate segments through `child_dir`.
///
/// A segment that exists but is not a directory is as unresolvable as a
/// missing one, so kind mismatches also come back as `NotFound`.
async fn descend(
    mut dir: Arc<dyn DirectoryHandle>,
    mids: &[&str],
    path: &str,
) -> BridgeResult<Arc<dyn DirectoryHandle>> {
    for mid in mids {
        dir = dir.child_dir(mid).await.map_err(|e| match e {
            BridgeError::NotFound(_) | BridgeError::InvalidOperation(_) => {
                BridgeError::NotFound(path.to_string())
            }
            other => other,
        })?;
    }
    Ok(dir)
}

/// Rewrite bare-name `NotFound` payloads to the full virtual path.
fn at_path(err: BridgeError, path: &str) -> BridgeError {
    match err {
        BridgeError::NotFound(_) => BridgeError::NotFound(path.to_string()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::memory::{MemoryCapabilityProvider, MemoryDirectory};
    use crate::store::SqliteStore;

    async fn resolver_with(folders: &[(&str, Arc<MemoryDirectory>)]) -> PathResolver {
        let store = Arc::new(SqliteStore::in_memory().expect("store"));
        let registry = Arc::new(FolderRegistry::new(
            store.clone(),
            store,
            Arc::new(MemoryCapabilityProvider::new()),
        ));
        for (name, root) in folders {
            registry
                .adopt(*name, Arc::clone(root) as Arc<dyn DirectoryHandle>)
                .await
                .expect("adopt");
        }
        PathResolver::new(registry)
    }

    fn sample_root() -> Arc<MemoryDirectory> {
        let root = MemoryDirectory::new();
        root.seed_file("readme.md", b"hello");
        root.seed_file("src/main.rs", b"fn main() {}");
        root.seed_file("src/lib/mod.rs", b"");
        root
    }

    #[tokio::test]
    async fn folder_root_resolves_as_directory() {
        let resolver = resolver_with(&[("proj", sample_root())]).await;

        match resolver.resolve("/proj").await.expect("resolve") {
            ResolvedNode::Directory(dir) => {
                assert!(dir.child_file("readme.md").await.is_ok());
            }
            ResolvedNode::File(_) => panic!("expected directory"),
        }
    }

    #[tokio::test]
    async fn last_segment_tries_directory_then_file() {
        let resolver = resolver_with(&[("proj", sample_root())]).await;

        assert!(matches!(
            resolver.resolve("/proj/src").await.expect("resolve"),
            ResolvedNode::Directory(_)
        ));
        assert!(matches!(
            resolver.resolve("/proj/readme.md").await.expect("resolve"),
            ResolvedNode::File(_)
        ));
        assert!(matches!(
            resolver.resolve("/proj/src/main.rs").await.expect("resolve"),
            ResolvedNode::File(_)
        ));
    }

    #[tokio::test]
    async fn missing_nodes_are_not_found() {
        let resolver = resolver_with(&[("proj", sample_root())]).await;

        assert_eq!(
            resolver.resolve("/proj/ghost.txt").await.unwrap_err(),
            BridgeError::NotFound("/proj/ghost.txt".to_string())
        );
        assert_eq!(
            resolver.resolve("/nope/readme.md").await.unwrap_err(),
            BridgeError::NotFound("/nope/readme.md".to_string())
        );
        assert_eq!(
            resolver.resolve("/proj/ghost/deep.txt").await.unwrap_err(),
            BridgeError::NotFound("/proj/ghost/deep.txt".to_string())
        );
    }

    #[tokio::test]
    async fn typed_resolution() {
        let resolver = resolver_with(&[("proj", sample_root())]).await;

        assert!(resolver.resolve_dir("/proj/src/lib").await.is_ok());
        assert!(resolver.resolve_file("/proj/src/main.rs").await.is_ok());

        // Wrong kind fails instead of falling back.
        assert!(resolver.resolve_file("/proj/src").await.is_err());
        assert!(resolver.resolve_dir("/proj/readme.md").await.is_err());
        assert!(matches!(
            resolver.resolve_file("/proj").await,
            Err(BridgeError::InvalidOperation(_))
        ));
    }

    #[tokio::test]
    async fn file_as_intermediate_segment_is_not_found() {
        let resolver = resolver_with(&[("proj", sample_root())]).await;

        assert_eq!(
            resolver.resolve("/proj/readme.md/child").await.unwrap_err(),
            BridgeError::NotFound("/proj/readme.md/child".to_string())
        );
        assert!(matches!(
            resolver.resolve_dir("/proj/readme.md/child").await,
            Err(BridgeError::NotFound(p)) if p == "/proj/readme.md/child"
        ));
        assert!(matches!(
            resolver.resolve_file("/proj/readme.md/child/deep.txt").await,
            Err(BridgeError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn ensure_file_creates_parents() {
        let root = MemoryDirectory::new();
        let resolver = resolver_with(&[("proj", Arc::clone(&root))]).await;

        let (file, existed) = resolver
            .ensure_file("/proj/deep/nested/new.txt")
            .await
            .expect("ensure");
        assert!(!existed);
        file.write(b"data").await.expect("write");

        let (again, existed) = resolver
            .ensure_file("/proj/deep/nested/new.txt")
            .await
            .expect("ensure");
        assert!(existed);
        assert_eq!(again.read().await.expect("read"), b"data");
    }

    #[tokio::test]
    async fn extra_slashes_are_harmless() {
        let resolver = resolver_with(&[("proj", sample_root())]).await;
        assert!(resolver.resolve_file("//proj//src//main.rs").await.is_ok());
    }

    #[tokio::test]
    async fn duplicate_names_resolve_to_first_folder() {
        let first = MemoryDirectory::new();
        first.seed_file("only-in-first.txt", b"1");
        let second = MemoryDirectory::new();
        second.seed_file("only-in-second.txt", b"2");

        let resolver =
            resolver_with(&[("docs", first), ("docs", second)]).await;

        assert!(resolver.resolve_file("/docs/only-in-first.txt").await.is_ok());
        assert!(resolver
            .resolve_file("/docs/only-in-second.txt")
            .await
            .is_err());
    }
}
