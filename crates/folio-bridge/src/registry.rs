//! Tracked folder registry.
//!
//! The registry owns the list of folders the user has granted, pairing
//! persisted metadata with live capability handles. Capability acquisition
//! is delegated to a [`FolderPicker`] so the bridge never initiates
//! platform UI itself.

use std::hash::{BuildHasher, Hasher};
use std::sync::{Arc, RwLock};
use std::time::SystemTime;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::capability::{CapabilityProvider, DirectoryHandle, PermissionIntent, PermissionState};
use crate::error::{BridgeError, BridgeResult};
use crate::store::{CapabilityStore, FolderRecord, MetadataStore};

/// A granted folder with its live capability handle.
#[derive(Clone)]
pub struct TrackedFolder {
    pub id: String,
    pub display_name: String,
    pub added_at: DateTime<Utc>,
    pub handle: Arc<dyn DirectoryHandle>,
}

impl TrackedFolder {
    fn record(&self) -> FolderRecord {
        FolderRecord {
            id: self.id.clone(),
            display_name: self.display_name.clone(),
            added_at: self.added_at,
        }
    }
}

/// Result of a folder picker interaction.
pub struct PickedFolder {
    pub display_name: String,
    pub handle: Arc<dyn DirectoryHandle>,
}

/// Acquires new folder capabilities, typically through platform UI.
///
/// User cancellation is reported as [`BridgeError::AbortedByUser`].
#[async_trait]
pub trait FolderPicker: Send + Sync {
    async fn pick(&self) -> BridgeResult<PickedFolder>;
}

/// Outcome of an add request.
pub enum AddOutcome {
    Added(TrackedFolder),
    /// The user dismissed the picker. Not a failure.
    Cancelled,
}

/// Registry of tracked folders.
///
/// Shared via `Arc`; the folder list sits behind an internal `RwLock` so
/// reads (resolution, search) never block each other.
pub struct FolderRegistry {
    metadata: Arc<dyn MetadataStore>,
    capabilities: Arc<dyn CapabilityStore>,
    provider: Arc<dyn CapabilityProvider>,
    folders: RwLock<Vec<TrackedFolder>>,
}

impl FolderRegistry {
    pub fn new(
        metadata: Arc<dyn MetadataStore>,
        capabilities: Arc<dyn CapabilityStore>,
        provider: Arc<dyn CapabilityProvider>,
    ) -> Self {
        Self {
            metadata,
            capabilities,
            provider,
            folders: RwLock::new(Vec::new()),
        }
    }

    /// Rehydrate tracked folders from the stores.
    ///
    /// Records whose token is missing, whose capability no longer restores,
    /// or whose permission is reported revoked are dropped from the
    /// in-memory list. Their persisted records are left untouched, so a
    /// capability that comes back (a re-mounted drive) reappears on the
    /// next load.
    pub async fn load(&self) -> BridgeResult<()> {
        let records = self.metadata.load_records()?;
        let mut loaded = Vec::with_capacity(records.len());

        for record in records {
            let Some(token) = self.capabilities.get_token(&record.id)? else {
                debug!(id = %record.id, name = %record.display_name, "no capability token, dropping");
                continue;
            };

            let Some(handle) = self.provider.restore(&token).await else {
                debug!(id = %record.id, name = %record.display_name, "capability did not restore, dropping");
                continue;
            };

            match handle.query_permission(PermissionIntent::ReadWrite).await {
                Some(PermissionState::Granted) | None => {}
                Some(_) => {
                    debug!(id = %record.id, name = %record.display_name, "permission revoked, dropping");
                    continue;
                }
            }

            loaded.push(TrackedFolder {
                id: record.id,
                display_name: record.display_name,
                added_at: record.added_at,
                handle,
            });
        }

        info!(count = loaded.len(), "loaded tracked folders");

        #[allow(clippy::expect_used)]
        let mut folders = self.folders.write().expect("registry poisoned");
        *folders = loaded;
        Ok(())
    }

    /// Add a folder through the picker.
    ///
    /// Cancellation comes back as [`AddOutcome::Cancelled`]; any other
    /// picker failure propagates.
    pub async fn add(&self, picker: &dyn FolderPicker) -> BridgeResult<AddOutcome> {
        let picked = match picker.pick().await {
            Ok(picked) => picked,
            Err(BridgeError::AbortedByUser) => return Ok(AddOutcome::Cancelled),
            Err(e) => return Err(e),
        };

        let folder = self.adopt(picked.display_name, picked.handle).await?;
        Ok(AddOutcome::Added(folder))
    }

    /// Track an already granted handle directly, bypassing any picker.
    ///
    /// Used by embedders that acquire capabilities out of band, and by
    /// `add` once the picker has produced a grant.
    pub async fn adopt(
        &self,
        display_name: impl Into<String>,
        handle: Arc<dyn DirectoryHandle>,
    ) -> BridgeResult<TrackedFolder> {
        let id = generate_folder_id();
        let token = self.provider.persist(&handle).await?;
        self.capabilities.put_token(&id, &token)?;

        let folder = TrackedFolder {
            id: id.clone(),
            display_name: display_name.into(),
            added_at: Utc::now(),
            handle,
        };

        // Token first, then metadata, then memory: a crash between the two
        // leaves an orphan token, which load() tolerates.
        {
            #[allow(clippy::expect_used)]
            let mut folders = self.folders.write().expect("registry poisoned");
            let mut records: Vec<FolderRecord> = folders.iter().map(|f| f.record()).collect();
            records.push(folder.record());
            self.metadata.save_records(&records)?;
            folders.push(folder.clone());
        }

        info!(id = %id, name = %folder.display_name, "added folder");
        Ok(folder)
    }

    /// Remove a tracked folder. Unknown ids are a no-op.
    pub fn remove(&self, id: &str) -> BridgeResult<()> {
        // Token removal is best-effort; a stale token is harmless.
        if let Err(e) = self.capabilities.delete_token(id) {
            debug!(id = %id, error = %e, "capability token delete failed");
        }

        #[allow(clippy::expect_used)]
        let mut folders = self.folders.write().expect("registry poisoned");
        let before = folders.len();
        folders.retain(|f| f.id != id);
        if folders.len() != before {
            let records: Vec<FolderRecord> = folders.iter().map(|f| f.record()).collect();
            self.metadata.save_records(&records)?;
            info!(id = %id, "removed folder");
        }
        Ok(())
    }

    /// Snapshot of the tracked folders, in registration order.
    pub fn list(&self) -> Vec<TrackedFolder> {
        #[allow(clippy::expect_used)]
        let folders = self.folders.read().expect("registry poisoned");
        folders.clone()
    }

    /// First folder with the given display name, in registration order.
    ///
    /// Display names are not unique; first-match keeps name resolution
    /// deterministic.
    pub fn find_by_name(&self, name: &str) -> Option<TrackedFolder> {
        #[allow(clippy::expect_used)]
        let folders = self.folders.read().expect("registry poisoned");
        folders.iter().find(|f| f.display_name == name).cloned()
    }

    /// Folder with the given id.
    pub fn find_by_id(&self, id: &str) -> Option<TrackedFolder> {
        #[allow(clippy::expect_used)]
        let folders = self.folders.read().expect("registry poisoned");
        folders.iter().find(|f| f.id == id).cloned()
    }
}

/// Generate a folder id: add time in millis plus a random hex suffix.
fn generate_folder_id() -> String {
    let now = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default();

    let hasher_state = std::collections::hash_map::RandomState::new();
    let mut hasher = hasher_state.build_hasher();
    hasher.write_u128(now.as_nanos());

    format!("{}-{:08x}", now.as_millis(), hasher.finish() as u32)
}
