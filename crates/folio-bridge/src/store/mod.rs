//! Persistence traits for folder metadata and capability tokens.
//!
//! Two concerns, two traits: metadata is what the registry shows users
//! (names, timestamps), capability tokens are what rehydrates access.
//! They are persisted separately so a lost token degrades to a dropped
//! folder instead of corrupting the metadata list.

mod sqlite;

pub use sqlite::SqliteStore;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::BridgeResult;

/// A persisted record of a tracked folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderRecord {
    /// Stable unique id, assigned at add time.
    pub id: String,
    /// Display name shown in virtual paths. Not unique.
    pub display_name: String,
    /// When the folder was added.
    pub added_at: DateTime<Utc>,
}

/// Stores the folder list.
///
/// The whole list is written as one unit; the registry owns ordering.
pub trait MetadataStore: Send + Sync {
    /// Load all persisted records, oldest first.
    fn load_records(&self) -> BridgeResult<Vec<FolderRecord>>;

    /// Replace the persisted records with the given list.
    fn save_records(&self, records: &[FolderRecord]) -> BridgeResult<()>;
}

/// Stores capability tokens keyed by folder id.
pub trait CapabilityStore: Send + Sync {
    /// Store a token, replacing any previous one for the id.
    fn put_token(&self, folder_id: &str, token: &str) -> BridgeResult<()>;

    /// Fetch the token for a folder, if one was stored.
    fn get_token(&self, folder_id: &str) -> BridgeResult<Option<String>>;

    /// Remove the token for a folder. Absent ids are not an error.
    fn delete_token(&self, folder_id: &str) -> BridgeResult<()>;
}
