//! SQLite-backed store implementation.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection, OpenFlags};

use super::{CapabilityStore, FolderRecord, MetadataStore};
use crate::error::{BridgeError, BridgeResult};

/// Schema SQL embedded from schema/store.sql.
const SCHEMA_SQL: &str = include_str!("../../../../schema/store.sql");

/// Meta key under which the folder list is stored as a JSON array.
const TRACKED_FOLDERS_KEY: &str = "tracked_folders";

/// SQLite store implementing both [`MetadataStore`] and [`CapabilityStore`].
///
/// `Connection` is not `Sync`, so it sits behind a `Mutex`; all operations
/// are short single statements.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a store database at the given path.
    ///
    /// Creates parent directories and initializes the schema if needed.
    pub fn open(path: impl AsRef<Path>) -> BridgeResult<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                BridgeError::Store(format!("creating store directory {}: {e}", parent.display()))
            })?;
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| BridgeError::Store(format!("opening store {}: {e}", path.display())))?;

        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory store (for testing or ephemeral sessions).
    pub fn in_memory() -> BridgeResult<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| BridgeError::Store(format!("creating in-memory store: {e}")))?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> BridgeResult<()> {
        #[allow(clippy::expect_used)]
        let conn = self.conn.lock().expect("store connection poisoned");
        conn.execute_batch(SCHEMA_SQL)
            .map_err(|e| BridgeError::Store(format!("initializing store schema: {e}")))?;
        Ok(())
    }

    fn get_meta(&self, key: &str) -> BridgeResult<Option<String>> {
        #[allow(clippy::expect_used)]
        let conn = self.conn.lock().expect("store connection poisoned");
        let result = conn.query_row(
            "SELECT value FROM meta WHERE key = ?1",
            params![key],
            |row| row.get(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(BridgeError::Store(format!("loading meta {key}: {e}"))),
        }
    }

    fn set_meta(&self, key: &str, value: &str) -> BridgeResult<()> {
        #[allow(clippy::expect_used)]
        let conn = self.conn.lock().expect("store connection poisoned");
        conn.execute(
            "INSERT OR REPLACE INTO meta (key, value) VALUES (?1, ?2)",
            params![key, value],
        )
        .map_err(|e| BridgeError::Store(format!("saving meta {key}: {e}")))?;
        Ok(())
    }
}

impl MetadataStore for SqliteStore {
    fn load_records(&self) -> BridgeResult<Vec<FolderRecord>> {
        match self.get_meta(TRACKED_FOLDERS_KEY)? {
            Some(json) => serde_json::from_str(&json)
                .map_err(|e| BridgeError::Store(format!("decoding folder records: {e}"))),
            None => Ok(Vec::new()),
        }
    }

    fn save_records(&self, records: &[FolderRecord]) -> BridgeResult<()> {
        let json = serde_json::to_string(records)
            .map_err(|e| BridgeError::Store(format!("encoding folder records: {e}")))?;
        self.set_meta(TRACKED_FOLDERS_KEY, &json)
    }
}

impl CapabilityStore for SqliteStore {
    fn put_token(&self, folder_id: &str, token: &str) -> BridgeResult<()> {
        #[allow(clippy::expect_used)]
        let conn = self.conn.lock().expect("store connection poisoned");
        conn.execute(
            "INSERT OR REPLACE INTO capabilities (folder_id, token) VALUES (?1, ?2)",
            params![folder_id, token],
        )
        .map_err(|e| BridgeError::Store(format!("saving capability {folder_id}: {e}")))?;
        Ok(())
    }

    fn get_token(&self, folder_id: &str) -> BridgeResult<Option<String>> {
        #[allow(clippy::expect_used)]
        let conn = self.conn.lock().expect("store connection poisoned");
        let result = conn.query_row(
            "SELECT token FROM capabilities WHERE folder_id = ?1",
            params![folder_id],
            |row| row.get(0),
        );

        match result {
            Ok(token) => Ok(Some(token)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(BridgeError::Store(format!(
                "loading capability {folder_id}: {e}"
            ))),
        }
    }

    fn delete_token(&self, folder_id: &str) -> BridgeResult<()> {
        #[allow(clippy::expect_used)]
        let conn = self.conn.lock().expect("store connection poisoned");
        conn.execute(
            "DELETE FROM capabilities WHERE folder_id = ?1",
            params![folder_id],
        )
        .map_err(|e| BridgeError::Store(format!("deleting capability {folder_id}: {e}")))?;
        Ok(())
    }
}
