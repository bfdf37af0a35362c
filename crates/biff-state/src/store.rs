//! EnrollmentStore — redb-backed persistence for enrollments.
//!
//! Records are JSON-serialized into redb's `&[u8]` value column. A second
//! table maps node keys to record ids and doubles as the uniqueness
//! constraint on node keys. The store supports both on-disk and in-memory
//! backends (the latter for testing).

use std::path::Path;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use redb::{Database, ReadableDatabase, ReadableTable, ReadableTableMetadata};
use tracing::debug;

use crate::error::{StateError, StateResult};
use crate::tables::*;
use crate::types::*;

/// Convert any `Display` error into a `StateError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| StateError::$variant(e.to_string())
    };
}

/// Thread-safe enrollment store backed by redb.
#[derive(Clone)]
pub struct EnrollmentStore {
    db: Arc<Database>,
}

impl EnrollmentStore {
    /// Open (or create) a persistent store at the given path.
    pub fn open(path: &Path) -> StateResult<Self> {
        let db = Database::create(path).map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!(?path, "enrollment store opened");
        Ok(store)
    }

    /// Create an ephemeral in-memory store (for testing).
    pub fn open_in_memory() -> StateResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!("in-memory enrollment store opened");
        Ok(store)
    }

    /// Create all tables if they don't exist yet.
    fn ensure_tables(&self) -> StateResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        // Opening a table in a write transaction creates it if absent.
        txn.open_table(ENROLLMENTS).map_err(map_err!(Table))?;
        txn.open_table(NODE_KEYS).map_err(map_err!(Table))?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    /// Look up a single enrollment by id or by node key.
    pub fn find(&self, lookup: EnrollmentLookup<'_>) -> StateResult<Option<Enrollment>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let id = match lookup {
            EnrollmentLookup::ById(id) => id,
            EnrollmentLookup::ByNodeKey(node_key) => {
                let keys = txn.open_table(NODE_KEYS).map_err(map_err!(Table))?;
                let found = keys
                    .get(node_key)
                    .map_err(map_err!(Read))?
                    .map(|guard| guard.value());
                match found {
                    Some(id) => id,
                    None => return Ok(None),
                }
            }
        };

        let table = txn.open_table(ENROLLMENTS).map_err(map_err!(Table))?;
        match table.get(id).map_err(map_err!(Read))? {
            Some(guard) => {
                let enrollment: Enrollment =
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                Ok(Some(enrollment))
            }
            None => Ok(None),
        }
    }

    /// Persist a new enrollment and return it with its assigned id.
    ///
    /// Id allocation, the record and the node-key index entry are written in
    /// one transaction. A node key that is already indexed aborts the
    /// transaction with [`StateError::DuplicateNodeKey`].
    pub fn insert(
        &self,
        platform_type: i64,
        host_identifier: &str,
        host_details: &serde_json::Value,
        node_key: &str,
    ) -> StateResult<Enrollment> {
        let host_details = serde_json::to_string(host_details).map_err(map_err!(Serialize))?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let enrollment = {
            let mut keys = txn.open_table(NODE_KEYS).map_err(map_err!(Table))?;
            if keys.get(node_key).map_err(map_err!(Read))?.is_some() {
                return Err(StateError::DuplicateNodeKey);
            }

            let mut enrollments = txn.open_table(ENROLLMENTS).map_err(map_err!(Table))?;
            let id = match enrollments.last().map_err(map_err!(Read))? {
                Some((last, _)) => last.value() + 1,
                None => 1,
            };

            let enrollment = Enrollment {
                id,
                host_identifier: host_identifier.to_string(),
                platform_type,
                host_details,
                node_key: node_key.to_string(),
                enrolled_at: unix_now(),
            };
            let value = serde_json::to_vec(&enrollment).map_err(map_err!(Serialize))?;
            enrollments
                .insert(id, value.as_slice())
                .map_err(map_err!(Write))?;
            keys.insert(node_key, id).map_err(map_err!(Write))?;
            enrollment
        };
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(id = enrollment.id, "enrollment stored");
        Ok(enrollment)
    }

    /// List all enrollments in insertion order.
    pub fn list_all(&self) -> StateResult<Vec<Enrollment>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(ENROLLMENTS).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in table.iter().map_err(map_err!(Read))? {
            let (_, value) = entry.map_err(map_err!(Read))?;
            let enrollment: Enrollment =
                serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
            results.push(enrollment);
        }
        Ok(results)
    }

    /// Number of stored enrollments.
    pub fn count(&self) -> StateResult<u64> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(ENROLLMENTS).map_err(map_err!(Table))?;
        table.len().map_err(map_err!(Read))
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
