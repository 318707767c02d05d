//! Durable key-value medium backing the local store and the write queue

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use rusqlite::{params, OptionalExtension};

use super::Database;
use crate::error::{Error, Result};

/// Namespace holding the session blob, app meta and conflict log
pub const LOCAL_STATE_NAMESPACE: &str = "local_state";
/// Namespace holding queued sync payloads, one key per entry
pub const PENDING_WRITES_NAMESPACE: &str = "pending_writes";

/// Key-value persistence that survives process restarts.
///
/// Values are opaque strings; callers own their encoding.
pub trait DurableMedium {
    fn get(&self, namespace: &str, key: &str) -> Result<Option<String>>;

    /// Insert or replace one value
    fn put(&self, namespace: &str, key: &str, value: &str) -> Result<()>;

    /// Delete one value; deleting a missing key is not an error
    fn delete(&self, namespace: &str, key: &str) -> Result<()>;

    /// All `(key, value)` pairs in a namespace, ordered by key
    fn list(&self, namespace: &str) -> Result<Vec<(String, String)>>;
}

impl DurableMedium for Database {
    fn get(&self, namespace: &str, key: &str) -> Result<Option<String>> {
        self.connection()
            .query_row(
                "SELECT value FROM kv_entries WHERE namespace = ?1 AND key = ?2",
                params![namespace, key],
                |row| row.get(0),
            )
            .optional()
            .map_err(|error| storage_error("read", namespace, &error))
    }

    fn put(&self, namespace: &str, key: &str, value: &str) -> Result<()> {
        let updated_at = chrono::Utc::now().timestamp_millis();
        self.connection()
            .execute(
                "INSERT OR REPLACE INTO kv_entries (namespace, key, value, updated_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![namespace, key, value, updated_at],
            )
            .map_err(|error| storage_error("write", namespace, &error))?;
        tracing::debug!("Stored {namespace}/{key} ({} bytes)", value.len());
        Ok(())
    }

    fn delete(&self, namespace: &str, key: &str) -> Result<()> {
        self.connection()
            .execute(
                "DELETE FROM kv_entries WHERE namespace = ?1 AND key = ?2",
                params![namespace, key],
            )
            .map_err(|error| storage_error("delete from", namespace, &error))?;
        tracing::debug!("Deleted {namespace}/{key}");
        Ok(())
    }

    fn list(&self, namespace: &str) -> Result<Vec<(String, String)>> {
        let read_all = || -> rusqlite::Result<Vec<(String, String)>> {
            let mut stmt = self
                .connection()
                .prepare("SELECT key, value FROM kv_entries WHERE namespace = ?1 ORDER BY key")?;
            let rows = stmt.query_map([namespace], |row| Ok((row.get(0)?, row.get(1)?)))?;
            let entries = rows.collect::<rusqlite::Result<Vec<(String, String)>>>()?;
            Ok(entries)
        };
        read_all().map_err(|error| storage_error("list", namespace, &error))
    }
}

/// Medium failures surface as `Error::Storage` whatever the backend.
fn storage_error(action: &str, namespace: &str, error: &rusqlite::Error) -> Error {
    tracing::warn!("Failed to {action} {namespace}: {error}");
    Error::Storage(format!("failed to {action} {namespace}: {error}"))
}

/// In-process medium with a switch that makes every call fail.
#[derive(Debug)]
pub struct MemoryMedium {
    entries: Mutex<BTreeMap<(String, String), String>>,
    available: AtomicBool,
}

impl Default for MemoryMedium {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryMedium {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Mutex::new(BTreeMap::new()),
            available: AtomicBool::new(true),
        }
    }

    /// Simulate the medium going away (or coming back).
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Write raw bytes under a key, bypassing any encoding.
    pub fn put_raw(&self, namespace: &str, key: &str, value: &str) {
        self.lock()
            .insert((namespace.to_string(), key.to_string()), value.to_string());
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<(String, String), String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_available(&self) -> Result<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(Error::Storage("durable medium is unavailable".to_string()))
        }
    }
}

impl DurableMedium for MemoryMedium {
    fn get(&self, namespace: &str, key: &str) -> Result<Option<String>> {
        self.ensure_available()?;
        Ok(self
            .lock()
            .get(&(namespace.to_string(), key.to_string()))
            .cloned())
    }

    fn put(&self, namespace: &str, key: &str, value: &str) -> Result<()> {
        self.ensure_available()?;
        self.put_raw(namespace, key, value);
        Ok(())
    }

    fn delete(&self, namespace: &str, key: &str) -> Result<()> {
        self.ensure_available()?;
        self.lock()
            .remove(&(namespace.to_string(), key.to_string()));
        Ok(())
    }

    fn list(&self, namespace: &str) -> Result<Vec<(String, String)>> {
        self.ensure_available()?;
        Ok(self
            .lock()
            .iter()
            .filter(|((entry_namespace, _), _)| entry_namespace == namespace)
            .map(|((_, key), value)| (key.clone(), value.clone()))
            .collect())
    }
}
