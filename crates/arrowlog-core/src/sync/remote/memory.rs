//! In-process remote store with failure injection.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;

use super::{PushReceipt, RemoteError, RemoteStore, SyncCounts};
use crate::models::{format_instant, AppMeta, Session};

/// Remote store held in memory.
///
/// Clones share state, so a test can keep a handle while the engine
/// drives another.
#[derive(Debug, Clone)]
pub struct MemoryRemoteStore {
    inner: Arc<Mutex<MemoryRemoteInner>>,
}

#[derive(Debug)]
struct MemoryRemoteInner {
    meta: AppMeta,
    sessions: Vec<Session>,
    pushes: Vec<Vec<Session>>,
    calls: usize,
    fail_next_bootstrap: Option<String>,
    fail_next_push: Option<String>,
    fail_next_pull: Option<String>,
    persist_limit: Option<usize>,
}

impl Default for MemoryRemoteStore {
    fn default() -> Self {
        Self::new(AppMeta::new("memory-store", "Archery Log"))
    }
}

impl MemoryRemoteStore {
    #[must_use]
    pub fn new(meta: AppMeta) -> Self {
        Self {
            inner: Arc::new(Mutex::new(MemoryRemoteInner {
                meta,
                sessions: Vec::new(),
                pushes: Vec::new(),
                calls: 0,
                fail_next_bootstrap: None,
                fail_next_push: None,
                fail_next_pull: None,
                persist_limit: None,
            })),
        }
    }

    /// Seed the remote collection.
    #[must_use]
    pub fn with_sessions(self, sessions: Vec<Session>) -> Self {
        self.lock().sessions = sessions;
        self
    }

    /// Overwrite the remote collection, as another device would.
    pub fn replace_sessions(&self, sessions: Vec<Session>) {
        self.lock().sessions = sessions;
    }

    /// Current remote collection.
    pub fn sessions(&self) -> Vec<Session> {
        self.lock().sessions.clone()
    }

    /// Payloads of every accepted push, in arrival order.
    pub fn pushes(&self) -> Vec<Vec<Session>> {
        self.lock().pushes.clone()
    }

    /// Number of bootstrap, pull and push calls received.
    pub fn call_count(&self) -> usize {
        self.lock().calls
    }

    pub fn fail_next_bootstrap(&self, error: &str) {
        self.lock().fail_next_bootstrap = Some(error.to_string());
    }

    pub fn fail_next_push(&self, error: &str) {
        self.lock().fail_next_push = Some(error.to_string());
    }

    pub fn fail_next_pull(&self, error: &str) {
        self.lock().fail_next_pull = Some(error.to_string());
    }

    /// Accept pushes but keep only the first `limit` sessions.
    pub fn set_persist_limit(&self, limit: Option<usize>) {
        self.lock().persist_limit = limit;
    }

    fn lock(&self) -> MutexGuard<'_, MemoryRemoteInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl RemoteStore for MemoryRemoteStore {
    async fn bootstrap(&self) -> Result<AppMeta, RemoteError> {
        let mut inner = self.lock();
        inner.calls += 1;
        if let Some(error) = inner.fail_next_bootstrap.take() {
            return Err(RemoteError::Unavailable(error));
        }
        Ok(inner.meta.clone())
    }

    async fn pull(&self, store_id: &str) -> Result<Vec<Session>, RemoteError> {
        let mut inner = self.lock();
        inner.calls += 1;
        if let Some(error) = inner.fail_next_pull.take() {
            return Err(RemoteError::Unavailable(error));
        }
        if store_id != inner.meta.store_id {
            return Err(RemoteError::Api {
                status: 404,
                message: format!("unknown store {store_id}"),
            });
        }
        Ok(inner.sessions.clone())
    }

    async fn push(&self, store_id: &str, sessions: &[Session]) -> Result<PushReceipt, RemoteError> {
        let mut inner = self.lock();
        inner.calls += 1;
        if let Some(error) = inner.fail_next_push.take() {
            return Err(RemoteError::Unavailable(error));
        }
        if store_id != inner.meta.store_id {
            return Err(RemoteError::Api {
                status: 404,
                message: format!("unknown store {store_id}"),
            });
        }

        let kept = inner.persist_limit.unwrap_or(sessions.len()).min(sessions.len());
        inner.pushes.push(sessions.to_vec());
        inner.sessions = sessions[..kept].to_vec();

        Ok(PushReceipt {
            synced_at: format_instant(Utc::now()),
            counts: Some(SyncCounts::of(sessions)),
            persisted: Some(SyncCounts::of(&inner.sessions)),
        })
    }
}
