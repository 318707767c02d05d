//! Durable copy of the session collection, app meta and conflict log

use crate::error::Result;
use crate::models::{normalize_sessions, AppMeta, Session, SyncConflict};

use super::medium::{DurableMedium, LOCAL_STATE_NAMESPACE};

const SESSIONS_KEY: &str = "sessions";
const META_KEY: &str = "meta";
const CONFLICTS_KEY: &str = "conflicts";

/// Most recent conflicts kept in the log
pub const CONFLICT_LOG_LIMIT: usize = 100;

/// Local store over a durable medium.
///
/// Reads absorb corrupt data as absence. Each write replaces a whole blob
/// with a single `put`, so a partial collection is never observable.
pub struct LocalStore<'a, M: DurableMedium + ?Sized> {
    medium: &'a M,
}

impl<'a, M: DurableMedium + ?Sized> LocalStore<'a, M> {
    pub const fn new(medium: &'a M) -> Self {
        Self { medium }
    }

    /// Last persisted sessions, or an empty collection.
    pub fn load(&self) -> Vec<Session> {
        let Some(mut sessions) = self.read_json::<Vec<Session>>(SESSIONS_KEY) else {
            return Vec::new();
        };
        normalize_sessions(&mut sessions);
        sessions
    }

    pub fn save(&self, sessions: &[Session]) -> Result<()> {
        let json = serde_json::to_string(sessions)?;
        self.medium.put(LOCAL_STATE_NAMESPACE, SESSIONS_KEY, &json)
    }

    pub fn load_meta(&self) -> Option<AppMeta> {
        self.read_json(META_KEY)
    }

    /// Persist meta, or delete it when `None`.
    pub fn save_meta(&self, meta: Option<&AppMeta>) -> Result<()> {
        match meta {
            Some(meta) => {
                let json = serde_json::to_string(meta)?;
                self.medium.put(LOCAL_STATE_NAMESPACE, META_KEY, &json)
            }
            None => self.medium.delete(LOCAL_STATE_NAMESPACE, META_KEY),
        }
    }

    /// Conflict log, oldest first.
    pub fn load_conflicts(&self) -> Vec<SyncConflict> {
        self.read_json(CONFLICTS_KEY).unwrap_or_default()
    }

    /// Append to the conflict log, dropping the oldest beyond the limit.
    pub fn append_conflicts(&self, conflicts: &[SyncConflict]) -> Result<()> {
        if conflicts.is_empty() {
            return Ok(());
        }
        let mut log = self.load_conflicts();
        log.extend_from_slice(conflicts);
        if log.len() > CONFLICT_LOG_LIMIT {
            log.drain(..log.len() - CONFLICT_LOG_LIMIT);
        }
        let json = serde_json::to_string(&log)?;
        self.medium.put(LOCAL_STATE_NAMESPACE, CONFLICTS_KEY, &json)
    }

    fn read_json<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.medium.get(LOCAL_STATE_NAMESPACE, key) {
            Ok(raw) => raw?,
            Err(error) => {
                tracing::warn!("Could not read {key} from local store: {error}");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(error) => {
                tracing::warn!("Ignoring corrupt {key} in local store: {error}");
                None
            }
        }
    }
}
