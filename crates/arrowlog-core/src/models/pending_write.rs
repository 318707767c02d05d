//! Pending-write queue entry

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::WriteId;
use super::session::{format_instant, parse_instant, Session};

/// A full snapshot of the sync target, waiting for the remote to confirm it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingWrite {
    pub id: WriteId,
    /// RFC 3339 instant; orders delivery
    pub created_at: String,
    pub payload: Vec<Session>,
}

impl PendingWrite {
    /// Snapshot `sessions` so later local edits cannot reach the queued payload.
    #[must_use]
    pub fn snapshot(sessions: &[Session], now: DateTime<Utc>) -> Self {
        Self {
            id: WriteId::new(),
            created_at: format_instant(now),
            payload: sessions.to_vec(),
        }
    }

    pub fn created_instant(&self) -> Option<DateTime<Utc>> {
        parse_instant(&self.created_at)
    }
}
