//! Remote store collaborators.
//!
//! The remote store is the system of record the device syncs with. It is
//! consumed through [`RemoteStore`]; [`HttpRemoteStore`] talks to the sheets
//! API and [`MemoryRemoteStore`] runs in-process for tests and dry runs.

mod http;
mod memory;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{AppMeta, Session};

pub use http::HttpRemoteStore;
pub use memory::MemoryRemoteStore;

/// Push or pull failures, distinguishable by cause.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("Invalid remote configuration: {0}")]
    InvalidConfiguration(String),

    /// Expired or rejected credentials
    #[error("Remote store rejected the credentials: {0}")]
    Auth(String),

    /// Rate or storage quota exhausted
    #[error("Remote store quota exceeded: {0}")]
    Quota(String),

    #[error("Remote store error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Remote request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid remote payload: {0}")]
    InvalidPayload(String),

    /// Remote could not be reached
    #[error("Remote store unavailable: {0}")]
    Unavailable(String),
}

/// Sizes of a session collection, used to reconcile a push.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncCounts {
    pub sessions: usize,
    pub ends: usize,
    pub shots: usize,
}

impl SyncCounts {
    pub fn of(sessions: &[Session]) -> Self {
        Self {
            sessions: sessions.len(),
            ends: sessions.iter().map(|session| session.ends.len()).sum(),
            shots: sessions.iter().map(Session::shot_count).sum(),
        }
    }
}

/// What the remote reported for an accepted push.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushReceipt {
    /// Remote-confirmed sync instant
    pub synced_at: String,
    /// Counts the remote received
    #[serde(default)]
    pub counts: Option<SyncCounts>,
    /// Counts the remote read back after writing
    #[serde(default)]
    pub persisted: Option<SyncCounts>,
}

/// Remote system of record.
#[allow(async_fn_in_trait)]
pub trait RemoteStore {
    /// Resolve (creating if needed) the store this account syncs with.
    async fn bootstrap(&self) -> Result<AppMeta, RemoteError>;

    /// Full remote collection.
    async fn pull(&self, store_id: &str) -> Result<Vec<Session>, RemoteError>;

    /// Replace the remote collection with `sessions`.
    async fn push(&self, store_id: &str, sessions: &[Session]) -> Result<PushReceipt, RemoteError>;
}

impl<R: RemoteStore + ?Sized> RemoteStore for &R {
    async fn bootstrap(&self) -> Result<AppMeta, RemoteError> {
        (**self).bootstrap().await
    }

    async fn pull(&self, store_id: &str) -> Result<Vec<Session>, RemoteError> {
        (**self).pull(store_id).await
    }

    async fn push(&self, store_id: &str, sessions: &[Session]) -> Result<PushReceipt, RemoteError> {
        (**self).push(store_id, sessions).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};

    #[test]
    fn counts_sum_ends_and_shots() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let mut first = Session::new_draft(date, now, 6);
        first.add_end();
        let second = Session::new_draft(date, now, 3);

        assert_eq!(
            SyncCounts::of(&[first, second]),
            SyncCounts {
                sessions: 2,
                ends: 3,
                shots: 15
            }
        );
    }

    #[test]
    fn receipt_tolerates_missing_counts() {
        let receipt: PushReceipt =
            serde_json::from_str(r#"{"syncedAt":"2024-05-01T12:00:00.000Z"}"#).unwrap();
        assert_eq!(receipt.counts, None);
        assert_eq!(receipt.persisted, None);
    }
}
