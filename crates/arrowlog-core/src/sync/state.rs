//! Sync status state machine.
//!
//! Pure transitions only; the orchestrator feeds events and owns the I/O.

use serde::{Deserialize, Serialize};

/// User-visible sync status.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    /// Local data has changes the remote has not confirmed
    #[default]
    NotSynced,
    /// A sync cycle is in flight
    Syncing,
    /// The last cycle delivered every queued write
    Synced,
    /// The last cycle failed; queued writes are retained
    SyncFailed,
}

/// Inputs to the sync state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncEvent {
    Started,
    Succeeded,
    Failed,
    /// Any successful local edit
    LocalMutation,
}

impl SyncState {
    #[must_use]
    pub const fn on_event(self, event: SyncEvent) -> Self {
        match (self, event) {
            (Self::NotSynced | Self::Synced | Self::SyncFailed | Self::Syncing, SyncEvent::Started) => {
                Self::Syncing
            }
            (Self::Syncing, SyncEvent::Succeeded) => Self::Synced,
            (Self::Syncing, SyncEvent::Failed) => Self::SyncFailed,
            (Self::Synced | Self::SyncFailed | Self::NotSynced, SyncEvent::LocalMutation) => {
                Self::NotSynced
            }
            // Outcomes without a cycle in flight, and edits during one, change nothing.
            (state, _) => state,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::NotSynced => "Not synced",
            Self::Syncing => "Syncing",
            Self::Synced => "Synced",
            Self::SyncFailed => "Sync failed",
        }
    }
}

impl std::fmt::Display for SyncState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
