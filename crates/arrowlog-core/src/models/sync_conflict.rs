//! Sync conflict model

use serde::{Deserialize, Serialize};

use super::ids::SessionId;

/// Which copy the merge kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictWinner {
    Local,
    Remote,
}

/// Recorded divergence between the local and remote copy of one session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncConflict {
    /// Session involved in the conflict
    pub session_id: SessionId,
    /// Local copy's `updatedAt`, verbatim
    pub local_updated_at: String,
    /// Remote copy's `updatedAt`, verbatim
    pub remote_updated_at: String,
    pub winner: ConflictWinner,
    /// Resolution instant (RFC 3339)
    pub resolved_at: String,
    /// Resolution strategy name
    pub strategy: String,
}
