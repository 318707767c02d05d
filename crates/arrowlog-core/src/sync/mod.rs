//! Local-first synchronization with the remote store

mod engine;
mod merge;
mod remote;
mod state;

pub use engine::{EngineSettings, RefreshReport, SyncEngine, SyncOptions, SyncReport};
pub use merge::{
    local_wins, merge_sessions_lww, merge_with_conflicts, MergeOutcome, MERGE_STRATEGY,
};
pub use remote::{
    HttpRemoteStore, MemoryRemoteStore, PushReceipt, RemoteError, RemoteStore, SyncCounts,
};
pub use state::{SyncEvent, SyncState};
