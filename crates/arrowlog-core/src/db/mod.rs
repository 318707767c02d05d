//! Durable storage for arrowlog

mod connection;
mod local_store;
mod medium;
mod migrations;
mod queue;

pub use connection::Database;
pub use local_store::{LocalStore, CONFLICT_LOG_LIMIT};
pub use medium::{DurableMedium, MemoryMedium, LOCAL_STATE_NAMESPACE, PENDING_WRITES_NAMESPACE};
pub use queue::PendingWriteQueue;
