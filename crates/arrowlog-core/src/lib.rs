//! arrowlog-core - Core library for arrowlog
//!
//! Session models, the durable local store and write queue, the
//! last-writer-wins merge, and the sync orchestrator that pushes local
//! practice sessions to a spreadsheet-backed remote store.

pub mod clock;
pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod models;
pub mod services;
pub mod stats;
pub mod sync;
pub mod util;

pub use error::{Error, Result, ValidationError};
pub use models::{AppMeta, End, PendingWrite, Session, SessionId, Shot, ShotValue, SyncConflict};
