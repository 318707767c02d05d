//! Error types for arrowlog-core

use thiserror::Error;

use crate::sync::RemoteError;

/// Result type alias using arrowlog-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in arrowlog-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Durable medium unavailable, or a write to it failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// `SQLite` error while opening or migrating the database
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// No published sessions are eligible for a push
    #[error("No local session data to sync yet. Create or edit a session first.")]
    NothingToSync,

    /// Sync requested before the remote store identity is known
    #[error("No remote store is connected yet. Run a refresh first.")]
    NotBootstrapped,

    /// Push or pull against the remote store failed
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// Input rejected before entering the model
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Session not found
    #[error("Session not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    /// Whether this failure is the user's to fix rather than a system fault.
    pub const fn is_user_recoverable(&self) -> bool {
        matches!(
            self,
            Self::NothingToSync | Self::NotBootstrapped | Self::Validation(_)
        )
    }
}

/// Malformed shot values, out-of-range distances and similar input errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Invalid shot value '{0}' (expected M, 1-10 or X)")]
    InvalidShotValue(String),

    #[error("Shot score {score} does not match value '{value}'")]
    ScoreMismatch { value: String, score: u8 },

    #[error("Distance {0}m is out of range (1-300)")]
    DistanceOutOfRange(i64),

    #[error("Shots per end must be between {min} and {max}, got {got}")]
    ShotsPerEndOutOfRange { got: usize, min: usize, max: usize },

    #[error("End {0} does not exist")]
    UnknownEnd(u32),

    #[error("Shot {shot} does not exist in end {end}")]
    UnknownShot { end: u32, shot: u32 },

    #[error("A session needs at least one end")]
    LastEnd,

    #[error("Invalid date '{0}' (expected YYYY-MM-DD)")]
    InvalidDate(String),

    #[error("Invalid coordinates ({lat}, {lng})")]
    InvalidCoordinates { lat: f64, lng: f64 },

    #[error("Session dated {session_date} can no longer be extended (today is {today})")]
    EditWindowClosed { session_date: String, today: String },
}
