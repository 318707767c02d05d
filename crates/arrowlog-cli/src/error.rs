use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] arrowlog_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Session ID cannot be empty")]
    EmptySessionId,
    #[error("Session not found for id/prefix: {0}")]
    SessionNotFound(String),
    #[error("{0}")]
    AmbiguousSessionId(String),
    #[error("Pass a distance in meters or --clear")]
    MissingDistance,
    #[error("Pass both --lat and --lng, or neither")]
    IncompleteCoordinates,
    #[error("Configuration error: {0}")]
    Config(String),
}
