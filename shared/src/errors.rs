//! Error types for PlayStream

use thiserror::Error;

/// Result type alias using PlayStream Error
pub type Result<T> = std::result::Result<T, Error>;

/// PlayStream error types
#[derive(Error, Debug)]
pub enum Error {
    /// Event references a track with no catalog entry
    #[error("Unknown track: {0}")]
    UnknownTrack(String),

    /// Structurally malformed event
    #[error("Invalid event: {0}")]
    InvalidEvent(String),

    /// Processor no longer accepts events
    #[error("Processor is finalized")]
    Finalized,

    /// Internal synchronization failure (poisoned lock, torn state)
    #[error("Concurrency violation: {0}")]
    ConcurrencyViolation(String),

    /// Invalid configuration or catalog data
    #[error("Configuration error: {0}")]
    Config(String),

    /// Ingestion queue is no longer running
    #[error("Ingestion channel closed")]
    ChannelClosed,

    /// JSON Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Returns a stable error code
    pub fn code(&self) -> &'static str {
        match self {
            Error::UnknownTrack(_) => "unknown_track",
            Error::InvalidEvent(_) => "invalid_event",
            Error::Finalized => "finalized",
            Error::ConcurrencyViolation(_) => "concurrency_violation",
            Error::Config(_) => "config_error",
            Error::ChannelClosed => "channel_closed",
            Error::Serialization(_) => "serialization_error",
            Error::Io(_) => "io_error",
        }
    }

    /// Whether the failure is local to one event.
    ///
    /// Recoverable errors are counted and skipped by batch ingestion; every
    /// other error aborts it.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::UnknownTrack(_) | Error::InvalidEvent(_))
    }
}
