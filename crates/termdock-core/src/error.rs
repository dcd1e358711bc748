//! Error types for the termdock coordinator.

use thiserror::Error;

use crate::TerminalId;

/// Main error type for termdock lifecycle operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Terminal limit reached; also the user-visible capacity warning
    #[error("Terminal limit reached ({current}/{max})")]
    CapacityExceeded {
        /// Sessions currently occupying slots
        current: usize,
        /// Configured session ceiling
        max: usize,
    },

    /// Queued creation request expired before it could be dispatched
    #[error("Creation request timed out after {0}ms in queue")]
    QueueTimeout(u64),

    /// Queued request aborted by a forced synchronization
    #[error("Synchronization forced, queued request aborted")]
    SynchronizationForced,

    /// Refusal to delete the only remaining session
    #[error("Cannot delete the last remaining terminal")]
    LastSessionProtected,

    /// Terminal not found
    #[error("Terminal not found: {0}")]
    NotFound(TerminalId),

    /// An inbound snapshot violated a structural invariant
    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),

    /// Sending a message over the backend channel failed
    #[error("Transport error: {0}")]
    Transport(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
