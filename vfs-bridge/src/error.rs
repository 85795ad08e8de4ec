//! Error types for the UI/core bridge.

use thiserror::Error;

use crate::channel::Direction;
use crate::layout::Directory;

/// Errors that can occur while managing the shared virtual filesystem.
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Directory not empty: {0}")]
    NotEmpty(String),

    /// Not raised by this crate: `DeletionService` reports a declined delete
    /// as `DeleteOutcome::Declined`. Kept so callers that treat a declined
    /// confirmation as a failure have a variant for it.
    #[error("Deletion declined by user")]
    UserDeclined,

    #[error("Not a directory: {0}")]
    NotADirectory(String),

    #[error("Is a directory: {0}")]
    IsADirectory(String),

    #[error("Invalid name: {0:?}")]
    InvalidName(String),

    #[error("No request slot for {direction:?} in {directory}")]
    UnsupportedRequest {
        directory: Directory,
        direction: Direction,
    },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Lock poisoned")]
    LockPoisoned,

    #[error("Channel closed")]
    ChannelClosed,

    #[error("Core error: {0}")]
    Core(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl BridgeError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, BridgeError::NotFound(_))
    }
}

/// Result type for bridge operations.
pub type BridgeResult<T> = Result<T, BridgeError>;
