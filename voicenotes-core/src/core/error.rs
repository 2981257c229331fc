//! Error types for the Voice Notes core library.

use thiserror::Error;

/// All errors that can occur within the Voice Notes core library.
#[derive(Debug, Error)]
pub enum VoiceNotesError {
    /// No principal is signed in; note operations are scoped per user.
    #[error("User not authenticated")]
    NotAuthenticated,

    /// A note failed local validation before any store call was made.
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    /// A SQLite operation failed.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The document store could not complete a call (lock poisoned, worker
    /// task failed, backend unreachable).
    #[error("Transport error: {0}")]
    Transport(String),

    /// The opened file is not a valid Voice Notes document store.
    #[error("Invalid store: {0}")]
    InvalidStore(String),

    /// An I/O operation on the filesystem failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored document could not be (de)serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias that pins the error type to [`VoiceNotesError`].
pub type Result<T> = std::result::Result<T, VoiceNotesError>;

/// Coarse classification used by callers deciding how to surface a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The operation needs a signed-in principal.
    Precondition,
    /// The input was rejected locally; nothing was sent to the store.
    Validation,
    /// The store call itself failed.
    Transport,
}

impl VoiceNotesError {
    /// Returns which part of the taxonomy this error belongs to.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotAuthenticated => ErrorKind::Precondition,
            Self::ValidationFailed(_) => ErrorKind::Validation,
            Self::Database(_)
            | Self::Transport(_)
            | Self::InvalidStore(_)
            | Self::Io(_)
            | Self::Json(_) => ErrorKind::Transport,
        }
    }

    /// Returns a short, human-readable message suitable for display to the end user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::NotAuthenticated => "Please sign in first".to_string(),
            Self::ValidationFailed(msg) => msg.clone(),
            Self::Database(e) => format!("Notes store error: {e}"),
            Self::Transport(e) => format!("Could not reach notes store: {e}"),
            Self::InvalidStore(_) => "Could not open notes store".to_string(),
            Self::Io(e) => format!("File error: {e}"),
            Self::Json(e) => format!("Data format error: {e}"),
        }
    }
}

impl From<tokio::task::JoinError> for VoiceNotesError {
    fn from(e: tokio::task::JoinError) -> Self {
        Self::Transport(format!("store worker failed: {e}"))
    }
}
