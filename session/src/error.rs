//! Error types for session tracking.

use thiserror::Error;

/// Result type alias for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;

/// Errors raised by session storage and the session store.
///
/// Errors are `Clone` so they can travel inside monitor actions.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The storage backend could not be read or written.
    #[error("Storage error: {0}")]
    Storage(String),

    /// The persisted record could not be decoded.
    #[error("Corrupt session record: {0}")]
    Corrupt(String),

    /// The record could not be encoded.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The storage key cannot be used by this backend.
    #[error("Invalid storage key: {0:?}")]
    InvalidKey(String),
}

impl SessionError {
    /// Returns `true` if the failure came from the persistence layer.
    ///
    /// These failures are treated as "unknown, try again on the next tick":
    /// they never log a user out on their own.
    ///
    /// # Examples
    ///
    /// ```
    /// # use school_session::SessionError;
    /// assert!(SessionError::Storage("disk full".into()).is_storage_failure());
    /// assert!(!SessionError::InvalidKey("../x".into()).is_storage_failure());
    /// ```
    #[must_use]
    pub const fn is_storage_failure(&self) -> bool {
        matches!(self, Self::Storage(_) | Self::Corrupt(_))
    }
}

impl From<std::io::Error> for SessionError {
    fn from(error: std::io::Error) -> Self {
        Self::Storage(error.to_string())
    }
}
