//! Error types for guild storage.

use guild_core::ForumError;

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur in storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database operation failed permanently.
    #[error("database error: {0}")]
    Database(String),

    /// Database was temporarily unable to serve the call; retrying may succeed.
    #[error("database busy: {0}")]
    Busy(String),

    /// Serialization/deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A domain rule rejected the operation (not found, conflict, forbidden, ...).
    #[error(transparent)]
    Domain(#[from] ForumError),
}

impl StoreError {
    /// Whether the call may succeed if repeated unchanged.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Busy(_))
    }
}

impl From<rocksdb::Error> for StoreError {
    fn from(err: rocksdb::Error) -> Self {
        use rocksdb::ErrorKind;

        match err.kind() {
            ErrorKind::Busy | ErrorKind::TryAgain | ErrorKind::TimedOut | ErrorKind::Incomplete => {
                Self::Busy(err.to_string())
            }
            _ => Self::Database(err.to_string()),
        }
    }
}
