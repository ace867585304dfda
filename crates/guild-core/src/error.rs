//! Error types for guild domain rules.

use crate::ids::IdError;

/// Result type for guild domain operations.
pub type Result<T> = std::result::Result<T, ForumError>;

/// Domain-policy violations detected by the state-transition rules.
///
/// These are distinguishable outcomes, never I/O failures; the storage layer
/// wraps them unchanged so callers can map each kind to its own response.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ForumError {
    /// An action or value the rules do not recognize.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A referenced document does not exist.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of document that was looked up.
        entity: &'static str,
        /// The key that did not resolve.
        id: String,
    },

    /// Uniqueness or duplicate-action violation.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The caller is not allowed to perform the action on this document.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Invalid identifier.
    #[error("invalid identifier: {0}")]
    InvalidId(#[from] IdError),
}

impl ForumError {
    /// Shorthand for a [`ForumError::NotFound`].
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}
