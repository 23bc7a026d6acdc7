//! Error types for review-core.

use thiserror::Error;

use crate::session::SessionState;

/// Result type alias using SessionError.
pub type Result<T> = std::result::Result<T, SessionError>;

/// Errors reported by a persistence collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Errors that can occur while driving a study session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("failed to load study queue: {0}")]
    Load(#[source] StoreError),

    #[error("session is {actual:?}, expected {expected}")]
    InvalidState {
        expected: &'static str,
        actual: SessionState,
    },
}
