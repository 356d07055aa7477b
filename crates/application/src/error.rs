//! Application error types

use thiserror::Error;

/// Application-level errors.
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// The referenced variable is not registered.
    #[error("unknown variable: {0}")]
    UnknownVariable(String),

    /// The operation is not valid in the editor's current state.
    #[error("invalid editor state: {0}")]
    InvalidState(String),
}

/// Result type alias for application operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
