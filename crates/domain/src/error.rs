//! Domain error types

use thiserror::Error;

/// Domain-level errors that can occur during validation or processing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A variable type tag is not one of the known tags.
    #[error("unknown variable type: {0}")]
    UnknownVariableType(String),

    /// A variable identifier is empty or contains braces.
    #[error("invalid variable identifier: {0:?}")]
    InvalidIdentifier(String),

    /// A body syntax name is not recognised.
    #[error("unknown body syntax: {0}")]
    UnknownSyntax(String),

    /// A timestamp unit name is not recognised.
    #[error("unknown timestamp unit: {0}")]
    UnknownTimestampUnit(String),
}

/// Result type alias for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
