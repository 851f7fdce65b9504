//! Registry error taxonomy.
//!
//! Every failure aborts the whole operation with no partial effect.

use thiserror::Error;

/// Errors returned by registry operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Unknown agent or validation key.
    #[error("not found: {0}")]
    NotFound(String),

    /// Feedback index outside the caller's range.
    #[error("index out of range: {0}")]
    OutOfRange(String),

    /// Already revoked, already responded, or duplicate validation key.
    #[error("already done: {0}")]
    AlreadyDone(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Responder cap reached for a feedback entry.
    #[error("capacity exceeded: {0}")]
    CapacityExceeded(String),

    #[error("expired: {0}")]
    Expired(String),

    #[error("not yet valid: {0}")]
    NotYetValid(String),
}

/// Discriminant of [`RegistryError`], for matching on the category only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    OutOfRange,
    AlreadyDone,
    Unauthorized,
    InvalidInput,
    CapacityExceeded,
    Expired,
    NotYetValid,
}

impl RegistryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RegistryError::NotFound(_) => ErrorKind::NotFound,
            RegistryError::OutOfRange(_) => ErrorKind::OutOfRange,
            RegistryError::AlreadyDone(_) => ErrorKind::AlreadyDone,
            RegistryError::Unauthorized(_) => ErrorKind::Unauthorized,
            RegistryError::InvalidInput(_) => ErrorKind::InvalidInput,
            RegistryError::CapacityExceeded(_) => ErrorKind::CapacityExceeded,
            RegistryError::Expired(_) => ErrorKind::Expired,
            RegistryError::NotYetValid(_) => ErrorKind::NotYetValid,
        }
    }
}

/// Result type for registry operations.
pub type RegistryResult<T> = std::result::Result<T, RegistryError>;
