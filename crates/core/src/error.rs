//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Deterministic, business-level failure.
///
/// Infrastructure failures (storage, upstream services) are modelled where
/// they happen; this enum covers only decisions the domain itself makes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Input failed a validation rule; nothing was changed.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A state-machine invariant was violated.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// The operation lost a race or targets state that already exists.
    /// Callers should re-fetch before retrying.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The caller is not allowed to perform this transition.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The targeted record does not exist.
    #[error("not found")]
    NotFound,

    /// An identifier or date failed to parse.
    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }
}
