//! Domain errors for the repair loop.
//!
//! Candidate-artifact failures (a stage that does not pass) are never
//! represented here: they live inside [`VerificationResult`] values and drive
//! the loop. Everything in [`DomainError`] is either an infrastructure fault,
//! a configuration problem, or a violated invariant.
//!
//! [`VerificationResult`]: crate::domain::models::VerificationResult

use thiserror::Error;

/// Domain-level errors that can occur while running repair sessions.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Infrastructure fault: {0}")]
    Infrastructure(String),

    #[error("Timed out after {secs}s: {command}")]
    Timeout { command: String, secs: u64 },

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Problem not found: {0}")]
    ProblemNotFound(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

pub type DomainResult<T> = Result<T, DomainError>;

impl From<std::io::Error> for DomainError {
    fn from(err: std::io::Error) -> Self {
        DomainError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::SerializationError(err.to_string())
    }
}
