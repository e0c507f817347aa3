//! Common error types for Pandu

use thiserror::Error;

/// Common result type for Pandu operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across Pandu services
///
/// The first four variants are the business-rejection taxonomy returned by
/// the progression and award engines; the rest wrap ambient failures.
#[derive(Error, Debug)]
pub enum Error {
    /// Referenced entity missing or soft-deleted
    #[error("Not found: {0}")]
    NotFound(String),

    /// State-machine precondition violated (wrong tier, duplicate award,
    /// approved-immutable)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Business-rule gate failed (elapsed time, badge-count threshold)
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Caller role insufficient for the operation
    #[error("Not authorized: {0}")]
    Authorization(String),

    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}
