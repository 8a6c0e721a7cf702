//! State store error types.

use thiserror::Error;

/// Errors raised by the state store.
///
/// Any of these is fatal to the check cycle: alert decisions without the
/// stored streaks would be wrong.
#[derive(Debug, Error)]
pub enum StateError {
    /// The database could not be opened or initialised.
    #[error("failed to open state store: {0}")]
    Open(String),

    /// A query or transaction failed.
    #[error("state store query failed: {0}")]
    Query(#[from] rusqlite::Error),

    /// The connection mutex was poisoned by a panicking writer.
    #[error("state store lock poisoned")]
    Poisoned,

    /// A stored value could not be decoded.
    #[error("corrupt state for '{service}': {detail}")]
    Corrupt { service: String, detail: String },

    /// A blocking store task panicked or was cancelled.
    #[error("state store task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Result type for state store operations.
pub type StateResult<T> = Result<T, StateError>;
