//! Probe result and error types.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

/// Outcome of one check of one service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeResult {
    pub service_name: String,
    pub ok: bool,
    pub message: String,
    pub checked_at: DateTime<Utc>,
}

impl ProbeResult {
    pub fn healthy(service_name: &str, message: impl Into<String>) -> Self {
        Self {
            service_name: service_name.to_string(),
            ok: true,
            message: message.into(),
            checked_at: Utc::now(),
        }
    }

    pub fn failed(service_name: &str, message: impl Into<String>) -> Self {
        Self {
            service_name: service_name.to_string(),
            ok: false,
            message: message.into(),
            checked_at: Utc::now(),
        }
    }

    /// Override the check instant (replayed or synthetic results).
    pub fn at(mut self, checked_at: DateTime<Utc>) -> Self {
        self.checked_at = checked_at;
        self
    }
}

/// Errors raised inside a probe. None of these escape the checker; each one
/// becomes a failed [`ProbeResult`].
#[derive(Debug, Error)]
pub enum ProbeError {
    /// Network failure or timeout.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Backend answered with an unexpected status.
    #[error("HTTP {0}")]
    Status(u16),

    /// Authentication failed or the token was rejected twice.
    #[error("authentication failed for {0}")]
    Auth(String),

    /// Response body was not the expected shape.
    #[error("unexpected response: {0}")]
    Decode(String),
}

/// Unrecognized timestamp encoding.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unrecognized timestamp '{0}'")]
pub struct TimeParseError(pub String);

/// Result type for probe internals.
pub type ProbeOutcome<T> = Result<T, ProbeError>;
