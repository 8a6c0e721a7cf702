//! Outbound connectivity pre-check.
//!
//! A failed probe means the monitor itself is offline, so per-service
//! failures in that cycle would all be false positives.

use std::time::Duration;

use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::config::ConnectivityConfig;

#[derive(Debug, Clone)]
pub struct ConnectivityProbe {
    enabled: bool,
    target: String,
    timeout: Duration,
}

impl ConnectivityProbe {
    pub fn new(target: impl Into<String>, timeout: Duration) -> Self {
        Self {
            enabled: true,
            target: target.into(),
            timeout,
        }
    }

    /// A probe that always reports online.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            target: String::new(),
            timeout: Duration::ZERO,
        }
    }

    pub fn from_config(config: &ConnectivityConfig) -> Self {
        if config.enabled {
            Self::new(config.target.clone(), Duration::from_secs(config.timeout_secs))
        } else {
            Self::disabled()
        }
    }

    /// Whether a TCP connection to the target can be opened.
    pub async fn is_online(&self) -> bool {
        if !self.enabled {
            return true;
        }

        match timeout(self.timeout, TcpStream::connect(self.target.as_str())).await {
            Ok(Ok(_)) => true,
            Ok(Err(e)) => {
                tracing::warn!(address = %self.target, error = %e, "Connectivity check failed");
                false
            }
            Err(_) => {
                tracing::warn!(address = %self.target, "Connectivity check timed out");
                false
            }
        }
    }
}
