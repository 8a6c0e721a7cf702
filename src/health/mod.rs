//! Health check engine.
//!
//! # Data Flow
//! ```text
//! ServiceDescriptor
//!     → HealthChecker::check (dispatch on CheckKind)
//!         → probes.rs   reachability | admin_surface | deep_health
//!             deep_health → records.rs (authenticated listing, auth.rs tokens)
//!                         → time.rs (timestamp parsing)
//!                         → partitions.rs (persistent partition failures)
//!     → ProbeResult (always; errors become failed results)
//! ```
//!
//! # Design Decisions
//! - Closed set of check kinds dispatched in one place
//! - The token cache is owned by the checker and injected, never global
//! - Probes never return errors; every failure is a message on a failed result

pub mod auth;
pub mod partitions;
pub mod probes;
pub mod records;
pub mod time;
pub mod types;

use std::time::Duration;

use reqwest::Client;

use crate::config::{CheckConfig, CheckKind, MonitorConfig, ServiceDescriptor};
use crate::observability::metrics;

pub use auth::{TokenCache, TokenSource};
pub use types::{ProbeError, ProbeResult};

/// Build the HTTP client shared by probes and authentication.
pub fn build_client(request_timeout_secs: u64) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(Duration::from_secs(request_timeout_secs))
        .user_agent(concat!("service-monitor/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// Dispatches services to their probe strategy.
pub struct HealthChecker<T: TokenSource = TokenCache> {
    client: Client,
    tokens: T,
    settings: CheckConfig,
}

impl HealthChecker<TokenCache> {
    /// Create a checker with a password-authenticated token cache.
    pub fn from_config(config: &MonitorConfig) -> Result<Self, reqwest::Error> {
        let client = build_client(config.check.request_timeout_secs)?;
        let tokens = TokenCache::new(client.clone(), config.auth.clone());
        Ok(Self::new(client, tokens, config.check.clone()))
    }
}

impl<T: TokenSource> HealthChecker<T> {
    pub fn new(client: Client, tokens: T, settings: CheckConfig) -> Self {
        Self { client, tokens, settings }
    }

    pub fn tokens(&self) -> &T {
        &self.tokens
    }

    /// Probe one service.
    pub async fn check(&self, service: &ServiceDescriptor) -> ProbeResult {
        let result = match &service.kind {
            CheckKind::Reachability => probes::reachability(&self.client, service).await,
            CheckKind::AdminSurface => probes::admin_surface(&self.client, service).await,
            CheckKind::DeepHealth => {
                probes::deep_health(&self.client, &self.tokens, &self.settings, service).await
            }
            CheckKind::Unrecognized(kind) => {
                tracing::error!(service = %service.name, kind = %kind, "Unrecognized check kind");
                ProbeResult::failed(&service.name, format!("unknown check kind: {}", kind))
            }
        };

        metrics::record_probe(&service.name, result.ok);
        result
    }
}
