//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the monitor.
//! All types derive Serde traits for deserialization from config files.

use std::fmt;

use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};

/// Root configuration for the service monitor.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct MonitorConfig {
    /// Check cycle tunables.
    pub check: CheckConfig,

    /// Credentials for deep-health backends.
    pub auth: AuthConfig,

    /// Outbound connectivity pre-check.
    pub connectivity: ConnectivityConfig,

    /// State store location.
    pub storage: StorageConfig,

    /// Admin/status API settings.
    pub admin: AdminConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Monitored services.
    pub services: Vec<ServiceDescriptor>,
}

/// Check cycle configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CheckConfig {
    /// Seconds between check cycles.
    pub interval_secs: u64,

    /// Seconds after which a deep-health backend's newest record is stale.
    pub staleness_timeout_secs: u64,

    /// Consecutive failures before an alert fires.
    pub error_threshold: u32,

    /// Per-request timeout for probes and authentication.
    pub request_timeout_secs: u64,

    /// Error-log entries younger than this fail a deep-health check.
    pub recent_error_window_secs: u64,

    /// Offset of the monitoring timezone, applied to naive timestamps.
    pub timezone_offset_hours: i32,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            interval_secs: 300,
            staleness_timeout_secs: 1800,
            error_threshold: 2,
            request_timeout_secs: 15,
            recent_error_window_secs: 300,
            timezone_offset_hours: 9,
        }
    }
}

impl CheckConfig {
    /// The local monitoring timezone.
    ///
    /// Out-of-range offsets fall back to UTC; validation rejects them earlier.
    pub fn local_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.timezone_offset_hours * 3600)
            .unwrap_or_else(|| Utc.fix())
    }
}

/// Backend authentication configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Login identity (usually an email address).
    pub identity: String,

    /// Login secret.
    pub secret: String,

    /// Auth collection used for password authentication.
    pub collection: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            identity: String::new(),
            secret: String::new(),
            collection: "users".to_string(),
        }
    }
}

/// Connectivity pre-check configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ConnectivityConfig {
    /// Gate every cycle on a connectivity probe.
    pub enabled: bool,

    /// TCP address that must accept a connection.
    pub target: String,

    /// Connect timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ConnectivityConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            target: "8.8.8.8:53".to_string(),
            timeout_secs: 5,
        }
    }
}

/// State store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite database path.
    pub path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: "monitor.db".to_string(),
        }
    }
}

/// Admin/status API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable the admin API.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,

    /// Admin API bind address.
    pub bind_address: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            // WARNING: This is a placeholder! Change this in production.
            api_key: "CHANGE_ME_IN_PRODUCTION".to_string(),
            bind_address: "127.0.0.1:8081".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Default log filter when `RUST_LOG` is unset.
    pub log_level: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "service_monitor=info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// How a service is probed.
///
/// Deserialized from a plain string so that a typo in the config file
/// surfaces as a failed check instead of a load error.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(from = "String", into = "String")]
pub enum CheckKind {
    /// Plain GET; 2xx/3xx is healthy.
    Reachability,
    /// GET against the admin surface (`/_/`); only 200 is healthy.
    AdminSurface,
    /// Multi-stage check driven by backend records.
    DeepHealth,
    /// Anything else found in the config file.
    Unrecognized(String),
}

impl From<String> for CheckKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "reachability" | "http" => CheckKind::Reachability,
            "admin_surface" | "pb_admin" => CheckKind::AdminSurface,
            "deep_health" | "scrapper" => CheckKind::DeepHealth,
            _ => CheckKind::Unrecognized(value),
        }
    }
}

impl From<CheckKind> for String {
    fn from(kind: CheckKind) -> Self {
        kind.to_string()
    }
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckKind::Reachability => write!(f, "reachability"),
            CheckKind::AdminSurface => write!(f, "admin_surface"),
            CheckKind::DeepHealth => write!(f, "deep_health"),
            CheckKind::Unrecognized(other) => write!(f, "{}", other),
        }
    }
}

/// A monitored service.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceDescriptor {
    /// Unique service name; the state store key.
    pub name: String,

    /// Probe strategy.
    pub kind: CheckKind,

    /// Base URL of the service.
    pub url: String,

    /// Owning organisation, for logs and the status API.
    #[serde(default)]
    pub group: String,

    /// Deep-health parameters; required for `deep_health`.
    #[serde(default)]
    pub deep_health: Option<DeepHealthConfig>,
}

/// Parameters for the record-driven deep health check.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeepHealthConfig {
    /// Backend base URL hosting the record collections.
    pub backend_url: String,

    /// Collection whose newest record proves liveness.
    pub collection: String,

    /// Timestamp field on that collection.
    pub time_field: String,

    /// Field holding a `stopped` marker.
    #[serde(default)]
    pub status_field: Option<String>,

    /// Collection holding error-level log entries.
    #[serde(default)]
    pub error_collection: Option<String>,

    /// Level field on the error collection.
    #[serde(default)]
    pub error_level_field: Option<String>,

    /// Collection holding per-partition metric snapshots.
    #[serde(default)]
    pub metrics_collection: Option<String>,
}
