//! Configuration loading from disk and the environment.

use std::path::Path;
use std::fs;
use crate::config::schema::MonitorConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Env { var: &'static str, value: String },
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Env { var, value } => write!(f, "Invalid value for {}: '{}'", var, value),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load, apply environment overrides to, and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<MonitorConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: MonitorConfig = toml::from_str(&content).map_err(ConfigError::Parse)?;
    finish(config, |key| std::env::var(key).ok())
}

/// Build a configuration from defaults plus the environment (no file).
pub fn load_from_env() -> Result<MonitorConfig, ConfigError> {
    finish(MonitorConfig::default(), |key| std::env::var(key).ok())
}

fn finish<F>(mut config: MonitorConfig, lookup: F) -> Result<MonitorConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    apply_env_overrides(&mut config, lookup)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    tracing::debug!(services = config.services.len(), "Configuration loaded");
    Ok(config)
}

/// Apply `MONITOR_*` environment overrides.
///
/// Credentials normally arrive this way so they stay out of the config file.
pub fn apply_env_overrides<F>(config: &mut MonitorConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(identity) = lookup("MONITOR_AUTH_IDENTITY") {
        config.auth.identity = identity;
    }
    if let Some(secret) = lookup("MONITOR_AUTH_SECRET") {
        config.auth.secret = secret;
    }
    if let Some(path) = lookup("MONITOR_DB_PATH") {
        config.storage.path = path;
    }
    if let Some(value) = lookup("MONITOR_CHECK_INTERVAL") {
        config.check.interval_secs = parse_env("MONITOR_CHECK_INTERVAL", value)?;
    }
    if let Some(value) = lookup("MONITOR_STALENESS_TIMEOUT") {
        config.check.staleness_timeout_secs = parse_env("MONITOR_STALENESS_TIMEOUT", value)?;
    }
    if let Some(value) = lookup("MONITOR_ERROR_THRESHOLD") {
        config.check.error_threshold = parse_env("MONITOR_ERROR_THRESHOLD", value)?;
    }
    Ok(())
}

fn parse_env<T: std::str::FromStr>(var: &'static str, value: String) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Env { var, value })
}
