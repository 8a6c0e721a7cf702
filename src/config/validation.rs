//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check value ranges (interval > 0, threshold >= 1)
//! - Check service names are unique and URLs parse
//! - Check deep-health services carry their parameters
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: MonitorConfig → Result<(), Vec<ValidationError>>
//! - Unrecognized check kinds are not errors; the engine reports them per check

use std::collections::HashSet;
use std::fmt;

use url::Url;

use crate::config::schema::{CheckKind, MonitorConfig};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    /// What is wrong with it.
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &MonitorConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.check.interval_secs == 0 {
        errors.push(ValidationError::new("check.interval_secs", "must be greater than 0"));
    }
    if config.check.error_threshold == 0 {
        errors.push(ValidationError::new("check.error_threshold", "must be at least 1"));
    }
    if config.check.request_timeout_secs == 0 {
        errors.push(ValidationError::new("check.request_timeout_secs", "must be greater than 0"));
    }
    if !(-23..=23).contains(&config.check.timezone_offset_hours) {
        errors.push(ValidationError::new(
            "check.timezone_offset_hours",
            "must be between -23 and 23",
        ));
    }
    if config.connectivity.enabled && config.connectivity.target.is_empty() {
        errors.push(ValidationError::new("connectivity.target", "must not be empty"));
    }

    let mut seen = HashSet::new();
    for (i, service) in config.services.iter().enumerate() {
        let field = |name: &str| format!("services[{}].{}", i, name);

        if service.name.trim().is_empty() {
            errors.push(ValidationError::new(field("name"), "must not be empty"));
        } else if !seen.insert(service.name.as_str()) {
            errors.push(ValidationError::new(
                field("name"),
                format!("duplicate service name '{}'", service.name),
            ));
        }

        if let Err(e) = Url::parse(&service.url) {
            errors.push(ValidationError::new(field("url"), format!("invalid URL: {}", e)));
        }

        if let CheckKind::Unrecognized(kind) = &service.kind {
            tracing::warn!(service = %service.name, kind = %kind, "Unrecognized check kind; checks will fail");
        }

        if service.kind == CheckKind::DeepHealth {
            match &service.deep_health {
                None => errors.push(ValidationError::new(
                    field("deep_health"),
                    "required for deep_health checks",
                )),
                Some(deep) => {
                    if let Err(e) = Url::parse(&deep.backend_url) {
                        errors.push(ValidationError::new(
                            field("deep_health.backend_url"),
                            format!("invalid URL: {}", e),
                        ));
                    }
                    if deep.collection.is_empty() {
                        errors.push(ValidationError::new(field("deep_health.collection"), "must not be empty"));
                    }
                    if deep.time_field.is_empty() {
                        errors.push(ValidationError::new(field("deep_health.time_field"), "must not be empty"));
                    }
                    if deep.error_collection.is_some() && deep.error_level_field.is_none() {
                        errors.push(ValidationError::new(
                            field("deep_health.error_level_field"),
                            "required when error_collection is set",
                        ));
                    }
                }
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
