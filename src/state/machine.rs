//! Per-service alert state machine.
//!
//! # States
//! - Ok: last probe succeeded
//! - Pending: failing, below the alert threshold (not yet alerted)
//! - Error: failing, alert sent
//!
//! # State Transitions
//! ```text
//! Ok      → Pending: first failure (threshold > 1)
//! Pending → Error:   error_count reaches threshold (alert fires once)
//! Error   → Error:   further failures (no new alert)
//! Pending → Ok:      silent recovery, no recovery signal
//! Error   → Ok:      recovery signal
//! ```
//!
//! `evaluate` is pure; persistence lives in `store.rs`.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::health::ProbeResult;

/// Persisted status of a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    Ok,
    Error,
}

impl ServiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceStatus::Ok => "ok",
            ServiceStatus::Error => "error",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "ok" => Some(ServiceStatus::Ok),
            "error" => Some(ServiceStatus::Error),
            _ => None,
        }
    }
}

impl fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a display should show for a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayStatus {
    Ok,
    /// Failing but below the alert threshold.
    Pending,
    Error,
}

/// Stored state of one service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceStateRow {
    pub status: ServiceStatus,
    pub message: String,
    pub error_count: u32,
    pub alerted: bool,
    pub last_checked: Option<DateTime<Utc>>,
    pub first_error_at: Option<DateTime<Utc>>,
}

impl Default for ServiceStateRow {
    fn default() -> Self {
        Self {
            status: ServiceStatus::Ok,
            message: String::new(),
            error_count: 0,
            alerted: false,
            last_checked: None,
            first_error_at: None,
        }
    }
}

impl ServiceStateRow {
    pub fn display_status(&self) -> DisplayStatus {
        match (self.status, self.alerted) {
            (ServiceStatus::Ok, _) => DisplayStatus::Ok,
            (ServiceStatus::Error, false) => DisplayStatus::Pending,
            (ServiceStatus::Error, true) => DisplayStatus::Error,
        }
    }
}

/// Transition category of a single evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    /// Ok, and was ok (or a silent recovery from pending).
    Healthy,
    /// Ok after an alerted outage.
    Recovered,
    /// Failing below the threshold.
    Pending,
    /// Threshold reached now; alert fires.
    Alert,
    /// Failing and already alerted.
    StillFailing,
}

/// Outcome of one evaluation, handed to the alert dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateChange {
    pub service_name: String,
    pub current_ok: bool,
    pub message: String,
    pub error_count: u32,
    pub should_alert: bool,
    pub is_recovery: bool,
    pub already_alerted: bool,
}

impl StateChange {
    pub fn transition(&self) -> Transition {
        if self.current_ok {
            if self.is_recovery {
                Transition::Recovered
            } else {
                Transition::Healthy
            }
        } else if self.should_alert {
            Transition::Alert
        } else if self.already_alerted {
            Transition::StillFailing
        } else {
            Transition::Pending
        }
    }
}

/// Compute the next row and the transition for `result`.
///
/// `threshold` is the consecutive failure count at which an alert fires.
pub fn evaluate(previous: &ServiceStateRow, result: &ProbeResult, threshold: u32) -> (ServiceStateRow, StateChange) {
    if result.ok {
        let is_recovery = previous.status != ServiceStatus::Ok && previous.error_count >= threshold;
        let row = ServiceStateRow {
            status: ServiceStatus::Ok,
            message: result.message.clone(),
            error_count: 0,
            alerted: false,
            last_checked: Some(result.checked_at),
            first_error_at: None,
        };
        let change = StateChange {
            service_name: result.service_name.clone(),
            current_ok: true,
            message: result.message.clone(),
            error_count: 0,
            should_alert: false,
            is_recovery,
            already_alerted: false,
        };
        return (row, change);
    }

    let error_count = previous.error_count.saturating_add(1);
    let should_alert = error_count >= threshold && !previous.alerted;
    let already_alerted = previous.alerted;

    let row = ServiceStateRow {
        status: ServiceStatus::Error,
        message: result.message.clone(),
        error_count,
        alerted: should_alert || already_alerted,
        last_checked: Some(result.checked_at),
        first_error_at: previous.first_error_at.or(Some(result.checked_at)),
    };
    let change = StateChange {
        service_name: result.service_name.clone(),
        current_ok: false,
        message: result.message.clone(),
        error_count,
        should_alert,
        is_recovery: false,
        already_alerted,
    };
    (row, change)
}
