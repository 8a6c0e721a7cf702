//! System-wide error state.
//!
//! Set when the whole service set cannot be checked (no connectivity) and
//! cleared once a cycle gets through again. Displays must show it instead of
//! per-service state while it is set.

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use serde::Serialize;

use crate::state::store::ServiceSnapshot;

/// Shared, lock-free holder for the current system error.
#[derive(Debug, Default)]
pub struct SystemStatus {
    error: ArcSwapOption<String>,
}

impl SystemStatus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set or clear the system error. Logs only on change.
    pub fn set_error(&self, message: Option<String>) {
        let previous = self.error.swap(message.clone().map(Arc::new));
        match (previous.as_deref(), message.as_deref()) {
            (None, Some(new)) => tracing::warn!(error = %new, "System error set"),
            (Some(old), None) => tracing::info!(previous = %old, "System error cleared"),
            (Some(old), Some(new)) if old != new => tracing::warn!(error = %new, "System error changed"),
            _ => {}
        }
    }

    pub fn error(&self) -> Option<String> {
        self.error.load_full().map(|e| e.as_ref().clone())
    }
}

/// Everything a display needs in one read.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    /// Overrides `services` when set.
    pub system_error: Option<String>,
    pub services: Vec<ServiceSnapshot>,
}
