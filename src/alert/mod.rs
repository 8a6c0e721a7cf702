//! Alert dispatch.
//!
//! The dispatcher receives one `StateChange` per evaluated service per cycle.
//! It formats and forwards; it never writes state.

use chrono::{FixedOffset, Utc};

use crate::observability::metrics;
use crate::state::{StateChange, Transition};

/// Consumer of state transitions.
pub trait AlertSink: Send + Sync {
    fn dispatch(&self, change: &StateChange);
}

/// Writes alerts and recoveries to the log.
pub struct LogAlerter {
    local: FixedOffset,
}

impl LogAlerter {
    pub fn new(local: FixedOffset) -> Self {
        Self { local }
    }
}

impl AlertSink for LogAlerter {
    fn dispatch(&self, change: &StateChange) {
        let now = Utc::now().with_timezone(&self.local).format("%m/%d %H:%M");
        match change.transition() {
            Transition::Recovered => {
                metrics::record_alert(&change.service_name, "recovery");
                tracing::info!(
                    service = %change.service_name,
                    at = %now,
                    "[RECOVERED] {} is healthy again",
                    change.service_name
                );
            }
            Transition::Alert => {
                metrics::record_alert(&change.service_name, "alert");
                tracing::warn!(
                    service = %change.service_name,
                    error_count = change.error_count,
                    at = %now,
                    "[ALERT] {} | {} | {} consecutive failures",
                    change.service_name,
                    change.message,
                    change.error_count
                );
            }
            Transition::Pending if change.error_count == 1 => {
                tracing::info!(
                    service = %change.service_name,
                    "[PENDING] {} failed once (below threshold)",
                    change.service_name
                );
            }
            _ => {}
        }
    }
}

impl<S: AlertSink + ?Sized> AlertSink for std::sync::Arc<S> {
    fn dispatch(&self, change: &StateChange) {
        (**self).dispatch(change)
    }
}
