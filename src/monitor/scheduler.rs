//! Check cycle scheduling.
//!
//! # Responsibilities
//! - Run a full check cycle at startup, then every interval
//! - Run an extra cycle immediately on a manual trigger
//! - Gate each cycle on outbound connectivity
//! - Feed every result through the state store to the alert sink
//!
//! # Design Decisions
//! - Services in a cycle are probed one after another
//! - A persistence error ends the loop; the caller shuts the process down
//! - Shutdown interrupts both the interval wait and a running cycle
//! - Store writes run on the blocking pool; an interrupted write still commits or rolls back whole

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::broadcast;

use crate::alert::AlertSink;
use crate::config::{MonitorConfig, ServiceDescriptor};
use crate::health::{HealthChecker, TokenSource};
use crate::monitor::connectivity::ConnectivityProbe;
use crate::monitor::trigger::ManualTrigger;
use crate::observability::metrics;
use crate::state::{StateResult, StateStore, SystemStatus};

/// System error shown while the monitor itself is offline.
pub const CONNECTIVITY_LOST: &str = "network connection lost";

/// What a single cycle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Connectivity pre-check failed; no service was probed.
    Offline,
    /// Every service was probed and evaluated.
    Completed { ok: usize, total: usize },
}

/// Drives check cycles over the configured services.
pub struct Monitor<T: TokenSource, A: AlertSink> {
    services: Vec<ServiceDescriptor>,
    threshold: u32,
    interval: Duration,
    checker: HealthChecker<T>,
    store: StateStore,
    system: Arc<SystemStatus>,
    connectivity: ConnectivityProbe,
    trigger: ManualTrigger,
    alerts: A,
}

impl<T: TokenSource, A: AlertSink> Monitor<T, A> {
    pub fn new(config: &MonitorConfig, checker: HealthChecker<T>, store: StateStore, alerts: A) -> Self {
        Self {
            services: config.services.clone(),
            threshold: config.check.error_threshold,
            interval: Duration::from_secs(config.check.interval_secs),
            checker,
            store,
            system: Arc::new(SystemStatus::new()),
            connectivity: ConnectivityProbe::from_config(&config.connectivity),
            trigger: ManualTrigger::new(),
            alerts,
        }
    }

    /// Share a system status holder with display readers.
    pub fn with_system_status(mut self, system: Arc<SystemStatus>) -> Self {
        self.system = system;
        self
    }

    pub fn with_trigger(mut self, trigger: ManualTrigger) -> Self {
        self.trigger = trigger;
        self
    }

    pub fn with_connectivity(mut self, connectivity: ConnectivityProbe) -> Self {
        self.connectivity = connectivity;
        self
    }

    /// Run cycles until shutdown or a persistence failure.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) -> StateResult<()> {
        tracing::info!(
            interval_secs = self.interval.as_secs(),
            threshold = self.threshold,
            services = self.services.len(),
            "Monitor starting"
        );

        loop {
            tokio::select! {
                outcome = self.check_all() => {
                    outcome?;
                }
                _ = shutdown.recv() => {
                    tracing::info!("Monitor received shutdown signal during a cycle");
                    break;
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = self.trigger.fired() => {
                    tracing::info!("Manual check triggered");
                }
                _ = shutdown.recv() => {
                    tracing::info!("Monitor received shutdown signal, exiting loop");
                    break;
                }
            }
        }

        Ok(())
    }

    /// Run one full cycle over every service.
    pub async fn check_all(&self) -> StateResult<CycleOutcome> {
        let start = Instant::now();

        if !self.connectivity.is_online().await {
            metrics::record_connectivity(false);
            self.system.set_error(Some(CONNECTIVITY_LOST.to_string()));
            tracing::warn!("Connectivity lost; skipping service checks this cycle");
            return Ok(CycleOutcome::Offline);
        }
        metrics::record_connectivity(true);
        self.system.set_error(None);

        let total = self.services.len();
        tracing::info!(services = total, "===== Check cycle started =====");

        let mut ok = 0;
        for service in &self.services {
            let result = self.checker.check(service).await;
            let change = self
                .store
                .record_async(result, self.threshold)
                .await
                .inspect_err(|e| {
                    tracing::error!(service = %service.name, error = %e, "Failed to persist check result");
                })?;

            tracing::info!(
                service = %service.name,
                group = %service.group,
                "  [{}] {} - {}",
                if change.current_ok { "O" } else { "X" },
                service.name,
                change.message
            );
            self.alerts.dispatch(&change);

            if change.current_ok {
                ok += 1;
            }
        }

        metrics::record_cycle(start);
        tracing::info!(ok, total, "===== Check cycle finished: {}/{} healthy =====", ok, total);
        Ok(CycleOutcome::Completed { ok, total })
    }
}
