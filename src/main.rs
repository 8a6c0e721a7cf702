//! Service health monitor.
//!
//! Periodically probes a configured set of services, keeps their state in a
//! local SQLite database and raises alerts after repeated failures.
//!
//! # Architecture Overview
//!
//! ```text
//!   ┌──────────────┐   ┌───────────────┐   ┌──────────────┐   ┌──────────────┐
//!   │   monitor    │──▶│    health     │──▶│    state     │──▶│    alert     │
//!   │  scheduler   │   │ probes + auth │   │ SQLite store │   │ log sink     │
//!   └──────┬───────┘   └───────────────┘   └──────┬───────┘   └──────────────┘
//!          │ manual trigger                       │ snapshots
//!   ┌──────┴──────────────────────────────────────┴───────┐
//!   │                   admin API (axum)                   │
//!   └──────────────────────────────────────────────────────┘
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use service_monitor::admin::{self, AdminState};
use service_monitor::alert::LogAlerter;
use service_monitor::config::loader::{load_config, load_from_env};
use service_monitor::health::HealthChecker;
use service_monitor::lifecycle::{signals, Shutdown};
use service_monitor::monitor::{ManualTrigger, Monitor};
use service_monitor::observability::{logging, metrics};
use service_monitor::state::{StateStore, SystemStatus};

#[derive(Parser)]
#[command(name = "service-monitor")]
#[command(about = "Periodic health monitor for web services", long_about = None)]
struct Cli {
    /// Path to the TOML config file. Without it, config comes from MONITOR_* variables.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => load_from_env()?,
    };

    logging::init(&config.observability);
    tracing::info!("service-monitor v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        services = config.services.len(),
        interval_secs = config.check.interval_secs,
        staleness_timeout_secs = config.check.staleness_timeout_secs,
        error_threshold = config.check.error_threshold,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let store = StateStore::open(Path::new(&config.storage.path)).inspect_err(|e| {
        tracing::error!(path = %config.storage.path, error = %e, "Cannot open state store");
    })?;

    let system = Arc::new(SystemStatus::new());
    let trigger = ManualTrigger::new();
    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(shutdown.clone());

    let admin_task = if config.admin.enabled {
        let listener = TcpListener::bind(&config.admin.bind_address).await?;
        let state = AdminState::new(store.clone(), system.clone(), trigger.clone(), &config.admin.api_key);
        Some(tokio::spawn(admin::serve(listener, state, shutdown.subscribe())))
    } else {
        None
    };

    let checker = HealthChecker::from_config(&config)?;
    let alerts = LogAlerter::new(config.check.local_offset());
    let monitor = Monitor::new(&config, checker, store.clone(), alerts)
        .with_system_status(system)
        .with_trigger(trigger);

    let outcome = monitor.run(shutdown.subscribe()).await;
    if let Err(e) = &outcome {
        tracing::error!(error = %e, "Monitor stopped on a persistence failure");
    }

    shutdown.trigger();
    if let Some(task) = admin_task {
        match task.await {
            Ok(Err(e)) => tracing::error!(error = %e, "Admin API failed"),
            Err(e) => tracing::error!(error = %e, "Admin API task panicked"),
            Ok(Ok(())) => {}
        }
    }

    store.close()?;
    outcome?;

    tracing::info!("Shutdown complete");
    Ok(())
}
