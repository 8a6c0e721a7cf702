//! Monitoring loop.
//!
//! # Data Flow
//! ```text
//! interval tick | manual trigger
//!     → connectivity.rs (pre-check; offline sets the system error)
//!     → scheduler.rs: for each service, sequentially
//!         → health::HealthChecker::check
//!         → state::StateStore::record
//!         → alert::AlertSink::dispatch
//! ```

pub mod connectivity;
pub mod scheduler;
pub mod trigger;

pub use connectivity::ConnectivityProbe;
pub use scheduler::{CycleOutcome, Monitor, CONNECTIVITY_LOST};
pub use trigger::ManualTrigger;
