//! Service health monitor library.

pub mod admin;
pub mod alert;
pub mod config;
pub mod health;
pub mod lifecycle;
pub mod monitor;
pub mod observability;
pub mod state;

pub use config::MonitorConfig;
pub use health::HealthChecker;
pub use lifecycle::Shutdown;
pub use monitor::Monitor;
pub use state::StateStore;
