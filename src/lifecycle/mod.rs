//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Open state store → Start admin API → Start monitor
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Interrupt monitor wait/cycle → Stop admin API → Close store
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Fail fast: a state store that cannot be opened is fatal
//! - The store closes last, after every task holding it has stopped

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
