//! State & alert decision subsystem.
//!
//! # Data Flow
//! ```text
//! ProbeResult
//!     → store.rs: load row (or default) ─┐
//!     → machine.rs: evaluate (pure)      │ one transaction
//!     → store.rs: write row + history ───┘
//!     → StateChange → alert dispatcher
//!
//! Display readers:
//!     store.rs all_states() + system.rs system error → StatusReport
//! ```
//!
//! # Design Decisions
//! - The transition function never touches the database
//! - Missing rows become explicit defaults at the store boundary
//! - Persistence errors are fatal; zeroed state would erase real streaks

pub mod error;
pub mod machine;
pub mod store;
pub mod system;

pub use error::{StateError, StateResult};
pub use machine::{evaluate, DisplayStatus, ServiceStateRow, ServiceStatus, StateChange, Transition};
pub use store::{HistoryEntry, ServiceSnapshot, StateStore, HISTORY_LIMIT};
pub use system::{StatusReport, SystemStatus};
