//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → loader.rs (MONITOR_* environment overrides)
//!     → validation.rs (semantic checks)
//!     → MonitorConfig (validated, immutable)
//!     → shared with the checker, store and scheduler
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use schema::MonitorConfig;
pub use schema::CheckConfig;
pub use schema::AuthConfig;
pub use schema::ConnectivityConfig;
pub use schema::AdminConfig;
pub use schema::ObservabilityConfig;
pub use schema::ServiceDescriptor;
pub use schema::DeepHealthConfig;
pub use schema::CheckKind;
