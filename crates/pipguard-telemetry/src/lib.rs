//! Logging, audit trail and activity reporting for pipguard.
//!
//! Three independent concerns:
//! - `logging`: tracing-subscriber setup (JSON in production)
//! - `audit`: append-only key-event file, terminal outcomes only
//! - `heartbeat` / `stats`: external liveness probe and periodic
//!   activity summaries

pub mod audit;
pub mod error;
pub mod heartbeat;
pub mod logging;
pub mod stats;

pub use audit::{AuditKind, AuditLog};
pub use error::{TelemetryError, TelemetryResult};
pub use heartbeat::Heartbeat;
pub use logging::init_logging;
pub use stats::ActivitySummary;
