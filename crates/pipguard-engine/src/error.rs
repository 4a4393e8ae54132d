//! Error types for pipguard-engine.

use thiserror::Error;

/// Engine error types.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("State store error: {0}")]
    Store(#[from] pipguard_persistence::PersistenceError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] pipguard_telemetry::TelemetryError),
}

/// Result type alias for engine operations.
pub type EngineResult<T> = std::result::Result<T, EngineError>;
