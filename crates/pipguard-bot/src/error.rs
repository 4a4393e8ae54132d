//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Engine error: {0}")]
    Engine(#[from] pipguard_engine::EngineError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] pipguard_telemetry::TelemetryError),

    #[error("Persistence error: {0}")]
    Persistence(#[from] pipguard_persistence::PersistenceError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;
