//! Multi-account TP securing bot.

pub mod app;
pub mod config;
pub mod error;

pub use app::Application;
pub use config::{AccountConfig, AppConfig};
pub use error::{AppError, AppResult};
