//! Core domain types for the pipguard position manager.
//!
//! This crate provides the fundamental types shared across the system:
//! - `Price`, `Volume`: precision-safe numeric types
//! - `Symbol`, `Direction`: instrument identity and trade side
//! - `Position`, `PendingOrder`: read-only broker snapshots
//! - pip-size normalization across symbol naming conventions
//! - the `_TP<n>` signal-tag comment codec

pub mod decimal;
pub mod error;
pub mod pip;
pub mod position;
pub mod symbol;
pub mod tag;

pub use decimal::{Price, Volume};
pub use error::{CoreError, Result};
pub use pip::{pip_size, precision_threshold};
pub use position::{OrderState, PendingOrder, PendingOrderType, Position, Ticket};
pub use symbol::{Direction, Symbol};
pub use tag::SignalTag;
