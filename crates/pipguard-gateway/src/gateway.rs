//! Broker gateway trait.
//!
//! Trait-based abstraction over the trading terminal connection.
//! This allows for:
//! - Dependency injection for testing
//! - A simulation backend with identical semantics
//! - Future flexibility in bridge transport

use std::pin::Pin;
use std::sync::Arc;

use pipguard_core::{PendingOrder, Position, Price, Symbol, Ticket};

use crate::error::GatewayResult;

/// Boxed future for dyn-compatible async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn std::future::Future<Output = T> + Send + 'a>>;

/// Stop-loss / take-profit modification request.
///
/// `None` fields keep the broker-side value unchanged; the optional
/// comment re-tags the position (progressive level bump).
#[derive(Debug, Clone, PartialEq)]
pub struct ModifyRequest {
    pub ticket: Ticket,
    pub stop_loss: Option<Price>,
    pub take_profit: Option<Price>,
    pub comment: Option<String>,
}

impl ModifyRequest {
    /// Modification that only moves the stop-loss.
    pub fn stop_loss_only(ticket: Ticket, stop_loss: Price) -> Self {
        Self {
            ticket,
            stop_loss: Some(stop_loss),
            take_profit: None,
            comment: None,
        }
    }
}

/// Connection to a trading terminal for one account.
///
/// Empty snapshots are not failures; a broker with no open positions
/// returns `Ok(vec![])`.
pub trait BrokerGateway: Send + Sync {
    /// Establish (or re-establish) the terminal session.
    fn connect(&self) -> BoxFuture<'_, GatewayResult<()>>;

    /// Tear down the session. Best-effort.
    fn disconnect(&self) -> BoxFuture<'_, GatewayResult<()>>;

    /// Cheap local connectivity check, no round-trip.
    fn is_connected(&self) -> bool;

    /// Snapshot of all open positions.
    fn positions(&self) -> BoxFuture<'_, GatewayResult<Vec<Position>>>;

    /// Snapshot of pending orders, optionally filtered by symbol.
    fn pending_orders<'a>(
        &'a self,
        symbol: Option<&'a Symbol>,
    ) -> BoxFuture<'a, GatewayResult<Vec<PendingOrder>>>;

    /// Quote precision (decimal digits) for a symbol.
    fn symbol_digits<'a>(&'a self, symbol: &'a Symbol) -> BoxFuture<'a, GatewayResult<u32>>;

    /// Modify SL/TP (and optionally the comment) of an open position.
    fn modify_position(&self, request: ModifyRequest) -> BoxFuture<'_, GatewayResult<()>>;

    /// Cancel a pending order.
    fn cancel_order(&self, ticket: Ticket) -> BoxFuture<'_, GatewayResult<()>>;

    /// Close an open position at market, full volume.
    fn close_position(&self, ticket: Ticket) -> BoxFuture<'_, GatewayResult<()>>;
}

/// Arc wrapper for gateway trait objects.
pub type DynGateway = Arc<dyn BrokerGateway>;
