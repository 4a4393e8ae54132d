//! Broker position and pending-order snapshots.
//!
//! These are read-only views of broker state. The engine never mutates
//! them directly; all changes go through the gateway as modify, cancel
//! or close requests.

use crate::decimal::{Price, Volume};
use crate::symbol::{Direction, Symbol};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Broker-assigned position/order identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ticket(pub u64);

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Open position snapshot as reported by the broker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub ticket: Ticket,
    pub symbol: Symbol,
    pub direction: Direction,
    pub volume: Volume,
    pub open_price: Price,
    /// `Price::ZERO` means no stop-loss set.
    pub stop_loss: Price,
    /// `Price::ZERO` means no take-profit set.
    pub take_profit: Price,
    pub current_price: Price,
    /// Unix timestamp (seconds) of position open.
    pub open_time: i64,
    /// Broker comment field, may carry a `_TP<n>` signal tag.
    pub comment: String,
}

impl Position {
    #[inline]
    pub fn has_take_profit(&self) -> bool {
        !self.take_profit.is_zero()
    }

    /// Position age in seconds relative to `now` (unix seconds).
    #[inline]
    pub fn age_secs(&self, now: i64) -> i64 {
        now - self.open_time
    }
}

/// Pending order type. Stop-limit variants are treated like their
/// plain counterparts for direction matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PendingOrderType {
    BuyLimit,
    BuyStop,
    BuyStopLimit,
    SellLimit,
    SellStop,
    SellStopLimit,
}

impl PendingOrderType {
    /// Direction the order would open if filled.
    #[inline]
    pub fn direction(&self) -> Direction {
        match self {
            PendingOrderType::BuyLimit
            | PendingOrderType::BuyStop
            | PendingOrderType::BuyStopLimit => Direction::Buy,
            PendingOrderType::SellLimit
            | PendingOrderType::SellStop
            | PendingOrderType::SellStopLimit => Direction::Sell,
        }
    }
}

/// Lifecycle state of a pending order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderState {
    Placed,
    Started,
    Filled,
    Cancelled,
    Rejected,
    Expired,
}

impl OrderState {
    /// Only orders still working at the broker count as active.
    #[inline]
    pub fn is_active(&self) -> bool {
        matches!(self, OrderState::Placed | OrderState::Started)
    }
}

/// Pending order snapshot as reported by the broker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingOrder {
    pub ticket: Ticket,
    pub symbol: Symbol,
    pub order_type: PendingOrderType,
    pub entry_price: Price,
    /// Unix timestamp (seconds) of order placement.
    pub setup_time: i64,
    pub state: OrderState,
}

impl PendingOrder {
    /// Active and opening in the given direction.
    #[inline]
    pub fn is_active_for(&self, direction: Direction) -> bool {
        self.state.is_active() && self.order_type.direction() == direction
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn pending(order_type: PendingOrderType, state: OrderState) -> PendingOrder {
        PendingOrder {
            ticket: Ticket(42),
            symbol: Symbol::new("EURUSD"),
            order_type,
            entry_price: Price::new(dec!(1.0950)),
            setup_time: 1_700_000_000,
            state,
        }
    }

    #[test]
    fn test_order_type_direction() {
        assert_eq!(PendingOrderType::BuyLimit.direction(), Direction::Buy);
        assert_eq!(PendingOrderType::BuyStopLimit.direction(), Direction::Buy);
        assert_eq!(PendingOrderType::SellStop.direction(), Direction::Sell);
    }

    #[test]
    fn test_is_active_for() {
        let p = pending(PendingOrderType::BuyStop, OrderState::Placed);
        assert!(p.is_active_for(Direction::Buy));
        assert!(!p.is_active_for(Direction::Sell));

        let cancelled = pending(PendingOrderType::BuyStop, OrderState::Cancelled);
        assert!(!cancelled.is_active_for(Direction::Buy));

        let started = pending(PendingOrderType::SellLimit, OrderState::Started);
        assert!(started.is_active_for(Direction::Sell));
    }

    #[test]
    fn test_position_age() {
        let pos = Position {
            ticket: Ticket(1),
            symbol: Symbol::new("EURUSD"),
            direction: Direction::Buy,
            volume: Volume::new(dec!(0.1)),
            open_price: Price::new(dec!(1.1)),
            stop_loss: Price::ZERO,
            take_profit: Price::ZERO,
            current_price: Price::new(dec!(1.1)),
            open_time: 1_000,
            comment: String::new(),
        };
        assert_eq!(pos.age_secs(1_400), 400);
        assert!(!pos.has_take_profit());
    }
}
