//! Broker error taxonomy.
//!
//! The split that matters downstream is retryable vs terminal vs
//! stale: transient transport failures get retried with backoff,
//! broker rejections abort retries for that item, and unknown-ticket
//! errors mean the position already left the book.

use pipguard_core::Ticket;
use thiserror::Error;

/// Errors surfaced by a broker gateway.
#[derive(Debug, Clone, Error)]
pub enum BrokerError {
    #[error("Request timed out")]
    Timeout,

    #[error("Requote received")]
    Requote,

    #[error("Connection to terminal lost")]
    ConnectionLost,

    #[error("Invalid stops for request")]
    InvalidStops,

    #[error("Trading disabled for account or symbol")]
    TradingDisabled,

    #[error("Market closed")]
    MarketClosed,

    #[error("Unknown ticket: {0}")]
    UnknownTicket(Ticket),

    #[error("Gateway not connected")]
    NotConnected,

    #[error("Broker error {code}: {message}")]
    Other { code: i32, message: String },
}

impl BrokerError {
    /// Transient failures worth retrying with backoff.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            BrokerError::Timeout | BrokerError::Requote | BrokerError::ConnectionLost
        )
    }

    /// The referenced position/order no longer exists at the broker.
    /// Callers treat this as "nothing left to do".
    #[must_use]
    pub fn is_stale(&self) -> bool {
        matches!(self, BrokerError::UnknownTicket(_))
    }
}

/// Result type alias for gateway operations.
pub type GatewayResult<T> = std::result::Result<T, BrokerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(BrokerError::Timeout.is_retryable());
        assert!(BrokerError::Requote.is_retryable());
        assert!(BrokerError::ConnectionLost.is_retryable());

        assert!(!BrokerError::InvalidStops.is_retryable());
        assert!(!BrokerError::TradingDisabled.is_retryable());
        assert!(!BrokerError::MarketClosed.is_retryable());
        assert!(!BrokerError::UnknownTicket(Ticket(7)).is_retryable());
    }

    #[test]
    fn test_stale_classification() {
        assert!(BrokerError::UnknownTicket(Ticket(7)).is_stale());
        assert!(!BrokerError::Timeout.is_stale());
    }
}
