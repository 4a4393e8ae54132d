//! Broker gateway abstraction for the pipguard position manager.
//!
//! `BrokerGateway` is the single seam between the engine and the
//! trading terminal. The trait is dyn-compatible (boxed futures) so
//! the engine can run against a live bridge, the in-memory
//! `SimGateway`, or a test double interchangeably.

pub mod error;
pub mod gateway;
pub mod retry;
pub mod sim;

pub use error::{BrokerError, GatewayResult};
pub use gateway::{BoxFuture, BrokerGateway, DynGateway, ModifyRequest};
pub use retry::RetryPolicy;
pub use sim::SimGateway;
