//! In-memory broker simulation.
//!
//! Backs simulation-mode accounts and doubles as the test gateway for
//! engine tests: positions and pendings are seeded directly, prices
//! moved with `set_price`, and failures scripted with `fail_next_with`.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use pipguard_core::{OrderState, PendingOrder, Position, Price, Symbol, Ticket};

use crate::error::{BrokerError, GatewayResult};
use crate::gateway::{BoxFuture, BrokerGateway, ModifyRequest};

#[derive(Debug, Default)]
struct SimState {
    positions: Vec<Position>,
    pendings: Vec<PendingOrder>,
    digits: HashMap<Symbol, u32>,
    /// Scripted failures, consumed one per mutating call.
    fail_queue: VecDeque<BrokerError>,
    cancelled: Vec<Ticket>,
    closed: Vec<Ticket>,
    modifies: Vec<ModifyRequest>,
}

/// Simulated broker gateway.
#[derive(Debug, Default)]
pub struct SimGateway {
    state: Mutex<SimState>,
    connected: AtomicBool,
}

impl SimGateway {
    pub fn new() -> Self {
        let gateway = Self::default();
        gateway.connected.store(true, Ordering::SeqCst);
        gateway
    }

    pub fn push_position(&self, position: Position) {
        self.state.lock().positions.push(position);
    }

    pub fn push_pending(&self, order: PendingOrder) {
        self.state.lock().pendings.push(order);
    }

    pub fn set_digits(&self, symbol: Symbol, digits: u32) {
        self.state.lock().digits.insert(symbol, digits);
    }

    /// Move the quote for every open position on `symbol`.
    pub fn set_price(&self, symbol: &Symbol, price: Price) {
        let mut state = self.state.lock();
        for position in state.positions.iter_mut() {
            if &position.symbol == symbol {
                position.current_price = price;
            }
        }
    }

    /// Queue a failure for the next mutating call.
    pub fn fail_next_with(&self, error: BrokerError) {
        self.state.lock().fail_queue.push_back(error);
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    /// Current snapshot of a position, if still open.
    pub fn position(&self, ticket: Ticket) -> Option<Position> {
        self.state
            .lock()
            .positions
            .iter()
            .find(|p| p.ticket == ticket)
            .cloned()
    }

    pub fn cancelled(&self) -> Vec<Ticket> {
        self.state.lock().cancelled.clone()
    }

    pub fn closed(&self) -> Vec<Ticket> {
        self.state.lock().closed.clone()
    }

    pub fn modifies(&self) -> Vec<ModifyRequest> {
        self.state.lock().modifies.clone()
    }

    fn take_scripted_failure(state: &mut SimState) -> Option<BrokerError> {
        state.fail_queue.pop_front()
    }

    fn check_connected(&self) -> GatewayResult<()> {
        if self.connected.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(BrokerError::NotConnected)
        }
    }
}

impl BrokerGateway for SimGateway {
    fn connect(&self) -> BoxFuture<'_, GatewayResult<()>> {
        Box::pin(async move {
            self.connected.store(true, Ordering::SeqCst);
            Ok(())
        })
    }

    fn disconnect(&self) -> BoxFuture<'_, GatewayResult<()>> {
        Box::pin(async move {
            self.connected.store(false, Ordering::SeqCst);
            Ok(())
        })
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn positions(&self) -> BoxFuture<'_, GatewayResult<Vec<Position>>> {
        Box::pin(async move {
            self.check_connected()?;
            Ok(self.state.lock().positions.clone())
        })
    }

    fn pending_orders<'a>(
        &'a self,
        symbol: Option<&'a Symbol>,
    ) -> BoxFuture<'a, GatewayResult<Vec<PendingOrder>>> {
        Box::pin(async move {
            self.check_connected()?;
            let state = self.state.lock();
            Ok(state
                .pendings
                .iter()
                .filter(|order| symbol.map_or(true, |s| &order.symbol == s))
                .cloned()
                .collect())
        })
    }

    fn symbol_digits<'a>(&'a self, symbol: &'a Symbol) -> BoxFuture<'a, GatewayResult<u32>> {
        Box::pin(async move {
            self.check_connected()?;
            Ok(self.state.lock().digits.get(symbol).copied().unwrap_or(5))
        })
    }

    fn modify_position(&self, request: ModifyRequest) -> BoxFuture<'_, GatewayResult<()>> {
        Box::pin(async move {
            self.check_connected()?;
            let mut state = self.state.lock();
            if let Some(err) = Self::take_scripted_failure(&mut state) {
                return Err(err);
            }
            let position = state
                .positions
                .iter_mut()
                .find(|p| p.ticket == request.ticket)
                .ok_or(BrokerError::UnknownTicket(request.ticket))?;
            if let Some(sl) = request.stop_loss {
                position.stop_loss = sl;
            }
            if let Some(tp) = request.take_profit {
                position.take_profit = tp;
            }
            if let Some(comment) = &request.comment {
                position.comment = comment.clone();
            }
            state.modifies.push(request);
            Ok(())
        })
    }

    fn cancel_order(&self, ticket: Ticket) -> BoxFuture<'_, GatewayResult<()>> {
        Box::pin(async move {
            self.check_connected()?;
            let mut state = self.state.lock();
            if let Some(err) = Self::take_scripted_failure(&mut state) {
                return Err(err);
            }
            let order = state
                .pendings
                .iter_mut()
                .find(|o| o.ticket == ticket && o.state.is_active())
                .ok_or(BrokerError::UnknownTicket(ticket))?;
            order.state = OrderState::Cancelled;
            state.cancelled.push(ticket);
            Ok(())
        })
    }

    fn close_position(&self, ticket: Ticket) -> BoxFuture<'_, GatewayResult<()>> {
        Box::pin(async move {
            self.check_connected()?;
            let mut state = self.state.lock();
            if let Some(err) = Self::take_scripted_failure(&mut state) {
                return Err(err);
            }
            let idx = state
                .positions
                .iter()
                .position(|p| p.ticket == ticket)
                .ok_or(BrokerError::UnknownTicket(ticket))?;
            state.positions.remove(idx);
            state.closed.push(ticket);
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipguard_core::{Direction, PendingOrderType, Volume};
    use rust_decimal_macros::dec;

    fn sample_position(ticket: u64) -> Position {
        Position {
            ticket: Ticket(ticket),
            symbol: Symbol::new("EURUSD"),
            direction: Direction::Buy,
            volume: Volume::new(dec!(0.1)),
            open_price: Price::new(dec!(1.1000)),
            stop_loss: Price::ZERO,
            take_profit: Price::new(dec!(1.1050)),
            current_price: Price::new(dec!(1.1000)),
            open_time: 1_700_000_000,
            comment: String::new(),
        }
    }

    #[tokio::test]
    async fn test_modify_updates_snapshot() {
        let gw = SimGateway::new();
        gw.push_position(sample_position(1));

        gw.modify_position(ModifyRequest::stop_loss_only(
            Ticket(1),
            Price::new(dec!(1.1000)),
        ))
        .await
        .unwrap();

        let pos = gw.position(Ticket(1)).unwrap();
        assert_eq!(pos.stop_loss, Price::new(dec!(1.1000)));
        assert_eq!(pos.take_profit, Price::new(dec!(1.1050)));
    }

    #[tokio::test]
    async fn test_unknown_ticket() {
        let gw = SimGateway::new();
        let err = gw
            .modify_position(ModifyRequest::stop_loss_only(
                Ticket(99),
                Price::new(dec!(1.0)),
            ))
            .await
            .unwrap_err();
        assert!(err.is_stale());
    }

    #[tokio::test]
    async fn test_cancel_only_hits_active_orders() {
        let gw = SimGateway::new();
        gw.push_pending(PendingOrder {
            ticket: Ticket(5),
            symbol: Symbol::new("EURUSD"),
            order_type: PendingOrderType::BuyStop,
            entry_price: Price::new(dec!(1.1100)),
            setup_time: 1_700_000_000,
            state: OrderState::Placed,
        });

        gw.cancel_order(Ticket(5)).await.unwrap();
        assert_eq!(gw.cancelled(), vec![Ticket(5)]);

        // second cancel: order is no longer active
        let err = gw.cancel_order(Ticket(5)).await.unwrap_err();
        assert!(err.is_stale());
    }

    #[tokio::test]
    async fn test_scripted_failure_consumed_once() {
        let gw = SimGateway::new();
        gw.push_position(sample_position(1));
        gw.fail_next_with(BrokerError::Requote);

        let err = gw
            .modify_position(ModifyRequest::stop_loss_only(
                Ticket(1),
                Price::new(dec!(1.1)),
            ))
            .await
            .unwrap_err();
        assert!(err.is_retryable());

        gw.modify_position(ModifyRequest::stop_loss_only(
            Ticket(1),
            Price::new(dec!(1.1)),
        ))
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_disconnected_gateway_rejects_reads() {
        let gw = SimGateway::new();
        gw.set_connected(false);
        assert!(matches!(
            gw.positions().await,
            Err(BrokerError::NotConnected)
        ));

        gw.connect().await.unwrap();
        assert!(gw.positions().await.unwrap().is_empty());
    }
}
