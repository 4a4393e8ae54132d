//! Trigger execution.
//!
//! When a TP1 leg fires the dispatcher runs the three-step sequence:
//! 1. secure (or progress) the TP1 leg itself
//! 2. breakeven-secure every sibling leg
//! 3. resolve the second price level: cancel matching pendings
//!    (Rule 1) or secure active second-price positions at the first
//!    group's entry (Rule 2)
//!
//! Step 1 failing aborts the whole sequence so the group can retry
//! next cycle. Later steps are independent per item: one failed
//! sibling never blocks the rest.
//!
//! Only terminal outcomes reach the audit log; retries are handled
//! below this layer and logged as warnings.

use std::time::Duration;

use pipguard_core::{precision_threshold, Position, Price, SignalTag};
use pipguard_gateway::{BrokerGateway, ModifyRequest, RetryPolicy};
use pipguard_telemetry::{ActivitySummary, AuditKind, AuditLog};
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::grouper::SignalGroup;
use crate::ladder::LadderCache;
use crate::tracker::SessionTracker;

const MODIFY_RETRY: RetryPolicy = RetryPolicy::new(3, Duration::from_millis(500));
const CANCEL_RETRY: RetryPolicy = RetryPolicy::new(2, Duration::from_millis(500));

/// Executes the securing sequence for one fired group.
pub struct Dispatcher<'a> {
    pub gateway: &'a dyn BrokerGateway,
    pub tracker: &'a mut SessionTracker,
    pub audit: &'a AuditLog,
    pub stats: &'a mut ActivitySummary,
    pub config: &'a EngineConfig,
    pub ladders: &'a LadderCache,
}

impl<'a> Dispatcher<'a> {
    /// Run the full sequence. Returns false when step 1 failed and
    /// the trigger should be retried next cycle.
    pub async fn handle_trigger(&mut self, tp1: &Position, group: &SignalGroup) -> bool {
        info!(
            ticket = tp1.ticket.0,
            symbol = %tp1.symbol,
            group = %group.key,
            "TP1 reached, securing group"
        );

        let secured = if self.config.progressive {
            self.secure_or_progress(tp1).await
        } else {
            self.secure_at_entry(tp1, true).await
        };
        if !secured {
            return false;
        }

        for sibling in &group.members {
            if sibling.ticket == tp1.ticket || self.tracker.is_secured(sibling.ticket) {
                continue;
            }
            self.secure_at_entry(sibling, false).await;
        }

        self.resolve_second_price(group, tp1.open_price).await;
        true
    }

    /// Move a position's stop-loss to its own entry, preserving TP.
    /// An SL already at entry counts as success without a broker
    /// call; a stale ticket means the position is already gone.
    pub async fn secure_at_entry(&mut self, position: &Position, tp1_event: bool) -> bool {
        let gateway = self.gateway;
        let threshold = self.precision_for(&position.symbol).await;

        if !position.stop_loss.is_zero()
            && (position.stop_loss.inner() - position.open_price.inner()).abs() < threshold
        {
            debug!(ticket = position.ticket.0, "SL already at entry");
            self.tracker.mark_secured(position.ticket);
            return true;
        }

        let request = ModifyRequest::stop_loss_only(position.ticket, position.open_price);
        match MODIFY_RETRY.run(|| gateway.modify_position(request.clone())).await {
            Ok(()) => {
                self.tracker.mark_secured(position.ticket);
                self.stats.record_secured();
                // only the triggering leg is audited; siblings ride
                // along without their own TP1 event
                if tp1_event {
                    self.audit_event(
                        AuditKind::Tp1Secured,
                        format!(
                            "ticket {} {} SL -> {} (breakeven)",
                            position.ticket, position.symbol, position.open_price
                        ),
                    );
                }
                true
            }
            Err(err) if err.is_stale() => {
                debug!(ticket = position.ticket.0, "position already closed");
                true
            }
            Err(err) => {
                warn!(ticket = position.ticket.0, error = %err, "failed to secure position");
                if tp1_event {
                    self.audit_event(
                        AuditKind::Tp1SecureFailed,
                        format!("ticket {} {}: {err}", position.ticket, position.symbol),
                    );
                }
                self.stats.record_error();
                false
            }
        }
    }

    /// Progressive step 1: bump the TP1 leg to the next cached
    /// ladder level (SL to entry, TP to next rung, comment re-tagged)
    /// or close it at market when the ladder is exhausted. Falls back
    /// to a plain breakeven secure without a cached ladder.
    async fn secure_or_progress(&mut self, tp1: &Position) -> bool {
        let gateway = self.gateway;
        let tag = SignalTag::parse(&tp1.comment);
        let Some(group_id) = tag.group.clone() else {
            return self.secure_at_entry(tp1, true).await;
        };
        let Some(ladder) = self.ladders.get(&group_id) else {
            return self.secure_at_entry(tp1, true).await;
        };

        let next_rank = tag.rank as usize + 1;
        let next_level = if tag.rank as usize >= self.config.max_tp_levels as usize {
            None
        } else {
            ladder.level(next_rank)
        };

        match next_level {
            Some(next_tp) => {
                let request = ModifyRequest {
                    ticket: tp1.ticket,
                    stop_loss: Some(tp1.open_price),
                    take_profit: Some(next_tp),
                    comment: Some(SignalTag::encode(&group_id, next_rank as u8)),
                };
                match MODIFY_RETRY.run(|| gateway.modify_position(request.clone())).await {
                    Ok(()) => {
                        self.tracker.mark_secured(tp1.ticket);
                        self.stats.record_secured();
                        self.audit_event(
                            AuditKind::Tp1Secured,
                            format!(
                                "ticket {} {} SL -> {}, TP -> {} (level {})",
                                tp1.ticket, tp1.symbol, tp1.open_price, next_tp, next_rank
                            ),
                        );
                        true
                    }
                    Err(err) if err.is_stale() => true,
                    Err(err) => {
                        warn!(ticket = tp1.ticket.0, error = %err, "failed to progress position");
                        self.audit_event(
                            AuditKind::Tp1SecureFailed,
                            format!("ticket {} {}: {err}", tp1.ticket, tp1.symbol),
                        );
                        self.stats.record_error();
                        false
                    }
                }
            }
            None => match MODIFY_RETRY.run(|| gateway.close_position(tp1.ticket)).await {
                Ok(()) => {
                    self.tracker.mark_secured(tp1.ticket);
                    self.stats.record_secured();
                    self.audit_event(
                        AuditKind::Tp1Secured,
                        format!(
                            "ticket {} {} closed at market (ladder exhausted)",
                            tp1.ticket, tp1.symbol
                        ),
                    );
                    true
                }
                Err(err) if err.is_stale() => true,
                Err(err) => {
                    warn!(ticket = tp1.ticket.0, error = %err, "failed to close position");
                    self.audit_event(
                        AuditKind::Tp1SecureFailed,
                        format!("ticket {} {}: {err}", tp1.ticket, tp1.symbol),
                    );
                    self.stats.record_error();
                    false
                }
            },
        }
    }

    /// Rule 1 / Rule 2 resolution for the second price level.
    /// `first_entry` is the entry of the triggering TP1 leg.
    async fn resolve_second_price(&mut self, group: &SignalGroup, first_entry: Price) {
        let gateway = self.gateway;
        let symbol = &group.key.symbol;
        let direction = group.key.direction;

        let pendings = match gateway.pending_orders(Some(symbol)).await {
            Ok(orders) => orders,
            Err(err) => {
                warn!(%symbol, error = %err, "failed to fetch pending orders");
                self.stats.record_error();
                return;
            }
        };
        let active: Vec<_> = pendings
            .into_iter()
            .filter(|order| order.is_active_for(direction))
            .collect();

        if !active.is_empty() {
            // Rule 1: second level not yet live, cancel its orders
            for order in active {
                match CANCEL_RETRY.run(|| gateway.cancel_order(order.ticket)).await {
                    Ok(()) => {
                        self.stats.record_pending_deleted();
                        self.audit_event(
                            AuditKind::PendingDeleted,
                            format!("ticket {} {} @ {}", order.ticket, order.symbol, order.entry_price),
                        );
                    }
                    Err(err) if err.is_stale() => {
                        debug!(ticket = order.ticket.0, "pending order already gone");
                    }
                    Err(err) => {
                        warn!(ticket = order.ticket.0, error = %err, "failed to cancel pending order");
                        self.audit_event(
                            AuditKind::PendingDeleteFailed,
                            format!("ticket {} {}: {err}", order.ticket, order.symbol),
                        );
                        self.stats.record_error();
                    }
                }
            }
            return;
        }

        // Rule 2: second level already active, secure it at the
        // first group's entry
        let positions = match gateway.positions().await {
            Ok(positions) => positions,
            Err(err) => {
                warn!(%symbol, error = %err, "failed to fetch positions");
                self.stats.record_error();
                return;
            }
        };
        let threshold = self.precision_for(symbol).await;

        for candidate in positions {
            if &candidate.symbol != symbol
                || candidate.direction != direction
                || group.contains(candidate.ticket)
            {
                continue;
            }
            if self.tracker.is_secured(candidate.ticket) {
                continue;
            }
            if !candidate.stop_loss.is_zero()
                && (candidate.stop_loss.inner() - first_entry.inner()).abs() < threshold
            {
                self.tracker.mark_secured(candidate.ticket);
                continue;
            }

            let request = ModifyRequest::stop_loss_only(candidate.ticket, first_entry);
            match MODIFY_RETRY.run(|| gateway.modify_position(request.clone())).await {
                Ok(()) => {
                    self.tracker.mark_secured(candidate.ticket);
                    self.stats.record_second_price_secured();
                    self.audit_event(
                        AuditKind::SecondPriceSecured,
                        format!(
                            "ticket {} {} SL -> {} (first group entry)",
                            candidate.ticket, candidate.symbol, first_entry
                        ),
                    );
                }
                Err(err) if err.is_stale() => {}
                Err(err) => {
                    warn!(ticket = candidate.ticket.0, error = %err, "failed to secure second-price position");
                    self.audit_event(
                        AuditKind::SecondPriceSecureFailed,
                        format!("ticket {} {}: {err}", candidate.ticket, candidate.symbol),
                    );
                    self.stats.record_error();
                }
            }
        }
    }

    async fn precision_for(&self, symbol: &pipguard_core::Symbol) -> rust_decimal::Decimal {
        let digits = match self.gateway.symbol_digits(symbol).await {
            Ok(digits) => digits,
            Err(err) => {
                debug!(%symbol, error = %err, "digits lookup failed, assuming 5");
                5
            }
        };
        precision_threshold(digits)
    }

    fn audit_event(&self, kind: AuditKind, payload: String) {
        if let Err(err) = self.audit.record(kind, payload) {
            warn!(error = %err, "failed to write audit entry");
        }
    }
}
