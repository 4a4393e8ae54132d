//! Periodic activity summary.
//!
//! Lightweight counters accumulated per cycle and emitted as one
//! structured log line on a fixed cadence. `positions_secured` is
//! cumulative across the session; the per-interval counters reset
//! after every emission.

use std::collections::BTreeSet;
use std::time::{Duration, Instant};

use tracing::info;

/// Per-account activity counters.
pub struct ActivitySummary {
    account: String,
    interval: Duration,
    last_emit: Instant,

    positions_checked: u64,
    positions_secured: u64,
    pending_orders_deleted: u64,
    second_price_secured: u64,
    errors: u64,
    active_symbols: BTreeSet<String>,
}

impl ActivitySummary {
    pub fn new(account: impl Into<String>, interval: Duration) -> Self {
        Self {
            account: account.into(),
            interval,
            last_emit: Instant::now(),
            positions_checked: 0,
            positions_secured: 0,
            pending_orders_deleted: 0,
            second_price_secured: 0,
            errors: 0,
            active_symbols: BTreeSet::new(),
        }
    }

    pub fn record_checked(&mut self, count: u64) {
        self.positions_checked += count;
    }

    pub fn record_secured(&mut self) {
        self.positions_secured += 1;
    }

    pub fn record_pending_deleted(&mut self) {
        self.pending_orders_deleted += 1;
    }

    pub fn record_second_price_secured(&mut self) {
        self.second_price_secured += 1;
    }

    pub fn record_error(&mut self) {
        self.errors += 1;
    }

    pub fn record_symbol(&mut self, symbol: &str) {
        self.active_symbols.insert(symbol.to_string());
    }

    /// Emit the summary when the interval has elapsed (or `force`).
    /// Interval counters reset; the secured total is kept.
    pub fn maybe_emit(&mut self, force: bool) {
        if !force && self.last_emit.elapsed() < self.interval {
            return;
        }
        let symbols: Vec<&str> = self.active_symbols.iter().map(String::as_str).collect();
        info!(
            account = %self.account,
            positions_checked = self.positions_checked,
            positions_secured_total = self.positions_secured,
            pending_orders_deleted = self.pending_orders_deleted,
            second_price_secured = self.second_price_secured,
            errors = self.errors,
            active_symbols = ?symbols,
            "activity summary"
        );
        self.positions_checked = 0;
        self.pending_orders_deleted = 0;
        self.second_price_secured = 0;
        self.errors = 0;
        self.active_symbols.clear();
        self.last_emit = Instant::now();
    }

    #[must_use]
    pub fn positions_checked(&self) -> u64 {
        self.positions_checked
    }

    #[must_use]
    pub fn positions_secured(&self) -> u64 {
        self.positions_secured
    }

    #[must_use]
    pub fn pending_orders_deleted(&self) -> u64 {
        self.pending_orders_deleted
    }

    #[must_use]
    pub fn errors(&self) -> u64 {
        self.errors
    }
}
