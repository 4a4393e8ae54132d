//! Session idempotency tracker.
//!
//! Two sets guarantee at-most-once behavior:
//! - `secured`: tickets already acted on this session, cleared when
//!   the broker reports a flat book (old tickets can never return)
//! - `hit_groups`: group keys whose TP1 already fired, intersected
//!   with live keys each cycle; in progressive mode backed by an
//!   append-only store so a restart never re-fires a level

use std::collections::HashSet;

use pipguard_core::Ticket;
use pipguard_persistence::HitGroupStore;
use tracing::warn;

use crate::error::EngineResult;
use crate::grouper::GroupKey;

/// Per-account idempotency state.
pub struct SessionTracker {
    secured: HashSet<Ticket>,
    hit_groups: HashSet<GroupKey>,
    store: Option<Box<dyn HitGroupStore + Send + Sync>>,
}

impl Default for SessionTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionTracker {
    pub fn new() -> Self {
        Self {
            secured: HashSet::new(),
            hit_groups: HashSet::new(),
            store: None,
        }
    }

    /// Attach a durable hit-group store and preload its contents.
    /// Unparseable lines are skipped with a warning.
    pub fn with_store(store: Box<dyn HitGroupStore + Send + Sync>) -> EngineResult<Self> {
        let mut hit_groups = HashSet::new();
        for line in store.load()? {
            match line.parse::<GroupKey>() {
                Ok(key) => {
                    hit_groups.insert(key);
                }
                Err(err) => warn!(%line, %err, "skipping unparseable hit-group entry"),
            }
        }
        Ok(Self {
            secured: HashSet::new(),
            hit_groups,
            store: Some(store),
        })
    }

    #[must_use]
    pub fn is_secured(&self, ticket: Ticket) -> bool {
        self.secured.contains(&ticket)
    }

    pub fn mark_secured(&mut self, ticket: Ticket) {
        self.secured.insert(ticket);
    }

    pub fn unmark_secured(&mut self, ticket: Ticket) {
        self.secured.remove(&ticket);
    }

    /// Housekeeping: with no open positions every tracked ticket is
    /// gone for good, so the set resets.
    pub fn clear_secured_if_flat(&mut self, open_positions: usize) {
        if open_positions == 0 && !self.secured.is_empty() {
            self.secured.clear();
        }
    }

    #[must_use]
    pub fn group_hit(&self, key: &GroupKey) -> bool {
        self.hit_groups.contains(key)
    }

    /// Record a fired group. Persisted when a store is attached; a
    /// persistence failure keeps the in-memory mark and logs.
    pub fn mark_group_hit(&mut self, key: GroupKey) {
        if self.hit_groups.insert(key.clone()) {
            if let Some(store) = &mut self.store {
                if let Err(err) = store.append(&key.to_string()) {
                    warn!(%key, %err, "failed to persist hit group");
                }
            }
        }
    }

    pub fn unmark_group_hit(&mut self, key: &GroupKey) {
        self.hit_groups.remove(key);
    }

    /// Drop in-memory hit marks for groups no longer live. Persisted
    /// entries stay on disk; stale lines are ignored on reload the
    /// same way.
    pub fn retain_live_groups(&mut self, live: &HashSet<GroupKey>) {
        if self.store.is_none() {
            self.hit_groups.retain(|key| live.contains(key));
        }
    }

    #[must_use]
    pub fn secured_count(&self) -> usize {
        self.secured.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipguard_core::{Direction, Symbol};
    use pipguard_persistence::FileHitGroupStore;

    fn key(symbol: &str, time_bucket: i64) -> GroupKey {
        GroupKey {
            symbol: Symbol::new(symbol),
            direction: Direction::Buy,
            time_bucket,
            price_bucket: 11000,
        }
    }

    #[test]
    fn test_secured_at_most_once() {
        let mut tracker = SessionTracker::new();
        assert!(!tracker.is_secured(Ticket(1)));
        tracker.mark_secured(Ticket(1));
        assert!(tracker.is_secured(Ticket(1)));

        tracker.unmark_secured(Ticket(1));
        assert!(!tracker.is_secured(Ticket(1)));
    }

    #[test]
    fn test_housekeeping_clears_only_when_flat() {
        let mut tracker = SessionTracker::new();
        tracker.mark_secured(Ticket(1));

        tracker.clear_secured_if_flat(3);
        assert!(tracker.is_secured(Ticket(1)));

        tracker.clear_secured_if_flat(0);
        assert!(!tracker.is_secured(Ticket(1)));
    }

    #[test]
    fn test_retain_live_groups_in_memory() {
        let mut tracker = SessionTracker::new();
        tracker.mark_group_hit(key("EURUSD", 1));
        tracker.mark_group_hit(key("USDJPY", 2));

        let live: HashSet<GroupKey> = [key("EURUSD", 1)].into_iter().collect();
        tracker.retain_live_groups(&live);

        assert!(tracker.group_hit(&key("EURUSD", 1)));
        assert!(!tracker.group_hit(&key("USDJPY", 2)));
    }

    #[test]
    fn test_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hits.log");

        {
            let store = FileHitGroupStore::open(&path).unwrap();
            let mut tracker = SessionTracker::with_store(Box::new(store)).unwrap();
            tracker.mark_group_hit(key("EURUSD", 7));
        }

        let store = FileHitGroupStore::open(&path).unwrap();
        let tracker = SessionTracker::with_store(Box::new(store)).unwrap();
        assert!(tracker.group_hit(&key("EURUSD", 7)));
        assert!(!tracker.group_hit(&key("EURUSD", 8)));
    }

    #[test]
    fn test_store_skips_bad_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hits.log");
        std::fs::write(&path, "not a key\nEURUSD|buy|t7|p11000\n").unwrap();

        let store = FileHitGroupStore::open(&path).unwrap();
        let tracker = SessionTracker::with_store(Box::new(store)).unwrap();
        assert!(tracker.group_hit(&key("EURUSD", 7)));
    }

    // the tracker crosses task boundaries inside the per-account
    // monitor, store included
    #[test]
    fn test_tracker_usable_across_tasks() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SessionTracker>();
    }

    #[test]
    fn test_persistent_hits_survive_retain() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileHitGroupStore::open(dir.path().join("hits.log")).unwrap();
        let mut tracker = SessionTracker::with_store(Box::new(store)).unwrap();
        tracker.mark_group_hit(key("EURUSD", 7));

        tracker.retain_live_groups(&HashSet::new());
        assert!(tracker.group_hit(&key("EURUSD", 7)));
    }
}
