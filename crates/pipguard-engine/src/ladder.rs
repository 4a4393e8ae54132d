//! Cached TP ladders for progressive mode.
//!
//! A ladder is the ordered TP1..TPn price list for one signal-tag
//! group id (e.g. "G12345"). Ladders come from config at startup;
//! the dispatcher reads the next rung when bumping a secured leg.

use std::collections::HashMap;

use pipguard_core::Price;

/// Ordered TP levels for one signal, index 0 = TP1.
#[derive(Debug, Clone, PartialEq)]
pub struct TpLadder {
    levels: Vec<Price>,
}

impl TpLadder {
    pub fn new(levels: Vec<Price>) -> Self {
        Self { levels }
    }

    /// TP price for a 1-based rank.
    pub fn level(&self, rank: usize) -> Option<Price> {
        if rank == 0 {
            return None;
        }
        self.levels.get(rank - 1).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

/// Ladders keyed by signal-tag group id.
#[derive(Debug, Default)]
pub struct LadderCache {
    ladders: HashMap<String, TpLadder>,
}

impl LadderCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, group: impl Into<String>, ladder: TpLadder) {
        self.ladders.insert(group.into(), ladder);
    }

    pub fn get(&self, group: &str) -> Option<&TpLadder> {
        self.ladders.get(group)
    }
}
