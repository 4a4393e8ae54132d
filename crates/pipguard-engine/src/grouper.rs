//! Position grouping.
//!
//! Clusters the per-cycle position snapshot into multi-leg signal
//! groups: same symbol and direction, opened within a short time
//! window at nearby entry prices. Single positions are standalone
//! and never grouped.
//!
//! Group identity is a deterministic fingerprint of the seed member
//! (earliest leg), not an ordinal counter, so the same market state
//! always yields the same key regardless of snapshot order or which
//! unrelated groups exist. The key doubles as the persisted
//! hit-group identifier.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use pipguard_core::{pip_size, CoreError, Direction, Position, Symbol, Ticket};
use rust_decimal::prelude::ToPrimitive;

use crate::config::EngineConfig;

/// Deterministic, order-independent group fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupKey {
    pub symbol: Symbol,
    pub direction: Direction,
    /// Seed open time quantized to the grouping time window.
    pub time_bucket: i64,
    /// Seed entry price quantized to the grouping price tolerance.
    pub price_bucket: i64,
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}|{}|t{}|p{}",
            self.symbol, self.direction, self.time_bucket, self.price_bucket
        )
    }
}

impl FromStr for GroupKey {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split('|');
        let (Some(symbol), Some(direction), Some(time), Some(price), None) = (
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
        ) else {
            return Err(CoreError::InvalidGroupKey(s.to_string()));
        };
        let time_bucket = time
            .strip_prefix('t')
            .and_then(|v| v.parse::<i64>().ok())
            .ok_or_else(|| CoreError::InvalidGroupKey(s.to_string()))?;
        let price_bucket = price
            .strip_prefix('p')
            .and_then(|v| v.parse::<i64>().ok())
            .ok_or_else(|| CoreError::InvalidGroupKey(s.to_string()))?;
        Ok(Self {
            symbol: Symbol::new(symbol),
            direction: direction.parse()?,
            time_bucket,
            price_bucket,
        })
    }
}

/// A multi-leg signal group (always >= 2 members).
#[derive(Debug, Clone)]
pub struct SignalGroup {
    pub key: GroupKey,
    pub members: Vec<Position>,
}

impl SignalGroup {
    #[inline]
    pub fn contains(&self, ticket: Ticket) -> bool {
        self.members.iter().any(|p| p.ticket == ticket)
    }

    pub fn tickets(&self) -> Vec<Ticket> {
        self.members.iter().map(|p| p.ticket).collect()
    }
}

fn key_for_seed(seed: &Position, config: &EngineConfig) -> GroupKey {
    let pip = pip_size(&seed.symbol);
    let tolerance = config.price_tolerance_for(&seed.symbol);
    let bucket_width = pip * tolerance;
    let price_bucket = if bucket_width.is_sign_positive() && !bucket_width.is_zero() {
        (seed.open_price.inner() / bucket_width)
            .round()
            .to_i64()
            .unwrap_or(0)
    } else {
        0
    };
    let window = config.time_proximity_secs.max(1);
    GroupKey {
        symbol: seed.symbol.clone(),
        direction: seed.direction,
        time_bucket: seed.open_time.div_euclid(window),
        price_bucket,
    }
}

fn belongs_with(seed: &Position, candidate: &Position, config: &EngineConfig) -> bool {
    if candidate.symbol != seed.symbol || candidate.direction != seed.direction {
        return false;
    }
    if (candidate.open_time - seed.open_time).abs() > config.time_proximity_secs {
        return false;
    }
    let pip = pip_size(&seed.symbol);
    match candidate.open_price.pips_from(seed.open_price, pip) {
        Some(distance) => distance <= config.price_tolerance_for(&seed.symbol),
        // no sane pip size: accept on time+symbol+direction alone
        None => true,
    }
}

/// Cluster a snapshot into signal groups. Standalone positions are
/// dropped; the result holds only groups of two or more legs.
pub fn group_positions(positions: &[Position], config: &EngineConfig) -> Vec<SignalGroup> {
    let mut sorted: Vec<&Position> = positions.iter().collect();
    sorted.sort_by(|a, b| {
        (a.open_time, &a.symbol, a.direction).cmp(&(b.open_time, &b.symbol, b.direction))
    });

    let mut processed: HashSet<Ticket> = HashSet::new();
    let mut groups = Vec::new();

    for (i, seed) in sorted.iter().enumerate() {
        if processed.contains(&seed.ticket) {
            continue;
        }
        let mut members: Vec<Position> = vec![(*seed).clone()];
        for candidate in sorted.iter().skip(i + 1) {
            if processed.contains(&candidate.ticket) {
                continue;
            }
            if belongs_with(seed, candidate, config) {
                members.push((*candidate).clone());
            }
        }
        if members.len() < 2 {
            continue;
        }
        for member in &members {
            processed.insert(member.ticket);
        }
        groups.push(SignalGroup {
            key: key_for_seed(seed, config),
            members,
        });
    }

    groups
}
