//! TP level ranking within a group.
//!
//! Baseline ranks are value-based: sort the nonzero-TP members by
//! take-profit, ascending for buys (nearest target first) and
//! descending for sells. Zero-TP members get no rank and are only
//! ever secured as siblings.
//!
//! The progressive variant trusts the `_TP<n>` comment tag instead,
//! falling back to rank 1 on anything malformed.

use pipguard_core::{Direction, Position, SignalTag, Ticket};

/// 1-based TP rank of `position` within `members`, or `None` when it
/// carries no take-profit.
pub fn rank_in_group(position: &Position, members: &[Position]) -> Option<usize> {
    if !position.has_take_profit() {
        return None;
    }
    let mut ranked: Vec<(Ticket, pipguard_core::Price)> = members
        .iter()
        .filter(|p| p.has_take_profit())
        .map(|p| (p.ticket, p.take_profit))
        .collect();
    match position.direction {
        Direction::Buy => ranked.sort_by(|a, b| a.1.cmp(&b.1)),
        Direction::Sell => ranked.sort_by(|a, b| b.1.cmp(&a.1)),
    }
    ranked
        .iter()
        .position(|(ticket, _)| *ticket == position.ticket)
        .map(|idx| idx + 1)
}

/// Tag-declared TP rank. Fails closed to 1.
pub fn rank_from_tag(position: &Position) -> usize {
    SignalTag::parse(&position.comment).rank as usize
}
