//! Signal-tag comment codec.
//!
//! Progressive signals tag each leg's broker comment with
//! `"<group>_TP<rank>"`, e.g. `"G12345_TP2"`. Parsing fails closed:
//! anything malformed is treated as an untagged rank-1 leg, so a
//! garbled comment can never promote a position past its real level.

use std::fmt;

/// Parsed signal tag: optional group id plus 1-based TP rank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalTag {
    /// Signal group id, e.g. "G12345". `None` for untagged comments.
    pub group: Option<String>,
    /// 1-based TP level rank. Defaults to 1 when absent or malformed.
    pub rank: u8,
}

impl SignalTag {
    /// Parse a broker comment. Never fails; malformed input yields
    /// an untagged rank-1 tag.
    pub fn parse(comment: &str) -> Self {
        let trimmed = comment.trim();
        if let Some((group, rank_str)) = trimmed.rsplit_once("_TP") {
            if let Ok(rank) = rank_str.parse::<u8>() {
                if rank >= 1 && group.starts_with('G') && group.len() > 1 {
                    return Self {
                        group: Some(group.to_string()),
                        rank,
                    };
                }
            }
        }
        Self {
            group: None,
            rank: 1,
        }
    }

    /// Render a tag for a given group id and rank.
    pub fn encode(group: &str, rank: u8) -> String {
        format!("{group}_TP{rank}")
    }
}

impl fmt::Display for SignalTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.group {
            Some(group) => write!(f, "{}_TP{}", group, self.rank),
            None => write!(f, "TP{}", self.rank),
        }
    }
}
