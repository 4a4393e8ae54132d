//! TP-reached decision.
//!
//! A TP1 leg fires when price is effectively at its target:
//! - multi-group mode (more than one group live on the symbol):
//!   distance-only, so one group's progress percentage can never
//!   fire another group's level
//! - single-group mode: distance OR progress >= 80%
//!
//! Progressive mode adds two guards evaluated before either test:
//! minimum pips gained and minimum position age. Both must hold.

use pipguard_core::Position;
use rust_decimal::Decimal;

use crate::config::EngineConfig;

/// Distance and progress of a position toward its take-profit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TpMetrics {
    /// Pips gained since entry, signed (negative = under water).
    pub pips_gained: Decimal,
    /// Pips still short of the TP, signed (negative = overshot).
    pub pips_to_tp: Decimal,
    /// Full entry-to-TP distance in pips.
    pub total_tp_pips: Decimal,
    /// Progress toward the TP, percent.
    pub progress_pct: Decimal,
}

impl TpMetrics {
    /// Compute metrics for a position. `None` when the position has
    /// no take-profit or the pip size is unusable.
    pub fn compute(position: &Position, pip: Decimal) -> Option<Self> {
        if !position.has_take_profit() {
            return None;
        }
        let entry = position.open_price;
        let current = position.current_price;
        let tp = position.take_profit;

        let (pips_gained, pips_to_tp, total_tp_pips) = match position.direction {
            pipguard_core::Direction::Buy => (
                current.signed_pips_from(entry, pip)?,
                tp.signed_pips_from(current, pip)?,
                tp.signed_pips_from(entry, pip)?,
            ),
            pipguard_core::Direction::Sell => (
                entry.signed_pips_from(current, pip)?,
                current.signed_pips_from(tp, pip)?,
                entry.signed_pips_from(tp, pip)?,
            ),
        };

        // degenerate TP at entry: report full progress when not losing
        let progress_pct = if total_tp_pips.abs() <= Decimal::new(1, 1) {
            if pips_gained.is_sign_negative() {
                Decimal::ZERO
            } else {
                Decimal::from(100)
            }
        } else {
            pips_gained / total_tp_pips * Decimal::from(100)
        };

        Some(Self {
            pips_gained,
            pips_to_tp,
            total_tp_pips,
            progress_pct,
        })
    }
}

/// Outcome of evaluating one TP1 leg.
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub fire: bool,
    pub reason: String,
}

impl Decision {
    fn hold(reason: impl Into<String>) -> Self {
        Self {
            fire: false,
            reason: reason.into(),
        }
    }

    fn fire(reason: impl Into<String>) -> Self {
        Self {
            fire: true,
            reason: reason.into(),
        }
    }
}

/// Judge whether a TP1 leg has effectively reached its target.
///
/// `multi_group` is true when its symbol carries more than one live
/// group this cycle; `age_secs` only matters in progressive mode.
pub fn evaluate(
    metrics: &TpMetrics,
    multi_group: bool,
    age_secs: i64,
    config: &EngineConfig,
) -> Decision {
    if config.progressive {
        if metrics.pips_gained < config.min_profit_pips {
            return Decision::hold(format!(
                "gained {} pips, below minimum {}",
                metrics.pips_gained.round_dp(1),
                config.min_profit_pips
            ));
        }
        if age_secs < config.min_age_secs {
            return Decision::hold(format!(
                "position age {age_secs}s below minimum {}s",
                config.min_age_secs
            ));
        }
    }

    if metrics.pips_to_tp <= config.trigger_distance_pips {
        return Decision::fire(format!(
            "{} pips to TP (threshold {})",
            metrics.pips_to_tp.round_dp(1),
            config.trigger_distance_pips
        ));
    }

    if !multi_group && metrics.progress_pct >= config.trigger_progress_pct {
        return Decision::fire(format!(
            "progress {}% (threshold {}%)",
            metrics.progress_pct.round_dp(1),
            config.trigger_progress_pct
        ));
    }

    Decision::hold(format!(
        "{} pips to TP, progress {}%",
        metrics.pips_to_tp.round_dp(1),
        metrics.progress_pct.round_dp(1)
    ))
}
