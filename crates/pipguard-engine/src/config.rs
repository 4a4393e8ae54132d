//! Engine configuration.

use pipguard_core::Symbol;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Thresholds and modes for grouping and TP detection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Max open-time spread within a group, seconds.
    #[serde(default = "default_time_proximity_secs")]
    pub time_proximity_secs: i64,

    /// Max entry-price spread within a group, pips.
    #[serde(default = "default_price_proximity_pips")]
    pub price_proximity_pips: Decimal,

    /// Widened entry spread for high-spread symbols, pips.
    #[serde(default = "default_wide_price_proximity_pips")]
    pub wide_price_proximity_pips: Decimal,

    /// Symbol prefixes that use the widened tolerance.
    #[serde(default = "default_wide_tolerance_prefixes")]
    pub wide_tolerance_prefixes: Vec<String>,

    /// Fire when distance to TP drops to this many pips or less.
    /// Slightly above 3 so a boundary quote is not lost to rounding.
    #[serde(default = "default_trigger_distance_pips")]
    pub trigger_distance_pips: Decimal,

    /// Fire at this progress percentage (single-group mode only).
    #[serde(default = "default_trigger_progress_pct")]
    pub trigger_progress_pct: Decimal,

    /// Progressive guard: minimum pips gained before any trigger.
    #[serde(default = "default_min_profit_pips")]
    pub min_profit_pips: Decimal,

    /// Progressive guard: minimum position age in seconds.
    #[serde(default = "default_min_age_secs")]
    pub min_age_secs: i64,

    /// Progressive TP mode: tag-based ranks, ladder progression,
    /// persisted hit groups.
    #[serde(default)]
    pub progressive: bool,

    /// Deepest TP level a ladder may progress to.
    #[serde(default = "default_max_tp_levels")]
    pub max_tp_levels: u8,
}

fn default_time_proximity_secs() -> i64 {
    5
}

fn default_price_proximity_pips() -> Decimal {
    Decimal::from(10)
}

fn default_wide_price_proximity_pips() -> Decimal {
    Decimal::from(50)
}

fn default_wide_tolerance_prefixes() -> Vec<String> {
    vec!["GBP".to_string(), "XAU".to_string(), "GOLD".to_string()]
}

fn default_trigger_distance_pips() -> Decimal {
    Decimal::new(301, 2) // 3.01
}

fn default_trigger_progress_pct() -> Decimal {
    Decimal::from(80)
}

fn default_min_profit_pips() -> Decimal {
    Decimal::from(5)
}

fn default_min_age_secs() -> i64 {
    300
}

fn default_max_tp_levels() -> u8 {
    4
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            time_proximity_secs: default_time_proximity_secs(),
            price_proximity_pips: default_price_proximity_pips(),
            wide_price_proximity_pips: default_wide_price_proximity_pips(),
            wide_tolerance_prefixes: default_wide_tolerance_prefixes(),
            trigger_distance_pips: default_trigger_distance_pips(),
            trigger_progress_pct: default_trigger_progress_pct(),
            min_profit_pips: default_min_profit_pips(),
            min_age_secs: default_min_age_secs(),
            progressive: false,
            max_tp_levels: default_max_tp_levels(),
        }
    }
}

impl EngineConfig {
    /// Entry-price tolerance in pips for a symbol, widened for
    /// configured high-spread prefixes.
    pub fn price_tolerance_for(&self, symbol: &Symbol) -> Decimal {
        let name = symbol.as_str().to_ascii_uppercase();
        if self
            .wide_tolerance_prefixes
            .iter()
            .any(|p| name.starts_with(&p.to_ascii_uppercase()))
        {
            self.wide_price_proximity_pips
        } else {
            self.price_proximity_pips
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.time_proximity_secs, 5);
        assert_eq!(config.price_proximity_pips, dec!(10));
        assert_eq!(config.trigger_distance_pips, dec!(3.01));
        assert_eq!(config.trigger_progress_pct, dec!(80));
        assert!(!config.progressive);
    }

    #[test]
    fn test_wide_tolerance_prefixes() {
        let config = EngineConfig::default();
        assert_eq!(
            config.price_tolerance_for(&Symbol::new("GBPUSD")),
            dec!(50)
        );
        assert_eq!(
            config.price_tolerance_for(&Symbol::new("gold.m")),
            dec!(50)
        );
        assert_eq!(
            config.price_tolerance_for(&Symbol::new("EURUSD")),
            dec!(10)
        );
    }

    #[test]
    fn test_deserialize_partial_toml() {
        let config: EngineConfig = toml::from_str(
            r#"
            trigger_distance_pips = "2.5"
            progressive = true
            "#,
        )
        .unwrap();
        assert_eq!(config.trigger_distance_pips, dec!(2.5));
        assert!(config.progressive);
        assert_eq!(config.min_age_secs, 300);
    }
}
