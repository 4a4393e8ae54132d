//! Pip-size normalization across broker symbol naming conventions.
//!
//! Brokers decorate symbols with suffixes ("EURUSD.m", "XAUUSD_raw"),
//! so resolution is substring/prefix based rather than an exact table.

use crate::symbol::Symbol;
use rust_decimal::Decimal;

/// Index CFDs quoted in whole points.
const INDEX_PREFIXES: &[&str] = &[
    "US30", "US100", "US500", "JP225", "GER40", "UK100", "FRA40", "AUS200", "ESP35", "EUSTX50",
];

/// Resolve the pip size for a symbol. Always positive.
///
/// Lookup order matters: "GOLD"-named feeds use a coarser pip than
/// XAU-prefixed metals quotes.
pub fn pip_size(symbol: &Symbol) -> Decimal {
    let name = symbol.as_str().to_ascii_uppercase();

    if name.contains("GOLD") {
        return Decimal::new(1, 1); // 0.1
    }
    if name.starts_with("XAU") || name.starts_with("XAG") || name.starts_with("OIL") {
        return Decimal::new(1, 2); // 0.01
    }
    if INDEX_PREFIXES.iter().any(|p| name.starts_with(p)) {
        return Decimal::ONE;
    }
    if name.contains("JPY") {
        return Decimal::new(1, 2); // 0.01
    }
    Decimal::new(1, 4) // 0.0001
}

/// Smallest meaningful price increment for a quote precision,
/// i.e. `10^-digits`. Used for "already at entry" comparisons.
pub fn precision_threshold(digits: u32) -> Decimal {
    Decimal::new(1, digits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_forex_default() {
        assert_eq!(pip_size(&Symbol::new("EURUSD")), dec!(0.0001));
        assert_eq!(pip_size(&Symbol::new("GBPUSD.m")), dec!(0.0001));
    }

    #[test]
    fn test_jpy_pairs() {
        assert_eq!(pip_size(&Symbol::new("USDJPY")), dec!(0.01));
        assert_eq!(pip_size(&Symbol::new("EURJPY_raw")), dec!(0.01));
    }

    #[test]
    fn test_metals_and_oil() {
        assert_eq!(pip_size(&Symbol::new("XAUUSD")), dec!(0.01));
        assert_eq!(pip_size(&Symbol::new("OILUSD")), dec!(0.01));
        // GOLD-named feeds take precedence over the metals entry
        assert_eq!(pip_size(&Symbol::new("GOLD")), dec!(0.1));
        assert_eq!(pip_size(&Symbol::new("GOLDmicro")), dec!(0.1));
    }

    #[test]
    fn test_indices() {
        assert_eq!(pip_size(&Symbol::new("US30")), dec!(1));
        assert_eq!(pip_size(&Symbol::new("GER40.cash")), dec!(1));
        assert_eq!(pip_size(&Symbol::new("JP225")), dec!(1));
    }

    #[test]
    fn test_precision_threshold() {
        assert_eq!(precision_threshold(5), dec!(0.00001));
        assert_eq!(precision_threshold(2), dec!(0.01));
    }
}
