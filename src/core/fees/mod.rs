//! Fee Table: maker/taker lookup with environment-variable overrides.

use std::collections::HashMap;

use crate::core::domain::{Bps, FeeEntry, Pair, VenueId};
use crate::error::{ConfigError, Result};

/// Default taker/maker fees used when no venue default is loaded and no
/// override applies. Conservative (higher than most real venues) so an
/// unconfigured venue does not look artificially profitable.
const FALLBACK_MAKER: &str = "0.001";
const FALLBACK_TAKER: &str = "0.001";

/// `(venue, pair)` or venue-wide fee lookup, overridable via
/// `FEE_OVERRIDE_<VENUE>_(MAKER|TAKER)` and
/// `FEE_OVERRIDE_<VENUE>_<PAIR>_(MAKER|TAKER)`.
#[derive(Default)]
pub struct FeeTable {
    venue_default: HashMap<VenueId, FeeEntry>,
    pair_override: HashMap<(VenueId, Pair), FeeEntry>,
}

impl FeeTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_venue_default(&mut self, entry: FeeEntry) {
        self.venue_default.insert(entry.venue(), entry);
    }

    pub fn set_pair_override(&mut self, entry: FeeEntry) {
        if let Some(pair) = entry.pair().clone() {
            self.pair_override.insert((entry.venue(), pair), entry);
        }
    }

    /// Taker fee used for every arbitrage leg (immediate-execution
    /// assumption). Lookup order: pair override, then venue default.
    pub fn taker(&self, venue: VenueId, pair: &Pair) -> Result<Bps> {
        if let Some(entry) = self.pair_override.get(&(venue, pair.clone())) {
            return Ok(entry.taker());
        }
        self.venue_default
            .get(&venue)
            .map(FeeEntry::taker)
            .ok_or_else(|| ConfigError::MissingField { field: format!("fee table entry for {venue}") }.into())
    }

    pub fn maker(&self, venue: VenueId, pair: &Pair) -> Result<Bps> {
        if let Some(entry) = self.pair_override.get(&(venue, pair.clone())) {
            return Ok(entry.maker());
        }
        self.venue_default
            .get(&venue)
            .map(FeeEntry::maker)
            .ok_or_else(|| ConfigError::MissingField { field: format!("fee table entry for {venue}") }.into())
    }

    /// Build a fee table from venue defaults plus `FEE_OVERRIDE_*`
    /// environment variables. `venue_defaults` provides a starting
    /// (maker, taker) pair per venue from exchange documentation; any
    /// venue missing from it falls back to a conservative constant.
    pub fn from_env_with_defaults(venue_defaults: &HashMap<VenueId, (Bps, Bps)>) -> Result<Self> {
        use rust_decimal::Decimal;
        use std::str::FromStr;

        let fallback_maker = Decimal::from_str(FALLBACK_MAKER).expect("valid constant");
        let fallback_taker = Decimal::from_str(FALLBACK_TAKER).expect("valid constant");

        let mut table = Self::new();
        for venue in VenueId::ALL {
            let (maker, taker) = venue_defaults.get(&venue).copied().unwrap_or((fallback_maker, fallback_taker));
            table.set_venue_default(FeeEntry::new(venue, None, maker, taker));
        }

        for (key, value) in std::env::vars() {
            let Some(rest) = key.strip_prefix("FEE_OVERRIDE_") else { continue };
            let Some(parsed) = parse_override_key(rest) else {
                return Err(ConfigError::InvalidValue { field: key, reason: "unrecognized FEE_OVERRIDE_ key shape".into() }.into());
            };
            let amount = Decimal::from_str(value.trim())
                .map_err(|_| ConfigError::InvalidValue { field: key.clone(), reason: "not a decimal".into() })?;

            match parsed {
                OverrideKey::Venue(venue, kind) => {
                    let entry = table.venue_default.entry(venue).or_insert_with(|| FeeEntry::new(venue, None, fallback_maker, fallback_taker));
                    *entry = apply_kind(entry, kind, amount);
                }
                OverrideKey::Pair(venue, pair, kind) => {
                    let existing = table.pair_override.get(&(venue, pair.clone())).cloned().unwrap_or_else(|| FeeEntry::new(venue, Some(pair.clone()), fallback_maker, fallback_taker));
                    let updated = apply_kind(&existing, kind, amount);
                    table.pair_override.insert((venue, pair), updated);
                }
            }
        }

        Ok(table)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FeeKind {
    Maker,
    Taker,
}

fn apply_kind(entry: &FeeEntry, kind: FeeKind, amount: Bps) -> FeeEntry {
    match kind {
        FeeKind::Maker => FeeEntry::new(entry.venue(), entry.pair().clone(), amount, entry.taker()),
        FeeKind::Taker => FeeEntry::new(entry.venue(), entry.pair().clone(), entry.maker(), amount),
    }
}

enum OverrideKey {
    Venue(VenueId, FeeKind),
    Pair(VenueId, Pair, FeeKind),
}

/// Parse the tail of a `FEE_OVERRIDE_<...>` key, after the fixed prefix.
/// Shapes: `<VENUE>_MAKER`, `<VENUE>_TAKER`, `<VENUE>_<PAIR>_MAKER`,
/// `<VENUE>_<PAIR>_TAKER`, where `<PAIR>` is `BASE_QUOTE`.
fn parse_override_key(rest: &str) -> Option<OverrideKey> {
    let (kind_str, prefix) = rest.rsplit_once('_')?;
    let kind = match kind_str.to_ascii_uppercase().as_str() {
        "MAKER" => FeeKind::Maker,
        "TAKER" => FeeKind::Taker,
        _ => return None,
    };

    let parts: Vec<&str> = prefix.split('_').collect();
    match parts.as_slice() {
        [venue] => Some(OverrideKey::Venue(VenueId::parse(venue)?, kind)),
        [venue, base, quote] => {
            let venue = VenueId::parse(venue)?;
            Some(OverrideKey::Pair(venue, Pair::new(base, quote), kind))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn pair() -> Pair {
        Pair::new("BTC", "USDT")
    }

    #[test]
    fn venue_default_lookup() {
        let mut table = FeeTable::new();
        table.set_venue_default(FeeEntry::new(VenueId::Binance, None, dec!(0.0008), dec!(0.001)));
        assert_eq!(table.taker(VenueId::Binance, &pair()).unwrap(), dec!(0.001));
        assert_eq!(table.maker(VenueId::Binance, &pair()).unwrap(), dec!(0.0008));
    }

    #[test]
    fn pair_override_wins_over_venue_default() {
        let mut table = FeeTable::new();
        table.set_venue_default(FeeEntry::new(VenueId::Binance, None, dec!(0.0008), dec!(0.001)));
        table.set_pair_override(FeeEntry::new(VenueId::Binance, Some(pair()), dec!(0.0002), dec!(0.0003)));
        assert_eq!(table.taker(VenueId::Binance, &pair()).unwrap(), dec!(0.0003));
    }

    #[test]
    fn missing_venue_is_an_error() {
        let table = FeeTable::new();
        assert!(table.taker(VenueId::Binance, &pair()).is_err());
    }

    #[test]
    fn parse_override_key_venue_wide() {
        match parse_override_key("BINANCE_TAKER") {
            Some(OverrideKey::Venue(VenueId::Binance, FeeKind::Taker)) => {}
            _ => panic!("expected venue-wide taker override"),
        }
    }

    #[test]
    fn parse_override_key_pair_scoped() {
        match parse_override_key("OKX_BTC_USDT_MAKER") {
            Some(OverrideKey::Pair(VenueId::Okx, p, FeeKind::Maker)) => assert_eq!(p, Pair::new("BTC", "USDT")),
            _ => panic!("expected pair-scoped maker override"),
        }
    }

    #[test]
    fn from_env_with_defaults_applies_override() {
        std::env::set_var("FEE_OVERRIDE_BYBIT_TAKER", "0.0005");
        let table = FeeTable::from_env_with_defaults(&HashMap::new()).unwrap();
        assert_eq!(table.taker(VenueId::Bybit, &pair()).unwrap(), dec!(0.0005));
        std::env::remove_var("FEE_OVERRIDE_BYBIT_TAKER");
    }
}
