//! Symbol Registry: venue-native symbol <-> canonical pair translation.
//!
//! Venues spell the same instrument differently (`BTCUSDT`, `BTC-USDT`,
//! `XBTUSD`, ...). The registry normalizes those into canonical
//! `(base, quote)` pairs so the rest of the pipeline never has to reason
//! about venue string quirks.

mod quote_suffixes;

use std::collections::{HashMap, HashSet};

use dashmap::DashSet;
use tracing::warn;

use crate::core::domain::{Market, Pair, VenueId};

pub use quote_suffixes::PREFERRED_QUOTE_SUFFIXES;

/// Base-asset aliases applied before canonicalization, e.g. exchanges that
/// still spell bitcoin `XBT` in their native symbol.
const ALIASES: &[(&str, &str)] = &[("XBT", "BTC")];

fn apply_aliases(asset: &str) -> String {
    let upper = asset.to_ascii_uppercase();
    for (from, to) in ALIASES {
        if upper == *from {
            return (*to).to_string();
        }
    }
    upper
}

/// Split a concatenated native symbol (no separator) into (base, quote)
/// using the longest-match preferred-suffix list.
fn split_concatenated(symbol: &str) -> Option<(String, String)> {
    let upper = symbol.to_ascii_uppercase();
    for suffix in PREFERRED_QUOTE_SUFFIXES {
        if upper.len() > suffix.len() && upper.ends_with(suffix) {
            let base = &upper[..upper.len() - suffix.len()];
            if !base.is_empty() {
                return Some((base.to_string(), (*suffix).to_string()));
            }
        }
    }
    None
}

/// Split a native symbol that already uses a separator (`-` or `_`).
fn split_separated(symbol: &str) -> Option<(String, String)> {
    for sep in ['-', '_', '/'] {
        if let Some((base, quote)) = symbol.split_once(sep) {
            if !base.is_empty() && !quote.is_empty() {
                return Some((base.to_ascii_uppercase(), quote.to_ascii_uppercase()));
            }
        }
    }
    None
}

/// Translates native exchange symbols to/from canonical pairs and holds the
/// discovered `Market` set per venue.
#[derive(Default)]
pub struct SymbolRegistry {
    markets: HashMap<(VenueId, Pair), Market>,
    native_by_canonical: HashMap<(VenueId, Pair), String>,
    canonical_by_native: HashMap<(VenueId, String), Pair>,
    warned_unresolvable: DashSet<(VenueId, String)>,
}

impl SymbolRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attempt to resolve a venue-native symbol to a canonical pair.
    ///
    /// Tries a separator split first (cheap, unambiguous), then falls back
    /// to longest-suffix matching against concatenated symbols. Returns
    /// `None` for symbols whose quote asset is not recognized.
    #[must_use]
    pub fn resolve_native(native: &str) -> Option<Pair> {
        let (base, quote) = split_separated(native).or_else(|| split_concatenated(native))?;
        Some(Pair::new(apply_aliases(&base), apply_aliases(&quote)))
    }

    /// Register markets discovered for a venue, replacing any previously
    /// registered markets for that venue (a reload is a full rebuild, not
    /// an incremental merge).
    pub fn load(&mut self, venue: VenueId, native_symbols: impl IntoIterator<Item = (String, Market)>) {
        self.markets.retain(|(v, _), _| *v != venue);
        self.native_by_canonical.retain(|(v, _), _| *v != venue);
        self.canonical_by_native.retain(|(v, _), _| *v != venue);

        for (native, market) in native_symbols {
            match Self::resolve_native(&native) {
                Some(pair) if pair == *market.pair() => {
                    self.native_by_canonical.insert((venue, pair.clone()), native.clone());
                    self.canonical_by_native.insert((venue, native), pair.clone());
                    self.markets.insert((venue, pair), market);
                }
                Some(_) | None => {
                    if self.warned_unresolvable.insert((venue, native.clone())) {
                        warn!(%venue, symbol = %native, "unresolvable native symbol, skipping");
                    }
                }
            }
        }
    }

    #[must_use]
    pub fn canonicalize(&self, venue: VenueId, native: &str) -> Option<Pair> {
        self.canonical_by_native.get(&(venue, native.to_string())).cloned()
    }

    #[must_use]
    pub fn native(&self, venue: VenueId, pair: &Pair) -> Option<String> {
        self.native_by_canonical.get(&(venue, pair.clone())).cloned()
    }

    #[must_use]
    pub fn market(&self, venue: VenueId, pair: &Pair) -> Option<&Market> {
        self.markets.get(&(venue, pair.clone()))
    }

    #[must_use]
    pub fn pairs_of(&self, venue: VenueId) -> HashSet<Pair> {
        self.markets.keys().filter(|(v, _)| *v == venue).map(|(_, p)| p.clone()).collect()
    }

    #[must_use]
    pub fn markets(&self) -> impl Iterator<Item = &Market> {
        self.markets.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn market(venue: VenueId, pair: Pair, native: &str) -> Market {
        Market::new(venue, pair, native, 2, 6, dec!(10))
    }

    #[test]
    fn resolves_separated_symbol() {
        assert_eq!(SymbolRegistry::resolve_native("BTC-USDT"), Some(Pair::new("BTC", "USDT")));
    }

    #[test]
    fn resolves_concatenated_symbol_via_longest_suffix() {
        // BTCUSDT should match the USDT suffix, not a shorter false-positive.
        assert_eq!(SymbolRegistry::resolve_native("BTCUSDT"), Some(Pair::new("BTC", "USDT")));
    }

    #[test]
    fn applies_alias_before_canonicalization() {
        assert_eq!(SymbolRegistry::resolve_native("XBTUSD"), Some(Pair::new("BTC", "USD")));
    }

    #[test]
    fn unrecognized_quote_is_unresolvable() {
        assert_eq!(SymbolRegistry::resolve_native("ABCDEF"), None);
    }

    #[test]
    fn load_then_round_trip_native_and_canonical() {
        let mut reg = SymbolRegistry::new();
        let pair = Pair::new("BTC", "USDT");
        reg.load(
            VenueId::Binance,
            vec![("BTCUSDT".to_string(), market(VenueId::Binance, pair.clone(), "BTCUSDT"))],
        );
        assert_eq!(reg.canonicalize(VenueId::Binance, "BTCUSDT"), Some(pair.clone()));
        assert_eq!(reg.native(VenueId::Binance, &pair), Some("BTCUSDT".to_string()));
    }

    #[test]
    fn load_skips_unresolvable_symbols() {
        let mut reg = SymbolRegistry::new();
        reg.load(
            VenueId::Binance,
            vec![("NOTASYMBOL".to_string(), market(VenueId::Binance, Pair::new("X", "Y"), "NOTASYMBOL"))],
        );
        assert!(reg.pairs_of(VenueId::Binance).is_empty());
    }

    #[test]
    fn load_is_a_full_rebuild_per_venue() {
        let mut reg = SymbolRegistry::new();
        let pair = Pair::new("BTC", "USDT");
        reg.load(
            VenueId::Binance,
            vec![("BTCUSDT".to_string(), market(VenueId::Binance, pair.clone(), "BTCUSDT"))],
        );
        reg.load(VenueId::Binance, vec![]);
        assert!(reg.pairs_of(VenueId::Binance).is_empty());
    }
}
