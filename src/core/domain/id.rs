//! Identifier and canonical-pair types, encapsulated the way the rest of the
//! domain layer is: a private inner value plus explicit constructors.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// One of the seven supported spot exchanges.
///
/// This is a closed set by design: connectors, fee overrides, and the
/// `INCLUDE_EXCHANGES`/`EXCLUDE_EXCHANGES` config keys all reason about a
/// fixed enumeration rather than an open string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum VenueId {
    Binance,
    Bybit,
    Okx,
    Kucoin,
    Mexc,
    Huobi,
    Cointr,
}

impl VenueId {
    pub const ALL: [VenueId; 7] = [
        Self::Binance,
        Self::Bybit,
        Self::Okx,
        Self::Kucoin,
        Self::Mexc,
        Self::Huobi,
        Self::Cointr,
    ];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Binance => "binance",
            Self::Bybit => "bybit",
            Self::Okx => "okx",
            Self::Kucoin => "kucoin",
            Self::Mexc => "mexc",
            Self::Huobi => "huobi",
            Self::Cointr => "cointr",
        }
    }

    /// Parse a lowercase venue identifier as it appears in env var values.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "binance" => Some(Self::Binance),
            "bybit" => Some(Self::Bybit),
            "okx" => Some(Self::Okx),
            "kucoin" => Some(Self::Kucoin),
            "mexc" => Some(Self::Mexc),
            "huobi" => Some(Self::Huobi),
            "cointr" => Some(Self::Cointr),
            _ => None,
        }
    }
}

impl fmt::Display for VenueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A canonical trading pair, e.g. `BTC/USDT`.
///
/// Construction always uppercases both legs so that `Pair::new("btc",
/// "usdt")` and `Pair::new("BTC", "USDT")` compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Pair {
    base: String,
    quote: String,
}

impl Pair {
    pub fn new(base: impl AsRef<str>, quote: impl AsRef<str>) -> Self {
        Self {
            base: base.as_ref().to_ascii_uppercase(),
            quote: quote.as_ref().to_ascii_uppercase(),
        }
    }

    #[must_use]
    pub fn base(&self) -> &str {
        &self.base
    }

    #[must_use]
    pub fn quote(&self) -> &str {
        &self.quote
    }

    /// Parse a canonical `BASE/QUOTE` string.
    pub fn parse(s: &str) -> Option<Self> {
        let (base, quote) = s.split_once('/')?;
        if base.is_empty() || quote.is_empty() {
            return None;
        }
        Some(Self::new(base, quote))
    }
}

impl fmt::Display for Pair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}

static DETECTION_SEQ: AtomicU64 = AtomicU64::new(1);

/// Process-local monotonic id correlating a detected opportunity across the
/// notifier and persistence sinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DetectionId(u64);

impl DetectionId {
    /// Allocate the next id. Never reused within a process lifetime.
    #[must_use]
    pub fn next() -> Self {
        Self(DETECTION_SEQ.fetch_add(1, Ordering::Relaxed))
    }

    #[must_use]
    pub const fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for DetectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "det-{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn venue_id_round_trips_through_as_str() {
        for venue in VenueId::ALL {
            assert_eq!(VenueId::parse(venue.as_str()), Some(venue));
        }
    }

    #[test]
    fn venue_id_parse_rejects_unknown() {
        assert_eq!(VenueId::parse("coinbase"), None);
    }

    #[test]
    fn venue_id_parse_is_case_insensitive() {
        assert_eq!(VenueId::parse("BiNaNcE"), Some(VenueId::Binance));
    }

    #[test]
    fn pair_uppercases_both_legs() {
        let pair = Pair::new("btc", "usdt");
        assert_eq!(pair.base(), "BTC");
        assert_eq!(pair.quote(), "USDT");
        assert_eq!(pair.to_string(), "BTC/USDT");
    }

    #[test]
    fn pair_parse_round_trip() {
        let pair = Pair::parse("ETH/USDT").unwrap();
        assert_eq!(pair, Pair::new("eth", "usdt"));
        assert_eq!(pair.to_string(), "ETH/USDT");
    }

    #[test]
    fn pair_parse_rejects_malformed() {
        assert!(Pair::parse("BTCUSDT").is_none());
        assert!(Pair::parse("/USDT").is_none());
        assert!(Pair::parse("BTC/").is_none());
    }

    #[test]
    fn detection_ids_are_unique_and_increasing() {
        let a = DetectionId::next();
        let b = DetectionId::next();
        assert!(b.value() > a.value());
    }
}
