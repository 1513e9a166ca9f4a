//! Market records: a tradable (venue, canonical pair) instrument.

use super::id::{Pair, VenueId};
use super::money::{Price, Volume};

/// A single tradable instrument on a venue.
///
/// Markets are created once at discovery and never deleted; they may be
/// marked inactive by the registry that owns them, but this struct itself
/// carries no mutable state.
#[derive(Debug, Clone, PartialEq)]
pub struct Market {
    venue: VenueId,
    pair: Pair,
    native_symbol: String,
    price_precision: u32,
    size_precision: u32,
    min_notional: Volume,
}

impl Market {
    pub fn new(
        venue: VenueId,
        pair: Pair,
        native_symbol: impl Into<String>,
        price_precision: u32,
        size_precision: u32,
        min_notional: Price,
    ) -> Self {
        Self {
            venue,
            pair,
            native_symbol: native_symbol.into(),
            price_precision,
            size_precision,
            min_notional,
        }
    }

    #[must_use]
    pub const fn venue(&self) -> VenueId {
        self.venue
    }

    #[must_use]
    pub const fn pair(&self) -> &Pair {
        &self.pair
    }

    #[must_use]
    pub fn native_symbol(&self) -> &str {
        &self.native_symbol
    }

    #[must_use]
    pub const fn price_precision(&self) -> u32 {
        self.price_precision
    }

    #[must_use]
    pub const fn size_precision(&self) -> u32 {
        self.size_precision
    }

    #[must_use]
    pub const fn min_notional(&self) -> Volume {
        self.min_notional
    }
}
