//! Maker/taker fee records.

use super::id::{Pair, VenueId};
use super::money::Bps;

/// A maker/taker fee pair, optionally scoped to one trading pair on a venue.
/// A `pair` of `None` is the venue-wide default.
#[derive(Debug, Clone, PartialEq)]
pub struct FeeEntry {
    venue: VenueId,
    pair: Option<Pair>,
    maker: Bps,
    taker: Bps,
}

impl FeeEntry {
    #[must_use]
    pub const fn new(venue: VenueId, pair: Option<Pair>, maker: Bps, taker: Bps) -> Self {
        Self { venue, pair, maker, taker }
    }

    #[must_use]
    pub const fn venue(&self) -> VenueId {
        self.venue
    }

    #[must_use]
    pub const fn pair(&self) -> &Option<Pair> {
        &self.pair
    }

    #[must_use]
    pub const fn maker(&self) -> Bps {
        self.maker
    }

    #[must_use]
    pub const fn taker(&self) -> Bps {
        self.taker
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn fee_entry_accessors() {
        let fee = FeeEntry::new(VenueId::Binance, Some(Pair::new("BTC", "USDT")), dec!(0.001), dec!(0.001));
        assert_eq!(fee.venue(), VenueId::Binance);
        assert_eq!(fee.pair().as_ref().unwrap().to_string(), "BTC/USDT");
        assert_eq!(fee.taker(), dec!(0.001));
    }

    #[test]
    fn venue_default_has_no_pair() {
        let fee = FeeEntry::new(VenueId::Okx, None, dec!(0.0008), dec!(0.001));
        assert!(fee.pair().is_none());
    }
}
