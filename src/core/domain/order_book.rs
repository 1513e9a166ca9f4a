//! Order book side and snapshot types.

use chrono::{DateTime, Utc};

use super::id::{Pair, VenueId};
use super::money::{Price, Volume};

/// A single level in a book side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceLevel {
    price: Price,
    size: Volume,
}

impl PriceLevel {
    #[must_use]
    pub const fn new(price: Price, size: Volume) -> Self {
        Self { price, size }
    }

    #[must_use]
    pub const fn price(&self) -> Price {
        self.price
    }

    #[must_use]
    pub const fn size(&self) -> Volume {
        self.size
    }
}

/// One side of a book: bids are expected descending by price, asks ascending.
pub type BookSide = Vec<PriceLevel>;

/// Error returned when constructing a `BookSnapshot` from raw levels that
/// violate the book-ordering invariant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BookError {
    #[error("book is crossed: best bid {best_bid} >= best ask {best_ask}")]
    Crossed { best_bid: String, best_ask: String },
    #[error("bids are not strictly descending by price")]
    BidsNotDescending,
    #[error("asks are not strictly ascending by price")]
    AsksNotAscending,
}

/// A normalized, validated snapshot of both sides of a book for one
/// (venue, pair), bounded to a configured depth.
#[derive(Debug, Clone, PartialEq)]
pub struct BookSnapshot {
    venue: VenueId,
    pair: Pair,
    bids: BookSide,
    asks: BookSide,
    ts_exchange: Option<DateTime<Utc>>,
    ts_local: DateTime<Utc>,
    seq: Option<u64>,
}

impl BookSnapshot {
    /// Build a snapshot, rejecting crossed or unordered books.
    ///
    /// `bids`/`asks` must already be truncated to the desired depth by the
    /// caller; this constructor only validates ordering, not length.
    pub fn new(
        venue: VenueId,
        pair: Pair,
        bids: BookSide,
        asks: BookSide,
        ts_exchange: Option<DateTime<Utc>>,
        ts_local: DateTime<Utc>,
        seq: Option<u64>,
    ) -> Result<Self, BookError> {
        for window in bids.windows(2) {
            if window[0].price <= window[1].price {
                return Err(BookError::BidsNotDescending);
            }
        }
        for window in asks.windows(2) {
            if window[0].price >= window[1].price {
                return Err(BookError::AsksNotAscending);
            }
        }
        if let (Some(best_bid), Some(best_ask)) = (bids.first(), asks.first()) {
            if best_bid.price >= best_ask.price {
                return Err(BookError::Crossed {
                    best_bid: best_bid.price.to_string(),
                    best_ask: best_ask.price.to_string(),
                });
            }
        }
        Ok(Self {
            venue,
            pair,
            bids,
            asks,
            ts_exchange,
            ts_local,
            seq,
        })
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
    pub fn bids(&self) -> &[PriceLevel] {
        &self.bids
    }

    #[must_use]
    pub fn asks(&self) -> &[PriceLevel] {
        &self.asks
    }

    #[must_use]
    pub fn best_bid(&self) -> Option<PriceLevel> {
        self.bids.first().copied()
    }

    #[must_use]
    pub fn best_ask(&self) -> Option<PriceLevel> {
        self.asks.first().copied()
    }

    #[must_use]
    pub const fn ts_exchange(&self) -> Option<DateTime<Utc>> {
        self.ts_exchange
    }

    #[must_use]
    pub const fn ts_local(&self) -> DateTime<Utc> {
        self.ts_local
    }

    #[must_use]
    pub const fn seq(&self) -> Option<u64> {
        self.seq
    }

    /// Age of this snapshot relative to `now`, in milliseconds. Negative
    /// skew (clock adjustment) is clamped to zero.
    #[must_use]
    pub fn age_ms(&self, now: DateTime<Utc>) -> i64 {
        (now - self.ts_local).num_milliseconds().max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair() -> Pair {
        Pair::new("BTC", "USDT")
    }

    fn level(p: i64, s: i64) -> PriceLevel {
        PriceLevel::new(Price::new(p, 0), Volume::new(s, 0))
    }

    #[test]
    fn valid_book_constructs() {
        let snap = BookSnapshot::new(
            VenueId::Binance,
            pair(),
            vec![level(100, 1), level(99, 2)],
            vec![level(101, 1), level(102, 2)],
            None,
            Utc::now(),
            Some(1),
        )
        .unwrap();
        assert_eq!(snap.best_bid().unwrap().price(), Price::new(100, 0));
        assert_eq!(snap.best_ask().unwrap().price(), Price::new(101, 0));
    }

    #[test]
    fn crossed_book_rejected() {
        let err = BookSnapshot::new(
            VenueId::Binance,
            pair(),
            vec![level(102, 1)],
            vec![level(101, 1)],
            None,
            Utc::now(),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, BookError::Crossed { .. }));
    }

    #[test]
    fn unordered_bids_rejected() {
        let err = BookSnapshot::new(
            VenueId::Binance,
            pair(),
            vec![level(99, 1), level(100, 1)],
            vec![level(101, 1)],
            None,
            Utc::now(),
            None,
        )
        .unwrap_err();
        assert_eq!(err, BookError::BidsNotDescending);
    }

    #[test]
    fn unordered_asks_rejected() {
        let err = BookSnapshot::new(
            VenueId::Binance,
            pair(),
            vec![level(99, 1)],
            vec![level(102, 1), level(101, 1)],
            None,
            Utc::now(),
            None,
        )
        .unwrap_err();
        assert_eq!(err, BookError::AsksNotAscending);
    }

    #[test]
    fn empty_sides_are_valid() {
        let snap = BookSnapshot::new(VenueId::Binance, pair(), vec![], vec![], None, Utc::now(), None).unwrap();
        assert!(snap.best_bid().is_none());
        assert!(snap.best_ask().is_none());
    }

    #[test]
    fn age_ms_is_monotonic_with_elapsed_time() {
        let ts = Utc::now() - chrono::Duration::milliseconds(250);
        let snap = BookSnapshot::new(VenueId::Binance, pair(), vec![], vec![], None, ts, None).unwrap();
        assert!(snap.age_ms(Utc::now()) >= 250);
    }
}
