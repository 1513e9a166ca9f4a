use chrono::Utc;
use rust_decimal::Decimal;

use edgelord_arb::core::domain::{BookSnapshot, Pair, PriceLevel, VenueId};

/// Build a valid single-level book snapshot for `venue`/`pair`.
pub fn one_level_book(venue: VenueId, pair: Pair, bid: Decimal, ask: Decimal, size: Decimal) -> BookSnapshot {
    BookSnapshot::new(
        venue,
        pair,
        vec![PriceLevel::new(bid, size)],
        vec![PriceLevel::new(ask, size)],
        None,
        Utc::now(),
        None,
    )
    .expect("one_level_book levels are always valid")
}
