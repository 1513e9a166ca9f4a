//! Core data model: identifiers, markets, order books, fees, and opportunities.
//!
//! Types here are pure data plus validated constructors; none of them touch
//! I/O. Components further out (the book store, the engines, the connectors)
//! build on top of these.

mod fee;
mod id;
mod market;
mod money;
mod opportunity;
mod order_book;

pub use fee::FeeEntry;
pub use id::{DetectionId, Pair, VenueId};
pub use market::Market;
pub use money::{Bps, Price, Volume};
pub use opportunity::{CrossOpportunity, Leg, Opportunity, Side, TriOpportunity};
pub use order_book::{BookError, BookSide, BookSnapshot, PriceLevel};
