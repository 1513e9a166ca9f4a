//! The fixed capability contract a venue-specific transport implements.
//!
//! Re-architected from venue-specific client types into a single trait so
//! the connector task is written once and parameterized by venue id, per
//! the tagged-factory design.

use async_trait::async_trait;

use crate::core::domain::{BookSnapshot, Market, VenueId};
use crate::error::Result;

/// One parsed unit of work off the wire: either a fresh book for one
/// market, or a signal that the transport noticed a problem.
pub enum VenueEvent {
    Book(BookSnapshot),
    /// The venue-reported sequence for `pair` jumped past what the local
    /// shadow book expected; the connector must resync.
    SequenceGap { pair: crate::core::domain::Pair },
    Heartbeat,
}

/// A live transport session for one venue. Implementations own their own
/// socket/HTTP client state; the connector task only calls this contract.
#[async_trait]
pub trait VenueTransport: Send {
    /// Fetch the instrument list for this venue (C1 discovery source).
    async fn discover(&mut self) -> Result<Vec<Market>>;

    /// Open the transport and subscribe to depth updates for `markets`,
    /// honoring this venue's per-connection subscription limit internally.
    async fn subscribe(&mut self, markets: &[Market]) -> Result<()>;

    /// Request a REST depth snapshot for one market, used for sequence-gap
    /// resync.
    async fn resync(&mut self, market: &Market) -> Result<BookSnapshot>;

    /// Block until the next event is available.
    async fn next_event(&mut self) -> Result<VenueEvent>;

    /// Close the transport.
    async fn shutdown(&mut self);
}

/// Per-venue connection limits and timing, used by the generic connector
/// task to decide when to shard subscriptions across connections.
#[derive(Debug, Clone, Copy)]
pub struct VenueLimits {
    pub max_subscriptions_per_connection: usize,
    pub ws_inactivity_timeout_secs: u64,
}

impl Default for VenueLimits {
    fn default() -> Self {
        Self { max_subscriptions_per_connection: 200, ws_inactivity_timeout_secs: 30 }
    }
}

/// Construct a fresh transport for `venue`. Implementations live under
/// `core::connector::venues`.
#[must_use]
pub fn transport_for(venue: VenueId) -> Box<dyn VenueTransport> {
    super::venues::build(venue)
}
