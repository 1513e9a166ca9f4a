//! Book Store: concurrent, keyed map of the latest validated snapshot per
//! (venue, pair), with staleness-aware reads.
//!
//! Grounded in the reference cache's `RwLock<HashMap<..>>` + broadcast
//! notification shape: writers replace entries atomically, readers clone
//! out an immutable snapshot and never hold the lock across engine work.

use std::collections::HashMap;

use chrono::Utc;
use parking_lot::RwLock;
use tokio::sync::broadcast;

use crate::core::domain::{BookSnapshot, Pair, VenueId};

/// Notification fired after a snapshot is published, for callers that want
/// to react instead of polling.
#[derive(Debug, Clone)]
pub struct BookUpdate {
    pub venue: VenueId,
    pub pair: Pair,
}

pub struct BookStore {
    books: RwLock<HashMap<(VenueId, Pair), BookSnapshot>>,
    max_staleness_ms: i64,
    tx: Option<broadcast::Sender<BookUpdate>>,
}

impl BookStore {
    #[must_use]
    pub fn new(max_staleness_ms: i64) -> Self {
        Self { books: RwLock::new(HashMap::new()), max_staleness_ms, tx: None }
    }

    #[must_use]
    pub fn with_notifications(max_staleness_ms: i64, capacity: usize) -> (Self, broadcast::Receiver<BookUpdate>) {
        let (tx, rx) = broadcast::channel(capacity);
        (Self { books: RwLock::new(HashMap::new()), max_staleness_ms, tx: Some(tx) }, rx)
    }

    #[must_use]
    pub fn subscribe(&self) -> Option<broadcast::Receiver<BookUpdate>> {
        self.tx.as_ref().map(broadcast::Sender::subscribe)
    }

    /// Publish a new snapshot, replacing whatever is currently stored for
    /// its (venue, pair). `BookSnapshot` already guarantees non-crossed,
    /// ordered sides by construction; this additionally enforces the
    /// strictly-increasing `ts_local` invariant per key.
    pub fn put(&self, snapshot: BookSnapshot) {
        let key = (snapshot.venue(), snapshot.pair().clone());
        {
            let books = self.books.read();
            if let Some(existing) = books.get(&key) {
                if snapshot.ts_local() <= existing.ts_local() {
                    return;
                }
            }
        }
        let venue = snapshot.venue();
        let pair = snapshot.pair().clone();
        self.books.write().insert(key, snapshot);
        if let Some(tx) = &self.tx {
            let _ = tx.send(BookUpdate { venue, pair });
        }
    }

    /// Invalidate the book for a (venue, pair), e.g. while a sequence-gap
    /// resync is in flight.
    pub fn invalidate(&self, venue: VenueId, pair: &Pair) {
        self.books.write().remove(&(venue, pair.clone()));
    }

    /// Get the current snapshot, treating anything older than
    /// `max_staleness_ms` as absent.
    #[must_use]
    pub fn get(&self, venue: VenueId, pair: &Pair) -> Option<BookSnapshot> {
        let books = self.books.read();
        let snapshot = books.get(&(venue, pair.clone()))?;
        if snapshot.age_ms(Utc::now()) > self.max_staleness_ms {
            return None;
        }
        Some(snapshot.clone())
    }

    #[must_use]
    pub fn pairs_of(&self, venue: VenueId) -> Vec<Pair> {
        self.books.read().keys().filter(|(v, _)| *v == venue).map(|(_, p)| p.clone()).collect()
    }

    #[must_use]
    pub fn venues_of(&self, pair: &Pair) -> Vec<VenueId> {
        self.books.read().keys().filter(|(_, p)| p == pair).map(|(v, _)| *v).collect()
    }

    #[must_use]
    pub fn all_pairs(&self) -> Vec<Pair> {
        let mut pairs: Vec<Pair> = self.books.read().keys().map(|(_, p)| p.clone()).collect();
        pairs.sort();
        pairs.dedup();
        pairs
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.books.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::domain::{Price, Volume};

    fn snapshot(venue: VenueId, pair: Pair, ts: chrono::DateTime<Utc>) -> BookSnapshot {
        BookSnapshot::new(
            venue,
            pair,
            vec![crate::core::domain::PriceLevel::new(Price::new(100, 0), Volume::new(1, 0))],
            vec![crate::core::domain::PriceLevel::new(Price::new(101, 0), Volume::new(1, 0))],
            None,
            ts,
            None,
        )
        .unwrap()
    }

    #[test]
    fn put_then_get_round_trips() {
        let store = BookStore::new(5000);
        let pair = Pair::new("BTC", "USDT");
        store.put(snapshot(VenueId::Binance, pair.clone(), Utc::now()));
        assert!(store.get(VenueId::Binance, &pair).is_some());
    }

    #[test]
    fn stale_snapshot_is_invisible() {
        let store = BookStore::new(10);
        let pair = Pair::new("BTC", "USDT");
        let old = Utc::now() - chrono::Duration::milliseconds(500);
        store.put(snapshot(VenueId::Binance, pair.clone(), old));
        assert!(store.get(VenueId::Binance, &pair).is_none());
    }

    #[test]
    fn out_of_order_publish_is_ignored() {
        let store = BookStore::new(5000);
        let pair = Pair::new("BTC", "USDT");
        let now = Utc::now();
        let earlier = now - chrono::Duration::milliseconds(10);
        store.put(snapshot(VenueId::Binance, pair.clone(), now));
        store.put(snapshot(VenueId::Binance, pair.clone(), earlier));
        let current = store.get(VenueId::Binance, &pair).unwrap();
        assert_eq!(current.ts_local(), now);
    }

    #[test]
    fn pairs_and_venues_indices() {
        let store = BookStore::new(5000);
        let pair = Pair::new("BTC", "USDT");
        store.put(snapshot(VenueId::Binance, pair.clone(), Utc::now()));
        store.put(snapshot(VenueId::Bybit, pair.clone(), Utc::now()));
        assert_eq!(store.pairs_of(VenueId::Binance), vec![pair.clone()]);
        let mut venues = store.venues_of(&pair);
        venues.sort();
        assert_eq!(venues, vec![VenueId::Binance, VenueId::Bybit]);
    }

    #[test]
    fn invalidate_removes_entry() {
        let store = BookStore::new(5000);
        let pair = Pair::new("BTC", "USDT");
        store.put(snapshot(VenueId::Binance, pair.clone(), Utc::now()));
        store.invalidate(VenueId::Binance, &pair);
        assert!(store.get(VenueId::Binance, &pair).is_none());
    }

    #[tokio::test]
    async fn notifications_fire_on_publish() {
        let (store, mut rx) = BookStore::with_notifications(5000, 16);
        let pair = Pair::new("BTC", "USDT");
        store.put(snapshot(VenueId::Binance, pair.clone(), Utc::now()));
        let update = rx.recv().await.unwrap();
        assert_eq!(update.venue, VenueId::Binance);
        assert_eq!(update.pair, pair);
    }
}
