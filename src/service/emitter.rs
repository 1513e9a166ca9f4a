//! Emitter: deduplicates detections and fans them out to the persistence
//! and notifier sinks, each behind its own bounded drop-oldest queue so a
//! slow sink never backs up the engines.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use tokio::sync::{mpsc, watch, Notify};
use tracing::{error, warn};

use crate::core::domain::{CrossOpportunity, Opportunity, Pair, TriOpportunity, VenueId};

use super::notifier::Notifier;
use super::persistence::OpportunityStore;

pub struct EmitterConfig {
    pub cooldown: Duration,
    pub queue_capacity: usize,
    pub notifier_max_attempts: u32,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self { cooldown: Duration::from_secs(60), queue_capacity: 1024, notifier_max_attempts: 3 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum DedupKey {
    Cross { pair: Pair, buy: VenueId, sell: VenueId, bucket: i64 },
    Tri { venue: VenueId, legs: Vec<Pair>, base: String, bucket: i64 },
}

/// `floor(x / width) * width`, represented as a plain `i64` so the dedup
/// key implements `Hash` without leaning on `Decimal`'s scale-sensitive
/// equality across differently-scaled equal values.
fn bucket_bps(net_bps: Decimal, width: i64) -> i64 {
    let bucketed = (net_bps / Decimal::from(width)).floor() * Decimal::from(width);
    bucketed.trunc().to_string().parse().unwrap_or(0)
}

fn dedup_key(opportunity: &Opportunity) -> DedupKey {
    match opportunity {
        Opportunity::Cross(c) => DedupKey::Cross {
            pair: c.pair().clone(),
            buy: c.buy_venue(),
            sell: c.sell_venue(),
            bucket: bucket_bps(c.net_bps(), 5),
        },
        Opportunity::Tri(t) => {
            let mut legs: Vec<Pair> = t.legs().iter().map(|l| l.pair().clone()).collect();
            legs.sort();
            DedupKey::Tri { venue: t.venue(), legs, base: t.base().to_string(), bucket: bucket_bps(t.net_bps(), 5) }
        }
    }
}

/// Suppresses repeated alerts for the same dedup key within `cooldown`.
struct Deduplicator {
    cooldown: Duration,
    last_emitted: HashMap<DedupKey, DateTime<Utc>>,
}

impl Deduplicator {
    fn new(cooldown: Duration) -> Self {
        Self { cooldown, last_emitted: HashMap::new() }
    }

    fn should_emit(&mut self, opportunity: &Opportunity, now: DateTime<Utc>) -> bool {
        let key = dedup_key(opportunity);
        match self.last_emitted.get(&key) {
            Some(last) if now.signed_duration_since(*last).to_std().unwrap_or(Duration::ZERO) < self.cooldown => false,
            _ => {
                self.last_emitted.insert(key, now);
                true
            }
        }
    }
}

/// A bounded, drop-oldest queue shared between a producer loop and one
/// consumer task.
struct Ring<T> {
    items: Mutex<VecDeque<T>>,
    capacity: usize,
    dropped: AtomicU64,
    notify: Notify,
}

impl<T> Ring<T> {
    fn new(capacity: usize) -> Self {
        Self { items: Mutex::new(VecDeque::with_capacity(capacity)), capacity, dropped: AtomicU64::new(0), notify: Notify::new() }
    }

    fn push(&self, item: T) {
        let mut items = self.items.lock();
        if items.len() >= self.capacity {
            items.pop_front();
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
        items.push_back(item);
        drop(items);
        self.notify.notify_one();
    }

    async fn pop(&self) -> T {
        loop {
            if let Some(item) = self.items.lock().pop_front() {
                return item;
            }
            self.notify.notified().await;
        }
    }

    fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

async fn send_with_retry(notifier: &dyn Notifier, message: &str, max_attempts: u32) {
    let mut attempt = 0;
    loop {
        attempt += 1;
        match notifier.send(message).await {
            Ok(()) => return,
            Err(err) if attempt < max_attempts => {
                warn!(attempt, error = %err, "notifier send failed, retrying");
                tokio::time::sleep(Duration::from_millis(200 * 2u64.pow(attempt))).await;
            }
            Err(err) => {
                error!(attempt, error = %err, "notifier send failed, dropping");
                return;
            }
        }
    }
}

/// Spawn the Emitter: merges the two engine outputs, dedups, and runs one
/// consumer task per sink over its own bounded ring.
#[allow(clippy::too_many_arguments)]
pub fn spawn_emitter(
    mut cross_rx: mpsc::Receiver<CrossOpportunity>,
    mut tri_rx: mpsc::Receiver<TriOpportunity>,
    store: Arc<dyn OpportunityStore>,
    notifier: Arc<dyn Notifier>,
    config: EmitterConfig,
    mut shutdown: watch::Receiver<bool>,
) -> tokio::task::JoinHandle<()> {
    let persistence_ring = Arc::new(Ring::<Opportunity>::new(config.queue_capacity));
    let notifier_ring = Arc::new(Ring::<Opportunity>::new(config.queue_capacity));

    let persistence_task = {
        let ring = persistence_ring.clone();
        let store = store.clone();
        tokio::spawn(async move {
            loop {
                let opportunity = ring.pop().await;
                if let Err(err) = store.save(&opportunity).await {
                    error!(error = %err, "failed to persist opportunity");
                }
            }
        })
    };

    let notifier_task = {
        let ring = notifier_ring.clone();
        let notifier = notifier.clone();
        let max_attempts = config.notifier_max_attempts;
        tokio::spawn(async move {
            loop {
                let opportunity = ring.pop().await;
                send_with_retry(notifier.as_ref(), &opportunity.describe(), max_attempts).await;
            }
        })
    };

    tokio::spawn(async move {
        let mut dedup = Deduplicator::new(config.cooldown);
        loop {
            tokio::select! {
                biased;
                _ = shutdown.changed() => break,
                Some(cross) = cross_rx.recv() => {
                    dispatch(Opportunity::Cross(cross), &mut dedup, &persistence_ring, &notifier_ring);
                }
                Some(tri) = tri_rx.recv() => {
                    dispatch(Opportunity::Tri(tri), &mut dedup, &persistence_ring, &notifier_ring);
                }
                else => break,
            }
        }
        persistence_task.abort();
        notifier_task.abort();
        if persistence_ring.dropped_count() > 0 || notifier_ring.dropped_count() > 0 {
            warn!(
                persistence_dropped = persistence_ring.dropped_count(),
                notifier_dropped = notifier_ring.dropped_count(),
                "emitter queues dropped entries during this run"
            );
        }
    })
}

fn dispatch(opportunity: Opportunity, dedup: &mut Deduplicator, persistence_ring: &Ring<Opportunity>, notifier_ring: &Ring<Opportunity>) {
    if !dedup.should_emit(&opportunity, Utc::now()) {
        return;
    }
    persistence_ring.push(opportunity.clone());
    notifier_ring.push(opportunity);
}
