//! Cross Engine: periodically scans for cross-exchange spreads on the same
//! pair, VWAP-costed on both legs.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::{mpsc, watch};
use tracing::{debug, warn};

use crate::core::domain::{CrossOpportunity, Pair, VenueId};
use crate::core::fees::FeeTable;
use crate::core::store::BookStore;
use crate::core::vwap::vwap_for_notional;

pub struct CrossEngineConfig {
    pub scan_period: Duration,
    pub min_notional: Decimal,
    pub min_spread_bps: Decimal,
    pub max_staleness_ms: i64,
}

/// Score one ordered venue pair `(buy_venue, sell_venue)` for `pair`, or
/// `None` if either leg is unfillable, stale, or below threshold.
fn score_crossing(
    store: &BookStore,
    fees: &FeeTable,
    pair: &Pair,
    buy_venue: VenueId,
    sell_venue: VenueId,
    config: &CrossEngineConfig,
) -> Option<CrossOpportunity> {
    let now = Utc::now();
    let buy_book = store.get(buy_venue, pair)?;
    let sell_book = store.get(sell_venue, pair)?;
    if buy_book.age_ms(now) > config.max_staleness_ms || sell_book.age_ms(now) > config.max_staleness_ms {
        return None;
    }

    let buy = vwap_for_notional(buy_book.asks(), config.min_notional)?;
    let sell = vwap_for_notional(sell_book.bids(), config.min_notional)?;

    let gross_bps = (sell.vwap() / buy.vwap() - Decimal::ONE) * Decimal::from(10_000);
    let taker_buy = fees.taker(buy_venue, pair).ok()?;
    let taker_sell = fees.taker(sell_venue, pair).ok()?;
    let net_bps = gross_bps - (taker_buy + taker_sell) * Decimal::from(10_000);

    if net_bps < config.min_spread_bps {
        return None;
    }

    Some(CrossOpportunity::new(
        pair.clone(),
        buy_venue,
        sell_venue,
        buy.fillable_notional().min(sell.fillable_notional()),
        gross_bps,
        net_bps,
        buy.vwap(),
        sell.vwap(),
        buy.fillable_notional().min(sell.fillable_notional()),
        now,
    ))
}

/// Tie-break: highest net bps, then larger fillable notional, then
/// lexicographic (buy_venue, sell_venue).
fn better(a: &CrossOpportunity, b: &CrossOpportunity) -> bool {
    if a.net_bps() != b.net_bps() {
        return a.net_bps() > b.net_bps();
    }
    if a.fillable_notional() != b.fillable_notional() {
        return a.fillable_notional() > b.fillable_notional();
    }
    (a.buy_venue(), a.sell_venue()) < (b.buy_venue(), b.sell_venue())
}

/// Run a single scan pass over every pair with >= 2 live books, returning
/// one winning opportunity per pair.
#[must_use]
pub fn scan_once(store: &BookStore, fees: &FeeTable, config: &CrossEngineConfig) -> Vec<CrossOpportunity> {
    let mut winners = Vec::new();
    for pair in store.all_pairs() {
        let venues = store.venues_of(&pair);
        if venues.len() < 2 {
            continue;
        }

        let mut best: Option<CrossOpportunity> = None;
        for &buy_venue in &venues {
            for &sell_venue in &venues {
                if buy_venue == sell_venue {
                    continue;
                }
                if let Some(candidate) = score_crossing(store, fees, &pair, buy_venue, sell_venue, config) {
                    best = Some(match best {
                        Some(current) if better(&current, &candidate) => current,
                        _ => candidate,
                    });
                }
            }
        }
        if let Some(winner) = best {
            winners.push(winner);
        }
    }
    winners
}

/// Spawn the periodic cross-scan task. Emits via `tx`; exits on `shutdown`.
pub fn spawn_cross_engine(
    store: Arc<BookStore>,
    fees: Arc<FeeTable>,
    config: CrossEngineConfig,
    tx: mpsc::Sender<CrossOpportunity>,
    mut shutdown: watch::Receiver<bool>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(config.scan_period);
        loop {
            tokio::select! {
                biased;
                _ = shutdown.changed() => break,
                _ = ticker.tick() => {
                    for opp in scan_once(&store, &fees, &config) {
                        debug!(pair = %opp.pair(), net_bps = %opp.net_bps(), "cross opportunity");
                        if tx.send(opp).await.is_err() {
                            warn!("cross engine emit channel closed");
                            return;
                        }
                    }
                }
            }
        }
    })
}
