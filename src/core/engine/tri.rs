//! Tri Engine: periodically scans each venue's live books for profitable
//! 3-leg cycles back to a configured base asset.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::{mpsc, watch};
use tracing::{debug, warn};

use crate::core::domain::{Leg, Pair, Side, TriOpportunity, VenueId};
use crate::core::fees::FeeTable;
use crate::core::store::BookStore;
use crate::core::vwap::vwap_for_notional;

/// Neighbor count above which a base is skipped rather than enumerated, to
/// bound the O(d^2) cycle search per base.
const MAX_NEIGHBORS: usize = 200;

pub struct TriEngineConfig {
    pub scan_period: Duration,
    pub min_notional: Decimal,
    pub min_tri_gain_bps: Decimal,
    pub max_staleness_ms: i64,
    pub tri_bases: Vec<String>,
    pub tri_exclude_quotes: HashSet<String>,
}

#[derive(Debug, Clone)]
struct Edge {
    to: String,
    pair: Pair,
    side: Side,
    rate: Decimal,
    /// Distance of the VWAP used from the top-of-book touch price, used as
    /// a tie-break proxy for how much depth the leg consumed.
    depth_used: Decimal,
}

fn build_graph(
    venue: VenueId,
    store: &BookStore,
    min_notional: Decimal,
    max_staleness_ms: i64,
) -> HashMap<String, Vec<Edge>> {
    let now = Utc::now();
    let mut graph: HashMap<String, Vec<Edge>> = HashMap::new();

    for pair in store.pairs_of(venue) {
        let Some(snapshot) = store.get(venue, &pair) else { continue };
        if snapshot.age_ms(now) > max_staleness_ms {
            continue;
        }

        if let Some(bid_fill) = vwap_for_notional(snapshot.bids(), min_notional) {
            let touch = snapshot.best_bid().map(|l| l.price()).unwrap_or(bid_fill.vwap());
            graph.entry(pair.base().to_string()).or_default().push(Edge {
                to: pair.quote().to_string(),
                pair: pair.clone(),
                side: Side::Sell,
                rate: bid_fill.vwap(),
                depth_used: (touch - bid_fill.vwap()).abs(),
            });
        }
        if let Some(ask_fill) = vwap_for_notional(snapshot.asks(), min_notional) {
            let touch = snapshot.best_ask().map(|l| l.price()).unwrap_or(ask_fill.vwap());
            graph.entry(pair.quote().to_string()).or_default().push(Edge {
                to: pair.base().to_string(),
                pair: pair.clone(),
                side: Side::Buy,
                rate: Decimal::ONE / ask_fill.vwap(),
                depth_used: (touch - ask_fill.vwap()).abs(),
            });
        }
    }

    graph
}

fn cycle_legs(e1: &Edge, e2: &Edge, e3: &Edge) -> [Leg; 3] {
    [
        Leg::new(e1.pair.clone(), e1.side),
        Leg::new(e2.pair.clone(), e2.side),
        Leg::new(e3.pair.clone(), e3.side),
    ]
}

/// Run a single scan pass over `venue`, returning qualifying cycles for
/// every configured base, sorted by the tie-break rule (best first).
#[must_use]
pub fn scan_venue(
    venue: VenueId,
    store: &BookStore,
    fees: &FeeTable,
    config: &TriEngineConfig,
) -> Vec<TriOpportunity> {
    let graph = build_graph(venue, store, config.min_notional, config.max_staleness_ms);
    let now = Utc::now();
    let mut found = Vec::new();

    for base in &config.tri_bases {
        let Some(first_hop) = graph.get(base) else { continue };
        if first_hop.len() > MAX_NEIGHBORS {
            warn!(%venue, %base, neighbors = first_hop.len(), "tri base exceeds safety bound, skipping");
            continue;
        }

        for e1 in first_hop {
            if &e1.to == base || config.tri_exclude_quotes.contains(&e1.to) {
                continue;
            }
            let Some(second_hop) = graph.get(&e1.to) else { continue };
            for e2 in second_hop {
                if &e2.to == base || config.tri_exclude_quotes.contains(&e2.to) {
                    continue;
                }
                let Some(third_hop) = graph.get(&e2.to) else { continue };
                for e3 in third_hop {
                    if &e3.to != base {
                        continue;
                    }

                    let taker1 = fees.taker(venue, &e1.pair).ok();
                    let taker2 = fees.taker(venue, &e2.pair).ok();
                    let taker3 = fees.taker(venue, &e3.pair).ok();
                    let (Some(t1), Some(t2), Some(t3)) = (taker1, taker2, taker3) else { continue };

                    let gross = e1.rate * e2.rate * e3.rate;
                    let net_factor = gross * (Decimal::ONE - t1) * (Decimal::ONE - t2) * (Decimal::ONE - t3);
                    let gross_bps = (gross - Decimal::ONE) * Decimal::from(10_000);
                    let net_bps = (net_factor - Decimal::ONE) * Decimal::from(10_000);

                    if net_bps < config.min_tri_gain_bps {
                        continue;
                    }

                    let opp = TriOpportunity::new(venue, cycle_legs(e1, e2, e3), base.clone(), gross_bps, net_bps, now);
                    let depth_used = e1.depth_used + e2.depth_used + e3.depth_used;
                    found.push((opp, depth_used));
                }
            }
        }
    }

    found.sort_by(|(a, a_depth), (b, b_depth)| {
        b.net_bps().cmp(&a.net_bps()).then_with(|| a_depth.cmp(b_depth))
    });
    found.into_iter().map(|(opp, _)| opp).collect()
}

/// Spawn the periodic tri-scan task, one sweep across all venues per tick.
pub fn spawn_tri_engine(
    store: Arc<BookStore>,
    fees: Arc<FeeTable>,
    config: TriEngineConfig,
    tx: mpsc::Sender<TriOpportunity>,
    mut shutdown: watch::Receiver<bool>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(config.scan_period);
        loop {
            tokio::select! {
                biased;
                _ = shutdown.changed() => break,
                _ = ticker.tick() => {
                    for venue in VenueId::ALL {
                        for opp in scan_venue(venue, &store, &fees, &config) {
                            debug!(%venue, base = opp.base(), net_bps = %opp.net_bps(), "tri opportunity");
                            if tx.send(opp).await.is_err() {
                                warn!("tri engine emit channel closed");
                                return;
                            }
                        }
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::domain::{BookSnapshot, FeeEntry, PriceLevel};
    use rust_decimal_macros::dec;

    fn config() -> TriEngineConfig {
        TriEngineConfig {
            scan_period: Duration::from_millis(2000),
            min_notional: dec!(100),
            min_tri_gain_bps: dec!(15),
            max_staleness_ms: 5000,
            tri_bases: vec!["USDT".to_string()],
            tri_exclude_quotes: HashSet::new(),
        }
    }

    fn fees() -> FeeTable {
        let mut table = FeeTable::new();
        table.set_venue_default(FeeEntry::new(VenueId::Okx, None, dec!(0.0002), dec!(0.0005)));
        table
    }

    fn book(pair: Pair, bid: &str, ask: &str) -> BookSnapshot {
        BookSnapshot::new(
            VenueId::Okx,
            pair,
            vec![PriceLevel::new(bid.parse().unwrap(), dec!(1000))],
            vec![PriceLevel::new(ask.parse().unwrap(), dec!(1000))],
            None,
            Utc::now(),
            None,
        )
        .unwrap()
    }

    #[test]
    fn profitable_triangle_is_found() {
        let store = BookStore::new(5000);
        // USDT -> BTC -> ETH -> USDT, engineered with a small synthetic edge.
        store.put(book(Pair::new("BTC", "USDT"), "29990", "30000"));
        store.put(book(Pair::new("ETH", "BTC"), "0.066", "0.0661"));
        store.put(book(Pair::new("ETH", "USDT"), "2020", "2021"));

        let found = scan_venue(VenueId::Okx, &store, &fees(), &config());
        assert!(found.iter().any(|o| o.base() == "USDT"));
    }

    #[test]
    fn no_cycle_without_full_graph() {
        let store = BookStore::new(5000);
        store.put(book(Pair::new("BTC", "USDT"), "29990", "30000"));
        let found = scan_venue(VenueId::Okx, &store, &fees(), &config());
        assert!(found.is_empty());
    }

    #[test]
    fn excluded_intermediate_suppresses_cycle() {
        let store = BookStore::new(5000);
        store.put(book(Pair::new("BTC", "USDT"), "29990", "30000"));
        store.put(book(Pair::new("ETH", "BTC"), "0.066", "0.0661"));
        store.put(book(Pair::new("ETH", "USDT"), "2020", "2021"));

        let mut config = config();
        config.tri_exclude_quotes.insert("BTC".to_string());
        let found = scan_venue(VenueId::Okx, &store, &fees(), &config);
        assert!(found.is_empty());
    }
}
