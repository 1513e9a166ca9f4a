mod support;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use rust_decimal_macros::dec;
use tokio::sync::{mpsc, watch};

use edgelord_arb::core::domain::{Pair, Side, VenueId};
use edgelord_arb::core::engine::{spawn_tri_engine, TriEngineConfig};
use edgelord_arb::core::fees::FeeTable;
use edgelord_arb::core::store::BookStore;

use support::book::one_level_book;

fn fee_table(taker: rust_decimal::Decimal) -> Arc<FeeTable> {
    let mut defaults = HashMap::new();
    defaults.insert(VenueId::Okx, (taker, taker));
    Arc::new(FeeTable::from_env_with_defaults(&defaults).unwrap())
}

// min_notional applies uncoverted to each leg's own quote currency, so it
// has to clear the smallest-denominated leg (BTC-quoted) at the sizes used
// below rather than the USDT-scale notional of the other two legs.
fn config() -> TriEngineConfig {
    TriEngineConfig {
        scan_period: Duration::from_millis(20),
        min_notional: dec!(1),
        min_tri_gain_bps: dec!(15),
        max_staleness_ms: 5000,
        tri_bases: vec!["USDT".to_string()],
        tri_exclude_quotes: HashSet::new(),
    }
}

// S4: a 3-leg cycle (USDT -> BTC -> ETH -> USDT) that clears the gain
// threshold after fees is emitted with its legs in traversal order.
//
// The tri engine walks base->quote edges via bid VWAP and quote->base edges
// via 1/ask VWAP, so USDT->BTC uses the BTC/USDT ask, BTC->ETH uses the
// ETH/BTC ask, and ETH->USDT uses the ETH/USDT bid.
#[tokio::test]
async fn profitable_cycle_is_detected_end_to_end() {
    let store = Arc::new(BookStore::new(5000));
    store.put(one_level_book(VenueId::Okx, Pair::new("BTC", "USDT"), dec!(29990), dec!(30000), dec!(10)));
    store.put(one_level_book(VenueId::Okx, Pair::new("ETH", "BTC"), dec!(0.0659), dec!(0.0660), dec!(20)));
    store.put(one_level_book(VenueId::Okx, Pair::new("ETH", "USDT"), dec!(2010), dec!(2020), dec!(10)));

    let (tx, mut rx) = mpsc::channel(8);
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = spawn_tri_engine(store, fee_table(dec!(0.001)), config(), tx, shutdown_rx);

    let opp = tokio::time::timeout(Duration::from_secs(1), rx.recv()).await.unwrap().unwrap();
    assert_eq!(opp.venue(), VenueId::Okx);
    assert_eq!(opp.base(), "USDT");
    assert!(opp.net_bps() >= dec!(15));
    assert!(opp.net_bps() <= opp.gross_bps());

    let legs = opp.legs();
    assert_eq!(legs[0].pair(), &Pair::new("BTC", "USDT"));
    assert_eq!(legs[0].side(), Side::Buy);
    assert_eq!(legs[1].pair(), &Pair::new("ETH", "BTC"));
    assert_eq!(legs[1].side(), Side::Buy);
    assert_eq!(legs[2].pair(), &Pair::new("ETH", "USDT"));
    assert_eq!(legs[2].side(), Side::Sell);

    handle.abort();
}

// Flat books (no edge between the three assets clears a profit) never
// produce a cycle.
#[tokio::test]
async fn flat_books_produce_no_cycle() {
    let store = Arc::new(BookStore::new(5000));
    store.put(one_level_book(VenueId::Okx, Pair::new("BTC", "USDT"), dec!(29999), dec!(30000), dec!(10)));
    store.put(one_level_book(VenueId::Okx, Pair::new("ETH", "BTC"), dec!(0.06665), dec!(0.06667), dec!(20)));
    store.put(one_level_book(VenueId::Okx, Pair::new("ETH", "USDT"), dec!(1999.5), dec!(2000.5), dec!(10)));

    let (tx, mut rx) = mpsc::channel(8);
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = spawn_tri_engine(store, fee_table(dec!(0.001)), config(), tx, shutdown_rx);

    let result = tokio::time::timeout(Duration::from_millis(200), rx.recv()).await;
    assert!(result.is_err(), "no cycle should have cleared the threshold");

    handle.abort();
}
