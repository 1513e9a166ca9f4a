use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rust_decimal_macros::dec;
use tokio::sync::{mpsc, watch};

use edgelord_arb::core::domain::{CrossOpportunity, Pair, VenueId};
use edgelord_arb::service::{spawn_emitter, EmitterConfig, MemoryOpportunityStore, OpportunityStore, RecordingNotifier};

fn opportunity(net_bps: rust_decimal::Decimal) -> CrossOpportunity {
    CrossOpportunity::new(
        Pair::new("BTC", "USDT"),
        VenueId::Binance,
        VenueId::Bybit,
        dec!(100),
        net_bps,
        net_bps,
        dec!(30000),
        dec!(30100),
        dec!(100),
        Utc::now(),
    )
}

// S5: two detections of the same opportunity within the cooldown window
// collapse into a single notification and a single persisted record; a
// third detection after the cooldown expires gets through.
#[tokio::test]
async fn duplicate_detections_within_cooldown_are_suppressed() {
    let (cross_tx, cross_rx) = mpsc::channel(8);
    let (_tri_tx, tri_rx) = mpsc::channel::<edgelord_arb::core::domain::TriOpportunity>(8);
    let store: Arc<dyn OpportunityStore> = Arc::new(MemoryOpportunityStore::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);

    let config = EmitterConfig { cooldown: Duration::from_millis(100), queue_capacity: 64, notifier_max_attempts: 1 };
    let handle = spawn_emitter(cross_rx, tri_rx, store.clone(), notifier.clone() as Arc<dyn edgelord_arb::service::Notifier>, config, shutdown_rx);

    cross_tx.send(opportunity(dec!(30))).await.unwrap();
    cross_tx.send(opportunity(dec!(31))).await.unwrap();

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(notifier.sent().len(), 1, "second detection within cooldown must be suppressed");
    assert_eq!(store.count().await.unwrap(), 1);

    tokio::time::sleep(Duration::from_millis(80)).await;
    cross_tx.send(opportunity(dec!(30))).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(notifier.sent().len(), 2, "a detection after cooldown expiry must be delivered");
    assert_eq!(store.count().await.unwrap(), 2);

    drop(cross_tx);
    handle.abort();
}
