//! The per-venue connector task: a single state-machine loop driving one
//! `VenueTransport` and publishing into the shared `BookStore`.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use parking_lot::RwLock;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::core::domain::{Market, Pair, VenueId};
use crate::core::registry::SymbolRegistry;
use crate::core::store::BookStore;

use super::backoff::Backoff;
use super::coalesce::Coalescer;
use super::protocol::{transport_for, VenueEvent, VenueTransport};

/// Connector lifecycle state, reported for `edgelord-arb status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectorState {
    Init,
    Discover,
    Subscribing,
    Streaming,
    Degraded,
    Reconnecting,
    Stopped,
}

pub struct ConnectorConfig {
    pub venue: VenueId,
    pub symbol_universe: Option<HashSet<Pair>>,
    pub coalesce_ms: i64,
    pub grace_shutdown_ms: u64,
}

pub struct ConnectorHandle {
    pub venue: VenueId,
    pub state: watch::Receiver<ConnectorState>,
    pub join: JoinHandle<()>,
}

fn epoch_millis() -> u64 {
    Utc::now().timestamp_millis().max(0) as u64
}

fn filter_markets(markets: Vec<Market>, universe: &Option<HashSet<Pair>>) -> Vec<Market> {
    match universe {
        None => markets,
        Some(allowed) => markets.into_iter().filter(|m| allowed.contains(m.pair())).collect(),
    }
}

/// Spawn the connector task for one venue. Runs until `shutdown` fires.
pub fn spawn_connector(
    config: ConnectorConfig,
    registry: Arc<RwLock<SymbolRegistry>>,
    store: Arc<BookStore>,
    mut shutdown: watch::Receiver<bool>,
) -> ConnectorHandle {
    let venue = config.venue;
    let (state_tx, state_rx) = watch::channel(ConnectorState::Init);

    let join = tokio::spawn(async move {
        let mut transport = transport_for(venue);
        let mut backoff = Backoff::new();
        let mut coalescer = Coalescer::new(config.coalesce_ms);
        let mut markets: Vec<Market> = Vec::new();
        let mut state = ConnectorState::Init;

        loop {
            let _ = state_tx.send(state);
            match state {
                ConnectorState::Init => {
                    state = ConnectorState::Discover;
                }
                ConnectorState::Discover => {
                    match transport.discover().await {
                        Ok(discovered) => {
                            markets = filter_markets(discovered, &config.symbol_universe);
                            registry
                                .write()
                                .load(venue, markets.iter().map(|m| (m.native_symbol().to_string(), m.clone())));
                            state = ConnectorState::Subscribing;
                        }
                        Err(err) => {
                            warn!(%venue, error = %err, "venue discovery failed, retrying");
                            backoff.record_failure(Instant::now(), epoch_millis());
                            tokio::time::sleep(backoff.next_delay()).await;
                        }
                    }
                }
                ConnectorState::Subscribing => match transport.subscribe(&markets).await {
                    Ok(()) => {
                        state = ConnectorState::Streaming;
                        backoff.reset();
                        info!(%venue, count = markets.len(), "subscribed");
                    }
                    Err(err) => {
                        warn!(%venue, error = %err, "subscribe failed, reconnecting");
                        state = ConnectorState::Reconnecting;
                    }
                },
                ConnectorState::Streaming | ConnectorState::Degraded => {
                    tokio::select! {
                        biased;
                        _ = shutdown.changed() => {
                            state = ConnectorState::Stopped;
                        }
                        event = transport.next_event() => {
                            match event {
                                Ok(VenueEvent::Book(snapshot)) => {
                                    let pair = snapshot.pair().clone();
                                    if coalescer.should_publish(&pair, Utc::now()) {
                                        store.put(snapshot);
                                    }
                                    if state == ConnectorState::Degraded {
                                        state = ConnectorState::Streaming;
                                    }
                                }
                                Ok(VenueEvent::SequenceGap { pair }) => {
                                    warn!(%venue, %pair, "sequence gap, resyncing");
                                    store.invalidate(venue, &pair);
                                    state = ConnectorState::Degraded;
                                    if let Some(market) = markets.iter().find(|m| m.pair() == &pair) {
                                        match transport.resync(market).await {
                                            Ok(snapshot) => {
                                                store.put(snapshot);
                                                state = ConnectorState::Streaming;
                                            }
                                            Err(err) => {
                                                warn!(%venue, %pair, error = %err, "resync failed");
                                            }
                                        }
                                    }
                                }
                                Ok(VenueEvent::Heartbeat) => {
                                    debug!(%venue, "heartbeat");
                                }
                                Err(err) => {
                                    warn!(%venue, error = %err, "transport error, reconnecting");
                                    state = ConnectorState::Reconnecting;
                                }
                            }
                        }
                    }
                }
                ConnectorState::Reconnecting => {
                    backoff.record_failure(Instant::now(), epoch_millis());
                    if backoff.allows_connection(epoch_millis()) {
                        tokio::time::sleep(backoff.next_delay()).await;
                        state = ConnectorState::Subscribing;
                    } else {
                        tokio::time::sleep(Duration::from_millis(1000)).await;
                    }
                }
                ConnectorState::Stopped => {
                    let _ = tokio::time::timeout(
                        Duration::from_millis(config.grace_shutdown_ms),
                        transport.shutdown(),
                    )
                    .await;
                    let _ = state_tx.send(ConnectorState::Stopped);
                    break;
                }
            }
        }
    });

    ConnectorHandle { venue, state: state_rx, join }
}
