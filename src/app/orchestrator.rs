//! Orchestration: wires the registry, fee table, book store, per-venue
//! connectors, both engines, and the emitter into one running pipeline, and
//! drives it to a graceful shutdown.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};

use crate::core::connector::{spawn_connector, ConnectorConfig};
use crate::core::engine::{spawn_cross_engine, spawn_tri_engine, CrossEngineConfig, TriEngineConfig};
use crate::core::fees::FeeTable;
use crate::core::registry::SymbolRegistry;
use crate::core::store::BookStore;
use crate::error::Result;
use crate::service::{spawn_emitter, EmitterConfig, NullNotifier, Notifier, OpportunityStore, SqliteOpportunityStore};

use super::config::{default_venue_fees, Config};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    Healthy,
    Unhealthy(String),
}

#[derive(Debug, Clone)]
pub struct HealthCheck {
    name: &'static str,
    critical: bool,
    status: HealthStatus,
}

impl HealthCheck {
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub fn critical(&self) -> bool {
        self.critical
    }

    #[must_use]
    pub fn status(&self) -> &HealthStatus {
        &self.status
    }

    #[must_use]
    pub fn is_healthy(&self) -> bool {
        matches!(self.status, HealthStatus::Healthy)
    }
}

#[derive(Debug, Clone)]
pub struct HealthReport {
    checks: Vec<HealthCheck>,
}

impl HealthReport {
    #[must_use]
    pub fn checks(&self) -> &[HealthCheck] {
        &self.checks
    }

    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.checks.iter().filter(|check| check.critical()).all(HealthCheck::is_healthy)
    }
}

/// Validate configuration shape without connecting to anything. Used by
/// `edgelord check config` and as a pre-flight before `run`.
#[must_use]
pub fn health_check(config: &Config) -> HealthReport {
    let mut checks = Vec::new();

    checks.push(HealthCheck {
        name: "database_url",
        critical: true,
        status: if config.database_url.trim().is_empty() {
            HealthStatus::Unhealthy("DATABASE_URL is empty".to_string())
        } else {
            HealthStatus::Healthy
        },
    });

    checks.push(HealthCheck {
        name: "active_venues",
        critical: true,
        status: if config.active_venues().is_empty() {
            HealthStatus::Unhealthy("INCLUDE_EXCHANGES/EXCLUDE_EXCHANGES leave no venue active".to_string())
        } else {
            HealthStatus::Healthy
        },
    });

    checks.push(HealthCheck {
        name: "notifier",
        critical: false,
        status: if config.notifier_token.is_some() && config.notifier_chat.is_some() {
            HealthStatus::Healthy
        } else {
            HealthStatus::Unhealthy("NOTIFIER_TOKEN/NOTIFIER_CHAT unset, alerts will be logged only".to_string())
        },
    });

    HealthReport { checks }
}

/// Run until an external `ctrl_c` arrives.
pub async fn run(config: Config) -> Result<()> {
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    run_with_shutdown(config, shutdown_rx).await
}

/// Run the full pipeline until `shutdown` reports `true`.
pub async fn run_with_shutdown(config: Config, mut shutdown: watch::Receiver<bool>) -> Result<()> {
    let report = health_check(&config);
    if !report.is_healthy() {
        for check in report.checks().iter().filter(|c| !c.is_healthy() && c.critical()) {
            warn!(check = check.name(), "critical health check failed at startup");
        }
        return Err(crate::error::ConfigError::InvalidValue {
            field: "startup".into(),
            reason: "one or more critical health checks failed".into(),
        }
        .into());
    }

    let venues = config.active_venues();
    info!(venues = ?venues, "starting edgelord-arb");

    let registry = Arc::new(RwLock::new(SymbolRegistry::new()));
    let store = Arc::new(BookStore::new(config.max_staleness_ms));
    let fees = Arc::new(FeeTable::from_env_with_defaults(&default_venue_fees())?);

    let db_url = format!("sqlite://{}", config.database_url);
    let pool = crate::service::create_pool(&db_url)?;
    let opportunity_store: Arc<dyn OpportunityStore> = Arc::new(SqliteOpportunityStore::new(pool));

    let notifier: Arc<dyn Notifier> = build_notifier(&config);

    let mut connector_handles = Vec::new();
    for venue in &venues {
        let handle = spawn_connector(
            ConnectorConfig {
                venue: *venue,
                symbol_universe: config.symbol_universe.clone(),
                coalesce_ms: config.coalesce_ms,
                grace_shutdown_ms: config.grace_shutdown_ms,
            },
            Arc::clone(&registry),
            Arc::clone(&store),
            shutdown.clone(),
        );
        connector_handles.push(handle);
    }

    let (cross_tx, cross_rx) = mpsc::channel(256);
    let (tri_tx, tri_rx) = mpsc::channel(256);

    let cross_handle = spawn_cross_engine(
        Arc::clone(&store),
        Arc::clone(&fees),
        CrossEngineConfig {
            scan_period: Duration::from_millis(config.cross_scan_ms),
            min_notional: config.min_notional,
            min_spread_bps: config.min_spread_bps,
            max_staleness_ms: config.max_staleness_ms,
        },
        cross_tx,
        shutdown.clone(),
    );

    let tri_handle = spawn_tri_engine(
        Arc::clone(&store),
        Arc::clone(&fees),
        TriEngineConfig {
            scan_period: Duration::from_millis(config.tri_scan_ms),
            min_notional: config.min_notional,
            min_tri_gain_bps: config.min_tri_gain_bps,
            max_staleness_ms: config.max_staleness_ms,
            tri_bases: config.tri_bases.clone(),
            tri_exclude_quotes: config.tri_exclude_quotes.clone(),
        },
        tri_tx,
        shutdown.clone(),
    );

    let emitter_handle = spawn_emitter(
        cross_rx,
        tri_rx,
        opportunity_store,
        notifier,
        EmitterConfig {
            cooldown: Duration::from_secs(config.alert_cooldown_sec),
            queue_capacity: 1024,
            notifier_max_attempts: 3,
        },
        shutdown.clone(),
    );

    let _ = shutdown.changed().await;
    info!("shutdown signal received, draining");

    tokio::time::timeout(Duration::from_millis(config.grace_shutdown_ms), async {
        for handle in connector_handles {
            let _ = handle.join.await;
        }
        let _ = cross_handle.await;
        let _ = tri_handle.await;
        let _ = emitter_handle.await;
    })
    .await
    .ok();

    info!("edgelord-arb stopped");
    Ok(())
}

fn build_notifier(config: &Config) -> Arc<dyn Notifier> {
    #[cfg(feature = "telegram")]
    if let (Some(token), Some(chat)) = (&config.notifier_token, &config.notifier_chat) {
        return Arc::new(crate::service::TelegramNotifier::new(token.clone(), chat.clone()));
    }
    let _ = config;
    Arc::new(NullNotifier)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_check_struct_accessors() {
        let check = HealthCheck { name: "test", critical: true, status: HealthStatus::Healthy };
        assert_eq!(check.name(), "test");
        assert!(check.critical());
        assert!(check.is_healthy());
    }

    #[test]
    fn health_report_is_healthy_when_all_critical_pass() {
        let report = HealthReport {
            checks: vec![
                HealthCheck { name: "a", critical: true, status: HealthStatus::Healthy },
                HealthCheck { name: "b", critical: false, status: HealthStatus::Unhealthy("warn".into()) },
            ],
        };
        assert!(report.is_healthy());
    }

    #[test]
    fn health_report_is_unhealthy_when_critical_fails() {
        let report = HealthReport {
            checks: vec![HealthCheck { name: "a", critical: true, status: HealthStatus::Unhealthy("err".into()) }],
        };
        assert!(!report.is_healthy());
    }
}
