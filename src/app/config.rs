//! Runtime configuration, loaded entirely from the process environment
//! (optionally pre-populated from a `.env` file via `dotenvy`).
//!
//! Mirrors the reference codebase's `Config::load`/`validate` split, but
//! there is no TOML file in this version: every key in the external
//! interface table is an environment variable, parsed with a conservative
//! default where one exists.

use std::collections::{HashMap, HashSet};
use std::env;

use rust_decimal::Decimal;

use crate::core::domain::{Bps, Pair, VenueId};
use crate::error::{ConfigError, Result};

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: "pretty".to_string() }
    }
}

/// Fully parsed, validated runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub min_spread_bps: Bps,
    pub min_tri_gain_bps: Bps,
    pub min_notional: Decimal,
    pub symbol_universe: Option<HashSet<Pair>>,
    pub tri_bases: Vec<String>,
    pub tri_exclude_quotes: HashSet<String>,
    pub include_exchanges: Option<HashSet<VenueId>>,
    pub exclude_exchanges: HashSet<VenueId>,
    pub depth_levels: u32,
    pub coalesce_ms: i64,
    pub cross_scan_ms: u64,
    pub tri_scan_ms: u64,
    pub max_staleness_ms: i64,
    pub alert_cooldown_sec: u64,
    pub notifier_token: Option<String>,
    pub notifier_chat: Option<String>,
    pub grace_shutdown_ms: u64,
    pub database_url: String,
    pub logging: LoggingConfig,
    pub dry_run: bool,
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_decimal(key: &str, default: &str) -> Result<Decimal> {
    let raw = env_str(key).unwrap_or_else(|| default.to_string());
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::ParseEnv { key: key.to_string(), reason: "not a decimal".to_string() }.into())
}

fn parse_u64(key: &str, default: u64) -> Result<u64> {
    match env_str(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::ParseEnv { key: key.to_string(), reason: "not an integer".to_string() }.into()),
    }
}

fn parse_i64(key: &str, default: i64) -> Result<i64> {
    match env_str(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::ParseEnv { key: key.to_string(), reason: "not an integer".to_string() }.into()),
    }
}

fn parse_csv(key: &str) -> Vec<String> {
    env_str(key)
        .map(|raw| raw.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect())
        .unwrap_or_default()
}

fn parse_venue_set(key: &str) -> Result<HashSet<VenueId>> {
    parse_csv(key)
        .into_iter()
        .map(|s| VenueId::parse(&s).ok_or_else(|| ConfigError::InvalidValue { field: key.to_string(), reason: format!("unknown venue {s}") }.into()))
        .collect()
}

fn parse_pair_set(key: &str) -> Result<Option<HashSet<Pair>>> {
    let raw = parse_csv(key);
    if raw.is_empty() {
        return Ok(None);
    }
    let pairs = raw
        .into_iter()
        .map(|s| Pair::parse(&s).ok_or_else(|| ConfigError::InvalidValue { field: key.to_string(), reason: format!("malformed pair {s}") }.into()))
        .collect::<Result<HashSet<Pair>>>()?;
    Ok(Some(pairs))
}

impl Config {
    #[allow(clippy::result_large_err)]
    pub fn load() -> Result<Self> {
        let _ = dotenvy::dotenv();

        let tri_bases = {
            let raw = parse_csv("TRI_BASES");
            if raw.is_empty() { vec!["BTC".to_string(), "ETH".to_string(), "USDT".to_string()] } else { raw }
        };

        let config = Self {
            min_spread_bps: parse_decimal("MIN_SPREAD_BPS", "25")?,
            min_tri_gain_bps: parse_decimal("MIN_TRI_GAIN_BPS", "15")?,
            min_notional: parse_decimal("MIN_NOTIONAL", "100")?,
            symbol_universe: parse_pair_set("SYMBOL_UNIVERSE")?,
            tri_bases,
            tri_exclude_quotes: parse_csv("TRI_EXCLUDE_QUOTES").into_iter().collect(),
            include_exchanges: {
                let set = parse_venue_set("INCLUDE_EXCHANGES")?;
                if set.is_empty() { None } else { Some(set) }
            },
            exclude_exchanges: parse_venue_set("EXCLUDE_EXCHANGES")?,
            depth_levels: parse_u64("DEPTH_LEVELS", 20)? as u32,
            coalesce_ms: parse_i64("COALESCE_MS", 100)?,
            cross_scan_ms: parse_u64("CROSS_SCAN_MS", 1000)?,
            tri_scan_ms: parse_u64("TRI_SCAN_MS", 2000)?,
            max_staleness_ms: parse_i64("MAX_STALENESS_MS", 5000)?,
            alert_cooldown_sec: parse_u64("ALERT_COOLDOWN_SEC", 60)?,
            notifier_token: env_str("NOTIFIER_TOKEN"),
            notifier_chat: env_str("NOTIFIER_CHAT"),
            grace_shutdown_ms: parse_u64("GRACE_SHUTDOWN_MS", 2000)?,
            database_url: env_str("DATABASE_URL").unwrap_or_else(|| "edgelord-arb.db".to_string()),
            logging: LoggingConfig {
                level: env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
                format: env_str("LOG_FORMAT").unwrap_or_else(|| "pretty".to_string()),
            },
            dry_run: false,
        };

        config.validate()?;
        Ok(config)
    }

    #[allow(clippy::result_large_err)]
    fn validate(&self) -> Result<()> {
        if self.min_spread_bps <= Decimal::ZERO {
            return Err(ConfigError::InvalidValue { field: "MIN_SPREAD_BPS".into(), reason: "must be positive".into() }.into());
        }
        if self.min_tri_gain_bps <= Decimal::ZERO {
            return Err(ConfigError::InvalidValue { field: "MIN_TRI_GAIN_BPS".into(), reason: "must be positive".into() }.into());
        }
        if self.min_notional <= Decimal::ZERO {
            return Err(ConfigError::InvalidValue { field: "MIN_NOTIONAL".into(), reason: "must be positive".into() }.into());
        }
        if self.tri_bases.is_empty() {
            return Err(ConfigError::MissingField { field: "TRI_BASES".into() }.into());
        }
        if self.coalesce_ms <= 0 || self.cross_scan_ms == 0 || self.tri_scan_ms == 0 || self.max_staleness_ms <= 0 {
            return Err(ConfigError::InvalidValue { field: "*_MS".into(), reason: "scan and staleness windows must be positive".into() }.into());
        }
        if let Some(include) = &self.include_exchanges {
            let overlap: Vec<_> = include.intersection(&self.exclude_exchanges).collect();
            if !overlap.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "INCLUDE_EXCHANGES/EXCLUDE_EXCHANGES".into(),
                    reason: format!("{overlap:?} listed in both"),
                }
                .into());
            }
        }
        Ok(())
    }

    /// Effective venue set after whitelist/blacklist are applied.
    #[must_use]
    pub fn active_venues(&self) -> Vec<VenueId> {
        VenueId::ALL
            .into_iter()
            .filter(|v| self.include_exchanges.as_ref().map_or(true, |set| set.contains(v)))
            .filter(|v| !self.exclude_exchanges.contains(v))
            .collect()
    }

    pub fn init_logging(&self) {
        use tracing_subscriber::{fmt, EnvFilter};

        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.logging.level));

        match self.logging.format.as_str() {
            "json" => {
                fmt().json().with_env_filter(filter).init();
            }
            _ => {
                fmt().with_env_filter(filter).init();
            }
        }
    }
}

/// Conservative maker/taker defaults per venue, used as the starting point
/// for [`crate::core::fees::FeeTable::from_env_with_defaults`] before
/// `FEE_OVERRIDE_*` is applied.
#[must_use]
pub fn default_venue_fees() -> HashMap<VenueId, (Bps, Bps)> {
    use rust_decimal_macros::dec;

    HashMap::from([
        (VenueId::Binance, (dec!(0.001), dec!(0.001))),
        (VenueId::Bybit, (dec!(0.0001), dec!(0.0006))),
        (VenueId::Okx, (dec!(0.0008), dec!(0.001))),
        (VenueId::Kucoin, (dec!(0.001), dec!(0.001))),
        (VenueId::Mexc, (dec!(0), dec!(0.0005))),
        (VenueId::Huobi, (dec!(0.002), dec!(0.002))),
        (VenueId::Cointr, (dec!(0.001), dec!(0.001))),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn clear_all() {
        for key in [
            "MIN_SPREAD_BPS", "MIN_TRI_GAIN_BPS", "MIN_NOTIONAL", "SYMBOL_UNIVERSE", "TRI_BASES",
            "TRI_EXCLUDE_QUOTES", "INCLUDE_EXCHANGES", "EXCLUDE_EXCHANGES", "DEPTH_LEVELS",
            "COALESCE_MS", "CROSS_SCAN_MS", "TRI_SCAN_MS", "MAX_STALENESS_MS", "ALERT_COOLDOWN_SEC",
            "NOTIFIER_TOKEN", "NOTIFIER_CHAT", "GRACE_SHUTDOWN_MS", "DATABASE_URL", "LOG_FORMAT",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    fn defaults_apply_when_unset() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_all();
        let config = Config::load().unwrap();
        assert_eq!(config.min_spread_bps, Decimal::from(25));
        assert_eq!(config.tri_bases, vec!["BTC", "ETH", "USDT"]);
        assert_eq!(config.database_url, "edgelord-arb.db");
        assert!(config.include_exchanges.is_none());
        assert_eq!(config.active_venues().len(), VenueId::ALL.len());
    }

    #[test]
    fn include_and_exclude_overlap_is_rejected() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_all();
        env::set_var("INCLUDE_EXCHANGES", "binance,bybit");
        env::set_var("EXCLUDE_EXCHANGES", "bybit");
        assert!(Config::load().is_err());
        env::remove_var("INCLUDE_EXCHANGES");
        env::remove_var("EXCLUDE_EXCHANGES");
    }

    #[test]
    fn zero_threshold_is_rejected() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_all();
        env::set_var("MIN_SPREAD_BPS", "0");
        assert!(Config::load().is_err());
        env::remove_var("MIN_SPREAD_BPS");
    }

    #[test]
    fn symbol_universe_parses_canonical_pairs() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_all();
        env::set_var("SYMBOL_UNIVERSE", "BTC/USDT, eth/usdt");
        let config = Config::load().unwrap();
        let universe = config.symbol_universe.unwrap();
        assert!(universe.contains(&Pair::new("BTC", "USDT")));
        assert!(universe.contains(&Pair::new("ETH", "USDT")));
        env::remove_var("SYMBOL_UNIVERSE");
    }
}
