//! Opportunity persistence: an append-only log of every detection, used
//! for later analysis rather than as a source of truth the pipeline reads
//! back from.
//!
//! Grounded in the reference codebase's `RelationStore` /
//! `SqliteRelationStore` / `MemoryStore` trio: a narrow trait, a Diesel
//! backend, and an in-memory test double.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use parking_lot::Mutex;

use crate::core::domain::Opportunity;
use crate::error::{Error, Result};

use super::db::{model::NewOpportunityRow, model::OpportunityRow, schema::opportunities, DbPool};

/// One persisted detection row.
#[derive(Debug, Clone, PartialEq)]
pub struct OpportunityRecord {
    pub id: i64,
    pub t_detected: DateTime<Utc>,
    pub kind: String,
    pub payload_json: String,
}

fn kind_and_payload(opportunity: &Opportunity) -> Result<(&'static str, String)> {
    let kind = match opportunity {
        Opportunity::Cross(_) => "cross",
        Opportunity::Tri(_) => "tri",
    };
    let payload = serde_json::to_string(&Payload::from(opportunity)).map_err(Error::Json)?;
    Ok((kind, payload))
}

/// A serializable mirror of the fields a detection log entry needs, since
/// `Opportunity` itself carries no `Serialize` impl for its `Decimal`
/// fields beyond what `rust_decimal`'s `serde` feature provides directly.
#[derive(serde::Serialize)]
struct Payload {
    id: String,
    describe: String,
    net_bps: rust_decimal::Decimal,
}

impl From<&Opportunity> for Payload {
    fn from(opportunity: &Opportunity) -> Self {
        Self {
            id: opportunity.id().to_string(),
            describe: opportunity.describe(),
            net_bps: opportunity.net_bps(),
        }
    }
}

#[async_trait]
pub trait OpportunityStore: Send + Sync {
    async fn save(&self, opportunity: &Opportunity) -> Result<()>;
    async fn list_since(&self, since: DateTime<Utc>) -> Result<Vec<OpportunityRecord>>;
    async fn count(&self) -> Result<usize>;
}

pub struct SqliteOpportunityStore {
    pool: DbPool,
}

impl SqliteOpportunityStore {
    #[must_use]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn from_row(row: OpportunityRow) -> Result<OpportunityRecord> {
        let t_detected = DateTime::parse_from_rfc3339(&row.t_detected)
            .map_err(|e| Error::Notifier(format!("corrupt t_detected in opportunity row: {e}")))?
            .with_timezone(&Utc);
        Ok(OpportunityRecord { id: i64::from(row.id), t_detected, kind: row.kind, payload_json: row.payload_json })
    }
}

#[async_trait]
impl OpportunityStore for SqliteOpportunityStore {
    async fn save(&self, opportunity: &Opportunity) -> Result<()> {
        let (kind, payload_json) = kind_and_payload(opportunity)?;
        let row = NewOpportunityRow {
            t_detected: opportunity.t_detected().to_rfc3339(),
            kind: kind.to_string(),
            payload_json,
        };
        let mut conn = self.pool.get().map_err(Error::DbConnection)?;
        diesel::insert_into(opportunities::table).values(&row).execute(&mut conn).map_err(Error::Database)?;
        Ok(())
    }

    async fn list_since(&self, since: DateTime<Utc>) -> Result<Vec<OpportunityRecord>> {
        let mut conn = self.pool.get().map_err(Error::DbConnection)?;
        let since_str = since.to_rfc3339();
        let rows: Vec<OpportunityRow> = opportunities::table
            .filter(opportunities::t_detected.ge(since_str))
            .load(&mut conn)
            .map_err(Error::Database)?;
        rows.into_iter().map(Self::from_row).collect()
    }

    async fn count(&self) -> Result<usize> {
        let mut conn = self.pool.get().map_err(Error::DbConnection)?;
        let total: i64 = opportunities::table.count().get_result(&mut conn).map_err(Error::Database)?;
        Ok(total as usize)
    }
}

/// In-memory store backing unit and integration tests.
#[derive(Default)]
pub struct MemoryOpportunityStore {
    records: Mutex<Vec<OpportunityRecord>>,
    next_id: Mutex<i64>,
}

impl MemoryOpportunityStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OpportunityStore for MemoryOpportunityStore {
    async fn save(&self, opportunity: &Opportunity) -> Result<()> {
        let (kind, payload_json) = kind_and_payload(opportunity)?;
        let mut next_id = self.next_id.lock();
        *next_id += 1;
        self.records.lock().push(OpportunityRecord {
            id: *next_id,
            t_detected: opportunity.t_detected(),
            kind: kind.to_string(),
            payload_json,
        });
        Ok(())
    }

    async fn list_since(&self, since: DateTime<Utc>) -> Result<Vec<OpportunityRecord>> {
        Ok(self.records.lock().iter().filter(|r| r.t_detected >= since).cloned().collect())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.records.lock().len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::domain::{CrossOpportunity, Pair, VenueId};
    use rust_decimal_macros::dec;

    fn cross() -> Opportunity {
        Opportunity::Cross(CrossOpportunity::new(
            Pair::new("BTC", "USDT"),
            VenueId::Binance,
            VenueId::Bybit,
            dec!(100),
            dec!(30),
            dec!(20),
            dec!(30000),
            dec!(30100),
            dec!(100),
            Utc::now(),
        ))
    }

    #[tokio::test]
    async fn memory_store_round_trips() {
        let store = MemoryOpportunityStore::new();
        store.save(&cross()).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 1);
        let records = store.list_since(Utc::now() - chrono::Duration::seconds(5)).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, "cross");
    }

    #[tokio::test]
    async fn memory_store_list_since_excludes_old_records() {
        let store = MemoryOpportunityStore::new();
        store.save(&cross()).await.unwrap();
        let future = Utc::now() + chrono::Duration::seconds(5);
        assert!(store.list_since(future).await.unwrap().is_empty());
    }
}
