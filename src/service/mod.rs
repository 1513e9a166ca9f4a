//! Ambient output stack: notification, persistence, and the Emitter task
//! that fans detected opportunities out to both sinks with dedup and
//! bounded queues.

mod db;
pub mod emitter;
pub mod notifier;
pub mod persistence;

pub use db::create_pool;
pub use emitter::{spawn_emitter, EmitterConfig};
pub use notifier::{NullNotifier, Notifier, RecordingNotifier};
pub use persistence::{MemoryOpportunityStore, OpportunityRecord, OpportunityStore, SqliteOpportunityStore};

#[cfg(feature = "telegram")]
pub use notifier::TelegramNotifier;
