//! Detection engines: periodic tasks that scan the Book Store and emit
//! `Opportunity` values. Each engine is self-contained; the orchestrator
//! wires their output into the Emitter.

mod cross;
mod tri;

pub use cross::{spawn_cross_engine, CrossEngineConfig};
pub use tri::{spawn_tri_engine, TriEngineConfig};
