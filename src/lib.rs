//! Edgelord-arb - real-time cross-exchange and triangular arbitrage
//! detection for crypto spot markets.
//!
//! # Architecture
//!
//! ```text
//! src/
//! ├── core/             # Detection pipeline: domain types, registry, fee
//! │   │                 # table, book store, connectors, engines
//! └── service/          # Ambient output stack: notifier, persistence,
//! │                     # emitter
//! └── app/              # Configuration and orchestration wiring
//! └── cli/              # Command-line entrypoint
//! ```
//!
//! # Features
//!
//! - `telegram` - Enable Telegram notifications (default)
//! - `testkit` - Expose test-only fixtures for integration tests
//! - `integration-tests` - Tests that open real sockets to exchanges

pub mod app;
pub mod cli;
pub mod core;
pub mod error;
pub mod service;
