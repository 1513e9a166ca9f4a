//! Core detection pipeline: domain types, symbol/fee reference data, the
//! book store, venue connectors, the VWAP cost model, and the scanning
//! engines.

pub mod connector;
pub mod domain;
pub mod engine;
pub mod fees;
pub mod registry;
pub mod store;
pub mod vwap;
