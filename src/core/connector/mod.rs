//! Connector: one state-machine task per venue turning a `VenueTransport`
//! into a stream of published `BookSnapshot`s in the shared `BookStore`.

mod backoff;
mod coalesce;
mod protocol;
mod task;
mod venues;

pub use protocol::{transport_for, VenueEvent, VenueLimits, VenueTransport};
pub use task::{spawn_connector, ConnectorConfig, ConnectorHandle, ConnectorState};
