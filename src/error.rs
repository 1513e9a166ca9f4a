//! Crate-wide error taxonomy.
//!
//! `ConfigError` and `ConnectorError` are narrower enums that map onto the
//! config-fault / transport-fault / protocol-fault categories; everything
//! else collapses into the flat `Error` so call sites that just need `?`
//! don't have to reach into a variant.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required configuration field: {field}")]
    MissingField { field: String },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("failed to parse environment variable {key}: {reason}")]
    ParseEnv { key: String, reason: String },
}

#[derive(Error, Debug)]
pub enum ConnectorError {
    #[error("venue discovery failed: {0}")]
    Discovery(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("sequence gap detected, resync required")]
    SequenceGap,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("connector error: {0}")]
    Connector(#[from] ConnectorError),

    #[error("book error: {0}")]
    Book(#[from] crate::core::domain::BookError),

    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("database connection error: {0}")]
    DbConnection(#[from] r2d2::Error),

    #[error("database pool error: {0}")]
    DbPool(String),

    #[error("notifier error: {0}")]
    Notifier(String),
}

pub type Result<T> = std::result::Result<T, Error>;
