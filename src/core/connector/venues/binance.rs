//! Binance spot: REST `exchangeInfo` for discovery, combined depth streams
//! over a single WebSocket for live books.

use async_trait::async_trait;
use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

use crate::core::connector::protocol::{VenueEvent, VenueLimits, VenueTransport};
use crate::core::domain::{BookSnapshot, Market, Pair, PriceLevel, VenueId};
use crate::error::{ConnectorError, Error, Result};

const REST_BASE: &str = "https://api.binance.com";
const WS_BASE: &str = "wss://stream.binance.com:9443/stream";

#[derive(Deserialize)]
struct ExchangeInfoResponse {
    symbols: Vec<SymbolInfo>,
}

#[derive(Deserialize)]
struct SymbolInfo {
    symbol: String,
    status: String,
    #[serde(rename = "baseAsset")]
    base_asset: String,
    #[serde(rename = "quoteAsset")]
    quote_asset: String,
}

#[derive(Deserialize)]
struct CombinedStreamEnvelope {
    stream: String,
    data: DepthPayload,
}

#[derive(Deserialize)]
struct DepthPayload {
    #[serde(rename = "lastUpdateId")]
    last_update_id: Option<u64>,
    bids: Vec<(String, String)>,
    asks: Vec<(String, String)>,
}

pub struct BinanceTransport {
    http: reqwest::Client,
    ws: Option<WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>>,
    limits: VenueLimits,
    stream_to_pair: std::collections::HashMap<String, Pair>,
}

impl BinanceTransport {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
            ws: None,
            limits: VenueLimits { max_subscriptions_per_connection: 200, ws_inactivity_timeout_secs: 30 },
            stream_to_pair: std::collections::HashMap::new(),
        }
    }

    fn depth_stream_name(native_symbol: &str) -> String {
        format!("{}@depth20@100ms", native_symbol.to_ascii_lowercase())
    }

    fn parse_levels(raw: &[(String, String)]) -> Result<Vec<PriceLevel>> {
        raw.iter()
            .map(|(p, s)| {
                let price = Decimal::from_str(p)
                    .map_err(|e| Error::Connector(ConnectorError::Protocol(e.to_string())))?;
                let size = Decimal::from_str(s)
                    .map_err(|e| Error::Connector(ConnectorError::Protocol(e.to_string())))?;
                Ok(PriceLevel::new(price, size))
            })
            .collect()
    }
}

impl Default for BinanceTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VenueTransport for BinanceTransport {
    async fn discover(&mut self) -> Result<Vec<Market>> {
        let url = format!("{REST_BASE}/api/v3/exchangeInfo");
        let resp: ExchangeInfoResponse = self.http.get(&url).send().await?.json().await?;
        let markets = resp
            .symbols
            .into_iter()
            .filter(|s| s.status == "TRADING")
            .map(|s| {
                Market::new(
                    VenueId::Binance,
                    Pair::new(s.base_asset, s.quote_asset),
                    s.symbol,
                    8,
                    8,
                    Decimal::new(10, 0),
                )
            })
            .collect();
        Ok(markets)
    }

    async fn subscribe(&mut self, markets: &[Market]) -> Result<()> {
        let streams: Vec<String> = markets.iter().map(|m| Self::depth_stream_name(m.native_symbol())).collect();
        for (stream, market) in streams.iter().zip(markets.iter()) {
            self.stream_to_pair.insert(stream.clone(), market.pair().clone());
        }
        let joined = streams.join("/");
        let url = format!("{WS_BASE}?streams={joined}");
        let (ws, _) = connect_async(url).await.map_err(Error::WebSocket)?;
        self.ws = Some(ws);
        Ok(())
    }

    async fn resync(&mut self, market: &Market) -> Result<BookSnapshot> {
        let url = format!("{REST_BASE}/api/v3/depth?symbol={}&limit=20", market.native_symbol());
        let payload: DepthPayload = self.http.get(&url).send().await?.json().await?;
        let bids = Self::parse_levels(&payload.bids)?;
        let asks = Self::parse_levels(&payload.asks)?;
        BookSnapshot::new(VenueId::Binance, market.pair().clone(), bids, asks, None, Utc::now(), payload.last_update_id)
            .map_err(Error::Book)
    }

    async fn next_event(&mut self) -> Result<VenueEvent> {
        let ws = self.ws.as_mut().ok_or_else(|| Error::Connector(ConnectorError::Transport("not connected".into())))?;
        let timeout = tokio::time::Duration::from_secs(self.limits.ws_inactivity_timeout_secs);
        let msg = tokio::time::timeout(timeout, ws.next())
            .await
            .map_err(|_| Error::Connector(ConnectorError::Transport("inactivity timeout".into())))?
            .ok_or_else(|| Error::Connector(ConnectorError::Transport("stream closed".into())))?
            .map_err(Error::WebSocket)?;

        match msg {
            Message::Text(text) => {
                let envelope: CombinedStreamEnvelope =
                    serde_json::from_str(&text).map_err(|e| Error::Connector(ConnectorError::Protocol(e.to_string())))?;
                let pair = self
                    .stream_to_pair
                    .get(&envelope.stream)
                    .cloned()
                    .ok_or_else(|| Error::Connector(ConnectorError::Protocol("unknown stream".into())))?;
                let bids = Self::parse_levels(&envelope.data.bids)?;
                let asks = Self::parse_levels(&envelope.data.asks)?;
                let snapshot = BookSnapshot::new(
                    VenueId::Binance,
                    pair,
                    bids,
                    asks,
                    None,
                    Utc::now(),
                    envelope.data.last_update_id,
                )
                .map_err(Error::Book)?;
                Ok(VenueEvent::Book(snapshot))
            }
            Message::Ping(_) | Message::Pong(_) => Ok(VenueEvent::Heartbeat),
            Message::Close(_) => Err(Error::Connector(ConnectorError::Transport("connection closed".into()))),
            _ => Ok(VenueEvent::Heartbeat),
        }
    }

    async fn shutdown(&mut self) {
        if let Some(mut ws) = self.ws.take() {
            let _ = ws.close(None).await;
        }
    }
}
