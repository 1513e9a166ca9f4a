//! Bybit v5 spot: REST instruments-info for discovery, a single
//! WebSocket connection with an explicit JSON subscribe frame (as opposed
//! to Binance's URL-encoded combined streams).

use async_trait::async_trait;
use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::str::FromStr;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

use crate::core::connector::protocol::{VenueEvent, VenueLimits, VenueTransport};
use crate::core::domain::{BookSnapshot, Market, Pair, PriceLevel, VenueId};
use crate::error::{ConnectorError, Error, Result};

const REST_BASE: &str = "https://api.bybit.com";
const WS_URL: &str = "wss://stream.bybit.com/v5/public/spot";

#[derive(Deserialize)]
struct InstrumentsResponse {
    result: InstrumentsResult,
}

#[derive(Deserialize)]
struct InstrumentsResult {
    list: Vec<Instrument>,
}

#[derive(Deserialize)]
struct Instrument {
    symbol: String,
    status: String,
    #[serde(rename = "baseCoin")]
    base_coin: String,
    #[serde(rename = "quoteCoin")]
    quote_coin: String,
}

#[derive(Deserialize)]
struct OrderbookMessage {
    topic: String,
    data: OrderbookData,
}

#[derive(Deserialize)]
struct OrderbookData {
    #[serde(rename = "u")]
    update_id: u64,
    b: Vec<(String, String)>,
    a: Vec<(String, String)>,
}

pub struct BybitTransport {
    http: reqwest::Client,
    ws: Option<WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>>,
    limits: VenueLimits,
    topic_to_pair: HashMap<String, Pair>,
}

impl BybitTransport {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
            ws: None,
            limits: VenueLimits { max_subscriptions_per_connection: 10, ws_inactivity_timeout_secs: 30 },
            topic_to_pair: HashMap::new(),
        }
    }

    fn topic(native_symbol: &str) -> String {
        format!("orderbook.50.{native_symbol}")
    }

    fn parse_levels(raw: &[(String, String)]) -> Result<Vec<PriceLevel>> {
        raw.iter()
            .map(|(p, s)| {
                let price = Decimal::from_str(p).map_err(|e| Error::Connector(ConnectorError::Protocol(e.to_string())))?;
                let size = Decimal::from_str(s).map_err(|e| Error::Connector(ConnectorError::Protocol(e.to_string())))?;
                Ok(PriceLevel::new(price, size))
            })
            .collect()
    }
}

impl Default for BybitTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VenueTransport for BybitTransport {
    async fn discover(&mut self) -> Result<Vec<Market>> {
        let url = format!("{REST_BASE}/v5/market/instruments-info?category=spot");
        let resp: InstrumentsResponse = self.http.get(&url).send().await?.json().await?;
        let markets = resp
            .result
            .list
            .into_iter()
            .filter(|i| i.status == "Trading")
            .map(|i| Market::new(VenueId::Bybit, Pair::new(i.base_coin, i.quote_coin), i.symbol, 8, 8, Decimal::new(10, 0)))
            .collect();
        Ok(markets)
    }

    async fn subscribe(&mut self, markets: &[Market]) -> Result<()> {
        let (ws, _) = connect_async(WS_URL).await.map_err(Error::WebSocket)?;
        self.ws = Some(ws);

        let topics: Vec<String> = markets.iter().map(|m| Self::topic(m.native_symbol())).collect();
        for (topic, market) in topics.iter().zip(markets.iter()) {
            self.topic_to_pair.insert(topic.clone(), market.pair().clone());
        }

        for chunk in topics.chunks(self.limits.max_subscriptions_per_connection) {
            let frame = json!({ "op": "subscribe", "args": chunk }).to_string();
            if let Some(ws) = self.ws.as_mut() {
                ws.send(Message::Text(frame)).await.map_err(Error::WebSocket)?;
            }
        }
        Ok(())
    }

    async fn resync(&mut self, market: &Market) -> Result<BookSnapshot> {
        let url = format!("{REST_BASE}/v5/market/orderbook?category=spot&symbol={}&limit=50", market.native_symbol());
        #[derive(Deserialize)]
        struct Resp {
            result: OrderbookData,
        }
        let resp: Resp = self.http.get(&url).send().await?.json().await?;
        let bids = Self::parse_levels(&resp.result.b)?;
        let asks = Self::parse_levels(&resp.result.a)?;
        BookSnapshot::new(VenueId::Bybit, market.pair().clone(), bids, asks, None, Utc::now(), Some(resp.result.update_id))
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
                if !text.contains("\"topic\"") {
                    return Ok(VenueEvent::Heartbeat);
                }
                let parsed: OrderbookMessage =
                    serde_json::from_str(&text).map_err(|e| Error::Connector(ConnectorError::Protocol(e.to_string())))?;
                let pair = self
                    .topic_to_pair
                    .get(&parsed.topic)
                    .cloned()
                    .ok_or_else(|| Error::Connector(ConnectorError::Protocol("unknown topic".into())))?;
                let bids = Self::parse_levels(&parsed.data.b)?;
                let asks = Self::parse_levels(&parsed.data.a)?;
                let snapshot =
                    BookSnapshot::new(VenueId::Bybit, pair, bids, asks, None, Utc::now(), Some(parsed.data.update_id))
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
