//! Terminal delivery of detected opportunities: a thin `Notifier` trait
//! plus a Telegram implementation, a no-op, and a recording test double.
//!
//! Grounded in the reference codebase's `Notifier`/`NotifierRegistry`
//! pattern, simplified to the single `send(message)` operation the Emitter
//! needs rather than a typed `Event` enum -- this pipeline emits one kind
//! of terminal message (an opportunity line), not a mix of lifecycle
//! events.

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::Result;

/// A delivery sink for opportunity messages.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, message: &str) -> Result<()>;
}

/// Discards every message. Used when no chat notifier is configured.
pub struct NullNotifier;

#[async_trait]
impl Notifier for NullNotifier {
    async fn send(&self, _message: &str) -> Result<()> {
        Ok(())
    }
}

/// Records every message it receives, for assertions in tests.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, message: &str) -> Result<()> {
        self.sent.lock().push(message.to_string());
        Ok(())
    }
}

#[cfg(feature = "telegram")]
pub use telegram::TelegramNotifier;

#[cfg(feature = "telegram")]
mod telegram {
    use async_trait::async_trait;
    use serde_json::json;

    use super::Notifier;
    use crate::error::{Error, Result};

    const API_TIMEOUT_SECS: u64 = 10;

    /// Posts messages to a Telegram chat via the Bot API's `sendMessage`
    /// method, over plain `reqwest` rather than a bot framework -- the
    /// Emitter only ever needs to push text, never to receive updates.
    pub struct TelegramNotifier {
        http: reqwest::Client,
        bot_token: String,
        chat_id: String,
    }

    impl TelegramNotifier {
        #[must_use]
        pub fn new(bot_token: impl Into<String>, chat_id: impl Into<String>) -> Self {
            let http = reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(API_TIMEOUT_SECS))
                .build()
                .expect("reqwest client builds with default TLS backend");
            Self { http, bot_token: bot_token.into(), chat_id: chat_id.into() }
        }
    }

    #[async_trait]
    impl Notifier for TelegramNotifier {
        async fn send(&self, message: &str) -> Result<()> {
            let url = format!("https://api.telegram.org/bot{}/sendMessage", self.bot_token);
            let resp = self
                .http
                .post(&url)
                .json(&json!({ "chat_id": self.chat_id, "text": message }))
                .send()
                .await?;

            if !resp.status().is_success() {
                let status = resp.status();
                let body = resp.text().await.unwrap_or_default();
                return Err(Error::Notifier(format!("telegram API returned {status}: {body}")));
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn null_notifier_always_succeeds() {
        assert!(NullNotifier.send("hello").await.is_ok());
    }

    #[tokio::test]
    async fn recording_notifier_captures_messages_in_order() {
        let notifier = RecordingNotifier::new();
        notifier.send("first").await.unwrap();
        notifier.send("second").await.unwrap();
        assert_eq!(notifier.sent(), vec!["first".to_string(), "second".to_string()]);
    }
}
