//! Outbound Transport
//!
//! Where replies go. The Telegram client is the production implementation.

use async_trait::async_trait;
use thiserror::Error;

use portfolio_core::{Reply, SessionId};

#[derive(Error, Debug)]
pub enum TransportError {
    /// Request never produced a usable response
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    /// Chat service answered `ok: false`
    #[error("API error {code}: {description}")]
    Api { code: i64, description: String },

    #[error("Malformed response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for TransportError {
    // request URLs embed the bot token
    fn from(err: reqwest::Error) -> Self {
        Self::Http(err.without_url())
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Deliver `reply` to the chat identified by `chat_id`
    async fn send(&self, chat_id: SessionId, reply: &Reply) -> Result<(), TransportError>;
}
