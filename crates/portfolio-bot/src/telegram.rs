//! Telegram Bot API Client
//!
//! Long polling via `getUpdates`, replies via `sendMessage` / `sendPhoto`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, multipart};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::json;

use portfolio_core::{Reply, SessionId};

use crate::transport::{Transport, TransportError};

/// Slack on top of the long-poll timeout before the request itself times out
const POLL_GRACE_SECS: u64 = 10;

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    #[serde(default)]
    error_code: Option<i64>,
    #[serde(default)]
    description: Option<String>,
}

impl<T> ApiResponse<T> {
    fn into_result(self) -> Result<T, TransportError> {
        match (self.ok, self.result) {
            (true, Some(result)) => Ok(result),
            (true, None) => Err(TransportError::Malformed("ok response without result".into())),
            (false, _) => Err(TransportError::Api {
                code: self.error_code.unwrap_or_default(),
                description: self.description.unwrap_or_default(),
            }),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Chat {
    pub id: SessionId,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    #[serde(default)]
    pub from: Option<User>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
}

/// Telegram Bot API client
pub struct TelegramClient {
    client: Client,
    /// `{api_url}/bot{token}`, never logged
    endpoint: String,
    request_timeout: Duration,
}

impl TelegramClient {
    pub fn new(api_url: &str, token: &str, request_timeout_secs: u64) -> Result<Self, TransportError> {
        let client = Client::builder().build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/bot{}", api_url.trim_end_matches('/'), token),
            request_timeout: Duration::from_secs(request_timeout_secs),
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/{}", self.endpoint, method)
    }

    async fn call<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, TransportError> {
        let response: ApiResponse<T> = request.send().await?.json().await?;
        response.into_result()
    }

    /// Identity of the bot; fails when the token is rejected
    pub async fn get_me(&self) -> Result<User, TransportError> {
        self.call(
            self.client
                .get(self.method_url("getMe"))
                .timeout(self.request_timeout),
        )
        .await
    }

    /// Wait up to `timeout_secs` for updates with id >= `offset`
    pub async fn get_updates(&self, offset: i64, timeout_secs: u64) -> Result<Vec<Update>, TransportError> {
        let body = json!({
            "offset": offset,
            "timeout": timeout_secs,
            "allowed_updates": ["message"],
        });
        self.call(
            self.client
                .post(self.method_url("getUpdates"))
                .timeout(Duration::from_secs(timeout_secs + POLL_GRACE_SECS))
                .json(&body),
        )
        .await
    }

    pub async fn send_message(&self, chat_id: SessionId, text: &str) -> Result<(), TransportError> {
        let body = json!({ "chat_id": chat_id, "text": text });
        let _: Message = self
            .call(
                self.client
                    .post(self.method_url("sendMessage"))
                    .timeout(self.request_timeout)
                    .json(&body),
            )
            .await?;
        Ok(())
    }

    pub async fn send_photo(
        &self,
        chat_id: SessionId,
        name: &str,
        caption: Option<&str>,
        bytes: Vec<u8>,
    ) -> Result<(), TransportError> {
        let photo = multipart::Part::bytes(bytes)
            .file_name(name.to_string())
            .mime_str("image/png")?;
        let mut form = multipart::Form::new()
            .text("chat_id", chat_id.to_string())
            .part("photo", photo);
        if let Some(caption) = caption {
            form = form.text("caption", caption.to_string());
        }

        let _: Message = self
            .call(
                self.client
                    .post(self.method_url("sendPhoto"))
                    .timeout(self.request_timeout)
                    .multipart(form),
            )
            .await?;
        Ok(())
    }
}

#[async_trait]
impl Transport for TelegramClient {
    async fn send(&self, chat_id: SessionId, reply: &Reply) -> Result<(), TransportError> {
        match reply {
            Reply::Text(text) => self.send_message(chat_id, text).await,
            Reply::Photo { name, caption, bytes } => {
                self.send_photo(chat_id, name, caption.as_deref(), bytes.clone())
                    .await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_updates() {
        let body = r#"{
            "ok": true,
            "result": [
                {"update_id": 10, "message": {"message_id": 1, "chat": {"id": -100}, "text": "SHOW",
                 "from": {"id": 5, "is_bot": false, "first_name": "Ann"}}},
                {"update_id": 11, "edited_message": {"message_id": 1, "chat": {"id": -100}}},
                {"update_id": 12, "message": {"message_id": 2, "chat": {"id": 7}, "sticker": {}}}
            ]
        }"#;
        let response: ApiResponse<Vec<Update>> = serde_json::from_str(body).unwrap();
        let updates = response.into_result().unwrap();

        assert_eq!(updates.len(), 3);
        let first = updates[0].message.as_ref().unwrap();
        assert_eq!(first.chat.id, -100);
        assert_eq!(first.text.as_deref(), Some("SHOW"));
        assert!(updates[1].message.is_none());
        assert!(updates[2].message.as_ref().unwrap().text.is_none());
    }

    #[test]
    fn test_api_error() {
        let body = r#"{"ok": false, "error_code": 401, "description": "Unauthorized"}"#;
        let response: ApiResponse<User> = serde_json::from_str(body).unwrap();
        let err = response.into_result().unwrap_err();
        assert!(matches!(err, TransportError::Api { code: 401, ref description } if description == "Unauthorized"));
    }

    #[test]
    fn test_endpoint_layout() {
        let client = TelegramClient::new("https://api.telegram.org/", "123:abc", 5).unwrap();
        assert_eq!(client.method_url("getMe"), "https://api.telegram.org/bot123:abc/getMe");
    }
}
