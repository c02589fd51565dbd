//! Telegram Bot API delivery.
//!
//! Sends HTML-formatted messages through `sendMessage`. A missing bot token
//! disables delivery without any network call.

use std::time::Duration;

use async_trait::async_trait;
use domain::services::{DeliveryOutcome, NotificationSender};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::TelegramConfig;

/// Reason reported for every send when no token is configured.
pub const TOKEN_MISSING: &str = "bot token not configured";

/// Error type for Telegram operations.
#[derive(Debug, thiserror::Error)]
pub enum TelegramError {
    #[error("bot token not configured")]
    NotConfigured,

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Telegram API error: {0}")]
    Api(String),
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'static str,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Telegram Bot API client.
#[derive(Clone)]
pub struct TelegramClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl TelegramClient {
    pub fn new(config: &TelegramConfig) -> Result<Self, TelegramError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            token: config.token().map(str::to_string),
        })
    }

    fn send_message_url(&self, token: &str) -> String {
        format!("{}/bot{}/sendMessage", self.base_url, token)
    }

    /// Sends one message. Success requires `"ok": true` in the response body.
    pub async fn send_message(&self, chat_id: &str, html: &str) -> Result<(), TelegramError> {
        let token = self.token.as_deref().ok_or(TelegramError::NotConfigured)?;

        let response = self
            .client
            .post(self.send_message_url(token))
            .json(&SendMessageRequest {
                chat_id,
                text: html,
                parse_mode: "HTML",
            })
            .send()
            .await?;

        let status = response.status();
        let body: ApiResponse = match response.json().await {
            Ok(body) => body,
            Err(_) => return Err(TelegramError::Api(format!("unexpected response ({})", status))),
        };

        if body.ok {
            Ok(())
        } else {
            Err(TelegramError::Api(
                body.description
                    .unwrap_or_else(|| format!("request rejected ({})", status)),
            ))
        }
    }
}

#[async_trait]
impl NotificationSender for TelegramClient {
    async fn send(&self, chat_id: &str, html: &str) -> DeliveryOutcome {
        match self.send_message(chat_id, html).await {
            Ok(()) => {
                tracing::debug!(chat_id = %chat_id, "Telegram message sent");
                DeliveryOutcome::Sent
            }
            Err(TelegramError::NotConfigured) => DeliveryOutcome::Failed(TOKEN_MISSING.to_string()),
            Err(e) => {
                tracing::warn!(chat_id = %chat_id, error = %e, "Telegram delivery failed");
                DeliveryOutcome::Failed(e.to_string())
            }
        }
    }

    fn is_configured(&self) -> bool {
        self.token.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer, token: Option<&str>) -> TelegramClient {
        TelegramClient::new(&TelegramConfig {
            bot_token: token.map(str::to_string),
            api_base_url: server.uri(),
            timeout_secs: 5,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_send_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot123:abc/sendMessage"))
            .and(body_json(json!({
                "chat_id": "42",
                "text": "<b>hi</b>",
                "parse_mode": "HTML"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true, "result": {}})))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, Some("123:abc"));
        assert!(client.is_configured());
        assert_eq!(client.send("42", "<b>hi</b>").await, DeliveryOutcome::Sent);
    }

    #[tokio::test]
    async fn test_send_api_rejection() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "ok": false,
                "description": "Bad Request: chat not found"
            })))
            .mount(&server)
            .await;

        let outcome = client_for(&server, Some("t")).send("1", "x").await;
        match outcome {
            DeliveryOutcome::Failed(reason) => assert!(reason.contains("chat not found")),
            DeliveryOutcome::Sent => panic!("expected failure"),
        }
    }

    #[tokio::test]
    async fn test_send_ok_false_with_200() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": false})))
            .mount(&server)
            .await;

        assert!(!client_for(&server, Some("t")).send("1", "x").await.is_sent());
    }

    #[tokio::test]
    async fn test_send_non_json_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server)
            .await;

        assert!(!client_for(&server, Some("t")).send("1", "x").await.is_sent());
    }

    #[tokio::test]
    async fn test_missing_token_makes_no_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .expect(0)
            .mount(&server)
            .await;

        let client = client_for(&server, None);
        assert!(!client.is_configured());
        assert_eq!(
            client.send("1", "x").await,
            DeliveryOutcome::Failed(TOKEN_MISSING.to_string())
        );
    }
}
