//! Telegram Bot API client: long-poll for commands, send messages.

use super::Notifier;
use crate::config::TelegramConfig;
use crate::error::{AppError, Result};
use crate::types::ChatMessage;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Pause after a failed getUpdates call.
const RETRY_DELAY_SECS: u64 = 5;

#[derive(Debug, Deserialize)]
struct TelegramResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Update {
    update_id: i64,
    message: Option<Message>,
}

#[derive(Debug, Deserialize)]
struct Message {
    chat: Chat,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Chat {
    id: i64,
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
}

fn unwrap_response<T>(response: TelegramResponse<T>) -> Result<T> {
    if !response.ok {
        return Err(AppError::ExternalApi(
            response
                .description
                .unwrap_or_else(|| "Telegram request failed".to_string()),
        ));
    }
    response
        .result
        .ok_or_else(|| AppError::ExternalApi("Telegram response without result".to_string()))
}

/// Text messages in `updates`, plus the offset acknowledging all of them.
fn extract_messages(updates: Vec<Update>) -> (Vec<ChatMessage>, Option<i64>) {
    let next_offset = updates.iter().map(|u| u.update_id + 1).max();
    let messages = updates
        .into_iter()
        .filter_map(|u| {
            let message = u.message?;
            let text = message.text?;
            Some(ChatMessage::new(message.chat.id.to_string(), text))
        })
        .collect();
    (messages, next_offset)
}

/// Telegram Bot API client.
pub struct TelegramClient {
    client: Client,
    /// `{api_url}/bot{token}`
    base_url: String,
    poll_timeout_secs: u64,
}

impl TelegramClient {
    /// Create a new Telegram client for `token`.
    pub fn new(config: &TelegramConfig, token: &str) -> Result<Self> {
        // Long polls hold the request open for poll_timeout_secs
        let client = Client::builder()
            .timeout(Duration::from_secs(config.poll_timeout_secs + 10))
            .build()?;

        Ok(Self {
            client,
            base_url: format!("{}/bot{}", config.api_url.trim_end_matches('/'), token),
            poll_timeout_secs: config.poll_timeout_secs,
        })
    }

    async fn call<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        method: &str,
        body: &B,
    ) -> Result<T> {
        let url = format!("{}/{}", self.base_url, method);
        let response: TelegramResponse<T> = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await?
            .json()
            .await?;
        unwrap_response(response)
    }

    /// Fetch pending text messages after `offset`.
    async fn get_updates(&self, offset: Option<i64>) -> Result<(Vec<ChatMessage>, Option<i64>)> {
        let body = serde_json::json!({
            "offset": offset,
            "timeout": self.poll_timeout_secs,
            "allowed_updates": ["message"],
        });
        let updates: Vec<Update> = self.call("getUpdates", &body).await?;
        Ok(extract_messages(updates))
    }

    async fn send(&self, chat_id: &str, text: &str) -> Result<()> {
        let _: serde_json::Value = self
            .call("sendMessage", &SendMessageRequest { chat_id, text })
            .await?;
        debug!("Sent message to {}", chat_id);
        Ok(())
    }

    /// Long-poll for incoming messages and forward them to `tx`.
    ///
    /// Touches no bot state. Stops when the receiver is dropped.
    pub fn spawn_poller(self: Arc<Self>, tx: mpsc::Sender<ChatMessage>) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!("Starting Telegram update polling");
            let mut offset = None;

            loop {
                match self.get_updates(offset).await {
                    Ok((messages, next_offset)) => {
                        if next_offset.is_some() {
                            offset = next_offset;
                        }
                        for message in messages {
                            debug!("Command from {}: {}", message.chat_id, message.text);
                            if tx.send(message).await.is_err() {
                                info!("Command receiver closed, stopping Telegram polling");
                                return;
                            }
                        }
                    }
                    Err(e) => {
                        warn!("Telegram getUpdates error: {}", e);
                        tokio::time::sleep(Duration::from_secs(RETRY_DELAY_SECS)).await;
                    }
                }
            }
        })
    }
}

impl Notifier for TelegramClient {
    fn send_message<'a>(
        &'a self,
        chat_id: &'a str,
        text: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(self.send(chat_id, text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_messages() {
        let body = r#"{"ok":true,"result":[
            {"update_id":10,"message":{"message_id":1,"chat":{"id":7590209265,"type":"private"},"text":"/price"}},
            {"update_id":11,"message":{"message_id":2,"chat":{"id":-100123,"type":"group"}}},
            {"update_id":12,"edited_message":{"message_id":1,"chat":{"id":1},"text":"x"}}
        ]}"#;
        let response: TelegramResponse<Vec<Update>> = serde_json::from_str(body).unwrap();
        let (messages, offset) = extract_messages(unwrap_response(response).unwrap());
        assert_eq!(offset, Some(13));
        assert_eq!(messages, vec![ChatMessage::new("7590209265", "/price")]);
    }

    #[test]
    fn test_extract_messages_empty() {
        let (messages, offset) = extract_messages(Vec::new());
        assert!(messages.is_empty());
        assert_eq!(offset, None);
    }

    #[test]
    fn test_error_response() {
        let body = r#"{"ok":false,"error_code":401,"description":"Unauthorized"}"#;
        let response: TelegramResponse<Vec<Update>> = serde_json::from_str(body).unwrap();
        match unwrap_response(response) {
            Err(AppError::ExternalApi(msg)) => assert_eq!(msg, "Unauthorized"),
            other => panic!("expected ExternalApi, got {:?}", other.map(|u| u.len())),
        }
    }

    #[test]
    fn test_send_message_body() {
        let body = serde_json::to_string(&SendMessageRequest {
            chat_id: "42",
            text: "hi",
        })
        .unwrap();
        assert_eq!(body, r#"{"chat_id":"42","text":"hi"}"#);
    }

    #[test]
    fn test_base_url() {
        let config = TelegramConfig {
            api_url: "https://api.telegram.org/".to_string(),
            ..TelegramConfig::default()
        };
        let client = TelegramClient::new(&config, "123:abc").unwrap();
        assert_eq!(client.base_url, "https://api.telegram.org/bot123:abc");
    }

    #[tokio::test]
    async fn test_request_errors_hide_token() {
        let config = TelegramConfig {
            api_url: "http://127.0.0.1:1".to_string(),
            ..TelegramConfig::default()
        };
        let client = TelegramClient::new(&config, "123:SECRETTOKEN").unwrap();

        let err = client.get_updates(None).await.unwrap_err();
        assert!(matches!(err, AppError::Reqwest(_)));
        assert!(!err.to_string().contains("SECRETTOKEN"));

        let err = client.send("42", "hi").await.unwrap_err();
        assert!(!err.to_string().contains("SECRETTOKEN"));
    }
}
