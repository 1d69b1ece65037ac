//! WhatsApp channel — sends messages through the Cloud API.
//!
//! Covers the Graph API `/{number-id}/messages` endpoint with a bearer
//! token, adapted to the `MessageSender` trait the engine consumes.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use crate::channels::MessageSender;
use crate::error::{ChannelError, ConfigError};

/// Graph API version the Cloud API endpoints are pinned to.
const GRAPH_API_BASE: &str = "https://graph.facebook.com/v18.0";

/// Maximum body length for a WhatsApp text message.
const WHATSAPP_MAX_MESSAGE_LENGTH: usize = 4096;

/// Outbound request timeout.
const SEND_TIMEOUT: Duration = Duration::from_secs(30);

/// WhatsApp Cloud API credentials.
#[derive(Clone)]
pub struct WhatsAppConfig {
    /// Bearer token for the Cloud API.
    pub api_token: SecretString,
    /// The business phone-number id messages are sent from.
    pub number_id: String,
}

impl WhatsAppConfig {
    /// Build from `WHATSAPP_API_TOKEN` and `WHATSAPP_CLOUD_NUMBER_ID`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_token = std::env::var("WHATSAPP_API_TOKEN")
            .map_err(|_| ConfigError::MissingEnvVar("WHATSAPP_API_TOKEN".into()))?;
        let number_id = std::env::var("WHATSAPP_CLOUD_NUMBER_ID")
            .map_err(|_| ConfigError::MissingEnvVar("WHATSAPP_CLOUD_NUMBER_ID".into()))?;
        Ok(Self {
            api_token: SecretString::from(api_token),
            number_id,
        })
    }
}

/// WhatsApp channel — posts to the Cloud API message endpoint.
pub struct WhatsAppChannel {
    config: WhatsAppConfig,
    client: reqwest::Client,
}

impl WhatsAppChannel {
    pub fn new(config: WhatsAppConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(SEND_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self { config, client }
    }

    fn api_url(&self, resource: &str) -> String {
        format!("{GRAPH_API_BASE}/{}/{resource}", self.config.number_id)
    }

    /// Send a single text body (≤4096 chars).
    async fn send_chunk(&self, to: &str, text: &str) -> Result<(), ChannelError> {
        let payload = serde_json::json!({
            "messaging_product": "whatsapp",
            "to": to,
            "type": "text",
            "text": {
                "preview_url": false,
                "body": text,
            }
        });

        let resp = self
            .client
            .post(self.api_url("messages"))
            .bearer_auth(self.config.api_token.expose_secret())
            .json(&payload)
            .send()
            .await
            .map_err(|e| ChannelError::SendFailed {
                name: "whatsapp".into(),
                reason: e.to_string(),
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!(status = %status, %body, "WhatsApp sendMessage failed");
            return Err(ChannelError::Rejected {
                name: "whatsapp".into(),
                status: status.as_u16(),
            });
        }

        Ok(())
    }

    /// Verify the number id is reachable with the configured token.
    pub async fn health_check(&self) -> Result<(), ChannelError> {
        let resp = self
            .client
            .get(format!("{GRAPH_API_BASE}/{}", self.config.number_id))
            .bearer_auth(self.config.api_token.expose_secret())
            .send()
            .await
            .map_err(|e| ChannelError::StartupFailed {
                name: "whatsapp".into(),
                reason: e.to_string(),
            })?;

        if resp.status().is_success() {
            Ok(())
        } else {
            Err(ChannelError::HealthCheckFailed {
                name: "whatsapp".into(),
            })
        }
    }
}

#[async_trait]
impl MessageSender for WhatsAppChannel {
    fn name(&self) -> &str {
        "whatsapp"
    }

    async fn send(&self, text: &str, user: &str) -> Result<(), ChannelError> {
        for chunk in split_message(text, WHATSAPP_MAX_MESSAGE_LENGTH) {
            self.send_chunk(user, &chunk).await?;
        }
        Ok(())
    }
}

/// Split a message into chunks that fit the channel's character limit.
/// Tries to split on newlines, then spaces, then hard-cuts.
fn split_message(text: &str, max_len: usize) -> Vec<String> {
    if text.len() <= max_len {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut remaining = text;

    while !remaining.is_empty() {
        if remaining.len() <= max_len {
            chunks.push(remaining.to_string());
            break;
        }

        let chunk = &remaining[..max_len];
        let split_at = chunk
            .rfind('\n')
            .or_else(|| chunk.rfind(' '))
            .unwrap_or(max_len);

        // Don't split at position 0 (infinite loop guard)
        let split_at = if split_at == 0 { max_len } else { split_at };

        chunks.push(remaining[..split_at].to_string());
        remaining = remaining[split_at..].trim_start();
    }

    chunks
}
