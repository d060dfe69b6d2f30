//! Anthropic provider implementation for ChatBridge
//!
//! Sends chat requests to the Anthropic messages API. System-role turns
//! are lifted into the top-level `system` field because the API rejects
//! them inside `messages`.

use crate::error::{ChatBridgeError, Result};
use crate::providers::base::{
    extract_error_message, join_url, ChatCompletion, ChatParams, Message, Provider,
};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Claude models offered to clients; Anthropic has no public listing endpoint
pub const MODELS: &[&str] = &[
    "claude-3-5-sonnet-20241022",
    "claude-3-5-haiku-20241022",
    "claude-3-opus-20240229",
    "claude-3-sonnet-20240229",
    "claude-3-haiku-20240307",
];

/// Anthropic API provider
pub struct AnthropicProvider {
    client: Client,
    base_url: String,
    api_key: String,
    api_version: String,
}

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<&'a Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    temperature: f64,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContent>,
    #[serde(default)]
    usage: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct AnthropicContent {
    #[serde(rename = "type")]
    content_type: String,
    #[serde(default)]
    text: String,
}

impl AnthropicProvider {
    /// Create a provider bound to `base_url` and a server-side key
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        api_version: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
            api_version: api_version.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn build_request<'a>(&self, params: &'a ChatParams) -> AnthropicRequest<'a> {
        let (system, turns): (Vec<&Message>, Vec<&Message>) =
            params.messages.iter().partition(|m| m.is_system());

        let system = if system.is_empty() {
            None
        } else {
            Some(
                system
                    .iter()
                    .map(|m| m.content.as_str())
                    .collect::<Vec<_>>()
                    .join("\n\n"),
            )
        };

        AnthropicRequest {
            model: &params.model,
            max_tokens: params.max_tokens,
            messages: turns,
            system,
            temperature: params.temperature,
        }
    }
}

#[async_trait]
impl Provider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn complete(&self, params: &ChatParams) -> Result<ChatCompletion> {
        let url = join_url(&self.base_url, "v1/messages");
        let body = self.build_request(params);

        tracing::debug!(
            model = %params.model,
            messages = body.messages.len(),
            has_system = body.system.is_some(),
            "Sending Anthropic chat request"
        );

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", &self.api_version)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Anthropic request failed: {}", e);
                ChatBridgeError::Provider {
                    status: 0,
                    message: format!("Request to provider failed: {}", e),
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("Anthropic returned error {}: {}", status, error_text);
            return Err(ChatBridgeError::Provider {
                status: status.as_u16(),
                message: extract_error_message(&error_text),
            }
            .into());
        }

        let parsed: AnthropicResponse = response.json().await.map_err(|e| {
            tracing::error!("Failed to parse Anthropic response: {}", e);
            ChatBridgeError::Provider {
                status: status.as_u16(),
                message: format!("Invalid chat response: {}", e),
            }
        })?;

        let text = parsed
            .content
            .into_iter()
            .find(|c| c.content_type == "text")
            .map(|c| c.text)
            .ok_or_else(|| ChatBridgeError::Provider {
                status: status.as_u16(),
                message: "Chat response contained no text".to_string(),
            })?;

        Ok(ChatCompletion {
            response: text,
            usage: parsed.usage,
        })
    }

    async fn list_models(&self) -> Result<Vec<String>> {
        Ok(MODELS.iter().map(|m| m.to_string()).collect())
    }
}
