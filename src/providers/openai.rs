//! OpenAI provider implementation for ChatBridge
//!
//! Talks to the OpenAI REST API or any OpenAI-compatible server (Ollama,
//! LM Studio) for chat completions, model listing and image generation.

use crate::error::{ChatBridgeError, Result};
use crate::providers::base::{
    extract_error_message, join_url, ChatCompletion, ChatParams, ImageParams, Message, Provider,
};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Model ids returned when the upstream model listing fails
pub const FALLBACK_MODELS: &[&str] = &[
    "gpt-4o",
    "gpt-4-turbo",
    "gpt-4",
    "gpt-3.5-turbo",
    "dall-e-3",
    "dall-e-2",
];

/// Host of the official API; listings from it are filtered to chat and image models
const OFFICIAL_HOST: &str = "api.openai.com";

/// OpenAI API provider
///
/// # Examples
///
/// ```
/// use chatbridge::providers::{OpenAiProvider, Provider};
///
/// let provider = OpenAiProvider::new(
///     reqwest::Client::new(),
///     "https://api.openai.com/v1",
///     "sk-test",
/// );
/// assert_eq!(provider.name(), "openai");
/// assert_eq!(provider.base_url(), "https://api.openai.com/v1");
/// ```
pub struct OpenAiProvider {
    client: Client,
    base_url: String,
    api_key: String,
}

/// Request body for `/chat/completions`
#[derive(Debug, Serialize)]
struct OpenAiChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    temperature: f64,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct OpenAiChatResponse {
    choices: Vec<OpenAiChoice>,
    #[serde(default)]
    usage: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiModelList {
    data: Vec<OpenAiModel>,
}

#[derive(Debug, Deserialize)]
struct OpenAiModel {
    id: String,
}

/// Request body for `/images/generations`
#[derive(Debug, Serialize)]
struct OpenAiImageRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    n: u32,
    size: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    quality: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct OpenAiImageResponse {
    data: Vec<OpenAiImage>,
}

#[derive(Debug, Deserialize)]
struct OpenAiImage {
    #[serde(default)]
    url: Option<String>,
}

impl OpenAiProvider {
    /// Create a provider bound to `base_url` and a server-side key
    pub fn new(client: Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn is_official_endpoint(&self) -> bool {
        self.base_url.contains(OFFICIAL_HOST)
    }

    /// Generate one image and return its URL(s)
    ///
    /// `quality` is only forwarded for `dall-e-3`, the one model that
    /// accepts it.
    ///
    /// # Errors
    ///
    /// Returns [`ChatBridgeError::Provider`] on upstream failure
    pub async fn generate_image(&self, params: &ImageParams) -> Result<Vec<String>> {
        let url = join_url(&self.base_url, "images/generations");
        let body = OpenAiImageRequest {
            model: &params.model,
            prompt: &params.prompt,
            n: 1,
            size: &params.size,
            quality: (params.model == "dall-e-3").then_some(params.quality.as_str()),
        };

        tracing::debug!(model = %params.model, size = %params.size, "Requesting image generation");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| request_failed("image generation", e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("OpenAI image request returned error {}: {}", status, error_text);
            return Err(ChatBridgeError::Provider {
                status: status.as_u16(),
                message: extract_error_message(&error_text),
            }
            .into());
        }

        let parsed: OpenAiImageResponse = response.json().await.map_err(|e| {
            tracing::error!("Failed to parse OpenAI image response: {}", e);
            ChatBridgeError::Provider {
                status: status.as_u16(),
                message: format!("Invalid image response: {}", e),
            }
        })?;

        let urls: Vec<String> = parsed.data.into_iter().filter_map(|d| d.url).collect();
        if urls.is_empty() {
            return Err(ChatBridgeError::Provider {
                status: status.as_u16(),
                message: "Image response contained no URLs".to_string(),
            }
            .into());
        }
        Ok(urls)
    }
}

fn request_failed(what: &str, e: reqwest::Error) -> ChatBridgeError {
    tracing::error!("OpenAI {} request failed: {}", what, e);
    ChatBridgeError::Provider {
        status: e.status().map(|s| s.as_u16()).unwrap_or(0),
        message: format!("Request to provider failed: {}", e),
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn complete(&self, params: &ChatParams) -> Result<ChatCompletion> {
        let url = join_url(&self.base_url, "chat/completions");
        let body = OpenAiChatRequest {
            model: &params.model,
            messages: &params.messages,
            temperature: params.temperature,
            max_tokens: params.max_tokens,
        };

        tracing::debug!(
            model = %params.model,
            messages = params.messages.len(),
            "Sending OpenAI chat request"
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| request_failed("chat", e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("OpenAI returned error {}: {}", status, error_text);
            return Err(ChatBridgeError::Provider {
                status: status.as_u16(),
                message: extract_error_message(&error_text),
            }
            .into());
        }

        let parsed: OpenAiChatResponse = response.json().await.map_err(|e| {
            tracing::error!("Failed to parse OpenAI response: {}", e);
            ChatBridgeError::Provider {
                status: status.as_u16(),
                message: format!("Invalid chat response: {}", e),
            }
        })?;

        let response = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ChatBridgeError::Provider {
                status: status.as_u16(),
                message: "Chat response contained no choices".to_string(),
            })?;

        Ok(ChatCompletion {
            response,
            usage: parsed.usage,
        })
    }

    async fn list_models(&self) -> Result<Vec<String>> {
        let url = join_url(&self.base_url, "models");
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| request_failed("model list", e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("OpenAI model list returned error {}: {}", status, error_text);
            return Err(ChatBridgeError::Provider {
                status: status.as_u16(),
                message: extract_error_message(&error_text),
            }
            .into());
        }

        let parsed: OpenAiModelList = response.json().await.map_err(|e| {
            tracing::error!("Failed to parse OpenAI model list: {}", e);
            ChatBridgeError::Provider {
                status: status.as_u16(),
                message: format!("Invalid model list: {}", e),
            }
        })?;

        let official = self.is_official_endpoint();
        let mut models: Vec<String> = parsed
            .data
            .into_iter()
            .map(|m| m.id)
            .filter(|id| !official || id.contains("gpt") || id.contains("dall-e"))
            .collect();
        models.sort();

        tracing::debug!("Listed {} models from {}", models.len(), self.base_url);
        Ok(models)
    }
}
