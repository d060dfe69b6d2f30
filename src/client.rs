//! HTTP client for a running ChatBridge proxy
//!
//! Used by the CLI to chat, list models and generate images without ever
//! holding a provider credential.

use crate::chat::ChatPreferences;
use crate::error::{ChatBridgeError, Result};
use crate::providers::{ChatCompletion, Message};

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;

/// Result of an image generation call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedImage {
    pub images: Vec<String>,
    pub prompt: String,
    pub size: String,
    pub quality: String,
    pub model: String,
}

/// Options for [`ProxyClient::generate_image`]
#[derive(Debug, Clone, Default)]
pub struct ImageRequest {
    pub prompt: String,
    pub size: Option<String>,
    pub quality: Option<String>,
    pub model: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ModelsResponse {
    models: Vec<String>,
}

/// Client for the proxy HTTP API
#[derive(Debug, Clone)]
pub struct ProxyClient {
    client: Client,
    base_url: String,
}

impl ProxyClient {
    /// Create a client for the proxy at `base_url`
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client initialization fails
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("chatbridge-cli/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send the conversation with the stored preferences
    ///
    /// # Errors
    ///
    /// Returns the proxy's error mapped onto [`ChatBridgeError`]
    pub async fn chat(
        &self,
        preferences: &ChatPreferences,
        messages: &[Message],
    ) -> Result<ChatCompletion> {
        let mut config = json!({
            "provider": preferences.provider,
            "model": preferences.model,
            "temperature": preferences.temperature,
            "max_tokens": preferences.max_tokens,
        });
        if let Some(base_url) = preferences.requested_base_url() {
            config["base_url"] = json!(base_url);
        }

        let body = json!({ "config": config, "messages": messages });
        tracing::debug!(
            provider = %preferences.provider,
            model = %preferences.model,
            messages = messages.len(),
            "Sending chat request to proxy"
        );
        self.post("chat", &body).await
    }

    /// List models for `provider_name`
    pub async fn models(
        &self,
        provider_name: &str,
        endpoint_url: Option<&str>,
    ) -> Result<Vec<String>> {
        let mut body = json!({ "provider_name": provider_name });
        if let Some(endpoint) = endpoint_url {
            body["endpoint_url"] = json!(endpoint);
        }
        let response: ModelsResponse = self.post("models", &body).await?;
        Ok(response.models)
    }

    /// Generate an image
    pub async fn generate_image(&self, request: &ImageRequest) -> Result<GeneratedImage> {
        let mut body = json!({ "prompt": request.prompt });
        for (key, value) in [
            ("size", &request.size),
            ("quality", &request.quality),
            ("model", &request.model),
        ] {
            if let Some(value) = value {
                body[key] = json!(value);
            }
        }
        self.post("generate_image", &body).await
    }

    async fn post<T: for<'de> Deserialize<'de>>(&self, path: &str, body: &Value) -> Result<T> {
        let url = format!("{}/{}", self.base_url, path);
        let response = self.client.post(&url).json(body).send().await.map_err(|e| {
            tracing::error!("Proxy request to {} failed: {}", url, e);
            ChatBridgeError::Provider {
                status: 0,
                message: format!("Could not reach proxy at {}: {}", self.base_url, e),
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(error_from_response(status, &text).into());
        }

        Ok(response.json::<T>().await?)
    }
}

fn error_from_response(status: StatusCode, text: &str) -> ChatBridgeError {
    let body: Value = serde_json::from_str(text).unwrap_or(Value::Null);
    let message = body
        .get("error")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| text.trim().to_string());

    match status {
        StatusCode::BAD_REQUEST => match body.get("details").and_then(Value::as_array) {
            Some(details) => ChatBridgeError::Validation(
                details
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect(),
            ),
            None => ChatBridgeError::InvalidRequest(message),
        },
        StatusCode::TOO_MANY_REQUESTS => ChatBridgeError::RateLimitExceeded {
            limit: 0,
            remaining: body.get("remaining").and_then(Value::as_u64).unwrap_or(0) as u32,
            reset_after_secs: body
                .get("reset_after_seconds")
                .and_then(Value::as_u64)
                .unwrap_or(0),
        },
        _ => ChatBridgeError::Provider {
            status: status.as_u16(),
            message,
        },
    }
}
