//! Provider module for ChatBridge
//!
//! This module contains the upstream provider abstraction and the OpenAI
//! and Anthropic implementations the proxy forwards to.

pub mod anthropic;
pub mod base;
pub mod openai;

pub use anthropic::AnthropicProvider;
pub use base::{
    ChatCompletion, ChatParams, ImageParams, Message, Provider, ProviderCredentials, ProviderKind,
};
pub use openai::OpenAiProvider;

use crate::config::ProvidersConfig;
use crate::error::Result;
use reqwest::Client;
use std::time::Duration;

/// Built-in model list for local Ollama servers
pub const OLLAMA_MODELS: &[&str] = &["llama3.2", "llama3.1", "mistral", "codellama", "phi3"];

/// Placeholder shown for LM Studio, which serves whatever model is loaded
pub const LMSTUDIO_MODELS: &[&str] = &["Custom model"];

/// Build the shared HTTP client used for all upstream calls
///
/// # Errors
///
/// Returns error if the TLS backend cannot be initialised
pub fn build_http_client(config: &ProvidersConfig) -> Result<Client> {
    let client = Client::builder()
        .timeout(Duration::from_secs(config.request_timeout_seconds))
        .user_agent(concat!("chatbridge/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}

/// Create a provider instance for `kind`
///
/// # Arguments
///
/// * `kind` - Which upstream API to talk to
/// * `base_url` - Already-allowlisted base URL for the provider
/// * `client` - Shared HTTP client
/// * `credentials` - Server-side credentials
/// * `config` - Provider configuration
///
/// # Errors
///
/// Returns [`crate::error::ChatBridgeError::MissingCredentials`] when no key
/// is configured for `kind`
pub fn create_provider(
    kind: ProviderKind,
    base_url: &str,
    client: &Client,
    credentials: &ProviderCredentials,
    config: &ProvidersConfig,
) -> Result<Box<dyn Provider>> {
    let api_key = credentials.require(kind)?;
    let provider: Box<dyn Provider> = match kind {
        ProviderKind::OpenAi => Box::new(OpenAiProvider::new(client.clone(), base_url, api_key)),
        ProviderKind::Anthropic => Box::new(AnthropicProvider::new(
            client.clone(),
            base_url,
            api_key,
            config.anthropic.api_version.clone(),
        )),
    };
    Ok(provider)
}
