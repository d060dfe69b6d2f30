//! Model listing command handler
//!
//! Asks a running proxy which models a provider offers and prints them as
//! a table or JSON.

use crate::client::ProxyClient;
use crate::config::Config;
use crate::error::{ChatBridgeError, Result};
use prettytable::{row, Table};
use std::time::Duration;

/// List models available from a provider
///
/// The provider defaults to the one in the stored chat preferences.
///
/// # Arguments
///
/// * `provider` - Optional provider name
/// * `endpoint` - Optional OpenAI-compatible endpoint URL
/// * `json` - Print JSON instead of a table
/// * `config` - Loaded configuration
///
/// # Errors
///
/// Returns error if the proxy cannot be reached or rejects the request
pub async fn list_models(
    provider: Option<&str>,
    endpoint: Option<&str>,
    json: bool,
    config: &Config,
) -> Result<()> {
    let provider = match provider {
        Some(p) => p.to_string(),
        None => super::open_store(config)?.preferences().provider,
    };

    let client = ProxyClient::new(
        &config.client.proxy_url,
        Duration::from_secs(config.providers.request_timeout_seconds),
    )?;
    let models = client.models(&provider, endpoint).await?;

    if json {
        return output_models_json(&models);
    }

    if models.is_empty() {
        println!("No models available from provider: {}", provider);
        return Ok(());
    }

    output_models_table(&models, &provider);
    Ok(())
}

/// Serialize a value to pretty JSON
fn serialize_pretty<T: serde::Serialize>(value: &T) -> std::result::Result<String, serde_json::Error> {
    serde_json::to_string_pretty(value)
}

/// Output models in JSON format
///
/// # Errors
///
/// Returns `ChatBridgeError::Serialization` if serialization fails
fn output_models_json(models: &[String]) -> Result<()> {
    let json = serialize_pretty(&models).map_err(ChatBridgeError::Serialization)?;
    println!("{}", json);
    Ok(())
}

/// Output models in table format
fn output_models_table(models: &[String], provider: &str) {
    let mut table = Table::new();
    table.add_row(row!["#", "Model"]);

    for (index, model) in models.iter().enumerate() {
        table.add_row(row![index + 1, model]);
    }

    println!("\nAvailable models from {}:\n", provider);
    table.printstd();
    println!();
}
