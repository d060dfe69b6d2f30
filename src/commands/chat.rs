//! `chat` subcommand: send, edit and delete messages, and manage the
//! stored chat preferences

use crate::chat::{ChatPreferences, ChatStore};
use crate::cli::ChatCommand;
use crate::client::ProxyClient;
use crate::config::Config;
use crate::error::{ChatBridgeError, Result};
use crate::providers::Message;
use crate::proxy::validation::MAX_MESSAGES;
use crate::storage::{ChatMessage, KeyValueStore, Role};
use colored::Colorize;
use std::time::Duration;

/// Handle chat commands
pub async fn handle_chat(
    command: ChatCommand,
    session: Option<String>,
    config: &Config,
) -> Result<()> {
    let mut store = super::open_store(config)?;

    match command {
        ChatCommand::Send { message } => {
            let session_id = super::select_session(&mut store, session.as_deref())?;
            let client = ProxyClient::new(
                &config.client.proxy_url,
                Duration::from_secs(config.providers.request_timeout_seconds),
            )?;
            let reply = send_message(&mut store, &client, &message).await?;
            tracing::debug!(session_id = %session_id, "Recorded assistant reply");
            println!("{}", reply.content);
            Ok(())
        }
        ChatCommand::Edit { id, content } => {
            super::select_session(&mut store, session.as_deref())?;
            let before = store.history().len();
            if !store.update_message(&id, content) {
                return Err(ChatBridgeError::InvalidRequest(format!("Unknown message: {}", id)).into());
            }
            let discarded = before - store.history().len();
            println!("{}", format!("Updated message {}", id).green());
            if discarded > 0 {
                println!(
                    "{}",
                    format!("Discarded {} later message(s)", discarded).yellow()
                );
            }
            Ok(())
        }
        ChatCommand::DeleteMessage { id } => {
            super::select_session(&mut store, session.as_deref())?;
            if store.delete_message(&id) {
                println!("{}", format!("Deleted message {}", id).green());
            } else {
                println!("{}", format!("Message {} not found.", id).yellow());
            }
            Ok(())
        }
        ChatCommand::Config {
            provider,
            model,
            base_url,
            temperature,
            max_tokens,
        } => {
            let changed = provider.is_some()
                || model.is_some()
                || base_url.is_some()
                || temperature.is_some()
                || max_tokens.is_some();

            let prefs = if changed {
                if let Some(t) = temperature {
                    if !(0.0..=2.0).contains(&t) {
                        return Err(ChatBridgeError::InvalidRequest(
                            "temperature must be between 0 and 2".to_string(),
                        )
                        .into());
                    }
                }
                store.update_preferences(|prefs| {
                    if let Some(provider) = provider {
                        prefs.set_provider(provider);
                    }
                    if let Some(model) = model {
                        prefs.is_image_model = model.starts_with("dall-e");
                        prefs.model = model;
                    }
                    if let Some(base_url) = base_url {
                        prefs.base_url = base_url;
                    }
                    if let Some(t) = temperature {
                        prefs.temperature = t;
                    }
                    if let Some(n) = max_tokens {
                        prefs.max_tokens = n;
                    }
                })
            } else {
                store.preferences()
            };

            print_preferences(&prefs);
            Ok(())
        }
    }
}

/// Record `text` as a user turn, ask the proxy, and record the reply
///
/// The user turn stays in history even if the proxy call fails, so the
/// conversation can be retried.
pub async fn send_message<S: KeyValueStore>(
    store: &mut ChatStore<S>,
    client: &ProxyClient,
    text: &str,
) -> Result<ChatMessage> {
    let prefs = store.preferences();
    if prefs.model.trim().is_empty() {
        return Err(ChatBridgeError::Config(
            "No model selected; run `chatbridge chat config --model <MODEL>`".to_string(),
        )
        .into());
    }

    store.append_message(Role::User, text, None).ok_or_else(|| {
        ChatBridgeError::Storage("No active session to append to".to_string())
    })?;

    let messages = to_provider_messages(store.history());
    let completion = client.chat(&prefs, &messages).await?;

    store
        .append_message(Role::Assistant, completion.response, None)
        .ok_or_else(|| ChatBridgeError::Storage("No active session to append to".to_string()).into())
}

/// Convert stored history into the wire shape the proxy expects
///
/// Only the newest [`MAX_MESSAGES`] entries are sent; the proxy rejects
/// longer conversations.
pub fn to_provider_messages(history: &[ChatMessage]) -> Vec<Message> {
    let start = history.len().saturating_sub(MAX_MESSAGES);
    if start > 0 {
        tracing::debug!(dropped = start, "Sending only the newest {} messages", MAX_MESSAGES);
    }
    history[start..]
        .iter()
        .map(|m| Message {
            role: m.role.as_str().to_string(),
            content: m.content.clone(),
        })
        .collect()
}

fn print_preferences(prefs: &ChatPreferences) {
    println!("\nChat Preferences\n");
    println!("Provider:     {}", prefs.provider);
    println!("Base URL:     {}", prefs.base_url);
    let model = if prefs.model.is_empty() {
        "(not set)".yellow().to_string()
    } else {
        prefs.model.clone()
    };
    println!("Model:        {}", model);
    println!("Temperature:  {}", prefs.temperature);
    println!("Max Tokens:   {}", prefs.max_tokens);
    println!();
}
