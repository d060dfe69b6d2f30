//! Inbound request validation
//!
//! Chat requests arrive as loosely-typed JSON. Every rule is checked and
//! all failures are collected, so a client sees the full list in one
//! round-trip. Only a request that passes every rule is turned into a
//! typed [`ChatRequest`].

use crate::providers::{Message, ProviderKind};
use serde_json::Value;

/// Maximum number of messages in one chat request
pub const MAX_MESSAGES: usize = 100;

/// Maximum characters in one message
pub const MAX_CONTENT_CHARS: usize = 10_000;

/// Upper bound accepted for `max_tokens`
pub const MAX_TOKENS_LIMIT: f64 = 100_000.0;

const ALLOWED_ROLES: &[&str] = &["user", "assistant", "system"];

/// A chat request that passed validation
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub provider: ProviderKind,
    pub model: String,
    /// Requested temperature, `None` when the client left it out
    pub temperature: Option<f64>,
    /// Requested token limit, `None` when the client left it out
    pub max_tokens: Option<u32>,
    /// Client-requested base URL, still subject to the allowlist
    pub base_url: Option<String>,
    pub messages: Vec<Message>,
}

/// Validate a `/chat` body of shape `{config: {...}, messages: [...]}`
///
/// Any `api_key` the client includes is ignored.
///
/// # Errors
///
/// Returns every failed rule as a human-readable detail
///
/// # Examples
///
/// ```
/// use chatbridge::proxy::validation::validate_chat_request;
/// use serde_json::json;
///
/// let body = json!({
///     "config": {"provider": "openai", "model": "gpt-4o", "temperature": 3},
///     "messages": [{"role": "user", "content": "hi"}]
/// });
/// let details = validate_chat_request(&body).unwrap_err();
/// assert!(details[0].contains("temperature"));
/// ```
pub fn validate_chat_request(body: &Value) -> Result<ChatRequest, Vec<String>> {
    let mut errors = Vec::new();

    let empty = serde_json::Map::new();
    let config = match body.get("config") {
        None | Some(Value::Null) => &empty,
        Some(Value::Object(map)) => map,
        Some(_) => {
            errors.push("config must be an object".to_string());
            &empty
        }
    };

    let provider = match config.get("provider").and_then(Value::as_str) {
        Some(name) => name.parse::<ProviderKind>().ok(),
        None => None,
    };
    if provider.is_none() {
        errors.push(r#"provider must be "openai" or "anthropic""#.to_string());
    }

    let model = config
        .get("model")
        .and_then(Value::as_str)
        .filter(|m| !m.trim().is_empty());
    if model.is_none() {
        errors.push("model is required and must be a non-empty string".to_string());
    }

    let temperature = match config.get("temperature") {
        None | Some(Value::Null) => None,
        Some(value) => match value.as_f64() {
            Some(t) if (0.0..=2.0).contains(&t) => Some(t),
            _ => {
                errors.push("temperature must be a number between 0 and 2".to_string());
                None
            }
        },
    };

    let max_tokens = match config.get("max_tokens") {
        None | Some(Value::Null) => None,
        Some(value) => match value.as_f64() {
            Some(n) if (1.0..=MAX_TOKENS_LIMIT).contains(&n) => Some(n.floor() as u32),
            _ => {
                errors.push(format!(
                    "max_tokens must be a number between 1 and {}",
                    MAX_TOKENS_LIMIT as u32
                ));
                None
            }
        },
    };

    let base_url = match config.get("base_url") {
        None | Some(Value::Null) => None,
        Some(Value::String(url)) if url.trim().is_empty() => None,
        Some(Value::String(url)) => Some(url.trim().to_string()),
        Some(_) => {
            errors.push("base_url must be a string".to_string());
            None
        }
    };

    if config.contains_key("api_key") {
        tracing::warn!("Ignoring client-supplied api_key; credentials come from the server");
    }

    let messages = match body.get("messages") {
        None | Some(Value::Null) => {
            errors.push("at least one message is required".to_string());
            Vec::new()
        }
        Some(Value::Array(items)) => validate_messages(items, &mut errors),
        Some(_) => {
            errors.push("messages must be an array".to_string());
            Vec::new()
        }
    };

    match (provider, model) {
        (Some(provider), Some(model)) if errors.is_empty() => Ok(ChatRequest {
            provider,
            model: model.to_string(),
            temperature,
            max_tokens,
            base_url,
            messages,
        }),
        _ => Err(errors),
    }
}

fn validate_messages(items: &[Value], errors: &mut Vec<String>) -> Vec<Message> {
    if items.is_empty() {
        errors.push("at least one message is required".to_string());
    }
    if items.len() > MAX_MESSAGES {
        errors.push(format!(
            "too many messages: message count {} exceeds the maximum of {}",
            items.len(),
            MAX_MESSAGES
        ));
    }

    let mut messages = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let n = index + 1;
        let Some(obj) = item.as_object() else {
            errors.push(format!("message {}: invalid format", n));
            continue;
        };

        let role = obj
            .get("role")
            .and_then(Value::as_str)
            .filter(|r| ALLOWED_ROLES.contains(r));
        if role.is_none() {
            errors.push(format!(
                r#"message {}: role must be "user", "assistant" or "system""#,
                n
            ));
        }

        let content = match obj.get("content").and_then(Value::as_str) {
            Some(c) if !c.is_empty() => {
                if c.chars().count() > MAX_CONTENT_CHARS {
                    errors.push(format!(
                        "message {}: content too long (max {} characters)",
                        n, MAX_CONTENT_CHARS
                    ));
                    None
                } else {
                    Some(c)
                }
            }
            _ => {
                errors.push(format!("message {}: content must be a non-empty string", n));
                None
            }
        };

        if let (Some(role), Some(content)) = (role, content) {
            messages.push(Message {
                role: role.to_string(),
                content: content.to_string(),
            });
        }
    }
    messages
}

/// Decide which base URL a request may use
///
/// The configured base URL is used when the client asks for none. A
/// client-requested URL is accepted only if it matches the configured one
/// or an entry in `allowed` (trailing slashes ignored).
///
/// # Errors
///
/// Returns a detail message when the requested URL is not allowed
pub fn resolve_base_url(
    requested: Option<&str>,
    configured: &str,
    allowed: &[String],
) -> Result<String, String> {
    let Some(requested) = requested else {
        return Ok(configured.to_string());
    };

    let wanted = requested.trim_end_matches('/');
    let permitted = std::iter::once(configured)
        .chain(allowed.iter().map(String::as_str))
        .any(|candidate| candidate.trim_end_matches('/') == wanted);

    if permitted {
        Ok(requested.to_string())
    } else {
        tracing::warn!(requested, "Rejected base URL outside the allowlist");
        Err(format!("base URL {} is not allowed by this server", requested))
    }
}
