//! Base provider trait and common types for ChatBridge
//!
//! This module defines the Provider trait that every upstream LLM API
//! implements, along with the normalized request and response types the
//! proxy relays between clients and providers.

use crate::error::{ChatBridgeError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Message structure for conversation
///
/// Represents one turn forwarded to the provider. Roles are limited to
/// `system`, `user` and `assistant`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message sender (system, user, assistant)
    pub role: String,
    /// Content of the message
    pub content: String,
}

impl Message {
    /// Creates a new user message
    ///
    /// # Examples
    ///
    /// ```
    /// use chatbridge::providers::Message;
    ///
    /// let msg = Message::user("Hello, assistant!");
    /// assert_eq!(msg.role, "user");
    /// ```
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    /// Creates a new assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }

    /// Creates a new system message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    /// Returns true for system-role messages
    pub fn is_system(&self) -> bool {
        self.role == "system"
    }
}

/// Upstream providers that accept chat requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// OpenAI and OpenAI-compatible endpoints
    OpenAi,
    /// Anthropic messages API
    Anthropic,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Anthropic => "anthropic",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = ChatBridgeError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "openai" => Ok(ProviderKind::OpenAi),
            "anthropic" => Ok(ProviderKind::Anthropic),
            other => Err(ChatBridgeError::InvalidRequest(format!(
                "Unsupported provider: {}",
                other
            ))),
        }
    }
}

/// A validated, defaulted chat request ready to send upstream
#[derive(Debug, Clone, PartialEq)]
pub struct ChatParams {
    /// Model identifier
    pub model: String,
    /// Conversation in order
    pub messages: Vec<Message>,
    /// Sampling temperature in [0, 2]
    pub temperature: f64,
    /// Completion token limit
    pub max_tokens: u32,
}

/// Normalized completion returned to proxy callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatCompletion {
    /// Assistant reply text
    pub response: String,
    /// Provider usage block, passed through unchanged
    #[serde(default)]
    pub usage: serde_json::Value,
}

/// Image generation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageParams {
    pub prompt: String,
    pub size: String,
    pub quality: String,
    pub model: String,
}

/// Provider trait
///
/// Implemented by each upstream API. Credentials are bound at construction
/// time from server-side configuration; nothing a client sends can replace
/// them.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use chatbridge::error::Result;
/// use chatbridge::providers::{ChatCompletion, ChatParams, Provider};
///
/// struct Echo;
///
/// #[async_trait]
/// impl Provider for Echo {
///     fn name(&self) -> &str {
///         "echo"
///     }
///
///     async fn complete(&self, params: &ChatParams) -> Result<ChatCompletion> {
///         let last = params.messages.last().map(|m| m.content.clone()).unwrap_or_default();
///         Ok(ChatCompletion { response: last, usage: serde_json::Value::Null })
///     }
///
///     async fn list_models(&self) -> Result<Vec<String>> {
///         Ok(vec!["echo-1".to_string()])
///     }
/// }
/// ```
#[async_trait]
pub trait Provider: Send + Sync {
    /// Short provider name used in logs
    fn name(&self) -> &str;

    /// Send a chat request and return the normalized completion
    ///
    /// # Errors
    ///
    /// Returns [`ChatBridgeError::Provider`] when the upstream call fails
    /// or returns a non-success status
    async fn complete(&self, params: &ChatParams) -> Result<ChatCompletion>;

    /// List model identifiers this provider offers
    async fn list_models(&self) -> Result<Vec<String>>;
}

/// Server-side provider credentials
///
/// Resolved from the process environment only.
#[derive(Clone, Default)]
pub struct ProviderCredentials {
    openai_api_key: Option<String>,
    anthropic_api_key: Option<String>,
}

impl fmt::Debug for ProviderCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderCredentials")
            .field("openai_api_key", &self.openai_api_key.as_ref().map(|_| "<redacted>"))
            .field(
                "anthropic_api_key",
                &self.anthropic_api_key.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

impl ProviderCredentials {
    /// Read `OPENAI_API_KEY` and `ANTHROPIC_API_KEY`
    ///
    /// Empty values are treated as unset.
    pub fn from_env() -> Self {
        let read = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
        let credentials = Self {
            openai_api_key: read("OPENAI_API_KEY"),
            anthropic_api_key: read("ANTHROPIC_API_KEY"),
        };
        tracing::debug!(?credentials, "Resolved provider credentials");
        credentials
    }

    /// Build credentials explicitly
    pub fn new(openai_api_key: Option<String>, anthropic_api_key: Option<String>) -> Self {
        Self {
            openai_api_key,
            anthropic_api_key,
        }
    }

    /// The key for `kind`, if configured
    pub fn get(&self, kind: ProviderKind) -> Option<&str> {
        match kind {
            ProviderKind::OpenAi => self.openai_api_key.as_deref(),
            ProviderKind::Anthropic => self.anthropic_api_key.as_deref(),
        }
    }

    /// The key for `kind`, or a missing-credentials error
    pub fn require(&self, kind: ProviderKind) -> Result<&str> {
        self.get(kind)
            .ok_or_else(|| ChatBridgeError::MissingCredentials(kind.to_string()).into())
    }
}

/// Pull a readable message out of a provider error body
///
/// Both OpenAI and Anthropic nest it under `error.message`; anything else is
/// returned as-is.
pub fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message").or(Some(e)))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().to_string())
}

/// Join a base URL and a path without doubling slashes
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
