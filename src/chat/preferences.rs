//! Client chat preferences persisted next to the chat history

use crate::error::Result;
use crate::storage::KeyValueStore;
use serde::{Deserialize, Serialize};

/// Storage key of the preferences blob
pub const PREFERENCES_KEY: &str = "chatAppConfig";

/// What the client sends along with each chat request
///
/// Credentials are deliberately absent: the proxy resolves them from its
/// own environment, so a stored blob that still carries an `api_key` field
/// from an older client simply has it ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatPreferences {
    #[serde(default = "default_provider")]
    pub provider: String,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default)]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f64,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default)]
    pub is_image_model: bool,
}

/// Public OpenAI endpoint
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Public Anthropic endpoint
pub const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";

/// The public endpoint of a known provider
pub fn stock_base_url(provider: &str) -> Option<&'static str> {
    match provider {
        "openai" => Some(OPENAI_BASE_URL),
        "anthropic" => Some(ANTHROPIC_BASE_URL),
        _ => None,
    }
}

fn default_provider() -> String {
    "openai".to_string()
}

fn default_base_url() -> String {
    OPENAI_BASE_URL.to_string()
}

fn default_temperature() -> f64 {
    0.7
}

fn default_max_tokens() -> u32 {
    1000
}

impl Default for ChatPreferences {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            base_url: default_base_url(),
            model: String::new(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            is_image_model: false,
        }
    }
}

impl ChatPreferences {
    /// Load from storage, merging whatever is stored over the defaults
    ///
    /// A missing or unreadable blob yields the defaults.
    pub fn load<S: KeyValueStore + ?Sized>(storage: &S) -> Self {
        match storage.get(PREFERENCES_KEY) {
            Ok(Some(json)) => serde_json::from_str(&json).unwrap_or_else(|e| {
                tracing::warn!("Stored preferences are unreadable, using defaults: {}", e);
                Self::default()
            }),
            Ok(None) => {
                tracing::debug!("No stored preferences, using defaults");
                Self::default()
            }
            Err(e) => {
                tracing::warn!("Failed to read preferences, using defaults: {}", e);
                Self::default()
            }
        }
    }

    /// Switch provider, moving the base URL to the new provider's endpoint
    ///
    /// A custom base URL belongs to the provider it was set for, so it is
    /// replaced too.
    pub fn set_provider(&mut self, provider: impl Into<String>) {
        let provider = provider.into();
        if provider != self.provider {
            self.base_url = stock_base_url(&provider).unwrap_or_default().to_string();
        }
        self.provider = provider;
    }

    /// Base URL to ask the proxy for, if any
    ///
    /// Blank and stock public endpoints yield `None` so the proxy falls back
    /// to the endpoint it is configured with for the chosen provider.
    pub fn requested_base_url(&self) -> Option<&str> {
        let url = self.base_url.trim();
        let normalized = url.trim_end_matches('/');
        if url.is_empty() || normalized == OPENAI_BASE_URL || normalized == ANTHROPIC_BASE_URL {
            None
        } else {
            Some(url)
        }
    }

    pub fn save<S: KeyValueStore + ?Sized>(&self, storage: &mut S) -> Result<()> {
        storage.set(PREFERENCES_KEY, &serde_json::to_string(self)?)
    }
}
