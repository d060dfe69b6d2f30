//! Configuration management for ChatBridge
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.
//!
//! Provider credentials are never part of the configuration file; see
//! [`crate::providers::ProviderCredentials`].

use crate::chat::CapacityLimits;
use crate::error::{ChatBridgeError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure for ChatBridge
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Proxy server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Upstream provider endpoints and request defaults
    #[serde(default)]
    pub providers: ProvidersConfig,

    /// Client-side chat storage
    #[serde(default)]
    pub storage: StorageConfig,

    /// How the CLI reaches the proxy
    #[serde(default)]
    pub client: ClientConfig,
}

/// Proxy server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Socket address to listen on
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Value of `Access-Control-Allow-Origin` on every response
    #[serde(default = "default_allowed_origin")]
    pub allowed_origin: String,

    /// Per-address sliding-window rate limit
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

fn default_bind_address() -> String {
    "127.0.0.1:8888".to_string()
}

fn default_allowed_origin() -> String {
    "*".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            allowed_origin: default_allowed_origin(),
            rate_limit: RateLimitConfig::default(),
        }
    }
}

/// Sliding-window rate limit settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Requests allowed per window for one client address
    #[serde(default = "default_rate_limit_max_requests")]
    pub max_requests: u32,

    /// Window length in seconds
    #[serde(default = "default_rate_limit_window_seconds")]
    pub window_seconds: u64,
}

fn default_rate_limit_max_requests() -> u32 {
    10
}

fn default_rate_limit_window_seconds() -> u64 {
    60
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: default_rate_limit_max_requests(),
            window_seconds: default_rate_limit_window_seconds(),
        }
    }
}

/// Upstream provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvidersConfig {
    /// OpenAI (and OpenAI-compatible) settings
    #[serde(default)]
    pub openai: OpenAiConfig,

    /// Anthropic settings
    #[serde(default)]
    pub anthropic: AnthropicConfig,

    /// Temperature used when a request omits it
    #[serde(default = "default_temperature")]
    pub default_temperature: f64,

    /// Max tokens used when a request omits it
    #[serde(default = "default_max_tokens")]
    pub default_max_tokens: u32,

    /// Timeout for a single upstream request (seconds)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

fn default_temperature() -> f64 {
    0.7
}

fn default_max_tokens() -> u32 {
    1000
}

fn default_request_timeout() -> u64 {
    120
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            openai: OpenAiConfig::default(),
            anthropic: AnthropicConfig::default(),
            default_temperature: default_temperature(),
            default_max_tokens: default_max_tokens(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

/// OpenAI provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    /// API base URL
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,

    /// Additional base URLs a client may ask the proxy to use
    ///
    /// Server credentials are sent to these hosts, so list only endpoints
    /// you trust (e.g. a local Ollama or LM Studio server).
    #[serde(default)]
    pub allowed_base_urls: Vec<String>,
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: default_openai_base_url(),
            allowed_base_urls: Vec::new(),
        }
    }
}

/// Anthropic provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnthropicConfig {
    /// API base URL
    #[serde(default = "default_anthropic_base_url")]
    pub base_url: String,

    /// Value sent in the `anthropic-version` header
    #[serde(default = "default_anthropic_version")]
    pub api_version: String,

    /// Additional base URLs a client may ask the proxy to use
    #[serde(default)]
    pub allowed_base_urls: Vec<String>,
}

fn default_anthropic_base_url() -> String {
    "https://api.anthropic.com".to_string()
}

fn default_anthropic_version() -> String {
    "2023-06-01".to_string()
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            base_url: default_anthropic_base_url(),
            api_version: default_anthropic_version(),
            allowed_base_urls: Vec::new(),
        }
    }
}

/// Client-side storage configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Database path; the platform data directory is used when unset
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Hard byte limit enforced by the backend itself, if any
    #[serde(default)]
    pub quota_bytes: Option<usize>,

    /// Capacity ceilings applied before every persist
    #[serde(flatten)]
    pub limits: CapacityLimits,
}

/// CLI client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of a running proxy
    #[serde(default = "default_proxy_url")]
    pub proxy_url: String,
}

fn default_proxy_url() -> String {
    "http://127.0.0.1:8888".to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            proxy_url: default_proxy_url(),
        }
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Returns
    ///
    /// Returns the loaded and merged configuration
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ChatBridgeError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| ChatBridgeError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(bind) = std::env::var("CHATBRIDGE_BIND_ADDRESS") {
            tracing::debug!(bind = %bind, "Env override: CHATBRIDGE_BIND_ADDRESS");
            self.server.bind_address = bind;
        }

        if let Ok(origin) = std::env::var("CHATBRIDGE_ALLOWED_ORIGIN") {
            tracing::debug!(origin = %origin, "Env override: CHATBRIDGE_ALLOWED_ORIGIN");
            self.server.allowed_origin = origin;
        }

        if let Ok(max) = std::env::var("CHATBRIDGE_RATE_LIMIT_MAX_REQUESTS") {
            if let Ok(value) = max.parse() {
                self.server.rate_limit.max_requests = value;
            } else {
                tracing::warn!("Invalid CHATBRIDGE_RATE_LIMIT_MAX_REQUESTS: {}", max);
            }
        }

        if let Ok(window) = std::env::var("CHATBRIDGE_RATE_LIMIT_WINDOW_SECONDS") {
            if let Ok(value) = window.parse() {
                self.server.rate_limit.window_seconds = value;
            } else {
                tracing::warn!("Invalid CHATBRIDGE_RATE_LIMIT_WINDOW_SECONDS: {}", window);
            }
        }

        if let Ok(path) = std::env::var("CHATBRIDGE_STORAGE_PATH") {
            self.storage.path = Some(PathBuf::from(path));
        }

        if let Ok(url) = std::env::var("CHATBRIDGE_PROXY_URL") {
            self.client.proxy_url = url;
        }

        if let Ok(endpoint) = std::env::var("OPENAI_ENDPOINT") {
            tracing::debug!(endpoint = %endpoint, "Env override: OPENAI_ENDPOINT");
            self.providers.openai.base_url = endpoint;
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if cli.verbose {
            tracing::debug!("Verbose mode enabled");
        }

        if let Some(path) = &cli.storage_path {
            self.storage.path = Some(PathBuf::from(path));
        }
    }

    /// Validate the configuration
    ///
    /// Ensures all configuration values are within acceptable ranges
    /// and that required fields are properly set.
    ///
    /// # Errors
    ///
    /// Returns error if any validation check fails
    pub fn validate(&self) -> Result<()> {
        if self.server.bind_address.parse::<std::net::SocketAddr>().is_err() {
            return Err(ChatBridgeError::Config(format!(
                "server.bind_address is not a socket address: {}",
                self.server.bind_address
            ))
            .into());
        }

        if self.server.allowed_origin.trim().is_empty() {
            return Err(
                ChatBridgeError::Config("server.allowed_origin cannot be empty".to_string()).into(),
            );
        }

        if self.server.rate_limit.max_requests == 0 {
            return Err(ChatBridgeError::Config(
                "server.rate_limit.max_requests must be greater than 0".to_string(),
            )
            .into());
        }

        if self.server.rate_limit.window_seconds == 0 {
            return Err(ChatBridgeError::Config(
                "server.rate_limit.window_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        for (name, base) in [
            ("providers.openai.base_url", &self.providers.openai.base_url),
            ("providers.anthropic.base_url", &self.providers.anthropic.base_url),
            ("client.proxy_url", &self.client.proxy_url),
        ] {
            if url::Url::parse(base).is_err() {
                return Err(
                    ChatBridgeError::Config(format!("{} is not a valid URL: {}", name, base)).into(),
                );
            }
        }

        if !(0.0..=2.0).contains(&self.providers.default_temperature) {
            return Err(ChatBridgeError::Config(
                "providers.default_temperature must be between 0.0 and 2.0".to_string(),
            )
            .into());
        }

        if self.providers.default_max_tokens == 0 {
            return Err(ChatBridgeError::Config(
                "providers.default_max_tokens must be greater than 0".to_string(),
            )
            .into());
        }

        if self.providers.request_timeout_seconds == 0 {
            return Err(ChatBridgeError::Config(
                "providers.request_timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        let limits = &self.storage.limits;
        if limits.capacity_bytes == 0 {
            return Err(ChatBridgeError::Config(
                "storage.capacity_bytes must be greater than 0".to_string(),
            )
            .into());
        }

        if limits.max_history_entries == 0 {
            return Err(ChatBridgeError::Config(
                "storage.max_history_entries must be greater than 0".to_string(),
            )
            .into());
        }

        if !(limits.low_water_ratio > 0.0
            && limits.low_water_ratio < limits.high_water_ratio
            && limits.high_water_ratio <= 1.0)
        {
            return Err(ChatBridgeError::Config(
                "storage water marks must satisfy 0 < low_water_ratio < high_water_ratio <= 1"
                    .to_string(),
            )
            .into());
        }

        Ok(())
    }
}
