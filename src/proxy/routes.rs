//! Proxy HTTP routes
//!
//! `POST /chat`, `POST /models` and `POST /generate_image`, each answering
//! `OPTIONS` preflights and rejecting other methods with a JSON 405.
//! Every response carries the CORS and cache headers set by
//! [`response_headers`].

use super::error::ApiError;
use super::rate_limit::SlidingWindowRateLimiter;
use super::validation::{resolve_base_url, validate_chat_request};
use crate::config::Config;
use crate::error::{ChatBridgeError, Result};
use crate::providers::{
    self, anthropic, build_http_client, create_provider, openai, ChatParams, ImageParams,
    OpenAiProvider, Provider, ProviderCredentials, ProviderKind,
};

use axum::body::Bytes;
use axum::extract::{ConnectInfo, Request, State};
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

const RATE_LIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");

const DEFAULT_IMAGE_SIZE: &str = "1024x1024";
const DEFAULT_IMAGE_QUALITY: &str = "standard";
const DEFAULT_IMAGE_MODEL: &str = "dall-e-3";

/// State shared by all proxy handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub credentials: Arc<ProviderCredentials>,
    pub rate_limiter: SlidingWindowRateLimiter,
    pub http: reqwest::Client,
}

impl AppState {
    /// Build handler state from configuration and server-side credentials
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub fn new(config: Config, credentials: ProviderCredentials) -> Result<Self> {
        let http = build_http_client(&config.providers)?;
        let rate_limiter = SlidingWindowRateLimiter::new(
            config.server.rate_limit.max_requests,
            Duration::from_secs(config.server.rate_limit.window_seconds),
        );
        Ok(Self {
            config: Arc::new(config),
            credentials: Arc::new(credentials),
            rate_limiter,
            http,
        })
    }
}

/// Build the proxy router
///
/// # Examples
///
/// ```
/// use chatbridge::config::Config;
/// use chatbridge::providers::ProviderCredentials;
/// use chatbridge::proxy::{build_router, AppState};
///
/// let state = AppState::new(Config::default(), ProviderCredentials::default()).unwrap();
/// let _router = build_router(state);
/// ```
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/chat",
            post(chat).options(preflight).fallback(method_not_allowed),
        )
        .route(
            "/models",
            post(models).options(preflight).fallback(method_not_allowed),
        )
        .route(
            "/generate_image",
            post(generate_image)
                .options(preflight)
                .fallback(method_not_allowed),
        )
        .layer(middleware::from_fn_with_state(state.clone(), response_headers))
        .with_state(state)
}

/// Resolve the caller's address for rate limiting
///
/// Uses the first `X-Forwarded-For` entry, then `X-Real-IP`, then the
/// socket peer, then `127.0.0.1`.
pub fn client_address(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let header_value = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    if let Some(first) = header_value("x-forwarded-for")
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
    {
        return first.to_string();
    }

    if let Some(real_ip) = header_value("x-real-ip") {
        return real_ip.to_string();
    }

    peer.map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "127.0.0.1".to_string())
}

fn parse_body(body: &Bytes) -> std::result::Result<Value, ChatBridgeError> {
    serde_json::from_slice(body).map_err(|e| {
        tracing::debug!("Rejected malformed JSON body: {}", e);
        ChatBridgeError::InvalidRequest("Request body is not valid JSON".to_string())
    })
}

fn with_remaining(body: Value, remaining: u32) -> Response {
    let mut response = Json(body).into_response();
    response
        .headers_mut()
        .insert(RATE_LIMIT_REMAINING, HeaderValue::from(remaining));
    response
}

fn optional_str<'a>(body: &'a Value, key: &str) -> Option<&'a str> {
    body.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

async fn chat(
    State(state): State<AppState>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Bytes,
) -> std::result::Result<Response, ApiError> {
    let addr = client_address(&headers, peer.map(|ConnectInfo(addr)| addr));
    let remaining = state.rate_limiter.check(&addr).await?;

    let body = parse_body(&body)?;
    let request = validate_chat_request(&body).map_err(|details| {
        tracing::debug!(addr = %addr, errors = details.len(), "Chat request failed validation");
        ChatBridgeError::Validation(details)
    })?;

    let providers_config = &state.config.providers;
    let (configured, allowed) = match request.provider {
        ProviderKind::OpenAi => (
            &providers_config.openai.base_url,
            &providers_config.openai.allowed_base_urls,
        ),
        ProviderKind::Anthropic => (
            &providers_config.anthropic.base_url,
            &providers_config.anthropic.allowed_base_urls,
        ),
    };
    let base_url = resolve_base_url(request.base_url.as_deref(), configured, allowed)
        .map_err(ChatBridgeError::InvalidRequest)?;

    let provider = create_provider(
        request.provider,
        &base_url,
        &state.http,
        &state.credentials,
        providers_config,
    )?;

    let params = ChatParams {
        model: request.model,
        messages: request.messages,
        temperature: request
            .temperature
            .unwrap_or(providers_config.default_temperature),
        max_tokens: request
            .max_tokens
            .unwrap_or(providers_config.default_max_tokens),
    };

    tracing::info!(
        addr = %addr,
        provider = provider.name(),
        model = %params.model,
        messages = params.messages.len(),
        "Forwarding chat request"
    );

    let completion = provider.complete(&params).await?;
    Ok(with_remaining(json!(completion), remaining))
}

async fn models(
    State(state): State<AppState>,
    body: Bytes,
) -> std::result::Result<Response, ApiError> {
    let body = parse_body(&body)?;
    let provider_name = optional_str(&body, "provider_name").ok_or_else(|| {
        ChatBridgeError::InvalidRequest("provider_name is required".to_string())
    })?;

    let models: Vec<String> = match provider_name {
        "openai" => list_openai_models(&state, optional_str(&body, "endpoint_url")).await?,
        "anthropic" => builtin(anthropic::MODELS),
        "ollama" => builtin(providers::OLLAMA_MODELS),
        "lmstudio" => builtin(providers::LMSTUDIO_MODELS),
        other => {
            return Err(ChatBridgeError::InvalidRequest(format!(
                "Unsupported provider: {}",
                other
            ))
            .into())
        }
    };

    tracing::debug!(provider = provider_name, count = models.len(), "Listed models");
    Ok(Json(json!({ "models": models })).into_response())
}

fn builtin(models: &[&str]) -> Vec<String> {
    models.iter().map(|m| m.to_string()).collect()
}

async fn list_openai_models(
    state: &AppState,
    endpoint_url: Option<&str>,
) -> std::result::Result<Vec<String>, ApiError> {
    let Some(api_key) = state.credentials.get(ProviderKind::OpenAi) else {
        tracing::debug!("No OpenAI key configured, returning empty model list");
        return Ok(Vec::new());
    };

    let openai_config = &state.config.providers.openai;
    let base_url = resolve_base_url(
        endpoint_url,
        &openai_config.base_url,
        &openai_config.allowed_base_urls,
    )
    .map_err(ChatBridgeError::InvalidRequest)?;

    let provider = OpenAiProvider::new(state.http.clone(), base_url, api_key);
    match provider.list_models().await {
        Ok(models) => Ok(models),
        Err(e) => {
            tracing::warn!("Model listing failed, using fallback list: {:#}", e);
            Ok(builtin(openai::FALLBACK_MODELS))
        }
    }
}

async fn generate_image(
    State(state): State<AppState>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Bytes,
) -> std::result::Result<Response, ApiError> {
    let addr = client_address(&headers, peer.map(|ConnectInfo(addr)| addr));
    let remaining = state.rate_limiter.check(&addr).await?;

    let body = parse_body(&body)?;
    let prompt = optional_str(&body, "prompt").ok_or_else(|| {
        ChatBridgeError::InvalidRequest("prompt is required for image generation".to_string())
    })?;

    let params = ImageParams {
        prompt: prompt.to_string(),
        size: optional_str(&body, "size")
            .unwrap_or(DEFAULT_IMAGE_SIZE)
            .to_string(),
        quality: optional_str(&body, "quality")
            .unwrap_or(DEFAULT_IMAGE_QUALITY)
            .to_string(),
        model: optional_str(&body, "model")
            .unwrap_or(DEFAULT_IMAGE_MODEL)
            .to_string(),
    };

    let api_key = state.credentials.require(ProviderKind::OpenAi)?;
    let provider = OpenAiProvider::new(
        state.http.clone(),
        state.config.providers.openai.base_url.clone(),
        api_key,
    );

    tracing::info!(addr = %addr, model = %params.model, size = %params.size, "Forwarding image request");

    let images = provider.generate_image(&params).await?;
    Ok(with_remaining(
        json!({
            "images": images,
            "prompt": params.prompt,
            "size": params.size,
            "quality": params.quality,
            "model": params.model,
        }),
        remaining,
    ))
}

async fn preflight() -> StatusCode {
    StatusCode::OK
}

async fn method_not_allowed() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(json!({ "error": "Method not allowed" })),
    )
        .into_response()
}

/// Attach CORS, content-type and cache headers to every response
async fn response_headers(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let cacheable = request.uri().path() == "/models";
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let mut response = next.run(request).await;
    tracing::debug!(%method, path = %path, status = %response.status(), "Handled request");

    let origin = HeaderValue::from_str(&state.config.server.allowed_origin)
        .unwrap_or_else(|_| HeaderValue::from_static("*"));
    let cache_control = if cacheable {
        "public, max-age=3600"
    } else {
        "no-cache, no-store, must-revalidate"
    };

    let headers = response.headers_mut();
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin);
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("POST, OPTIONS"),
    );
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static(cache_control));
    response
}
