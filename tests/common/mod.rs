use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use chatbridge::config::Config;
use chatbridge::providers::ProviderCredentials;
use chatbridge::proxy::{build_router, AppState};
use chatbridge::storage::SqliteStorage;
use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;
use tower::ServiceExt;

#[allow(dead_code)]
pub fn create_temp_storage() -> (SqliteStorage, TempDir) {
    let tmp = TempDir::new().expect("failed to create tempdir");
    let db_path = tmp.path().join("chat.db");
    let storage =
        SqliteStorage::new_with_path(db_path).expect("failed to create sqlite storage with path");
    (storage, tmp)
}

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}

/// Credentials the tests treat as server-side secrets
#[allow(dead_code)]
pub fn server_credentials() -> ProviderCredentials {
    ProviderCredentials::new(
        Some("sk-server-openai".to_string()),
        Some("sk-ant-server".to_string()),
    )
}

/// Router over `config` with the given credentials
#[allow(dead_code)]
pub fn test_router(config: Config, credentials: ProviderCredentials) -> Router {
    let state = AppState::new(config, credentials).expect("failed to build app state");
    build_router(state)
}

/// Router whose providers point at `upstream` (e.g. a wiremock server)
#[allow(dead_code)]
pub fn router_for_upstream(upstream: &str) -> Router {
    let mut config = Config::default();
    config.providers.openai.base_url = format!("{}/v1", upstream);
    config.providers.anthropic.base_url = upstream.to_string();
    test_router(config, server_credentials())
}

/// A response decoded for assertions
#[allow(dead_code)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub raw: Vec<u8>,
    pub body: Value,
}

/// Send one request through `router` without opening a socket
#[allow(dead_code)]
pub async fn send(
    router: &Router,
    method: &str,
    path: &str,
    body: Option<String>,
    headers: &[(&str, &str)],
) -> TestResponse {
    let mut builder = Request::builder().method(method).uri(path);
    if body.is_some() {
        builder = builder.header("content-type", "application/json");
    }
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let request = builder
        .body(body.map(Body::from).unwrap_or_else(Body::empty))
        .expect("failed to build request");

    let response = router
        .clone()
        .oneshot(request)
        .await
        .expect("router is infallible");

    let status = response.status();
    let headers = response.headers().clone();
    let raw = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read body")
        .to_vec();
    let body = serde_json::from_slice(&raw).unwrap_or(Value::Null);

    TestResponse {
        status,
        headers,
        raw,
        body,
    }
}

/// POST a JSON value
#[allow(dead_code)]
pub async fn post_json(router: &Router, path: &str, body: &Value) -> TestResponse {
    send(router, "POST", path, Some(body.to_string()), &[]).await
}
