//! Forwarding tests against mock provider APIs
//!
//! A `wiremock` server stands in for OpenAI and Anthropic so the tests can
//! check exactly what the proxy sends upstream and how it relays replies.

mod common;

use axum::http::StatusCode;
use chatbridge::config::Config;
use common::{post_json, router_for_upstream, server_credentials, test_router};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_openai_chat_is_forwarded_with_server_key_and_defaults() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-server-openai"))
        .and(body_partial_json(json!({
            "model": "gpt-4o",
            "temperature": 0.7,
            "max_tokens": 1000,
            "messages": [{"role": "user", "content": "hello"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": "Hello there!"}}],
            "usage": {"prompt_tokens": 5, "completion_tokens": 3, "total_tokens": 8}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let router = router_for_upstream(&server.uri());
    let response = post_json(
        &router,
        "/chat",
        &json!({
            "config": {"provider": "openai", "model": "gpt-4o"},
            "messages": [{"role": "user", "content": "hello"}]
        }),
    )
    .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["response"], "Hello there!");
    assert_eq!(response.body["usage"]["total_tokens"], 8);
    assert_eq!(response.headers["x-ratelimit-remaining"], "9");
}

#[tokio::test]
async fn test_client_api_key_never_reaches_provider() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-server-openai"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"content": "ok"}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let router = router_for_upstream(&server.uri());
    let response = post_json(
        &router,
        "/chat",
        &json!({
            "config": {"provider": "openai", "model": "gpt-4o", "api_key": "sk-client-supplied"},
            "messages": [{"role": "user", "content": "hello"}]
        }),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let body = String::from_utf8_lossy(&requests[0].body);
    assert!(!body.contains("sk-client-supplied"));
    assert!(!body.contains("api_key"));
}

#[tokio::test]
async fn test_temperature_zero_is_forwarded() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(json!({"temperature": 0.0, "max_tokens": 42})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"content": "deterministic"}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let router = router_for_upstream(&server.uri());
    let response = post_json(
        &router,
        "/chat",
        &json!({
            "config": {"provider": "openai", "model": "gpt-4o", "temperature": 0, "max_tokens": 42},
            "messages": [{"role": "user", "content": "hello"}]
        }),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["response"], "deterministic");
}

#[tokio::test]
async fn test_provider_error_is_relayed_as_bad_gateway() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"message": "Incorrect API key provided", "type": "invalid_request_error"}
        })))
        .mount(&server)
        .await;

    let router = router_for_upstream(&server.uri());
    let response = post_json(
        &router,
        "/chat",
        &json!({
            "config": {"provider": "openai", "model": "gpt-4o"},
            "messages": [{"role": "user", "content": "hello"}]
        }),
    )
    .await;

    assert_eq!(response.status, StatusCode::BAD_GATEWAY);
    assert_eq!(response.body["error"], "Incorrect API key provided");
}

#[tokio::test]
async fn test_allowlisted_base_url_is_used() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"content": "from local server"}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let local = format!("{}/v1", server.uri());
    let mut config = Config::default();
    config.providers.openai.allowed_base_urls = vec![local.clone()];
    let router = test_router(config, server_credentials());

    let response = post_json(
        &router,
        "/chat",
        &json!({
            "config": {"provider": "openai", "model": "llama3.2", "base_url": local},
            "messages": [{"role": "user", "content": "hello"}]
        }),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["response"], "from local server");
}

#[tokio::test]
async fn test_anthropic_chat_lifts_system_and_sends_headers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "sk-ant-server"))
        .and(header("anthropic-version", "2023-06-01"))
        .and(body_partial_json(json!({
            "model": "claude-3-5-haiku-20241022",
            "system": "Be brief.",
            "messages": [{"role": "user", "content": "Hi"}],
            "max_tokens": 1000
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [{"type": "text", "text": "Hey!"}],
            "usage": {"input_tokens": 7, "output_tokens": 2}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let router = router_for_upstream(&server.uri());
    let response = post_json(
        &router,
        "/chat",
        &json!({
            "config": {"provider": "anthropic", "model": "claude-3-5-haiku-20241022"},
            "messages": [
                {"role": "system", "content": "Be brief."},
                {"role": "user", "content": "Hi"}
            ]
        }),
    )
    .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["response"], "Hey!");
    assert_eq!(response.body["usage"]["input_tokens"], 7);
}

#[tokio::test]
async fn test_openai_models_from_custom_endpoint_are_sorted() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/models"))
        .and(header("authorization", "Bearer sk-server-openai"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"id": "mistral"}, {"id": "llama3.2"}, {"id": "codellama"}]
        })))
        .mount(&server)
        .await;

    let router = router_for_upstream(&server.uri());
    let response = post_json(&router, "/models", &json!({"provider_name": "openai"})).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.body["models"],
        json!(["codellama", "llama3.2", "mistral"])
    );
}

#[tokio::test]
async fn test_openai_models_fall_back_on_upstream_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/models"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream down"))
        .mount(&server)
        .await;

    let router = router_for_upstream(&server.uri());
    let response = post_json(&router, "/models", &json!({"provider_name": "openai"})).await;

    assert_eq!(response.status, StatusCode::OK);
    let models = response.body["models"].as_array().unwrap();
    assert_eq!(models[0], "gpt-4o");
    assert!(models.contains(&json!("dall-e-3")));
}

#[tokio::test]
async fn test_image_generation_defaults() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/images/generations"))
        .and(body_partial_json(json!({
            "model": "dall-e-3",
            "prompt": "a lighthouse at dusk",
            "size": "1024x1024",
            "quality": "standard",
            "n": 1
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"url": "https://images.example.com/1.png"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let router = router_for_upstream(&server.uri());
    let response = post_json(
        &router,
        "/generate_image",
        &json!({"prompt": "a lighthouse at dusk"}),
    )
    .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.body["images"],
        json!(["https://images.example.com/1.png"])
    );
    assert_eq!(response.body["size"], "1024x1024");
    assert_eq!(response.body["quality"], "standard");
    assert_eq!(response.body["model"], "dall-e-3");
}

#[tokio::test]
async fn test_image_quality_omitted_for_dalle2() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/images/generations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"url": "https://images.example.com/2.png"}]
        })))
        .mount(&server)
        .await;

    let router = router_for_upstream(&server.uri());
    let response = post_json(
        &router,
        "/generate_image",
        &json!({"prompt": "a fox", "model": "dall-e-2", "size": "512x512", "quality": "hd"}),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);

    let requests = server.received_requests().await.unwrap();
    let sent: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert!(sent.get("quality").is_none());
    assert_eq!(sent["size"], "512x512");
}
