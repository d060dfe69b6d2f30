//! HTTP mapping of proxy errors

use crate::error::ChatBridgeError;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Error returned from proxy handlers
///
/// Wraps the crate error so handlers can use `?` on anything that
/// converts into `anyhow::Error`; the status code is chosen from the
/// underlying [`ChatBridgeError`] variant.
#[derive(Debug)]
pub struct ApiError(anyhow::Error);

impl<E> From<E> for ApiError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

impl ApiError {
    /// The HTTP status this error maps to
    pub fn status(&self) -> StatusCode {
        match self.0.downcast_ref::<ChatBridgeError>() {
            Some(ChatBridgeError::Validation(_)) | Some(ChatBridgeError::InvalidRequest(_)) => {
                StatusCode::BAD_REQUEST
            }
            Some(ChatBridgeError::RateLimitExceeded { .. }) => StatusCode::TOO_MANY_REQUESTS,
            Some(ChatBridgeError::Provider { .. }) | Some(ChatBridgeError::Http(_)) => {
                StatusCode::BAD_GATEWAY
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let (body, retry_after) = match self.0.downcast_ref::<ChatBridgeError>() {
            Some(ChatBridgeError::Validation(details)) => (
                json!({ "error": "Validation failed", "details": details }),
                None,
            ),
            Some(ChatBridgeError::InvalidRequest(message)) => (json!({ "error": message }), None),
            Some(ChatBridgeError::RateLimitExceeded {
                remaining,
                reset_after_secs,
                ..
            }) => (
                json!({
                    "error": "Rate limit exceeded. Try again in a few minutes.",
                    "remaining": remaining,
                    "reset_after_seconds": reset_after_secs,
                }),
                Some(*reset_after_secs),
            ),
            Some(ChatBridgeError::MissingCredentials(provider)) => (
                json!({
                    "error": format!(
                        "API key for {} is not configured on the server. Check the environment variables.",
                        provider
                    )
                }),
                None,
            ),
            Some(ChatBridgeError::Provider { message, .. }) => {
                (json!({ "error": message }), None)
            }
            _ => {
                tracing::error!("Unhandled proxy error: {:#}", self.0);
                (json!({ "error": self.0.to_string() }), None)
            }
        };

        let mut response = (status, Json(body)).into_response();
        if let Some(secs) = retry_after {
            if let Ok(value) = HeaderValue::from_str(&secs.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}
