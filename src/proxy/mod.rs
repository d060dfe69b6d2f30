//! Credential-hiding provider proxy
//!
//! Validates and rate-limits chat and image requests from untrusted
//! clients, then forwards them to the upstream provider using credentials
//! held only by the server.

pub mod error;
pub mod rate_limit;
pub mod routes;
pub mod validation;

pub use error::ApiError;
pub use rate_limit::SlidingWindowRateLimiter;
pub use routes::{build_router, client_address, AppState};
pub use validation::{resolve_base_url, validate_chat_request, ChatRequest};

use crate::error::{ChatBridgeError, Result};
use std::net::SocketAddr;

/// Bind `addr` and serve the proxy until the process is stopped
///
/// # Errors
///
/// Returns error if the address is invalid or cannot be bound
pub async fn serve(addr: &str, state: AppState) -> Result<()> {
    let addr: SocketAddr = addr
        .parse()
        .map_err(|e| ChatBridgeError::Config(format!("Invalid bind address {}: {}", addr, e)))?;

    let router = build_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("ChatBridge proxy listening on {}", addr);
    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
