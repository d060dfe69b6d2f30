use crate::config::Config;
use crate::error::Result;
use crate::providers::{ProviderCredentials, ProviderKind};
use crate::proxy::{self, AppState};

/// Run the proxy server
///
/// `bind` overrides the configured bind address.
pub async fn run_server(config: Config, bind: Option<String>) -> Result<()> {
    let addr = bind.unwrap_or_else(|| config.server.bind_address.clone());
    let credentials = ProviderCredentials::from_env();

    for kind in [ProviderKind::OpenAi, ProviderKind::Anthropic] {
        if credentials.get(kind).is_none() {
            tracing::warn!("No API key configured for {}; its requests will fail", kind);
        }
    }

    tracing::info!(
        origin = %config.server.allowed_origin,
        max_requests = config.server.rate_limit.max_requests,
        window_seconds = config.server.rate_limit.window_seconds,
        "Starting proxy"
    );

    let state = AppState::new(config, credentials)?;
    proxy::serve(&addr, state).await
}
