use crate::client::{ImageRequest, ProxyClient};
use crate::config::Config;
use crate::error::Result;
use crate::storage::Role;
use colored::Colorize;
use std::time::Duration;

/// Generate an image through the proxy
///
/// When `session` is given, the prompt and a summary of the result are
/// recorded in that session's history.
pub async fn generate_image(
    request: ImageRequest,
    session: Option<&str>,
    config: &Config,
) -> Result<()> {
    let client = ProxyClient::new(
        &config.client.proxy_url,
        Duration::from_secs(config.providers.request_timeout_seconds),
    )?;

    let result = client.generate_image(&request).await?;

    for url in &result.images {
        println!("{}", url.cyan());
    }
    let summary = format!(
        "Image generated ({}, {}, {})",
        result.size, result.quality, result.model
    );
    println!("{}", summary.green());

    if let Some(session) = session {
        let mut store = super::open_store(config)?;
        super::select_session(&mut store, Some(session))?;
        store.append_message(Role::User, result.prompt.clone(), None);
        let content = format!("{}\n{}", summary, result.images.join("\n"));
        store.append_message(Role::Assistant, content, None);
        tracing::debug!(session, "Recorded image result");
    }

    Ok(())
}
