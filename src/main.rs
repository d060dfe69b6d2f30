//! ChatBridge - multi-session LLM chat with a credential-hiding proxy
//!
#![doc = "ChatBridge - multi-session LLM chat CLI"]
#![doc = "Main entry point for the ChatBridge application."]

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use chatbridge::cli::{Cli, Commands};
use chatbridge::client::ImageRequest;
use chatbridge::commands;
use chatbridge::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize tracing
    init_tracing(cli.verbose, cli.json_logs);

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    // Validate configuration
    config.validate()?;

    // Execute command
    match cli.command {
        Commands::Serve { bind } => {
            tracing::info!("Starting proxy server");
            commands::serve::run_server(config, bind).await?;
            Ok(())
        }
        Commands::Sessions { command } => {
            commands::sessions::handle_sessions(command, &config)?;
            Ok(())
        }
        Commands::Chat { session, command } => {
            if let Some(s) = &session {
                tracing::debug!("Using session: {}", s);
            }
            commands::chat::handle_chat(command, session, &config).await?;
            Ok(())
        }
        Commands::Models {
            provider,
            endpoint,
            json,
        } => {
            commands::models::list_models(provider.as_deref(), endpoint.as_deref(), json, &config)
                .await?;
            Ok(())
        }
        Commands::Image {
            prompt,
            size,
            quality,
            model,
            session,
        } => {
            let request = ImageRequest {
                prompt,
                size,
                quality,
                model,
            };
            commands::image::generate_image(request, session.as_deref(), &config).await?;
            Ok(())
        }
    }
}

/// Initialize the tracing subscriber
///
/// `RUST_LOG` takes precedence; otherwise `chatbridge=info`, or
/// `chatbridge=debug` with `--verbose`. Logs go to stderr so command
/// output on stdout stays clean.
fn init_tracing(verbose: bool, json: bool) {
    let default_directive = if verbose {
        "chatbridge=debug"
    } else {
        "chatbridge=info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
