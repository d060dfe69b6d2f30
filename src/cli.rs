//! Command-line interface definition for ChatBridge
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for running the proxy, managing stored sessions,
//! and chatting through a running proxy.

use clap::{Parser, Subcommand};

/// ChatBridge - multi-session LLM chat with a credential-hiding proxy
///
/// Run the proxy with `serve`, then manage sessions and chat against it
/// from the same binary.
#[derive(Parser, Debug, Clone)]
#[command(name = "chatbridge")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,

    /// Override the chat storage database path
    #[arg(long, env = "CHATBRIDGE_STORAGE_PATH")]
    pub storage_path: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for ChatBridge
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run the provider proxy HTTP server
    Serve {
        /// Address to bind, e.g. 0.0.0.0:8888 (overrides config)
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Manage stored chat sessions
    Sessions {
        /// Session management subcommand
        #[command(subcommand)]
        command: SessionCommand,
    },

    /// Send and edit messages in a session
    Chat {
        /// Session to act on (defaults to the most recently created)
        #[arg(short, long, global = true)]
        session: Option<String>,

        /// Chat subcommand
        #[command(subcommand)]
        command: ChatCommand,
    },

    /// List models available from a provider through the proxy
    Models {
        /// Provider name (openai, anthropic, ollama, lmstudio)
        #[arg(short, long)]
        provider: Option<String>,

        /// Custom endpoint URL for OpenAI-compatible servers
        #[arg(short, long)]
        endpoint: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate an image through the proxy
    Image {
        /// Image description
        prompt: String,

        /// Image size
        #[arg(long)]
        size: Option<String>,

        /// Image quality (dall-e-3 only)
        #[arg(long)]
        quality: Option<String>,

        /// Image model
        #[arg(long)]
        model: Option<String>,

        /// Session to record the result in
        #[arg(short, long)]
        session: Option<String>,
    },
}

/// Session management subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum SessionCommand {
    /// List sessions, most recent first
    List,

    /// Create a new empty session
    New,

    /// Rename a session
    Rename {
        /// Session id
        id: String,

        /// New display name
        name: String,
    },

    /// Delete a session and its history
    Delete {
        /// Session id
        id: String,
    },

    /// Print a session's messages
    Show {
        /// Session id (defaults to the most recently created)
        id: Option<String>,
    },
}

/// Chat subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ChatCommand {
    /// Send a message and record the reply
    Send {
        /// Message text
        message: String,
    },

    /// Replace a message's content, discarding every later message
    Edit {
        /// Message id
        id: String,

        /// New content
        content: String,
    },

    /// Delete a single message
    DeleteMessage {
        /// Message id
        id: String,
    },

    /// Show or change stored chat preferences
    Config {
        /// Provider (openai, anthropic)
        #[arg(long)]
        provider: Option<String>,

        /// Model identifier
        #[arg(long)]
        model: Option<String>,

        /// Provider base URL
        #[arg(long)]
        base_url: Option<String>,

        /// Sampling temperature
        #[arg(long)]
        temperature: Option<f64>,

        /// Maximum tokens to generate
        #[arg(long)]
        max_tokens: Option<u32>,
    },
}

impl Cli {
    /// Parse command line arguments
    ///
    /// # Returns
    ///
    /// Returns the parsed CLI structure
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: Some("config/config.yaml".to_string()),
            verbose: false,
            json_logs: false,
            storage_path: None,
            command: Commands::Sessions {
                command: SessionCommand::List,
            },
        }
    }
}
