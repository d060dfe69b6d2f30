//! Command handlers for ChatBridge
//!
//! Each subcommand of the CLI is implemented in its own module. Commands
//! that touch stored chats open a [`ChatStore`] over SQLite; commands that
//! talk to a provider go through a running proxy.

pub mod chat;
pub mod image;
pub mod models;
pub mod serve;
pub mod sessions;

use crate::chat::{ChatStore, Notification, NotificationLevel, Notifier};
use crate::config::Config;
use crate::error::{ChatBridgeError, Result};
use crate::storage::SqliteStorage;
use colored::Colorize;
use std::sync::Arc;

/// Prints store notifications to stderr
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notification: Notification) {
        let line = match notification.level {
            NotificationLevel::Info => notification.message.cyan(),
            NotificationLevel::Warning => notification.message.yellow(),
            NotificationLevel::Error => notification.message.red(),
        };
        eprintln!("{}", line);
    }
}

/// Open the SQLite-backed chat store described by `config`
///
/// # Errors
///
/// Returns error if the database cannot be opened
pub fn open_store(config: &Config) -> Result<ChatStore<SqliteStorage>> {
    let storage = match &config.storage.path {
        Some(path) => SqliteStorage::new_with_path(path)?,
        None => SqliteStorage::new()?,
    };
    let storage = match config.storage.quota_bytes {
        Some(quota) => storage.with_quota(quota),
        None => storage,
    };

    tracing::debug!(path = %storage.path().display(), "Opened chat storage");
    Ok(ChatStore::open(
        storage,
        config.storage.limits.clone(),
        Arc::new(ConsoleNotifier),
    ))
}

/// Activate `session` if given, otherwise the default session
///
/// # Errors
///
/// Returns error if `session` names no stored session
pub fn select_session(
    store: &mut ChatStore<SqliteStorage>,
    session: Option<&str>,
) -> Result<String> {
    match session {
        Some(id) => {
            if store.switch_session(id) {
                Ok(id.to_string())
            } else {
                Err(ChatBridgeError::InvalidRequest(format!("Unknown session: {}", id)).into())
            }
        }
        None => store.bootstrap().ok_or_else(|| {
            ChatBridgeError::Storage("Could not create a chat session".to_string()).into()
        }),
    }
}
