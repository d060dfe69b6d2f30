//! ChatBridge - multi-session LLM chat library
//!
//! This library provides a client-side chat store with bounded persistence
//! and an HTTP proxy that forwards chat and image requests to LLM providers
//! without exposing provider credentials to clients.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `chat`: Sessions, histories, capacity management and preferences
//! - `storage`: Key/value persistence backends (SQLite, in-memory)
//! - `proxy`: Validating, rate-limited HTTP proxy built on axum
//! - `providers`: OpenAI and Anthropic API clients
//! - `client`: HTTP client for a running proxy
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//!
//! # Example
//!
//! ```
//! use chatbridge::chat::{CapacityLimits, ChatStore, TracingNotifier};
//! use chatbridge::storage::{MemoryStorage, Role};
//! use std::sync::Arc;
//!
//! let mut store = ChatStore::open(
//!     MemoryStorage::new(),
//!     CapacityLimits::default(),
//!     Arc::new(TracingNotifier),
//! );
//! let first = store.bootstrap().unwrap();
//! store.append_message(Role::User, "hi", None);
//!
//! let second = store.create_session();
//! assert_eq!(store.chat_history().len(), 0);
//!
//! store.switch_session(&first);
//! assert_eq!(store.chat_history()[0].content, "hi");
//! assert_ne!(first, second.id);
//! ```

pub mod chat;
pub mod cli;
pub mod client;
pub mod commands;
pub mod config;
pub mod error;
pub mod providers;
pub mod proxy;
pub mod storage;

// Re-export commonly used types
pub use chat::{ChatPreferences, ChatStore, Notification, Notifier};
pub use config::Config;
pub use error::{ChatBridgeError, Result};
pub use storage::{ChatMessage, ChatSession, KeyValueStore, MemoryStorage, Role, SqliteStorage};
