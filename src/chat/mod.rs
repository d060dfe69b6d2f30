//! Client-side chat state
//!
//! Sessions, per-session histories, capacity management and preferences,
//! all persisted through an injected [`crate::storage::KeyValueStore`].

pub mod capacity;
pub mod ids;
pub mod notification;
pub mod preferences;
pub mod store;

pub use capacity::{history_key, CapacityLimits, CapacityManager, EvictionReport, SESSIONS_KEY};
pub use ids::generate_unique_id;
pub use notification::{
    CollectingNotifier, Notification, NotificationLevel, Notifier, TracingNotifier,
};
pub use preferences::{stock_base_url, ChatPreferences, ANTHROPIC_BASE_URL, OPENAI_BASE_URL, PREFERENCES_KEY};
pub use store::ChatStore;
