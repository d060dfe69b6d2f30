//! Session and history store
//!
//! [`ChatStore`] owns the session index, the active session pointer and the
//! active session's message history. Every mutation is persisted straight
//! away through the injected [`KeyValueStore`], with the
//! [`CapacityManager`] given a chance to reclaim space first.
//!
//! Operations never return errors. Persistence failures are logged and
//! reported through the [`Notifier`]; the in-memory state stays usable.

use super::capacity::{history_key, CapacityLimits, CapacityManager, SESSIONS_KEY};
use super::ids::generate_unique_id;
use super::notification::{Notification, Notifier};
use super::preferences::ChatPreferences;
use crate::error::{ChatBridgeError, Result};
use crate::storage::{ChatMessage, ChatSession, KeyValueStore, Role};
use chrono::Utc;
use std::sync::Arc;

/// Which blob a persist call writes
#[derive(Debug, Clone)]
enum Blob {
    Sessions,
    History(String),
}

impl Blob {
    fn describe(&self) -> &'static str {
        match self {
            Blob::Sessions => "chat sessions",
            Blob::History(_) => "chat history",
        }
    }
}

/// Multi-session chat state over injected persistence
pub struct ChatStore<S: KeyValueStore> {
    storage: S,
    capacity: CapacityManager,
    notifier: Arc<dyn Notifier>,
    sessions: Vec<ChatSession>,
    active_id: Option<String>,
    /// Session being switched to; spared by eviction until it is active
    switch_target: Option<String>,
    history: Vec<ChatMessage>,
}

impl<S: KeyValueStore> ChatStore<S> {
    /// Open a store, loading the session index from `storage`
    ///
    /// No session is active until [`bootstrap`](Self::bootstrap),
    /// [`switch_session`](Self::switch_session) or
    /// [`create_session`](Self::create_session) is called.
    ///
    /// # Examples
    ///
    /// ```
    /// use chatbridge::chat::{CapacityLimits, ChatStore, TracingNotifier};
    /// use chatbridge::storage::{MemoryStorage, Role};
    /// use std::sync::Arc;
    ///
    /// let mut store = ChatStore::open(
    ///     MemoryStorage::new(),
    ///     CapacityLimits::default(),
    ///     Arc::new(TracingNotifier),
    /// );
    /// store.bootstrap();
    /// store.append_message(Role::User, "hi", None);
    /// assert_eq!(store.chat_history().len(), 1);
    /// ```
    pub fn open(storage: S, limits: CapacityLimits, notifier: Arc<dyn Notifier>) -> Self {
        let sessions = match storage.get(SESSIONS_KEY) {
            Ok(Some(json)) => serde_json::from_str(&json).unwrap_or_else(|e| {
                tracing::warn!("Session index is unreadable, starting empty: {}", e);
                notifier.notify(Notification::warning(
                    "Saved chat sessions could not be read; starting with an empty list",
                ));
                Vec::new()
            }),
            Ok(None) => {
                tracing::debug!("No chat sessions found");
                Vec::new()
            }
            Err(e) => {
                tracing::warn!("Failed to load chat sessions: {}", e);
                Vec::new()
            }
        };

        tracing::debug!("Loaded {} chat sessions", sessions.len());

        Self {
            storage,
            capacity: CapacityManager::new(limits),
            notifier,
            sessions,
            active_id: None,
            switch_target: None,
            history: Vec::new(),
        }
    }

    /// Make sure a session is active
    ///
    /// Creates the first session when none exist, otherwise activates the
    /// first session in the index if nothing is active yet. Returns the
    /// active session id.
    pub fn bootstrap(&mut self) -> Option<String> {
        if self.sessions.is_empty() {
            self.create_session();
        } else if self.active_id.is_none() {
            let first = self.sessions[0].id.clone();
            self.switch_session(&first);
        }
        self.active_id.clone()
    }

    /// Create a session and make it active with an empty history
    pub fn create_session(&mut self) -> ChatSession {
        if self.active_id.is_some() {
            self.save_current_history();
        }

        let session = ChatSession {
            id: generate_unique_id(),
            name: format!("New Chat {}", self.sessions.len() + 1),
            timestamp: Utc::now(),
        };

        self.sessions.insert(0, session.clone());
        self.save_sessions();

        self.active_id = Some(session.id.clone());
        self.history.clear();
        self.save_current_history();

        tracing::info!(session_id = %session.id, "Created chat session");
        session
    }

    /// Persist the active history and load `session_id` into the active slot
    ///
    /// Switching to the session that is already active is a successful
    /// no-op. Returns false when `session_id` is not a known session.
    pub fn switch_session(&mut self, session_id: &str) -> bool {
        if !self.sessions.iter().any(|s| s.id == session_id) {
            tracing::warn!(session_id, "Cannot switch to unknown session");
            return false;
        }

        if self.active_id.as_deref() == Some(session_id) {
            return true;
        }

        if self.active_id.is_some() {
            self.switch_target = Some(session_id.to_string());
            self.save_current_history();
            self.switch_target = None;

            if !self.sessions.iter().any(|s| s.id == session_id) {
                tracing::warn!(session_id, "Session disappeared while switching");
                return false;
            }
        }

        self.history = self.load_history(session_id);
        self.active_id = Some(session_id.to_string());
        tracing::debug!(session_id, messages = self.history.len(), "Switched session");
        true
    }

    /// Rename a session and bump its timestamp
    ///
    /// Only the session index is persisted. Returns whether the id exists.
    pub fn rename_session(&mut self, session_id: &str, new_name: &str) -> bool {
        let Some(session) = self.sessions.iter_mut().find(|s| s.id == session_id) else {
            return false;
        };

        session.name = new_name.to_string();
        session.timestamp = Utc::now();
        self.save_sessions();

        tracing::info!(session_id, "Renamed chat session");
        true
    }

    /// Remove a session and its history blob
    ///
    /// Deleting the active session leaves no session active. Returns
    /// whether the id existed.
    pub fn delete_session(&mut self, session_id: &str) -> bool {
        let before = self.sessions.len();
        self.sessions.retain(|s| s.id != session_id);
        let existed = self.sessions.len() < before;

        self.save_sessions();
        if let Err(e) = self.storage.remove(&history_key(session_id)) {
            tracing::error!(session_id, "Failed to remove history blob: {}", e);
            self.notifier
                .notify(Notification::error(format!("Failed to delete chat history: {}", e)));
        }

        if self.active_id.as_deref() == Some(session_id) {
            self.active_id = None;
            self.history.clear();
        }

        tracing::info!(session_id, "Deleted chat session");
        existed
    }

    /// Append a message to the active history
    ///
    /// Does nothing and returns `None` when no session is active. A fresh id
    /// is generated unless `message_id` is given.
    pub fn append_message(
        &mut self,
        role: Role,
        content: impl Into<String>,
        message_id: Option<String>,
    ) -> Option<ChatMessage> {
        if self.active_id.is_none() {
            tracing::debug!("No active session, message dropped");
            return None;
        }

        let message = ChatMessage {
            id: message_id.unwrap_or_else(generate_unique_id),
            role,
            content: content.into(),
            timestamp: Utc::now(),
        };
        self.history.push(message.clone());
        self.save_current_history();
        Some(message)
    }

    /// Edit a message and discard everything after it
    ///
    /// Editing rewinds the conversation to the edited message. Returns
    /// whether the id was found in the active history.
    pub fn update_message(&mut self, message_id: &str, new_content: impl Into<String>) -> bool {
        let Some(index) = self.history.iter().position(|m| m.id == message_id) else {
            return false;
        };

        let message = &mut self.history[index];
        message.content = new_content.into();
        message.timestamp = Utc::now();

        let discarded = self.history.len() - (index + 1);
        self.history.truncate(index + 1);
        if discarded > 0 {
            tracing::debug!(message_id, discarded, "Edit discarded later messages");
        }

        self.save_current_history();
        true
    }

    /// Remove a message from the active history
    ///
    /// Returns whether anything was removed.
    pub fn delete_message(&mut self, message_id: &str) -> bool {
        let before = self.history.len();
        self.history.retain(|m| m.id != message_id);
        if self.history.len() == before {
            return false;
        }

        self.save_current_history();
        true
    }

    /// Copy of the active history in conversation order
    pub fn chat_history(&self) -> Vec<ChatMessage> {
        self.history.clone()
    }

    /// Borrow the active history
    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    /// Copy of the session index in stored order (newest created first)
    pub fn sessions(&self) -> Vec<ChatSession> {
        self.sessions.clone()
    }

    /// Sessions ordered by timestamp, most recent first
    pub fn sessions_by_recency(&self) -> Vec<ChatSession> {
        let mut sessions = self.sessions.clone();
        sessions.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        sessions
    }

    pub fn current_session_id(&self) -> Option<&str> {
        self.active_id.as_deref()
    }

    /// Load a session's history without activating it
    pub fn peek_history(&self, session_id: &str) -> Vec<ChatMessage> {
        if self.active_id.as_deref() == Some(session_id) {
            return self.history.clone();
        }
        self.load_history(session_id)
    }

    pub fn preferences(&self) -> ChatPreferences {
        ChatPreferences::load(&self.storage)
    }

    /// Apply `update` to the stored preferences and persist them
    pub fn update_preferences(&mut self, update: impl FnOnce(&mut ChatPreferences)) -> ChatPreferences {
        let mut prefs = self.preferences();
        update(&mut prefs);
        if let Err(e) = prefs.save(&mut self.storage) {
            tracing::error!("Failed to save preferences: {}", e);
            self.notifier
                .notify(Notification::error(format!("Failed to save preferences: {}", e)));
        }
        prefs
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    fn load_history(&self, session_id: &str) -> Vec<ChatMessage> {
        match self.storage.get(&history_key(session_id)) {
            Ok(Some(json)) => serde_json::from_str(&json).unwrap_or_else(|e| {
                tracing::warn!(session_id, "History is unreadable, starting empty: {}", e);
                self.notifier.notify(Notification::warning(
                    "This chat's history could not be read; starting it empty",
                ));
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!(session_id, "Failed to load history: {}", e);
                Vec::new()
            }
        }
    }

    fn save_sessions(&mut self) -> bool {
        self.persist(Blob::Sessions)
    }

    fn save_current_history(&mut self) -> bool {
        let Some(id) = self.active_id.clone() else {
            return true;
        };
        self.capacity
            .truncate_history(&mut self.history, self.notifier.as_ref());
        self.persist(Blob::History(id))
    }

    /// Write a blob after a capacity pass, retrying once on quota errors
    fn persist(&mut self, blob: Blob) -> bool {
        if let Err(e) = self.reclaim(false) {
            tracing::warn!("Capacity check failed: {}", e);
        }

        let err = match self.write(&blob) {
            Ok(()) => return true,
            Err(e) => e,
        };

        if !ChatBridgeError::is_quota(&err) {
            tracing::error!("Failed to save {}: {}", blob.describe(), err);
            self.notifier.notify(Notification::error(format!(
                "Failed to save {}: {}",
                blob.describe(),
                err
            )));
            return false;
        }

        tracing::warn!("Storage quota exceeded saving {}, reclaiming space", blob.describe());
        if let Err(e) = self.reclaim(true) {
            tracing::warn!("Forced eviction failed: {}", e);
        }

        match self.write(&blob) {
            Ok(()) => {
                tracing::info!("Saved {} after freeing space", blob.describe());
                true
            }
            Err(e) => {
                tracing::error!("Giving up saving {}: {}", blob.describe(), e);
                self.notifier.notify(Notification::error(format!(
                    "Not enough storage space to save {}",
                    blob.describe()
                )));
                false
            }
        }
    }

    fn reclaim(&mut self, force: bool) -> Result<()> {
        let protected: Vec<&str> = self
            .active_id
            .iter()
            .chain(self.switch_target.iter())
            .map(String::as_str)
            .collect();
        self.capacity.enforce(
            &mut self.storage,
            &mut self.sessions,
            &protected,
            force,
            self.notifier.as_ref(),
        )?;
        Ok(())
    }

    fn write(&mut self, blob: &Blob) -> Result<()> {
        match blob {
            Blob::Sessions => {
                let json = serde_json::to_string(&self.sessions)?;
                self.storage.set(SESSIONS_KEY, &json)
            }
            Blob::History(id) => {
                let json = serde_json::to_string(&self.history)?;
                self.storage.set(&history_key(id), &json)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::notification::{CollectingNotifier, NotificationLevel};
    use crate::storage::MemoryStorage;

    fn new_store() -> (ChatStore<MemoryStorage>, CollectingNotifier) {
        let notifier = CollectingNotifier::new();
        let store = ChatStore::open(
            MemoryStorage::new(),
            CapacityLimits::default(),
            Arc::new(notifier.clone()),
        );
        (store, notifier)
    }

    #[test]
    fn test_create_session_activates_and_persists() {
        let (mut store, _) = new_store();
        let session = store.create_session();

        assert_eq!(store.current_session_id(), Some(session.id.as_str()));
        assert_eq!(session.name, "New Chat 1");
        assert!(store.chat_history().is_empty());
        assert!(store.storage().contains(SESSIONS_KEY).unwrap());
        assert_eq!(
            store.storage().get(&history_key(&session.id)).unwrap().as_deref(),
            Some("[]")
        );
    }

    #[test]
    fn test_create_session_prepends_and_names_by_count() {
        let (mut store, _) = new_store();
        let first = store.create_session();
        let second = store.create_session();

        let ids: Vec<String> = store.sessions().into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![second.id.clone(), first.id]);
        assert_eq!(second.name, "New Chat 2");
    }

    #[test]
    fn test_bootstrap_creates_first_session() {
        let (mut store, _) = new_store();
        let active = store.bootstrap();
        assert!(active.is_some());
        assert_eq!(store.sessions().len(), 1);
    }

    #[test]
    fn test_bootstrap_activates_existing_session() {
        let (mut store, _) = new_store();
        let session = store.create_session();
        store.append_message(Role::User, "remember me", None);

        let storage = store.into_storage();
        let mut reopened = ChatStore::open(
            storage,
            CapacityLimits::default(),
            Arc::new(CollectingNotifier::new()),
        );
        assert_eq!(reopened.current_session_id(), None);
        assert_eq!(reopened.bootstrap(), Some(session.id));
        assert_eq!(reopened.chat_history()[0].content, "remember me");
    }

    #[test]
    fn test_append_preserves_order_and_ids() {
        let (mut store, _) = new_store();
        store.create_session();
        let ids: Vec<String> = (0..5)
            .map(|i| {
                store
                    .append_message(Role::User, format!("msg {}", i), None)
                    .unwrap()
                    .id
            })
            .collect();

        let history = store.chat_history();
        let stored: Vec<String> = history.iter().map(|m| m.id.clone()).collect();
        assert_eq!(stored, ids);
        assert_eq!(history[4].content, "msg 4");
    }

    #[test]
    fn test_append_uses_supplied_id() {
        let (mut store, _) = new_store();
        store.create_session();
        let msg = store
            .append_message(Role::Assistant, "hello", Some("fixed".to_string()))
            .unwrap();
        assert_eq!(msg.id, "fixed");
        assert_eq!(msg.role, Role::Assistant);
    }

    #[test]
    fn test_append_without_active_session_is_noop() {
        let (mut store, notifier) = new_store();
        assert!(store.append_message(Role::User, "lost", None).is_none());
        assert!(store.chat_history().is_empty());
        assert!(store.storage().keys().unwrap().is_empty());
        assert!(notifier.notifications().is_empty());
    }

    #[test]
    fn test_update_message_truncates_after_edited() {
        let (mut store, _) = new_store();
        store.create_session();
        let ids: Vec<String> = (0..5)
            .map(|i| {
                store
                    .append_message(Role::User, format!("msg {}", i), None)
                    .unwrap()
                    .id
            })
            .collect();

        // Edit the 3rd message (k = 3)
        assert!(store.update_message(&ids[2], "edited"));
        let history = store.chat_history();
        assert_eq!(history.len(), 3);
        assert_eq!(history[2].content, "edited");
        assert_eq!(history[2].id, ids[2]);

        // The truncation is persisted
        let session_id = store.current_session_id().unwrap().to_string();
        let persisted: Vec<ChatMessage> = serde_json::from_str(
            &store.storage().get(&history_key(&session_id)).unwrap().unwrap(),
        )
        .unwrap();
        assert_eq!(persisted.len(), 3);
    }

    #[test]
    fn test_update_unknown_message_returns_false() {
        let (mut store, _) = new_store();
        store.create_session();
        store.append_message(Role::User, "a", None);
        assert!(!store.update_message("missing", "b"));
        assert_eq!(store.chat_history()[0].content, "a");
    }

    #[test]
    fn test_delete_message() {
        let (mut store, _) = new_store();
        store.create_session();
        let a = store.append_message(Role::User, "a", None).unwrap();
        store.append_message(Role::Assistant, "b", None);

        assert!(store.delete_message(&a.id));
        assert!(!store.delete_message(&a.id));
        assert_eq!(store.chat_history().len(), 1);
        assert_eq!(store.chat_history()[0].content, "b");
    }

    #[test]
    fn test_delete_session_removes_entry_and_blob() {
        let (mut store, _) = new_store();
        let doomed = store.create_session();
        store.append_message(Role::User, "bye", None);
        let kept = store.create_session();

        assert!(store.delete_session(&doomed.id));
        assert!(!store.sessions().iter().any(|s| s.id == doomed.id));
        assert!(!store.storage().contains(&history_key(&doomed.id)).unwrap());
        assert_eq!(store.current_session_id(), Some(kept.id.as_str()));
    }

    #[test]
    fn test_delete_active_session_clears_pointer() {
        let (mut store, _) = new_store();
        let session = store.create_session();
        store.append_message(Role::User, "x", None);

        assert!(store.delete_session(&session.id));
        assert_eq!(store.current_session_id(), None);
        assert!(store.chat_history().is_empty());
        assert!(store.append_message(Role::User, "y", None).is_none());
    }

    #[test]
    fn test_rename_session_updates_name_and_timestamp() {
        let (mut store, _) = new_store();
        let session = store.create_session();

        assert!(store.rename_session(&session.id, "Trip planning"));
        let renamed = store
            .sessions()
            .into_iter()
            .find(|s| s.id == session.id)
            .unwrap();
        assert_eq!(renamed.name, "Trip planning");
        assert!(renamed.timestamp >= session.timestamp);
        assert!(!store.rename_session("missing", "x"));
    }

    #[test]
    fn test_switch_round_trip_keeps_history() {
        let (mut store, _) = new_store();
        let original = store.create_session();
        store.append_message(Role::User, "hi", None);
        let other = store.create_session();

        assert!(store.switch_session(&other.id));
        assert!(store.chat_history().is_empty());
        assert!(store.switch_session(&original.id));

        let history = store.chat_history();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].content, "hi");
    }

    #[test]
    fn test_switch_to_active_session_is_idempotent() {
        let (mut store, _) = new_store();
        let session = store.create_session();
        store.append_message(Role::User, "hi", None);

        assert!(store.switch_session(&session.id));
        assert!(store.switch_session(&session.id));
        assert_eq!(store.chat_history().len(), 1);
    }

    #[test]
    fn test_switch_to_unknown_session_fails() {
        let (mut store, _) = new_store();
        let session = store.create_session();
        assert!(!store.switch_session("chat_missing"));
        assert_eq!(store.current_session_id(), Some(session.id.as_str()));
    }

    #[test]
    fn test_switch_target_is_spared_when_outgoing_save_evicts() {
        let notifier = CollectingNotifier::new();
        let mut store = ChatStore::open(
            MemoryStorage::new(),
            CapacityLimits {
                capacity_bytes: 3_000,
                ..CapacityLimits::default()
            },
            Arc::new(notifier.clone()),
        );

        // The target is the oldest session, so it is first in line for eviction
        let target = store.create_session();
        store.append_message(Role::User, "t".repeat(700), None);
        store.create_session();
        store.append_message(Role::User, "c".repeat(700), None);
        store.append_message(Role::Assistant, "d".repeat(500), None);
        assert!(store.storage().footprint().unwrap() as f64 > 2_400.0);

        assert!(store.switch_session(&target.id));
        assert_eq!(store.current_session_id(), Some(target.id.as_str()));
        assert!(store.sessions().iter().any(|s| s.id == target.id));
        assert_eq!(store.chat_history().len(), 1);
        assert_eq!(store.chat_history()[0].content, "t".repeat(700));

        // Every stored history blob is still named by the index
        store.append_message(Role::User, "more", None);
        let indexed: Vec<String> = store.sessions().into_iter().map(|s| history_key(&s.id)).collect();
        for key in store.storage().keys().unwrap() {
            if key != SESSIONS_KEY && key != crate::chat::PREFERENCES_KEY {
                assert!(indexed.contains(&key), "orphaned blob {}", key);
            }
        }
    }

    #[test]
    fn test_unreadable_blobs_warn_the_user() {
        let mut storage = MemoryStorage::new();
        storage.set(SESSIONS_KEY, "{broken").unwrap();
        let notifier = CollectingNotifier::new();
        let mut store = ChatStore::open(storage, CapacityLimits::default(), Arc::new(notifier.clone()));

        assert!(store.sessions().is_empty());
        let warnings: Vec<_> = notifier
            .drain()
            .into_iter()
            .filter(|n| n.level == NotificationLevel::Warning)
            .collect();
        assert_eq!(warnings.len(), 1);

        let session = store.create_session();
        store.create_session();
        store
            .storage
            .set(&history_key(&session.id), "not json")
            .unwrap();
        assert!(store.switch_session(&session.id));
        assert!(store.chat_history().is_empty());
        assert!(notifier
            .notifications()
            .iter()
            .any(|n| n.level == NotificationLevel::Warning && n.message.contains("history")));
    }

    #[test]
    fn test_sessions_by_recency() {
        let (mut store, _) = new_store();
        let first = store.create_session();
        let second = store.create_session();
        store.rename_session(&first.id, "touched");

        let ordered: Vec<String> = store
            .sessions_by_recency()
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(ordered, vec![first.id, second.id]);
    }

    #[test]
    fn test_history_entry_ceiling_enforced_on_persist() {
        let notifier = CollectingNotifier::new();
        let mut store = ChatStore::open(
            MemoryStorage::new(),
            CapacityLimits {
                max_history_entries: 3,
                ..CapacityLimits::default()
            },
            Arc::new(notifier.clone()),
        );
        store.create_session();
        for i in 0..5 {
            store.append_message(Role::User, format!("m{}", i), None);
        }

        let contents: Vec<String> = store.chat_history().into_iter().map(|m| m.content).collect();
        assert_eq!(contents, vec!["m2", "m3", "m4"]);
        assert!(notifier
            .notifications()
            .iter()
            .any(|n| n.level == NotificationLevel::Info && n.message.contains("old messages")));
    }

    #[test]
    fn test_quota_error_triggers_eviction_and_retry() {
        let notifier = CollectingNotifier::new();
        let mut store = ChatStore::open(
            MemoryStorage::with_quota(2_000),
            CapacityLimits::default(),
            Arc::new(notifier.clone()),
        );
        let old = store.create_session();
        store.append_message(Role::User, "x".repeat(900), None);
        store.create_session();

        // This write only fits once the old session is gone
        let saved = store.append_message(Role::User, "y".repeat(900), None);
        assert!(saved.is_some());

        assert!(!store.sessions().iter().any(|s| s.id == old.id));
        assert!(!store.storage().contains(&history_key(&old.id)).unwrap());
        let persisted = store
            .storage()
            .get(&history_key(store.current_session_id().unwrap()))
            .unwrap()
            .unwrap();
        assert!(persisted.contains(&"y".repeat(900)));
        assert!(!notifier
            .notifications()
            .iter()
            .any(|n| n.level == NotificationLevel::Error));
    }

    #[test]
    fn test_second_quota_failure_notifies_error() {
        let notifier = CollectingNotifier::new();
        let mut store = ChatStore::open(
            MemoryStorage::with_quota(500),
            CapacityLimits::default(),
            Arc::new(notifier.clone()),
        );
        store.create_session();

        // Nothing else to evict: the single active session cannot fit this
        store.append_message(Role::User, "z".repeat(1_000), None);

        // The message stays in memory even though it could not be saved
        assert_eq!(store.chat_history().len(), 1);
        assert!(notifier
            .notifications()
            .iter()
            .any(|n| n.level == NotificationLevel::Error && n.message.contains("storage space")));
    }

    #[test]
    fn test_preferences_round_trip() {
        let (mut store, _) = new_store();
        let prefs = store.update_preferences(|p| {
            p.provider = "anthropic".to_string();
            p.temperature = 0.2;
        });
        assert_eq!(prefs.provider, "anthropic");
        assert_eq!(store.preferences(), prefs);
    }
}
