//! Integration tests for chat persistence over SQLite
//!
//! Exercises the store the way the CLI does: every command opens the
//! database, mutates, and drops it again.

mod common;

use chatbridge::chat::{
    history_key, CapacityLimits, ChatStore, CollectingNotifier, NotificationLevel,
    PREFERENCES_KEY, SESSIONS_KEY,
};
use chatbridge::storage::{ChatSession, KeyValueStore, Role, SqliteStorage};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

fn open(path: &Path) -> (ChatStore<SqliteStorage>, Arc<CollectingNotifier>) {
    let notifier = Arc::new(CollectingNotifier::new());
    let storage = SqliteStorage::new_with_path(path).expect("failed to open storage");
    let store = ChatStore::open(storage, CapacityLimits::default(), notifier.clone());
    (store, notifier)
}

#[test]
fn test_sessions_and_history_survive_reopen() {
    let tmp = TempDir::new().unwrap();
    let db = tmp.path().join("chat.db");

    let (first_id, message_id) = {
        let (mut store, _) = open(&db);
        let id = store.bootstrap().unwrap();
        let message = store.append_message(Role::User, "hi", None).unwrap();
        store.append_message(Role::Assistant, "hello!", None);
        (id, message.id)
    };

    let (mut store, _) = open(&db);
    assert_eq!(store.sessions().len(), 1);
    assert_eq!(store.bootstrap().as_deref(), Some(first_id.as_str()));

    let history = store.chat_history();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].id, message_id);
    assert_eq!(history[0].content, "hi");
    assert_eq!(history[1].role, Role::Assistant);
}

#[test]
fn test_switch_round_trip_preserves_history() {
    let (storage, _tmp) = common::create_temp_storage();
    let mut store = ChatStore::open(
        storage,
        CapacityLimits::default(),
        Arc::new(CollectingNotifier::new()),
    );

    let original = store.create_session();
    store.append_message(Role::User, "hi", None);

    let other = store.create_session();
    assert!(store.chat_history().is_empty());
    assert!(store.switch_session(&other.id));

    assert!(store.switch_session(&original.id));
    let history = store.chat_history();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].content, "hi");
}

#[test]
fn test_new_sessions_are_numbered_and_prepended() {
    let (storage, _tmp) = common::create_temp_storage();
    let mut store = ChatStore::open(
        storage,
        CapacityLimits::default(),
        Arc::new(CollectingNotifier::new()),
    );

    store.create_session();
    store.create_session();
    let third = store.create_session();

    let sessions = store.sessions();
    assert_eq!(sessions[0], third);
    assert_eq!(sessions[0].name, "New Chat 3");
    assert_eq!(sessions[2].name, "New Chat 1");
}

#[test]
fn test_delete_session_removes_history_blob() {
    let (storage, _tmp) = common::create_temp_storage();
    let mut store = ChatStore::open(
        storage,
        CapacityLimits::default(),
        Arc::new(CollectingNotifier::new()),
    );

    let doomed = store.create_session();
    store.append_message(Role::User, "forget me", None);
    let kept = store.create_session();

    assert!(store.storage().contains(&history_key(&doomed.id)).unwrap());
    assert!(store.delete_session(&doomed.id));

    assert!(store.sessions().iter().all(|s| s.id != doomed.id));
    assert!(!store.storage().contains(&history_key(&doomed.id)).unwrap());
    assert_eq!(store.current_session_id(), Some(kept.id.as_str()));

    let index: Vec<ChatSession> =
        serde_json::from_str(&store.storage().get(SESSIONS_KEY).unwrap().unwrap()).unwrap();
    assert_eq!(index.len(), 1);
}

#[test]
fn test_edit_truncates_later_messages_on_disk() {
    let tmp = TempDir::new().unwrap();
    let db = tmp.path().join("chat.db");

    {
        let (mut store, _) = open(&db);
        store.bootstrap();
        store.append_message(Role::User, "one", None);
        let second = store.append_message(Role::Assistant, "two", None).unwrap();
        store.append_message(Role::User, "three", None);
        store.append_message(Role::Assistant, "four", None);

        assert!(store.update_message(&second.id, "TWO"));
    }

    let (mut store, _) = open(&db);
    store.bootstrap();
    let history = store.chat_history();
    assert_eq!(history.len(), 2);
    assert_eq!(history[1].content, "TWO");
}

#[test]
fn test_eviction_over_sqlite_spares_active_session() {
    let tmp = TempDir::new().unwrap();
    let db = tmp.path().join("chat.db");
    let notifier = Arc::new(CollectingNotifier::new());
    let limits = CapacityLimits {
        capacity_bytes: 4_000,
        ..CapacityLimits::default()
    };
    let storage = SqliteStorage::new_with_path(&db).unwrap();
    let mut store = ChatStore::open(storage, limits, notifier.clone());

    for _ in 0..6 {
        store.create_session();
        store.append_message(Role::User, "x".repeat(400), None);
    }
    let active = store.current_session_id().unwrap().to_string();

    // One more write triggers the capacity pass
    store.append_message(Role::Assistant, "ok", None);

    assert!(store.sessions().iter().any(|s| s.id == active));
    assert!(store.sessions().len() < 6);

    let notes = notifier.notifications();
    assert!(notes
        .iter()
        .any(|n| n.level == NotificationLevel::Info && n.message.contains("old chats")));
}

#[test]
fn test_preferences_persist_without_credentials() {
    let tmp = TempDir::new().unwrap();
    let db = tmp.path().join("chat.db");

    {
        let (mut store, _) = open(&db);
        store.update_preferences(|prefs| {
            prefs.provider = "anthropic".to_string();
            prefs.model = "claude-3-5-haiku-20241022".to_string();
            prefs.temperature = 0.0;
        });
    }

    let (store, _) = open(&db);
    let prefs = store.preferences();
    assert_eq!(prefs.provider, "anthropic");
    assert_eq!(prefs.temperature, 0.0);

    let raw = store.storage().get(PREFERENCES_KEY).unwrap().unwrap();
    assert!(!raw.contains("api_key"));
}

#[test]
fn test_quota_exhaustion_notifies_user() {
    let tmp = TempDir::new().unwrap();
    let db = tmp.path().join("chat.db");
    let notifier = Arc::new(CollectingNotifier::new());
    let storage = SqliteStorage::new_with_path(&db).unwrap().with_quota(300);
    let mut store = ChatStore::open(storage, CapacityLimits::default(), notifier.clone());

    store.bootstrap();
    store.append_message(Role::User, "y".repeat(1_000), None);

    let notes = notifier.notifications();
    assert!(notes
        .iter()
        .any(|n| n.level == NotificationLevel::Error && n.message.contains("Not enough storage")));
    // In-memory state is still usable
    assert_eq!(store.chat_history().len(), 1);
}
