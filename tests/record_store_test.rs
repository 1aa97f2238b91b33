mod helpers;

use serde_json::json;
use std::sync::Arc;

use daybook::models::Todo;
use daybook::{Collection, Database, RecordStore};
use helpers::memory_store;

#[test]
fn saved_collection_loads_back_in_order() {
    let store = memory_store();
    let todos = vec![Todo::new("first"), Todo::new("second")];
    store.save(Collection::Todos, &todos);

    let loaded: Vec<Todo> = store.load(Collection::Todos);
    assert_eq!(loaded, todos);

    let raw = store.load_raw("todos").unwrap();
    assert!(raw.contains("\"title\":\"first\""));
}

#[test]
fn missing_or_malformed_collections_load_empty() {
    let store = memory_store();
    assert!(store.load::<Todo>(Collection::Todos).is_empty());

    store.save_raw(Collection::Todos.key(), "{not json");
    assert!(store.load::<Todo>(Collection::Todos).is_empty());

    store.save_raw(Collection::Todos.key(), r#"{"title":"an object, not a list"}"#);
    assert!(store.load::<Todo>(Collection::Todos).is_empty());
}

#[test]
fn collections_use_their_storage_keys() {
    let keys: Vec<&str> = Collection::ALL.iter().map(|c| c.key()).collect();
    assert!(keys.contains(&"calendarEvents"));
    assert!(keys.contains(&"motivationalQuotes"));
    assert!(keys.contains(&"journalTags"));
    assert_eq!(Collection::from_key("moodEntries"), Some(Collection::MoodEntries));
    assert_eq!(Collection::Journal.remote_table(), "journal_entries");
}

#[test]
fn write_over_quota_is_dropped_and_previous_value_survives() {
    let db = Database::open_in_memory().unwrap().with_quota(Some(64));
    let store = RecordStore::new(Arc::new(db));

    store.save(Collection::Notes, &[json!({"id": "1", "title": "small"})]);
    let before = store.load_raw("notes").unwrap();

    let big: Vec<_> = (0..20).map(|i| json!({"id": i.to_string(), "title": "x".repeat(10)})).collect();
    store.save(Collection::Notes, &big);

    assert_eq!(store.load_raw("notes").unwrap(), before);
}

#[test]
fn database_file_persists_between_opens() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("daybook.db");
    let path = path.to_str().unwrap();

    {
        let store = RecordStore::new(Arc::new(Database::new(path).unwrap()));
        store.save(Collection::Todos, &[Todo::new("durable")]);
    }

    let store = RecordStore::new(Arc::new(Database::new(path).unwrap()));
    let loaded: Vec<Todo> = store.load(Collection::Todos);
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].title, "durable");
}
