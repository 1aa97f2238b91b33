mod helpers;

use serde_json::Value;

use daybook::backup::{self, BackupError};
use daybook::models::{Frequency, Habit, Todo};
use daybook::preferences::{Preference, Preferences};
use daybook::Collection;
use helpers::{day, local_planner, memory_store};

#[tokio::test]
async fn export_then_import_restores_every_key_verbatim() {
    let source = memory_store();
    let (mut planner, _) = local_planner(&source, day(2024, 8, 1)).await;
    planner.add_todo(Todo::new("pack")).await.unwrap();
    let habit = planner
        .add_habit(Habit::new("swim", Frequency::Daily))
        .await
        .unwrap();
    planner.toggle_habit(&habit.id, None).await.unwrap();
    let prefs = Preferences::new(source.clone());
    prefs.set(Preference::Theme, "ocean");
    prefs.set_flag(Preference::IsDark, true);
    prefs.set_reflection(day(2024, 8, 1), "steady");

    let exported = backup::export(&source).unwrap();
    assert!(exported[backup::EXPORT_DATE_FIELD].is_string());
    assert_eq!(exported[backup::APP_VERSION_FIELD], env!("CARGO_PKG_VERSION"));
    let raw = backup::export_string(&source).unwrap();

    let target = memory_store();
    let restored = backup::import(&target, &raw).unwrap();
    assert_eq!(restored, exported.as_object().unwrap().len() - 2);

    for key in ["todos", "habits", "history", "theme", "isDark", "reflection-2024-08-01"] {
        assert_eq!(
            target.load_raw(key),
            source.load_raw(key),
            "{key} should round-trip"
        );
        assert!(target.load_raw(key).is_some());
    }
}

#[test]
fn import_ignores_unknown_fields() {
    let store = memory_store();
    let raw = r#"{"todos":"[]","somethingElse":"x","exportDate":"2024-01-01T00:00:00Z"}"#;
    assert_eq!(backup::import(&store, raw).unwrap(), 1);
    assert_eq!(store.load_raw("todos").as_deref(), Some("[]"));
    assert!(store.load_raw("somethingElse").is_none());
}

#[test]
fn invalid_backup_writes_nothing() {
    let store = memory_store();
    store.save_raw(Collection::Todos.key(), "[]");

    let raw = r#"{"notes":"[]","todos":[1,2,3]}"#;
    assert!(matches!(
        backup::import(&store, raw),
        Err(BackupError::InvalidField(key)) if key == "todos"
    ));
    assert!(store.load_raw("notes").is_none());
    assert_eq!(store.load_raw("todos").as_deref(), Some("[]"));

    assert!(matches!(backup::import(&store, "[]"), Err(BackupError::NotAnObject)));
    assert!(matches!(backup::import(&store, "{oops"), Err(BackupError::Parse(_))));
}

#[test]
fn export_of_empty_store_has_only_metadata() {
    let store = memory_store();
    let exported = backup::export(&store).unwrap();
    let fields: Vec<&String> = exported.as_object().unwrap().keys().collect();
    assert_eq!(fields.len(), 2);
    assert!(matches!(exported["exportDate"], Value::String(_)));
}
