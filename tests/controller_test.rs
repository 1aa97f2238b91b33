mod helpers;

use std::collections::HashSet;

use daybook::controller::ControllerError;
use daybook::models::{
    CalendarEvent, Frequency, Goal, Habit, JournalEntry, Memory, MoodEntry, Note, Quote, Todo,
};
use daybook::Collection;
use helpers::{day, local_planner, memory_store};

#[tokio::test]
async fn created_records_get_unique_ids_and_one_ledger_entry_each() {
    let store = memory_store();
    let (mut planner, _) = local_planner(&store, day(2024, 5, 1)).await;

    let mut ids = HashSet::new();
    for i in 0..5 {
        let todo = planner.add_todo(Todo::new(format!("task {i}"))).await.unwrap();
        assert!(!todo.id.is_empty());
        assert!(!todo.created_at.is_empty());
        ids.insert(todo.id);
    }
    assert_eq!(ids.len(), 5);

    let history = planner.ledger().entries();
    assert_eq!(history.len(), 5);
    assert!(history.iter().all(|e| e.entity_type == "todo" && e.action == "created"));
    assert_eq!(history[0].name, "task 4");

    let stored: Vec<Todo> = store.load(Collection::Todos);
    assert_eq!(stored.len(), 5);
    assert_eq!(stored[0].title, "task 0");
}

#[tokio::test]
async fn duplicate_id_on_create_is_replaced() {
    let store = memory_store();
    let (mut planner, _) = local_planner(&store, day(2024, 5, 1)).await;

    let first = planner.add_todo(Todo::new("a")).await.unwrap();
    let mut clash = Todo::new("b");
    clash.id = first.id.clone();
    let second = planner.add_todo(clash).await.unwrap();
    assert_ne!(first.id, second.id);
}

#[tokio::test]
async fn toggling_a_todo_twice_restores_it_and_logs_both() {
    let store = memory_store();
    let (mut planner, _) = local_planner(&store, day(2024, 5, 1)).await;
    let todo = planner.add_todo(Todo::new("water plants")).await.unwrap();

    let done = planner.toggle_todo(&todo.id).await.unwrap();
    assert!(done.completed);
    assert!(done.completed_at.is_some());

    let undone = planner.toggle_todo(&todo.id).await.unwrap();
    assert!(!undone.completed);
    assert!(undone.completed_at.is_none());

    let actions: Vec<String> = planner
        .ledger()
        .query_recent(Some("todo"), None)
        .into_iter()
        .map(|e| e.action)
        .collect();
    assert_eq!(actions, vec!["uncompleted", "completed", "created"]);
}

#[tokio::test]
async fn toggling_a_habit_today_twice_resets_the_streak() {
    let store = memory_store();
    let today = day(2024, 5, 1);
    let (mut planner, _) = local_planner(&store, today).await;
    let habit = planner
        .add_habit(Habit::new("Meditate", Frequency::Daily))
        .await
        .unwrap();

    let once = planner.toggle_habit(&habit.id, None).await.unwrap();
    assert_eq!(once.streak, 1);
    assert_eq!(once.completed_dates.len(), 1);
    assert!(once.is_completed_on(today));

    let twice = planner.toggle_habit(&habit.id, None).await.unwrap();
    assert!(twice.completed_dates.is_empty());
    assert_eq!(twice.streak, 0);

    let toggles: Vec<(String, Option<String>)> = planner
        .ledger()
        .query_recent(Some("habit"), Some(2))
        .into_iter()
        .map(|e| (e.action, e.details))
        .collect();
    assert_eq!(
        toggles,
        vec![
            ("uncompleted".to_string(), Some("2024-05-01".to_string())),
            ("completed".to_string(), Some("2024-05-01".to_string())),
        ]
    );
}

#[tokio::test]
async fn completing_a_past_day_leaves_the_streak_alone() {
    let store = memory_store();
    let (mut planner, _) = local_planner(&store, day(2024, 5, 10)).await;
    let habit = planner
        .add_habit(Habit::new("Run", Frequency::Daily))
        .await
        .unwrap();

    let habit = planner
        .toggle_habit(&habit.id, Some(day(2024, 5, 8)))
        .await
        .unwrap();
    assert!(habit.is_completed_on(day(2024, 5, 8)));
    assert_eq!(habit.streak, 0);
}

#[tokio::test]
async fn update_keeps_creation_time_and_writes_one_entry() {
    let store = memory_store();
    let (mut planner, _) = local_planner(&store, day(2024, 5, 1)).await;
    let original = planner.notes().create(Note::new("draft", "body")).await.unwrap();

    let mut edited = original.clone();
    edited.title = "final".into();
    edited.content = "new body".into();
    edited.tags = vec!["work".into()];
    edited.created_at = "1999-01-01T00:00:00.000Z".into();
    let saved = planner.notes().update(edited).await.unwrap();

    assert_eq!(saved.created_at, original.created_at);
    assert!(saved.updated_at.is_some());

    let entries = planner.ledger().query_recent(Some("note"), None);
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].action, "updated");
    let details = entries[0].details.clone().unwrap();
    for field in ["title", "content", "tags"] {
        assert!(details.contains(field), "{details} should mention {field}");
    }
    assert!(!details.contains("updatedAt"));
}

#[tokio::test]
async fn unchanged_update_is_not_recorded() {
    let store = memory_store();
    let (mut planner, _) = local_planner(&store, day(2024, 5, 1)).await;
    let todo = planner.add_todo(Todo::new("same")).await.unwrap();

    planner.update_todo(todo.clone()).await.unwrap();
    assert_eq!(planner.ledger().entries().len(), 1);
}

#[tokio::test]
async fn deleting_removes_from_storage() {
    let store = memory_store();
    let (mut planner, _) = local_planner(&store, day(2024, 5, 1)).await;
    let keep = planner.add_todo(Todo::new("keep")).await.unwrap();
    let drop = planner.add_todo(Todo::new("drop")).await.unwrap();

    planner.delete_todo(&drop.id).await.unwrap();
    let stored: Vec<Todo> = store.load(Collection::Todos);
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].id, keep.id);
    assert_eq!(planner.ledger().entries()[0].action, "deleted");
}

#[tokio::test]
async fn unknown_id_is_an_error_without_history() {
    let store = memory_store();
    let (mut planner, _) = local_planner(&store, day(2024, 5, 1)).await;

    let err = planner.toggle_todo("missing").await.unwrap_err();
    assert!(matches!(err, ControllerError::NotFound { .. }));
    assert!(planner.ledger().entries().is_empty());
}

#[tokio::test]
async fn goal_progress_is_not_clamped_and_does_not_complete() {
    let store = memory_store();
    let (mut planner, notifier) = local_planner(&store, day(2024, 5, 1)).await;
    let goal = planner.add_goal(Goal::new("Read books", 10.0)).await.unwrap();

    let goal = planner.set_goal_progress(&goal.id, 12.0).await.unwrap();
    assert_eq!(goal.progress, 12.0);
    assert!(goal.ratio() > 1.0);
    assert!(!goal.completed);
    assert!(notifier.kinds().is_empty());

    let goal = planner.complete_goal(&goal.id).await.unwrap();
    assert!(goal.completed);
    assert!(matches!(
        planner.complete_goal(&goal.id).await,
        Err(ControllerError::InvalidState(_))
    ));

    let goal = planner.archive_goal(&goal.id).await.unwrap();
    assert!(goal.archived);

    let actions: Vec<String> = planner
        .ledger()
        .query_recent(Some("goal"), None)
        .into_iter()
        .map(|e| e.action)
        .collect();
    assert_eq!(actions, vec!["archived", "completed", "updated", "created"]);
}

#[tokio::test]
async fn pinning_flips_and_logs() {
    let store = memory_store();
    let (mut planner, _) = local_planner(&store, day(2024, 5, 1)).await;
    let note = planner.notes().create(Note::new("n", "")).await.unwrap();

    assert!(planner.notes().toggle_pin(&note.id).await.unwrap().pinned);
    assert!(!planner.notes().toggle_pin(&note.id).await.unwrap().pinned);

    let entries = planner.ledger().query_recent(Some("note"), Some(2));
    assert_eq!(entries[0].action, "unpinned");
    assert_eq!(entries[1].action, "pinned");
}

#[tokio::test]
async fn journal_tags_are_remembered_once() {
    let store = memory_store();
    let today = day(2024, 5, 1);
    let (mut planner, _) = local_planner(&store, today).await;

    let mut entry = daybook::JournalEntry::new(today, "first");
    entry.tags = vec!["calm".into(), "work".into()];
    planner.add_journal(entry).await.unwrap();

    let mut entry = daybook::JournalEntry::new(today, "second");
    entry.tags = vec!["work".into(), "family".into()];
    planner.add_journal(entry).await.unwrap();

    assert_eq!(planner.journal_tags(), vec!["calm", "work", "family"]);
}

#[tokio::test]
async fn malformed_records_are_skipped_on_open() {
    let store = memory_store();
    store.save_raw(
        Collection::Todos.key(),
        r#"[{"id":"1","title":"ok"},{"id":"2","title":42},{"id":"3","title":"also ok"}]"#,
    );
    let (planner, _) = local_planner(&store, day(2024, 5, 1)).await;
    let titles: Vec<&str> = planner.todos().iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["ok", "also ok"]);
}

#[tokio::test]
async fn stored_duplicate_days_need_only_one_untoggle() {
    let store = memory_store();
    store.save_raw(
        Collection::Habits.key(),
        r#"[{"id":"h1","name":"Walk","frequency":"daily","completedDates":["2024-04-30","2024-04-30"],"streak":1}]"#,
    );
    let today = day(2024, 4, 30);
    let (mut planner, _) = local_planner(&store, today).await;
    assert_eq!(planner.habits()[0].completed_dates.len(), 1);

    let habit = planner.toggle_habit("h1", None).await.unwrap();
    assert!(!habit.is_completed_on(today));
    assert!(habit.completed_dates.is_empty());

    let stored: Vec<Habit> = store.load(Collection::Habits);
    assert!(stored[0].completed_dates.is_empty());
}

#[tokio::test]
async fn full_update_cannot_repeat_a_day() {
    let store = memory_store();
    let today = day(2024, 4, 30);
    let (mut planner, _) = local_planner(&store, today).await;
    let mut habit = planner.add_habit(Habit::new("Walk", Frequency::Daily)).await.unwrap();

    assert!(habit.completed_dates.insert("2024-04-30".into()));
    assert!(!habit.completed_dates.insert("2024-04-30".into()));
    planner.update_habit(habit.clone()).await.unwrap();

    let raw = store.load_raw(Collection::Habits.key()).unwrap();
    assert_eq!(raw.matches("2024-04-30").count(), 1);

    let habit = planner.toggle_habit(&habit.id, None).await.unwrap();
    assert!(!habit.is_completed_on(today));
}

#[tokio::test]
async fn repeating_the_same_progress_is_not_recorded() {
    let store = memory_store();
    let (mut planner, _) = local_planner(&store, day(2024, 5, 1)).await;
    let goal = planner.add_goal(Goal::new("Run 100km", 100.0)).await.unwrap();

    planner.set_goal_progress(&goal.id, 40.0).await.unwrap();
    planner.set_goal_progress(&goal.id, 40.0).await.unwrap();

    let actions: Vec<String> = planner
        .ledger()
        .query_recent(Some("goal"), None)
        .into_iter()
        .map(|e| e.action)
        .collect();
    assert_eq!(actions, vec!["updated", "created"]);
}

#[tokio::test]
async fn every_collection_logs_its_mutations() {
    let store = memory_store();
    let today = day(2024, 5, 1);
    let (mut planner, _) = local_planner(&store, today).await;

    let entry = planner.add_journal(JournalEntry::new(today, "first")).await.unwrap();
    let mut edited = entry.clone();
    edited.content = "second".into();
    planner.update_journal(edited).await.unwrap();
    planner.delete_journal(&entry.id).await.unwrap();

    let memory = planner.memories().create(Memory::new("Beach", today)).await.unwrap();
    let mut edited = memory.clone();
    edited.description = "sunny".into();
    planner.memories().update(edited).await.unwrap();
    planner.memories().toggle_pin(&memory.id).await.unwrap();
    planner.memories().delete(&memory.id).await.unwrap();

    let event = planner.events().create(CalendarEvent::new("Dentist", today)).await.unwrap();
    planner.events().delete(&event.id).await.unwrap();

    let quote = planner
        .quotes()
        .create(Quote {
            id: String::new(),
            text: "Begin".into(),
            author: None,
            created_at: String::new(),
        })
        .await
        .unwrap();
    planner.quotes().delete(&quote.id).await.unwrap();

    let mood = planner
        .moods()
        .create(MoodEntry {
            id: String::new(),
            date: "2024-05-01".into(),
            mood: "calm".into(),
            note: None,
            created_at: String::new(),
        })
        .await
        .unwrap();
    planner.moods().delete(&mood.id).await.unwrap();

    let logged = |entity: &str| -> Vec<String> {
        planner
            .ledger()
            .query_recent(Some(entity), None)
            .into_iter()
            .rev()
            .map(|e| e.action)
            .collect()
    };
    assert_eq!(logged("journal"), vec!["created", "updated", "deleted"]);
    assert_eq!(logged("memory"), vec!["created", "updated", "pinned", "deleted"]);
    assert_eq!(logged("event"), vec!["created", "deleted"]);
    assert_eq!(logged("quote"), vec!["created", "deleted"]);
    assert_eq!(logged("mood"), vec!["created", "deleted"]);
    assert_eq!(planner.ledger().entries().len(), 13);
}
