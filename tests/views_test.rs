mod helpers;

use chrono::NaiveDateTime;

use daybook::models::{CalendarEvent, Frequency, Goal, Habit, JournalEntry, MoodEntry, Note, Todo};
use daybook::views::{self, DateWindow, DayCount};
use helpers::day;

fn at(value: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M").unwrap()
}

fn tagged(tags: &[&str]) -> Note {
    let mut note = Note::new("n", "");
    note.tags = tags.iter().map(|t| t.to_string()).collect();
    note
}

#[test]
fn events_are_bucketed_per_day_with_empty_days_kept() {
    let events = vec![
        CalendarEvent::new("new year", day(2024, 1, 1)),
        CalendarEvent::new("dentist", day(2024, 1, 3)),
        CalendarEvent::new("dinner", day(2024, 1, 3)),
        CalendarEvent::new("outside", day(2024, 1, 9)),
    ];
    let buckets = views::entries_over_time(&events, DateWindow::starting(day(2024, 1, 1), 7));

    assert_eq!(buckets.len(), 7);
    assert_eq!(buckets[0], DayCount { date: day(2024, 1, 1), count: 1 });
    assert_eq!(buckets[1], DayCount { date: day(2024, 1, 2), count: 0 });
    assert_eq!(buckets[2], DayCount { date: day(2024, 1, 3), count: 2 });
    assert_eq!(buckets.iter().map(|b| b.count).sum::<usize>(), 3);
}

#[test]
fn a_zero_day_window_has_no_buckets() {
    let events = vec![CalendarEvent::new("new year", day(2024, 1, 1))];
    let window = DateWindow::starting(day(2024, 1, 1), 0);

    assert!(window.is_empty());
    assert!(!window.contains(day(2024, 1, 1)));
    assert!(views::entries_over_time(&events, window).is_empty());
    assert!(DateWindow::last_days(day(2024, 1, 1), 0).days().is_empty());
}

#[test]
fn malformed_dates_are_skipped() {
    let mut broken = JournalEntry::new(day(2024, 1, 1), "x");
    broken.date = "not a date".into();
    let ok = JournalEntry::new(day(2024, 1, 2), "y");
    let buckets = views::entries_over_time(&[broken, ok], DateWindow::starting(day(2024, 1, 1), 2));
    assert_eq!(buckets.iter().map(|b| b.count).collect::<Vec<_>>(), vec![0, 1]);
}

#[test]
fn top_tags_break_ties_by_first_appearance() {
    let mut notes = Vec::new();
    for _ in 0..5 {
        notes.push(tagged(&["a", "b"]));
    }
    notes.push(tagged(&["c"]));
    let top = views::top_tags(&notes);
    assert_eq!(
        top,
        vec![("a".to_string(), 5), ("b".to_string(), 5), ("c".to_string(), 1)]
    );

    let many = vec![tagged(&["t1", "t2", "t3", "t4", "t5", "t6", "t7"])];
    assert_eq!(views::top_tags(&many).len(), 5);
}

#[test]
fn filter_by_tag_matches_exactly() {
    let notes = vec![tagged(&["work"]), tagged(&["workout"]), tagged(&["home", "work"])];
    assert_eq!(views::filter_by_tag(&notes, "work").len(), 2);
}

#[test]
fn mood_distribution_merges_journal_and_mood_entries() {
    let mut entry = JournalEntry::new(day(2024, 1, 1), "x");
    entry.mood = Some("happy".into());
    let moods = vec![
        MoodEntry {
            id: "m1".into(),
            date: "2024-01-02".into(),
            mood: "tired".into(),
            note: None,
            created_at: String::new(),
        },
        MoodEntry {
            id: "m2".into(),
            date: "2024-01-03".into(),
            mood: "happy".into(),
            note: None,
            created_at: String::new(),
        },
    ];
    let dist = views::mood_distribution(&[entry], &moods);
    assert_eq!(dist, vec![("happy".to_string(), 2), ("tired".to_string(), 1)]);
}

#[test]
fn category_distribution_ignores_uncategorised() {
    let mut a = Todo::new("a");
    a.category = Some("home".into());
    let mut b = Todo::new("b");
    b.category = Some("home".into());
    let c = Todo::new("c");
    assert_eq!(views::category_distribution(&[a, b, c]), vec![("home".to_string(), 2)]);
}

#[test]
fn leaderboard_keeps_top_three_streaks() {
    let habits: Vec<Habit> = [4, 9, 1, 9, 6]
        .iter()
        .enumerate()
        .map(|(i, streak)| {
            let mut h = Habit::new(format!("h{i}"), Frequency::Daily);
            h.streak = *streak;
            h
        })
        .collect();
    let names: Vec<&str> = views::streak_leaderboard(&habits)
        .into_iter()
        .map(|h| h.name.as_str())
        .collect();
    assert_eq!(names, vec!["h1", "h3", "h4"]);
}

#[test]
fn completion_rate_counts_only_scheduled_habits() {
    let today = day(2024, 3, 4);
    assert_eq!(views::completion_rate(&[], today), 0.0);

    let mut done = Habit::new("done", Frequency::Daily);
    done.toggle_date(today, today);
    let pending = Habit::new("pending", Frequency::Daily);
    // created on a Tuesday, so not scheduled on Monday the 4th
    let mut weekly = Habit::new("weekly", Frequency::Weekly);
    weekly.created_at = "2024-02-27T10:00:00".into();

    assert_eq!(views::completion_rate(&[done, pending, weekly], today), 0.5);
}

#[test]
fn upcoming_deadlines_are_sorted_and_capped() {
    let now = at("2024-05-10T12:00");
    let mut todos: Vec<Todo> = (1..=7)
        .rev()
        .map(|d| {
            let mut t = Todo::new(format!("due {d}"));
            t.due_date = Some(format!("2024-05-{:02}T09:00", 10 + d));
            t
        })
        .collect();
    let mut past = Todo::new("past");
    past.due_date = Some("2024-05-01".into());
    todos.push(past);
    let mut finished = Todo::new("finished");
    finished.due_date = Some("2024-05-11T08:00".into());
    finished.completed = true;
    todos.push(finished);

    let titles: Vec<&str> = views::upcoming_deadlines(&todos, now)
        .into_iter()
        .map(|t| t.title.as_str())
        .collect();
    assert_eq!(titles, vec!["due 1", "due 2", "due 3", "due 4", "due 5"]);
}

#[test]
fn overdue_means_before_today_and_incomplete() {
    let now = at("2024-05-10T12:00");
    let mut goal = Goal::new("g", 1.0);

    goal.deadline = Some("2024-05-10T08:00".into());
    assert!(!views::is_overdue(&goal, now));

    goal.deadline = Some("2024-05-09".into());
    assert!(views::is_overdue(&goal, now));

    goal.completed = true;
    assert!(!views::is_overdue(&goal, now));

    let no_deadline = Todo::new("whenever");
    assert!(!views::is_overdue(&no_deadline, now));
}

#[test]
fn monthly_habits_count_on_their_day_of_month() {
    let mut monthly = Habit::new("rent", Frequency::Monthly);
    monthly.created_at = "2024-02-04T10:00:00".into();
    let daily = Habit::new("walk", Frequency::Daily);

    let due = day(2024, 3, 4);
    monthly.toggle_date(due, due);
    let habits = [monthly, daily];
    assert_eq!(views::completion_rate(&habits, due), 0.5);

    // the 5th is not the monthly habit's day, leaving only the daily one
    assert_eq!(views::completion_rate(&habits, day(2024, 3, 5)), 0.0);
    assert_eq!(views::completion_rate(&habits[..1], due), 1.0);
    assert_eq!(views::completion_rate(&habits[..1], day(2024, 4, 4)), 0.0);
}
