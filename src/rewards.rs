//! Completion predicates and the one-shot celebration they trigger.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::{Frequency, Habit, JournalEntry, Todo};
use crate::utils;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Tasks,
    Journal,
    Goal,
    Day,
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NotificationKind::Tasks => "tasks",
            NotificationKind::Journal => "journal",
            NotificationKind::Goal => "goal",
            NotificationKind::Day => "day",
        };
        f.write_str(name)
    }
}

/// Displays a celebration; nothing is returned to the caller
pub trait Notifier: Send + Sync {
    fn notify(&self, kind: NotificationKind, title: &str, message: &str);
}

/// Prints notifications to stdout
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, kind: NotificationKind, title: &str, message: &str) {
        tracing::debug!(%kind, title, "notification");
        println!("* {} - {}", title, message);
    }
}

/// True when there is at least one todo and every todo is complete
pub fn all_tasks_completed(todos: &[Todo]) -> bool {
    !todos.is_empty() && todos.iter().all(|t| t.completed)
}

/// True when every daily habit has `today` in its completed dates.
/// Holds vacuously when there are no daily habits.
pub fn all_habits_completed_today(habits: &[Habit], today: NaiveDate) -> bool {
    habits
        .iter()
        .filter(|h| h.frequency == Frequency::Daily)
        .all(|h| h.is_completed_on(today))
}

pub fn journal_written_on(entries: &[JournalEntry], date: NaiveDate) -> bool {
    let key = utils::format_date(date);
    entries.iter().any(|e| e.date == key)
}

pub fn daily_completion(
    todos: &[Todo],
    habits: &[Habit],
    journal_written_today: bool,
    today: NaiveDate,
) -> bool {
    all_tasks_completed(todos) && all_habits_completed_today(habits, today) && journal_written_today
}

/// Predicate values at one instant
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RewardState {
    pub tasks: bool,
    pub journal: bool,
    pub day: bool,
}

impl RewardState {
    pub fn evaluate(
        todos: &[Todo],
        habits: &[Habit],
        journal: &[JournalEntry],
        today: NaiveDate,
    ) -> Self {
        let journal = journal_written_on(journal, today);
        Self {
            tasks: all_tasks_completed(todos),
            journal,
            day: daily_completion(todos, habits, journal, today),
        }
    }
}

/// Edge-triggered notification: each predicate fires once when it turns
/// from false to true and stays quiet while it remains true
#[derive(Debug, Default)]
pub struct RewardTracker {
    last: RewardState,
}

impl RewardTracker {
    /// Start from an already-observed state without firing for it
    pub fn primed(state: RewardState) -> Self {
        Self { last: state }
    }

    /// Compare against the previous state and return the kinds that just
    /// became true
    pub fn observe(&mut self, state: RewardState) -> Vec<NotificationKind> {
        let mut fired = Vec::new();
        if state.tasks && !self.last.tasks {
            fired.push(NotificationKind::Tasks);
        }
        if state.journal && !self.last.journal {
            fired.push(NotificationKind::Journal);
        }
        if state.day && !self.last.day {
            fired.push(NotificationKind::Day);
        }
        self.last = state;
        fired
    }

    pub fn last(&self) -> RewardState {
        self.last
    }
}

/// Title and message shown for each kind
pub fn celebration(kind: NotificationKind) -> (&'static str, &'static str) {
    match kind {
        NotificationKind::Tasks => ("All tasks done", "Every task on your list is complete."),
        NotificationKind::Journal => ("Journal written", "You wrote in your journal today."),
        NotificationKind::Goal => ("Goal achieved", "You completed a goal."),
        NotificationKind::Day => (
            "Day complete",
            "Tasks, habits and journal are all done for today.",
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn todo(completed: bool) -> Todo {
        let mut t = Todo::new("t");
        t.completed = completed;
        t
    }

    #[test]
    fn empty_todo_list_is_not_all_done() {
        assert!(!all_tasks_completed(&[]));
        assert!(all_tasks_completed(&[todo(true), todo(true)]));
        assert!(!all_tasks_completed(&[todo(true), todo(false)]));
    }

    #[test]
    fn only_daily_habits_count_for_today() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let mut daily = Habit::new("d", Frequency::Daily);
        let weekly = Habit::new("w", Frequency::Weekly);
        assert!(!all_habits_completed_today(&[daily.clone(), weekly.clone()], today));

        daily.completed_dates.insert("2024-06-01".into());
        assert!(all_habits_completed_today(&[daily, weekly], today));
        assert!(all_habits_completed_today(&[], today));
    }

    #[test]
    fn tracker_fires_once_per_rising_edge() {
        let mut tracker = RewardTracker::default();
        let done = RewardState { tasks: true, ..Default::default() };

        assert_eq!(tracker.observe(done), vec![NotificationKind::Tasks]);
        assert!(tracker.observe(done).is_empty());
        assert!(tracker.observe(RewardState::default()).is_empty());
        assert_eq!(tracker.observe(done), vec![NotificationKind::Tasks]);
    }

    #[test]
    fn primed_tracker_ignores_initial_truth() {
        let state = RewardState { tasks: true, journal: true, day: true };
        let mut tracker = RewardTracker::primed(state);
        assert!(tracker.observe(state).is_empty());
    }
}
