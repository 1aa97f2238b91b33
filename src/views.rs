//! Read-only projections over collections for display.
//!
//! Nothing here mutates or persists. Malformed dates are skipped rather
//! than reported.

use chrono::{Datelike, Days, NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::collections::HashMap;

use crate::models::{CalendarEvent, Goal, Habit, JournalEntry, Memory, MoodEntry, Note, Todo};
use crate::utils;

pub const TOP_TAGS_LIMIT: usize = 5;
pub const LEADERBOARD_LIMIT: usize = 3;
pub const UPCOMING_LIMIT: usize = 5;

/// Inclusive span of calendar days; empty when `end` is before `start`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    /// `days` consecutive days beginning at `start`
    pub fn starting(start: NaiveDate, days: u64) -> Self {
        match days.checked_sub(1) {
            Some(extra) => Self {
                start,
                end: start + Days::new(extra),
            },
            None => Self {
                start,
                end: start.pred_opt().unwrap_or(NaiveDate::MIN),
            },
        }
    }

    /// The `days` days ending with `today`
    pub fn last_days(today: NaiveDate, days: u64) -> Self {
        match days.checked_sub(1) {
            Some(extra) => Self {
                start: today - Days::new(extra),
                end: today,
            },
            None => Self {
                start: today.succ_opt().unwrap_or(NaiveDate::MAX),
                end: today,
            },
        }
    }

    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }

    pub fn last_7_days(today: NaiveDate) -> Self {
        Self::last_days(today, 7)
    }

    pub fn last_30_days(today: NaiveDate) -> Self {
        Self::last_days(today, 30)
    }

    /// First through last day of `today`'s month
    pub fn current_month(today: NaiveDate) -> Self {
        let start = today.with_day(1).unwrap_or(today);
        let next_month = start
            .checked_add_months(chrono::Months::new(1))
            .unwrap_or(start);
        let end = next_month.pred_opt().unwrap_or(today);
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    pub fn days(&self) -> Vec<NaiveDate> {
        self.start.iter_days().take_while(|d| *d <= self.end).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayCount {
    pub date: NaiveDate,
    pub count: usize,
}

/// Records that fall on a calendar day
pub trait Dated {
    fn date(&self) -> Option<NaiveDate>;
}

/// Records carrying free-form tags
pub trait Tagged {
    fn tags(&self) -> &[String];
}

/// Records with an optional due instant and a completion flag
pub trait Deadline {
    fn due(&self) -> Option<NaiveDateTime>;
    fn is_complete(&self) -> bool;
}

macro_rules! dated_by {
    ($ty:ty, $field:ident) => {
        impl Dated for $ty {
            fn date(&self) -> Option<NaiveDate> {
                utils::local_date_of(&self.$field)
            }
        }
    };
}

dated_by!(CalendarEvent, date);
dated_by!(JournalEntry, date);
dated_by!(Memory, date);
dated_by!(MoodEntry, date);
dated_by!(Todo, created_at);
dated_by!(Note, created_at);

impl Tagged for Note {
    fn tags(&self) -> &[String] {
        &self.tags
    }
}

impl Tagged for JournalEntry {
    fn tags(&self) -> &[String] {
        &self.tags
    }
}

impl Tagged for Memory {
    fn tags(&self) -> &[String] {
        &self.tags
    }
}

impl Deadline for Todo {
    fn due(&self) -> Option<NaiveDateTime> {
        self.due_date.as_deref().and_then(utils::parse_local_datetime)
    }

    fn is_complete(&self) -> bool {
        self.completed
    }
}

impl Deadline for Goal {
    fn due(&self) -> Option<NaiveDateTime> {
        self.deadline.as_deref().and_then(utils::parse_local_datetime)
    }

    fn is_complete(&self) -> bool {
        self.completed
    }
}

/// One bucket per day of `window`, counting items dated that day; empty
/// days are kept with a zero count
pub fn entries_over_time<T: Dated>(items: &[T], window: DateWindow) -> Vec<DayCount> {
    let mut counts: HashMap<NaiveDate, usize> = HashMap::new();
    for date in items.iter().filter_map(|i| i.date()) {
        if window.contains(date) {
            *counts.entry(date).or_default() += 1;
        }
    }
    window
        .days()
        .into_iter()
        .map(|date| DayCount {
            date,
            count: counts.get(&date).copied().unwrap_or(0),
        })
        .collect()
}

/// Count occurrences of each value, most frequent first; equal counts keep
/// the order in which values were first seen
pub fn distribution<'a, I>(values: I) -> Vec<(String, usize)>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut order: Vec<(String, usize)> = Vec::new();
    let mut index: HashMap<&'a str, usize> = HashMap::new();
    for value in values {
        match index.get(value) {
            Some(&i) => order[i].1 += 1,
            None => {
                index.insert(value, order.len());
                order.push((value.to_string(), 1));
            }
        }
    }
    // stable: ties stay in first-seen order
    order.sort_by(|a, b| b.1.cmp(&a.1));
    order
}

/// The five most used tags across `items`
pub fn top_tags<T: Tagged>(items: &[T]) -> Vec<(String, usize)> {
    let mut tags = distribution(items.iter().flat_map(|i| i.tags().iter().map(String::as_str)));
    tags.truncate(TOP_TAGS_LIMIT);
    tags
}

pub fn category_distribution(todos: &[Todo]) -> Vec<(String, usize)> {
    distribution(todos.iter().filter_map(|t| t.category.as_deref()))
}

/// Moods recorded in journal entries followed by standalone mood entries
pub fn mood_distribution(journal: &[JournalEntry], moods: &[MoodEntry]) -> Vec<(String, usize)> {
    distribution(
        journal
            .iter()
            .filter_map(|e| e.mood.as_deref())
            .chain(moods.iter().map(|m| m.mood.as_str())),
    )
}

pub fn filter_by_tag<'a, T: Tagged>(items: &'a [T], tag: &str) -> Vec<&'a T> {
    items
        .iter()
        .filter(|i| i.tags().iter().any(|t| t == tag))
        .collect()
}

/// Top three habits by streak; equal streaks keep list order
pub fn streak_leaderboard(habits: &[Habit]) -> Vec<&Habit> {
    let mut ranked: Vec<&Habit> = habits.iter().collect();
    ranked.sort_by(|a, b| b.streak.cmp(&a.streak));
    ranked.truncate(LEADERBOARD_LIMIT);
    ranked
}

/// Share of habits scheduled on `date` that were completed on it, or 0.0
/// when none are scheduled
pub fn completion_rate(habits: &[Habit], date: NaiveDate) -> f64 {
    let applicable: Vec<&Habit> = habits.iter().filter(|h| h.applies_on(date)).collect();
    if applicable.is_empty() {
        return 0.0;
    }
    let done = applicable.iter().filter(|h| h.is_completed_on(date)).count();
    done as f64 / applicable.len() as f64
}

/// Next five incomplete items due at or after `now`, soonest first
pub fn upcoming_deadlines<T: Deadline>(items: &[T], now: NaiveDateTime) -> Vec<&T> {
    let mut upcoming: Vec<(&T, NaiveDateTime)> = items
        .iter()
        .filter(|i| !i.is_complete())
        .filter_map(|i| i.due().map(|due| (i, due)))
        .filter(|(_, due)| *due >= now)
        .collect();
    upcoming.sort_by_key(|(_, due)| *due);
    upcoming.into_iter().take(UPCOMING_LIMIT).map(|(i, _)| i).collect()
}

/// Incomplete and due before the start of `now`'s day
pub fn is_overdue<T: Deadline>(item: &T, now: NaiveDateTime) -> bool {
    let start_of_today = now.date().and_hms_opt(0, 0, 0).unwrap_or(now);
    !item.is_complete() && item.due().is_some_and(|due| due < start_of_today)
}
