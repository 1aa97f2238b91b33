use chrono::{Datelike, NaiveDate, Weekday};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::store::Collection;
use crate::utils;

/// A record living in one collection, addressable by id
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const COLLECTION: Collection;
    /// Entity type written to the history ledger
    const ENTITY_TYPE: &'static str;

    fn id(&self) -> &str;
    fn set_id(&mut self, id: String);
    fn created_at(&self) -> &str;
    fn set_created_at(&mut self, created_at: String);
    /// Human-readable name used in history entries
    fn label(&self) -> String;

    /// Stamp a modification time, for records that keep one
    fn touch(&mut self, _now: &str) {}
}

/// Records that can be pinned to the top of their list
pub trait Pinnable: Record {
    fn pinned_mut(&mut self) -> &mut bool;
}

macro_rules! impl_record {
    (@impl $ty:ty, $collection:expr, $entity:literal, |$this:ident| $label:expr, { $($extra:tt)* }) => {
        impl Record for $ty {
            const COLLECTION: Collection = $collection;
            const ENTITY_TYPE: &'static str = $entity;

            fn id(&self) -> &str {
                &self.id
            }

            fn set_id(&mut self, id: String) {
                self.id = id;
            }

            fn created_at(&self) -> &str {
                &self.created_at
            }

            fn set_created_at(&mut self, created_at: String) {
                self.created_at = created_at;
            }

            fn label(&self) -> String {
                let $this = self;
                $label
            }

            $($extra)*
        }
    };
    ($ty:ty, $collection:expr, $entity:literal, |$this:ident| $label:expr) => {
        impl_record!(@impl $ty, $collection, $entity, |$this| $label, {});
    };
    ($ty:ty, $collection:expr, $entity:literal, |$this:ident| $label:expr, touches $field:ident) => {
        impl_record!(@impl $ty, $collection, $entity, |$this| $label, {
            fn touch(&mut self, now: &str) {
                self.$field = Some(now.to_string());
            }
        });
    };
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    #[default]
    Daily,
    Weekly,
    Monthly,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    #[serde(default)]
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
}

impl Todo {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            title: title.into(),
            description: None,
            completed: false,
            priority: Priority::default(),
            category: None,
            due_date: None,
            created_at: String::new(),
            completed_at: None,
        }
    }
}

impl_record!(Todo, Collection::Todos, "todo", |t| t.title.clone());

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Habit {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub frequency: Frequency,
    /// Days marked done, as `yyyy-MM-dd`; a day appears at most once
    #[serde(default)]
    pub completed_dates: BTreeSet<String>,
    #[serde(default)]
    pub streak: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub created_at: String,
}

impl Habit {
    pub fn new(name: impl Into<String>, frequency: Frequency) -> Self {
        Self {
            id: String::new(),
            name: name.into(),
            description: None,
            frequency,
            completed_dates: BTreeSet::new(),
            streak: 0,
            category: None,
            created_at: String::new(),
        }
    }

    pub fn is_completed_on(&self, date: NaiveDate) -> bool {
        self.completed_dates.contains(&utils::format_date(date))
    }

    /// Flip completion for `date` and return whether it is now complete.
    ///
    /// Only `today` moves the streak; past and future dates are recorded
    /// without touching it.
    pub fn toggle_date(&mut self, date: NaiveDate, today: NaiveDate) -> bool {
        let key = utils::format_date(date);
        if self.completed_dates.remove(&key) {
            if date == today {
                self.streak = self.streak.saturating_sub(1);
            }
            false
        } else {
            self.completed_dates.insert(key);
            if date == today {
                self.streak += 1;
            }
            true
        }
    }

    /// Local calendar date the habit was created on
    pub fn created_date(&self) -> Option<NaiveDate> {
        utils::local_date_of(&self.created_at)
    }

    /// Whether the habit is scheduled on `date`: daily habits always,
    /// weekly ones on their creation weekday, monthly ones on their
    /// creation day of month
    pub fn applies_on(&self, date: NaiveDate) -> bool {
        match self.frequency {
            Frequency::Daily => true,
            Frequency::Weekly => self
                .created_date()
                .map(|c| c.weekday() == date.weekday())
                .unwrap_or(false),
            Frequency::Monthly => self
                .created_date()
                .map(|c| c.day() == date.day())
                .unwrap_or(false),
        }
    }

    pub fn scheduled_weekday(&self) -> Option<Weekday> {
        match self.frequency {
            Frequency::Weekly => self.created_date().map(|c| c.weekday()),
            _ => None,
        }
    }
}

impl_record!(Habit, Collection::Habits, "habit", |h| h.name.clone());

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    #[serde(default)]
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub progress: f64,
    #[serde(default)]
    pub target: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<String>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub created_at: String,
}

impl Goal {
    pub fn new(title: impl Into<String>, target: f64) -> Self {
        Self {
            id: String::new(),
            title: title.into(),
            description: None,
            category: None,
            priority: Priority::default(),
            progress: 0.0,
            target,
            deadline: None,
            completed: false,
            completed_at: None,
            archived: false,
            created_at: String::new(),
        }
    }

    /// Progress as a fraction of target; not clamped, may exceed 1.0
    pub fn ratio(&self) -> f64 {
        if self.target == 0.0 {
            0.0
        } else {
            self.progress / self.target
        }
    }
}

impl_record!(Goal, Collection::Goals, "goal", |g| g.title.clone());

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    #[serde(default)]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub pinned: bool,
    #[serde(default)]
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Note {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            title: title.into(),
            content: content.into(),
            tags: Vec::new(),
            pinned: false,
            created_at: String::new(),
            updated_at: None,
        }
    }
}

impl_record!(Note, Collection::Notes, "note", |n| n.title.clone(), touches updated_at);

impl Pinnable for Note {
    fn pinned_mut(&mut self) -> &mut bool {
        &mut self.pinned
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalEntry {
    #[serde(default)]
    pub id: String,
    /// Calendar date the entry is about (`yyyy-MM-dd`)
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl JournalEntry {
    pub fn new(date: NaiveDate, content: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            date: utils::format_date(date),
            title: None,
            content: content.into(),
            mood: None,
            tags: Vec::new(),
            created_at: String::new(),
            updated_at: None,
        }
    }
}

impl_record!(
    JournalEntry,
    Collection::Journal,
    "journal",
    |j| j.title.clone().unwrap_or_else(|| format!("Entry for {}", j.date)),
    touches updated_at
);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Memory {
    #[serde(default)]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub date: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub pinned: bool,
    #[serde(default)]
    pub created_at: String,
}

impl Memory {
    pub fn new(title: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            id: String::new(),
            title: title.into(),
            description: String::new(),
            date: utils::format_date(date),
            tags: Vec::new(),
            pinned: false,
            created_at: String::new(),
        }
    }
}

impl_record!(Memory, Collection::Memories, "memory", |m| m.title.clone());

impl Pinnable for Memory {
    fn pinned_mut(&mut self) -> &mut bool {
        &mut self.pinned
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    #[serde(default)]
    pub id: String,
    pub title: String,
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub created_at: String,
}

impl CalendarEvent {
    pub fn new(title: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            id: String::new(),
            title: title.into(),
            date: utils::format_date(date),
            time: None,
            category: None,
            description: None,
            created_at: String::new(),
        }
    }
}

impl_record!(CalendarEvent, Collection::CalendarEvents, "event", |e| e.title.clone());

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    #[serde(default)]
    pub id: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default)]
    pub created_at: String,
}

impl_record!(Quote, Collection::MotivationalQuotes, "quote", |q| match &q.author {
    Some(author) => format!("{} ({})", q.text, author),
    None => q.text.clone(),
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoodEntry {
    #[serde(default)]
    pub id: String,
    pub date: String,
    pub mood: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default)]
    pub created_at: String,
}

impl_record!(MoodEntry, Collection::MoodEntries, "mood", |m| format!("{} on {}", m.mood, m.date));
