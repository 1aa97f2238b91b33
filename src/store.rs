//! Per-collection JSON persistence over [`Database`].
//!
//! Reads and writes never fail observably: corrupt payloads load as an
//! empty list and failed writes are logged and dropped. The in-memory copy
//! held by the caller stays authoritative for the session.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::Arc;

use crate::database::Database;

/// A named list of records in local storage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    Todos,
    Habits,
    Goals,
    Notes,
    Journal,
    JournalTags,
    CalendarEvents,
    Memories,
    MotivationalQuotes,
    History,
    MoodEntries,
}

impl Collection {
    pub const ALL: [Collection; 11] = [
        Collection::Todos,
        Collection::Habits,
        Collection::Goals,
        Collection::Notes,
        Collection::Journal,
        Collection::JournalTags,
        Collection::CalendarEvents,
        Collection::Memories,
        Collection::MotivationalQuotes,
        Collection::History,
        Collection::MoodEntries,
    ];

    /// Collections holding user records with ids (everything but the
    /// ledger and the tag vocabulary)
    pub const RECORDS: [Collection; 9] = [
        Collection::Todos,
        Collection::Habits,
        Collection::Goals,
        Collection::Notes,
        Collection::Journal,
        Collection::CalendarEvents,
        Collection::Memories,
        Collection::MotivationalQuotes,
        Collection::MoodEntries,
    ];

    /// Local storage key
    pub fn key(self) -> &'static str {
        match self {
            Collection::Todos => "todos",
            Collection::Habits => "habits",
            Collection::Goals => "goals",
            Collection::Notes => "notes",
            Collection::Journal => "journal",
            Collection::JournalTags => "journalTags",
            Collection::CalendarEvents => "calendarEvents",
            Collection::Memories => "memories",
            Collection::MotivationalQuotes => "motivationalQuotes",
            Collection::History => "history",
            Collection::MoodEntries => "moodEntries",
        }
    }

    /// Table name in the remote document store
    pub fn remote_table(self) -> &'static str {
        match self {
            Collection::Todos => "todos",
            Collection::Habits => "habits",
            Collection::Goals => "goals",
            Collection::Notes => "notes",
            Collection::Journal => "journal_entries",
            Collection::JournalTags => "journal_tags",
            Collection::CalendarEvents => "calendar_events",
            Collection::Memories => "memories",
            Collection::MotivationalQuotes => "motivational_quotes",
            Collection::History => "history",
            Collection::MoodEntries => "mood_entries",
        }
    }

    pub fn from_key(key: &str) -> Option<Collection> {
        Collection::ALL.into_iter().find(|c| c.key() == key)
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Typed access to collections and scalar keys in local storage
#[derive(Clone)]
pub struct RecordStore {
    db: Arc<Database>,
}

impl RecordStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Load the persisted list for `collection`, or an empty list when it is
    /// missing or unreadable
    pub fn load<T: DeserializeOwned>(&self, collection: Collection) -> Vec<T> {
        let Some(raw) = self.load_raw(collection.key()) else {
            return Vec::new();
        };
        match serde_json::from_str::<Vec<T>>(&raw) {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(
                    collection = %collection,
                    error = %e,
                    "stored collection is malformed, treating as empty"
                );
                Vec::new()
            }
        }
    }

    /// Replace the whole persisted list for `collection`
    pub fn save<T: Serialize>(&self, collection: Collection, records: &[T]) {
        match serde_json::to_string(records) {
            Ok(raw) => self.save_raw(collection.key(), &raw),
            Err(e) => {
                tracing::warn!(collection = %collection, error = %e, "failed to serialize collection");
            }
        }
    }

    /// Raw string stored under `key`
    pub fn load_raw(&self, key: &str) -> Option<String> {
        match self.db.get_item(key) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key, error = %e, "failed to read local storage");
                None
            }
        }
    }

    pub fn save_raw(&self, key: &str, value: &str) {
        if let Err(e) = self.db.set_item(key, value) {
            tracing::warn!(key, error = %e, "failed to write local storage");
        }
    }

    pub fn remove_raw(&self, key: &str) {
        if let Err(e) = self.db.remove_item(key) {
            tracing::warn!(key, error = %e, "failed to remove local storage key");
        }
    }
}
