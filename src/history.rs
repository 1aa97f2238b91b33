//! Append-only activity ledger shared by every collection.
//!
//! Entries are stored newest first under the `history` key. Nothing edits
//! or removes a single entry; [`HistoryLedger::clear`] drops the whole list.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::store::{Collection, RecordStore};
use crate::utils;

pub mod actions {
    pub const CREATED: &str = "created";
    pub const UPDATED: &str = "updated";
    pub const DELETED: &str = "deleted";
    pub const COMPLETED: &str = "completed";
    pub const UNCOMPLETED: &str = "uncompleted";
    pub const ARCHIVED: &str = "archived";
    pub const PINNED: &str = "pinned";
    pub const UNPINNED: &str = "unpinned";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub entity_type: String,
    pub action: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    pub timestamp: String,
}

/// Aggregate counts over the whole ledger
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistorySummary {
    pub by_type: BTreeMap<String, usize>,
    pub by_action: BTreeMap<String, usize>,
    /// Keyed by local `yyyy-MM-dd`
    pub by_day: BTreeMap<String, usize>,
    /// Keyed by local `yyyy-MM`
    pub by_month: BTreeMap<String, usize>,
    pub total: usize,
}

#[derive(Clone)]
pub struct HistoryLedger {
    store: RecordStore,
}

impl HistoryLedger {
    pub fn new(store: RecordStore) -> Self {
        Self { store }
    }

    /// Record one action and return the stored entry
    pub fn append(
        &self,
        entity_type: &str,
        action: &str,
        name: &str,
        details: Option<&str>,
    ) -> HistoryEntry {
        let entry = HistoryEntry {
            id: utils::new_id(),
            entity_type: entity_type.to_string(),
            action: action.to_string(),
            name: name.to_string(),
            details: details.map(str::to_string),
            timestamp: utils::now_timestamp(),
        };

        let mut entries = self.entries();
        entries.insert(0, entry.clone());
        self.store.save(Collection::History, &entries);

        tracing::debug!(
            entity_type,
            action,
            name,
            "history entry appended"
        );
        entry
    }

    /// Every entry, newest first
    pub fn entries(&self) -> Vec<HistoryEntry> {
        self.store.load(Collection::History)
    }

    /// Newest-first entries, optionally restricted to one entity type and
    /// truncated to `limit`
    pub fn query_recent(&self, entity_type: Option<&str>, limit: Option<usize>) -> Vec<HistoryEntry> {
        let filtered = self
            .entries()
            .into_iter()
            .filter(|e| entity_type.is_none_or(|t| e.entity_type == t));
        match limit {
            Some(n) => filtered.take(n).collect(),
            None => filtered.collect(),
        }
    }

    pub fn summarize(&self) -> HistorySummary {
        summarize_entries(&self.entries())
    }

    /// Drop the entire ledger
    pub fn clear(&self) {
        let removed = self.entries().len();
        self.store.save::<HistoryEntry>(Collection::History, &[]);
        tracing::info!(removed, "history cleared");
    }
}

/// Count entries by type, action, local day and local month
pub fn summarize_entries(entries: &[HistoryEntry]) -> HistorySummary {
    let mut summary = HistorySummary {
        total: entries.len(),
        ..Default::default()
    };

    for entry in entries {
        *summary.by_type.entry(entry.entity_type.clone()).or_default() += 1;
        *summary.by_action.entry(entry.action.clone()).or_default() += 1;

        if let Some(date) = utils::local_date_of(&entry.timestamp) {
            *summary.by_day.entry(date.format("%Y-%m-%d").to_string()).or_default() += 1;
            *summary.by_month.entry(date.format("%Y-%m").to_string()).or_default() += 1;
        }
    }

    summary
}
