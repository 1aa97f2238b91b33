//! Generic create/update/delete over one collection.
//!
//! Every successful mutation persists through the session backend and then
//! appends exactly one history entry. A backend failure leaves both the
//! in-memory list and the ledger untouched. The two writes are not atomic:
//! a crash between them can persist a change without its history entry.

use chrono::NaiveDate;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

use crate::backend::{BackendError, PersistenceBackend};
use crate::history::{HistoryLedger, actions};
use crate::models::{Goal, Habit, Pinnable, Record, Todo};
use crate::remote::Document;
use crate::store::Collection;
use crate::utils;

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("No {collection} record with id {id}")]
    NotFound { collection: Collection, id: String },
    #[error("{0}")]
    InvalidState(String),
}

/// How a mutation reaches the backend
enum Write {
    Patch,
    /// Completion time, or `None` for pending
    Completion(Option<String>),
}

/// What a mutation did, for the history ledger
struct Change {
    action: &'static str,
    details: Option<String>,
}

pub struct CollectionController<T: Record> {
    records: Vec<T>,
    backend: Arc<dyn PersistenceBackend>,
    ledger: HistoryLedger,
}

impl<T: Record> CollectionController<T> {
    /// Load the collection once from the session backend
    pub async fn open(
        backend: Arc<dyn PersistenceBackend>,
        ledger: HistoryLedger,
    ) -> Result<Self, ControllerError> {
        let raw = backend.load(T::COLLECTION).await?;
        let records = raw
            .into_iter()
            .filter_map(|value| match serde_json::from_value::<T>(value) {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!(
                        collection = %T::COLLECTION,
                        error = %e,
                        "skipping malformed record"
                    );
                    None
                }
            })
            .collect::<Vec<_>>();

        tracing::debug!(collection = %T::COLLECTION, count = records.len(), "collection loaded");
        Ok(Self {
            records,
            backend,
            ledger,
        })
    }

    pub fn records(&self) -> &[T] {
        &self.records
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.records.iter().find(|r| r.id() == id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn position(&self, id: &str) -> Result<usize, ControllerError> {
        self.records
            .iter()
            .position(|r| r.id() == id)
            .ok_or_else(|| ControllerError::NotFound {
                collection: T::COLLECTION,
                id: id.to_string(),
            })
    }

    fn snapshot(records: &[T]) -> Result<Vec<Value>, ControllerError> {
        records
            .iter()
            .map(|r| serde_json::to_value(r).map_err(ControllerError::from))
            .collect()
    }

    /// Add a record, assigning its id and creation time
    pub async fn create(&mut self, mut record: T) -> Result<T, ControllerError> {
        if record.id().is_empty() || self.get(record.id()).is_some() {
            record.set_id(utils::new_id());
        }
        record.set_created_at(utils::now_timestamp());

        let mut next = self.records.clone();
        next.push(record.clone());
        let document = to_document(&record)?;
        let snapshot = Self::snapshot(&next)?;

        let id = self
            .backend
            .insert(T::COLLECTION, &document, &snapshot)
            .await?;
        if id != record.id() {
            record.set_id(id);
            if let Some(last) = next.last_mut() {
                *last = record.clone();
            }
        }

        self.records = next;
        self.ledger
            .append(T::ENTITY_TYPE, actions::CREATED, &record.label(), None);
        Ok(record)
    }

    /// Replace a record wholesale. `id` and `createdAt` keep their stored
    /// values; an edit touching several fields is still one history entry
    pub async fn update(&mut self, mut record: T) -> Result<T, ControllerError> {
        let pos = self.position(record.id())?;
        let current = &self.records[pos];
        record.set_created_at(current.created_at().to_string());

        let before = to_document(current)?;
        if to_document(&record)? == before {
            return Ok(record);
        }
        record.touch(&utils::now_timestamp());
        let patch = diff(&before, &to_document(&record)?);

        let mut next = self.records.clone();
        next[pos] = record.clone();
        let snapshot = Self::snapshot(&next)?;
        self.backend
            .update(T::COLLECTION, record.id(), &patch, &snapshot)
            .await?;

        self.records = next;
        let fields = patch
            .keys()
            .filter(|k| k.as_str() != "updatedAt")
            .cloned()
            .collect::<Vec<_>>()
            .join(", ");
        self.ledger.append(
            T::ENTITY_TYPE,
            actions::UPDATED,
            &record.label(),
            Some(&fields),
        );
        Ok(record)
    }

    pub async fn delete(&mut self, id: &str) -> Result<T, ControllerError> {
        let pos = self.position(id)?;
        let mut next = self.records.clone();
        let removed = next.remove(pos);
        let snapshot = Self::snapshot(&next)?;

        self.backend.remove(T::COLLECTION, id, &snapshot).await?;

        self.records = next;
        self.ledger
            .append(T::ENTITY_TYPE, actions::DELETED, &removed.label(), None);
        Ok(removed)
    }

    async fn apply<F>(&mut self, id: &str, write: Write, mutate: F) -> Result<T, ControllerError>
    where
        F: FnOnce(&mut T) -> Change,
    {
        let pos = self.position(id)?;
        let before = to_document(&self.records[pos])?;

        let mut record = self.records[pos].clone();
        let change = mutate(&mut record);
        let patch = diff(&before, &to_document(&record)?);
        // an unchanged record is neither written nor recorded
        if patch.is_empty() && matches!(write, Write::Patch) {
            return Ok(record);
        }

        let mut next = self.records.clone();
        next[pos] = record.clone();
        let snapshot = Self::snapshot(&next)?;

        match write {
            Write::Patch => {
                self.backend
                    .update(T::COLLECTION, id, &patch, &snapshot)
                    .await?
            }
            Write::Completion(completed_at) => {
                self.backend
                    .set_completion(T::COLLECTION, id, completed_at.as_deref(), &snapshot)
                    .await?
            }
        }

        self.records = next;
        self.ledger.append(
            T::ENTITY_TYPE,
            change.action,
            &record.label(),
            change.details.as_deref(),
        );
        Ok(record)
    }
}

impl<T: Pinnable> CollectionController<T> {
    /// Pin or unpin a record
    pub async fn toggle_pin(&mut self, id: &str) -> Result<T, ControllerError> {
        self.apply(id, Write::Patch, |record| {
            let pinned = record.pinned_mut();
            *pinned = !*pinned;
            Change {
                action: if *pinned { actions::PINNED } else { actions::UNPINNED },
                details: None,
            }
        })
        .await
    }
}

impl CollectionController<Todo> {
    /// Flip a todo between complete and pending
    pub async fn toggle(&mut self, id: &str) -> Result<Todo, ControllerError> {
        let completed = !self.records[self.position(id)?].completed;
        let completed_at = completed.then(utils::now_timestamp);
        self.apply(id, Write::Completion(completed_at.clone()), move |todo| {
            todo.completed = completed;
            todo.completed_at = completed_at;
            Change {
                action: if completed { actions::COMPLETED } else { actions::UNCOMPLETED },
                details: None,
            }
        })
        .await
    }
}

impl CollectionController<Habit> {
    /// Mark or unmark `date`; only `today` moves the streak
    pub async fn toggle_completion(
        &mut self,
        id: &str,
        date: NaiveDate,
        today: NaiveDate,
    ) -> Result<Habit, ControllerError> {
        self.apply(id, Write::Patch, |habit| {
            let done = habit.toggle_date(date, today);
            Change {
                action: if done { actions::COMPLETED } else { actions::UNCOMPLETED },
                details: Some(utils::format_date(date)),
            }
        })
        .await
    }
}

impl CollectionController<Goal> {
    /// Record progress towards the target. Progress may exceed the target
    /// and never completes the goal by itself
    pub async fn set_progress(&mut self, id: &str, progress: f64) -> Result<Goal, ControllerError> {
        self.apply(id, Write::Patch, |goal| {
            goal.progress = progress;
            Change {
                action: actions::UPDATED,
                details: Some(format!("progress {}/{}", goal.progress, goal.target)),
            }
        })
        .await
    }

    pub async fn complete(&mut self, id: &str) -> Result<Goal, ControllerError> {
        if self.records[self.position(id)?].completed {
            return Err(ControllerError::InvalidState(format!("goal {id} is already completed")));
        }
        self.apply(id, Write::Patch, |goal| {
            goal.completed = true;
            goal.completed_at = Some(utils::now_timestamp());
            Change {
                action: actions::COMPLETED,
                details: None,
            }
        })
        .await
    }

    pub async fn archive(&mut self, id: &str) -> Result<Goal, ControllerError> {
        if self.records[self.position(id)?].archived {
            return Err(ControllerError::InvalidState(format!("goal {id} is already archived")));
        }
        self.apply(id, Write::Patch, |goal| {
            goal.archived = true;
            Change {
                action: actions::ARCHIVED,
                details: None,
            }
        })
        .await
    }
}

fn to_document<T: Record>(record: &T) -> Result<Document, ControllerError> {
    match serde_json::to_value(record)? {
        Value::Object(map) => Ok(map),
        other => Err(ControllerError::InvalidState(format!(
            "{} record serialized to {other}, expected an object",
            T::COLLECTION
        ))),
    }
}

/// Fields of `after` that differ from `before`; fields dropped in `after`
/// are patched to null
fn diff(before: &Document, after: &Document) -> Document {
    let mut patch = Document::new();
    for (field, value) in after {
        if before.get(field) != Some(value) {
            patch.insert(field.clone(), value.clone());
        }
    }
    for field in before.keys() {
        if !after.contains_key(field) {
            patch.insert(field.clone(), Value::Null);
        }
    }
    patch
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn diff_reports_changed_added_and_dropped_fields() {
        let before = doc(json!({"title": "a", "priority": "low", "dueDate": "2024-01-01"}));
        let after = doc(json!({"title": "a", "priority": "high", "category": "work"}));
        let patch = diff(&before, &after);

        assert_eq!(patch.len(), 3);
        assert_eq!(patch["priority"], "high");
        assert_eq!(patch["category"], "work");
        assert!(patch["dueDate"].is_null());
    }
}
