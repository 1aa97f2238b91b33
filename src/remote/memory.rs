use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use super::{Document, RemoteError, RemoteMirror, USER_ID_FIELD};
use crate::store::Collection;

/// Process-local document store honouring the remote contract.
///
/// Used offline and in tests. A collection can be switched into a failing
/// state to exercise error paths.
#[derive(Default)]
pub struct InMemoryRemote {
    tables: Mutex<HashMap<Collection, Vec<Document>>>,
    failing: Mutex<HashSet<Collection>>,
    next_id: AtomicU64,
}

impl InMemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call against `collection` fail until [`Self::recover`]
    pub fn fail_collection(&self, collection: Collection) {
        if let Ok(mut failing) = self.failing.lock() {
            failing.insert(collection);
        }
    }

    pub fn recover(&self, collection: Collection) {
        if let Ok(mut failing) = self.failing.lock() {
            failing.remove(&collection);
        }
    }

    /// Every document in `collection`, across all users
    pub fn documents(&self, collection: Collection) -> Vec<Document> {
        self.tables
            .lock()
            .map(|t| t.get(&collection).cloned().unwrap_or_default())
            .unwrap_or_default()
    }

    fn check(&self, collection: Collection) -> Result<(), RemoteError> {
        let failing = self
            .failing
            .lock()
            .map_err(|_| RemoteError::Unavailable("lock poisoned".into()))?;
        if failing.contains(&collection) {
            return Err(RemoteError::Unavailable(format!("{collection} is offline")));
        }
        Ok(())
    }

    fn tables(&self) -> Result<MutexGuard<'_, HashMap<Collection, Vec<Document>>>, RemoteError> {
        self.tables
            .lock()
            .map_err(|_| RemoteError::Unavailable("lock poisoned".into()))
    }
}

#[async_trait]
impl RemoteMirror for InMemoryRemote {
    async fn fetch_all(&self, collection: Collection, user_id: &str) -> Result<Vec<Value>, RemoteError> {
        self.check(collection)?;
        let tables = self.tables()?;
        Ok(tables
            .get(&collection)
            .map(|docs| {
                docs.iter()
                    .filter(|d| d.get(USER_ID_FIELD).and_then(Value::as_str) == Some(user_id))
                    .cloned()
                    .map(Value::Object)
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn insert(
        &self,
        collection: Collection,
        mut record: Document,
        user_id: &str,
    ) -> Result<String, RemoteError> {
        self.check(collection)?;
        let id = format!("doc-{}", self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        record.insert("id".into(), Value::String(id.clone()));
        record.insert(USER_ID_FIELD.into(), Value::String(user_id.to_string()));
        self.tables()?.entry(collection).or_default().push(record);
        Ok(id)
    }

    async fn update(&self, collection: Collection, id: &str, patch: Document) -> Result<(), RemoteError> {
        self.check(collection)?;
        let mut tables = self.tables()?;
        let doc = tables
            .get_mut(&collection)
            .and_then(|docs| {
                docs.iter_mut()
                    .find(|d| d.get("id").and_then(Value::as_str) == Some(id))
            })
            .ok_or_else(|| RemoteError::NotFound(id.to_string()))?;

        for (field, value) in patch {
            if field == "id" || field == USER_ID_FIELD {
                continue;
            }
            doc.insert(field, value);
        }
        Ok(())
    }

    async fn remove(&self, collection: Collection, id: &str) -> Result<(), RemoteError> {
        self.check(collection)?;
        if let Some(docs) = self.tables()?.get_mut(&collection) {
            docs.retain(|d| d.get("id").and_then(Value::as_str) != Some(id));
        }
        Ok(())
    }
}
