//! Whole-application backup as one JSON object.
//!
//! Each field holds the verbatim stored string of a local key, alongside
//! `exportDate` and `appVersion`. Import checks the whole document before
//! writing anything, then writes every field in one transaction.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::database::DatabaseError;
use crate::preferences::{Preference, REFLECTION_PREFIX};
use crate::store::{Collection, RecordStore};
use crate::utils;

pub const EXPORT_DATE_FIELD: &str = "exportDate";
pub const APP_VERSION_FIELD: &str = "appVersion";

#[derive(Debug, Error)]
pub enum BackupError {
    #[error("Backup is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Backup must be a JSON object")]
    NotAnObject,
    #[error("Backup field {0} must hold a string")]
    InvalidField(String),
    #[error("Failed to write backup into storage: {0}")]
    Storage(#[from] DatabaseError),
}

/// Whether `key` belongs in a backup
pub fn is_backup_key(key: &str) -> bool {
    Collection::from_key(key).is_some()
        || Preference::from_key(key).is_some()
        || key.starts_with(REFLECTION_PREFIX)
}

/// Every present backup key, in a stable order: collections, preferences,
/// then reflections by date
fn present_keys(store: &RecordStore) -> Result<Vec<String>, DatabaseError> {
    let db = store.database();
    let mut keys: Vec<String> = Vec::new();
    for key in Collection::ALL
        .iter()
        .map(|c| c.key())
        .chain(Preference::ALL.iter().map(|p| p.key()))
    {
        if db.get_item(key)?.is_some() {
            keys.push(key.to_string());
        }
    }
    keys.extend(db.keys_with_prefix(REFLECTION_PREFIX)?);
    Ok(keys)
}

/// Build the backup document
pub fn export(store: &RecordStore) -> Result<Value, BackupError> {
    let mut document = Map::new();
    for key in present_keys(store)? {
        if let Some(value) = store.database().get_item(&key)? {
            document.insert(key, Value::String(value));
        }
    }
    document.insert(EXPORT_DATE_FIELD.into(), Value::String(utils::now_timestamp()));
    document.insert(
        APP_VERSION_FIELD.into(),
        Value::String(env!("CARGO_PKG_VERSION").to_string()),
    );

    tracing::info!(keys = document.len() - 2, "backup exported");
    Ok(Value::Object(document))
}

pub fn export_string(store: &RecordStore) -> Result<String, BackupError> {
    Ok(serde_json::to_string_pretty(&export(store)?)?)
}

/// Restore every backup key present in `raw`, returning how many were written.
///
/// Unknown fields are ignored. Nothing is written if any known field is not
/// a string. Callers should reload their collections afterwards.
pub fn import(store: &RecordStore, raw: &str) -> Result<usize, BackupError> {
    let Value::Object(document) = serde_json::from_str::<Value>(raw)? else {
        return Err(BackupError::NotAnObject);
    };

    let mut items = Vec::new();
    for (key, value) in document {
        if !is_backup_key(&key) {
            continue;
        }
        match value {
            Value::String(s) => items.push((key, s)),
            _ => return Err(BackupError::InvalidField(key)),
        }
    }

    store.database().set_items(&items)?;
    tracing::info!(keys = items.len(), "backup imported");
    Ok(items.len())
}
