//! Optional per-user copy of collections in a hosted document store.
//!
//! Every call is async and may fail; callers surface the error and decide
//! whether to retry. Documents carry the record's own fields plus the
//! owning `userId`.

mod memory;
mod rest;

pub use memory::InMemoryRemote;
pub use rest::RestRemote;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::store::Collection;
use crate::utils;

/// A remote document: a JSON object keyed by field name
pub type Document = Map<String, Value>;

/// Field holding the owning user's id on every remote document
pub const USER_ID_FIELD: &str = "userId";

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Server error {status}: {message}")]
    Server { status: u16, message: String },
    #[error("Not signed in or session rejected")]
    Unauthorized,
    #[error("Document not found: {0}")]
    NotFound(String),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("Remote unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait RemoteMirror: Send + Sync {
    /// Every document in `collection` owned by `user_id`
    async fn fetch_all(&self, collection: Collection, user_id: &str) -> Result<Vec<Value>, RemoteError>;

    /// Store a new document; the server assigns and returns its id
    async fn insert(
        &self,
        collection: Collection,
        record: Document,
        user_id: &str,
    ) -> Result<String, RemoteError>;

    /// Merge `patch` into the document, leaving unlisted fields as they are
    async fn update(&self, collection: Collection, id: &str, patch: Document) -> Result<(), RemoteError>;

    async fn remove(&self, collection: Collection, id: &str) -> Result<(), RemoteError>;

    /// Mark complete at `completed_at`, or pending when `None`
    async fn set_completion(
        &self,
        collection: Collection,
        id: &str,
        completed_at: Option<&str>,
    ) -> Result<(), RemoteError> {
        self.update(collection, id, completion_patch(completed_at)).await
    }
}

/// Patch marking a document complete or pending, with its derived status
pub fn completion_patch(completed_at: Option<&str>) -> Document {
    let mut patch = Document::new();
    patch.insert("completed".into(), Value::Bool(completed_at.is_some()));
    patch.insert(
        "status".into(),
        Value::String(if completed_at.is_some() { "completed" } else { "pending" }.into()),
    );
    patch.insert(
        "completedAt".into(),
        completed_at.map_or(Value::Null, |at| Value::String(at.to_string())),
    );
    patch
}
