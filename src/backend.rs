//! Where a session's collections live: local storage or the remote mirror.
//!
//! The backend is chosen once per session by [`select_backend`] and never
//! switched; a session never writes the same collection to both.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

use crate::remote::{Document, RemoteError, RemoteMirror};
use crate::store::{Collection, RecordStore};

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Remote error: {0}")]
    Remote(#[from] RemoteError),
    #[error("Record has no id")]
    MissingId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Local,
    Remote,
}

/// Supplies the signed-in user, if any
pub trait IdentityProvider: Send + Sync {
    fn current_user_id(&self) -> Option<String>;
}

/// Identity fixed for the lifetime of the process (from config or `--user`)
#[derive(Debug, Clone, Default)]
pub struct StaticIdentity(pub Option<String>);

impl IdentityProvider for StaticIdentity {
    fn current_user_id(&self) -> Option<String> {
        self.0.clone()
    }
}

/// Storage seam used by every collection controller.
///
/// Mutations receive both the change and the full post-change snapshot of
/// the collection: local storage persists the snapshot, the remote mirror
/// sends the change.
#[async_trait]
pub trait PersistenceBackend: Send + Sync {
    fn kind(&self) -> BackendKind;

    async fn load(&self, collection: Collection) -> Result<Vec<Value>, BackendError>;

    /// Persist a new record and return the id it is stored under
    async fn insert(
        &self,
        collection: Collection,
        record: &Document,
        snapshot: &[Value],
    ) -> Result<String, BackendError>;

    async fn update(
        &self,
        collection: Collection,
        id: &str,
        patch: &Document,
        snapshot: &[Value],
    ) -> Result<(), BackendError>;

    /// Mark a record complete at `completed_at`, or pending when `None`
    async fn set_completion(
        &self,
        collection: Collection,
        id: &str,
        completed_at: Option<&str>,
        snapshot: &[Value],
    ) -> Result<(), BackendError>;

    async fn remove(&self, collection: Collection, id: &str, snapshot: &[Value]) -> Result<(), BackendError>;
}

/// Full-overwrite persistence into local storage
pub struct LocalBackend {
    store: RecordStore,
}

impl LocalBackend {
    pub fn new(store: RecordStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl PersistenceBackend for LocalBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Local
    }

    async fn load(&self, collection: Collection) -> Result<Vec<Value>, BackendError> {
        Ok(self.store.load(collection))
    }

    async fn insert(
        &self,
        collection: Collection,
        record: &Document,
        snapshot: &[Value],
    ) -> Result<String, BackendError> {
        let id = record
            .get("id")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .ok_or(BackendError::MissingId)?
            .to_string();
        self.store.save(collection, snapshot);
        Ok(id)
    }

    async fn update(
        &self,
        collection: Collection,
        _id: &str,
        _patch: &Document,
        snapshot: &[Value],
    ) -> Result<(), BackendError> {
        self.store.save(collection, snapshot);
        Ok(())
    }

    async fn set_completion(
        &self,
        collection: Collection,
        _id: &str,
        _completed_at: Option<&str>,
        snapshot: &[Value],
    ) -> Result<(), BackendError> {
        self.store.save(collection, snapshot);
        Ok(())
    }

    async fn remove(&self, collection: Collection, _id: &str, snapshot: &[Value]) -> Result<(), BackendError> {
        self.store.save(collection, snapshot);
        Ok(())
    }
}

/// Per-record calls against the remote mirror on behalf of one user
pub struct RemoteBackend {
    mirror: Arc<dyn RemoteMirror>,
    user_id: String,
}

impl RemoteBackend {
    pub fn new(mirror: Arc<dyn RemoteMirror>, user_id: impl Into<String>) -> Self {
        Self {
            mirror,
            user_id: user_id.into(),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }
}

#[async_trait]
impl PersistenceBackend for RemoteBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Remote
    }

    async fn load(&self, collection: Collection) -> Result<Vec<Value>, BackendError> {
        Ok(self.mirror.fetch_all(collection, &self.user_id).await?)
    }

    async fn insert(
        &self,
        collection: Collection,
        record: &Document,
        _snapshot: &[Value],
    ) -> Result<String, BackendError> {
        let mut document = record.clone();
        document.remove("id");
        Ok(self.mirror.insert(collection, document, &self.user_id).await?)
    }

    async fn update(
        &self,
        collection: Collection,
        id: &str,
        patch: &Document,
        _snapshot: &[Value],
    ) -> Result<(), BackendError> {
        if patch.is_empty() {
            return Ok(());
        }
        Ok(self.mirror.update(collection, id, patch.clone()).await?)
    }

    async fn set_completion(
        &self,
        collection: Collection,
        id: &str,
        completed_at: Option<&str>,
        _snapshot: &[Value],
    ) -> Result<(), BackendError> {
        Ok(self.mirror.set_completion(collection, id, completed_at).await?)
    }

    async fn remove(&self, collection: Collection, id: &str, _snapshot: &[Value]) -> Result<(), BackendError> {
        Ok(self.mirror.remove(collection, id).await?)
    }
}

/// Pick the session backend: the remote mirror when someone is signed in,
/// a mirror is configured and auth is not bypassed; local storage otherwise
pub fn select_backend(
    identity: &dyn IdentityProvider,
    store: RecordStore,
    mirror: Option<Arc<dyn RemoteMirror>>,
    bypass_auth: bool,
) -> Arc<dyn PersistenceBackend> {
    match (identity.current_user_id(), mirror) {
        (Some(user_id), Some(mirror)) if !bypass_auth => {
            tracing::info!(user_id = %user_id, "using remote mirror for this session");
            Arc::new(RemoteBackend::new(mirror, user_id))
        }
        (Some(_), None) if !bypass_auth => {
            tracing::warn!("signed in but no remote configured, using local storage");
            Arc::new(LocalBackend::new(store))
        }
        _ => {
            tracing::debug!("using local storage for this session");
            Arc::new(LocalBackend::new(store))
        }
    }
}

/// Copy every local record collection into the remote mirror under `user_id`.
///
/// Local copies are kept. Running it twice duplicates remote documents.
/// Stops at the first failure, leaving earlier collections migrated, and
/// reports only whether everything succeeded.
pub async fn migrate_local_to_remote(
    store: &RecordStore,
    mirror: &dyn RemoteMirror,
    user_id: &str,
) -> bool {
    for collection in Collection::RECORDS {
        let records: Vec<Value> = store.load(collection);
        let total = records.len();

        for record in records {
            let Value::Object(mut document) = record else {
                tracing::warn!(collection = %collection, "skipping non-object record during migration");
                continue;
            };
            document.remove("id");
            if let Err(e) = mirror.insert(collection, document, user_id).await {
                tracing::error!(collection = %collection, error = %e, "migration to remote failed");
                return false;
            }
        }

        tracing::info!(collection = %collection, migrated = total, "collection migrated");
    }
    true
}
