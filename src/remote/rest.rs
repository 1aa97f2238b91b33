use async_trait::async_trait;
use reqwest::{Client, StatusCode, header};
use serde_json::Value;
use std::time::Duration;

use super::{Document, RemoteError, RemoteMirror, USER_ID_FIELD};
use crate::config::RemoteConfig;
use crate::store::Collection;

/// HTTP client for a PostgREST-style document API.
///
/// Each collection is a table at `<base_url>/rest/v1/<table>`; rows are the
/// record's own fields plus `userId`.
pub struct RestRemote {
    base_url: String,
    client: Client,
}

impl RestRemote {
    pub fn new(config: &RemoteConfig) -> Result<Self, RemoteError> {
        let mut headers = header::HeaderMap::new();
        if let Some(ref api_key) = config.api_key {
            let bearer = header::HeaderValue::from_str(&format!("Bearer {}", api_key))
                .map_err(|e| RemoteError::Unavailable(format!("invalid API key: {e}")))?;
            let key = header::HeaderValue::from_str(api_key)
                .map_err(|e| RemoteError::Unavailable(format!("invalid API key: {e}")))?;
            headers.insert(header::AUTHORIZATION, bearer);
            headers.insert("apikey", key);
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn table_url(&self, collection: Collection) -> String {
        format!("{}/rest/v1/{}", self.base_url, collection.remote_table())
    }

    fn row_url(&self, collection: Collection, id: &str) -> String {
        format!(
            "{}?id=eq.{}",
            self.table_url(collection),
            urlencoding::encode(id)
        )
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, RemoteError> {
        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(RemoteError::Unauthorized),
            StatusCode::NOT_FOUND => Err(RemoteError::NotFound(response.url().path().to_string())),
            status if !status.is_success() => {
                let message = response.text().await.unwrap_or_default();
                Err(RemoteError::Server {
                    status: status.as_u16(),
                    message,
                })
            }
            _ => Ok(response),
        }
    }
}

#[async_trait]
impl RemoteMirror for RestRemote {
    async fn fetch_all(&self, collection: Collection, user_id: &str) -> Result<Vec<Value>, RemoteError> {
        let url = format!(
            "{}?{}=eq.{}&select=*",
            self.table_url(collection),
            USER_ID_FIELD,
            urlencoding::encode(user_id)
        );
        let response = Self::check(self.client.get(&url).send().await?).await?;
        let rows: Vec<Value> = response.json().await?;
        tracing::debug!(collection = %collection, count = rows.len(), "fetched remote collection");
        Ok(rows)
    }

    async fn insert(
        &self,
        collection: Collection,
        mut record: Document,
        user_id: &str,
    ) -> Result<String, RemoteError> {
        record.remove("id");
        record.insert(USER_ID_FIELD.into(), Value::String(user_id.to_string()));

        let response = self
            .client
            .post(self.table_url(collection))
            .header("Prefer", "return=representation")
            .json(&record)
            .send()
            .await?;
        let rows: Vec<Value> = Self::check(response).await?.json().await?;

        let id = rows
            .first()
            .and_then(|row| row.get("id"))
            .and_then(|id| match id {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .ok_or_else(|| RemoteError::InvalidResponse("insert returned no id".into()))?;
        Ok(id)
    }

    async fn update(&self, collection: Collection, id: &str, mut patch: Document) -> Result<(), RemoteError> {
        patch.remove("id");
        patch.remove(USER_ID_FIELD);
        let response = self
            .client
            .patch(self.row_url(collection, id))
            .json(&patch)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn remove(&self, collection: Collection, id: &str) -> Result<(), RemoteError> {
        let response = self.client.delete(self.row_url(collection, id)).send().await?;
        Self::check(response).await?;
        Ok(())
    }
}
