use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::error::AppError;

use super::store::StorageManager;

/// Collection name for a tenant. Injective as long as usernames stay within
/// the validated charset, so no two tenants can share an index table.
pub fn collection_name(username: &str) -> String {
    format!("user_{username}")
}

/// One question/answer exchange, persisted as a chat artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRecord {
    pub id: String,
    pub question: String,
    pub answer: String,
    pub created_at: DateTime<Utc>,
}

impl ChatRecord {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            question: question.into(),
            answer: answer.into(),
            created_at: Utc::now(),
        }
    }
}

/// Maps a username onto its isolated storage namespace.
///
/// All tenant files live below `users/<username>/`; documents and chat
/// artifacts get their own sub-prefixes. Prefixes are derived, never stored,
/// and creation is lazy on first write.
#[derive(Clone)]
pub struct WorkspaceManager {
    store: StorageManager,
}

impl WorkspaceManager {
    pub fn new(store: StorageManager) -> Self {
        Self { store }
    }

    fn documents_prefix(username: &str) -> String {
        format!("users/{username}/documents")
    }

    fn chat_prefix(username: &str) -> String {
        format!("users/{username}/chat")
    }

    fn tenant_prefix(username: &str) -> String {
        format!("users/{username}")
    }

    fn document_location(username: &str, filename: &str) -> String {
        format!("{}/{}", Self::documents_prefix(username), filename)
    }

    /// Persist a raw uploaded document, overwriting any same-named one.
    pub async fn store_document(
        &self,
        username: &str,
        filename: &str,
        bytes: Bytes,
    ) -> Result<(), AppError> {
        self.store
            .put(&Self::document_location(username, filename), bytes)
            .await
    }

    pub async fn list_documents(&self, username: &str) -> Result<Vec<String>, AppError> {
        let prefix = Self::documents_prefix(username);
        let mut filenames: Vec<String> = self
            .store
            .list(&prefix)
            .await?
            .into_iter()
            .filter_map(|location| {
                location
                    .strip_prefix(&format!("{prefix}/"))
                    .map(str::to_owned)
            })
            .collect();
        filenames.sort();

        Ok(filenames)
    }

    pub async fn delete_document(&self, username: &str, filename: &str) -> Result<(), AppError> {
        let location = Self::document_location(username, filename);
        match self.store.delete(&location).await {
            Err(AppError::ObjectStore(object_store::Error::NotFound { .. })) => {
                Err(AppError::NotFound(format!("document '{filename}'")))
            }
            other => other,
        }
    }

    pub async fn store_chat_artifact(
        &self,
        username: &str,
        record: &ChatRecord,
    ) -> Result<(), AppError> {
        let location = format!("{}/{}.json", Self::chat_prefix(username), record.id);
        let json = serde_json::to_vec_pretty(record)?;
        self.store.put(&location, Bytes::from(json)).await
    }

    /// Recursively remove all tenant storage. Callers treat this as
    /// best-effort during user deletion and log failures instead of
    /// propagating them.
    pub async fn destroy(&self, username: &str) -> Result<(), AppError> {
        self.store
            .delete_prefix(&Self::tenant_prefix(username))
            .await?;
        info!(%username, "removed tenant workspace");

        Ok(())
    }
}
