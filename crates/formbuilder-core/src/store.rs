//! Storage abstraction
//!
//! Repository trait over the two-table layout plus an in-memory
//! implementation. The per-form response list doubles as the
//! `responses.form_uuid` index and fixes display order to insertion
//! order, which is creation order.

use async_trait::async_trait;
use dashmap::DashMap;
use thiserror::Error;
use uuid::Uuid;

use crate::model::{FormRecord, ResponseRecord};

/// Store result type
pub type StoreResult<T> = Result<T, StoreError>;

/// Storage errors
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// No form with the given UUID
    #[error("form not found: {0}")]
    FormNotFound(Uuid),

    /// Backend failure
    #[error("storage error: {0}")]
    Storage(String),
}

/// Form and response persistence
#[async_trait]
pub trait FormStore: Send + Sync {
    /// Persist a new form
    async fn insert_form(&self, form: FormRecord) -> StoreResult<()>;

    /// Fetch a form by UUID
    async fn get_form(&self, uuid: &Uuid) -> StoreResult<FormRecord>;

    /// Delete a form and, cascading, all of its responses
    async fn delete_form(&self, uuid: &Uuid) -> StoreResult<()>;

    /// Append a response; the referenced form must exist
    async fn insert_response(&self, response: ResponseRecord) -> StoreResult<()>;

    /// All responses for a form, creation order ascending
    async fn responses_for(&self, form_uuid: &Uuid) -> StoreResult<Vec<ResponseRecord>>;
}

/// In-memory store
pub struct MemoryStore {
    forms: DashMap<Uuid, FormRecord>,
    responses: DashMap<Uuid, Vec<ResponseRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            forms: DashMap::new(),
            responses: DashMap::new(),
        }
    }

    /// Number of stored forms
    pub fn form_count(&self) -> usize {
        self.forms.len()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FormStore for MemoryStore {
    async fn insert_form(&self, form: FormRecord) -> StoreResult<()> {
        self.responses.insert(form.uuid, Vec::new());
        self.forms.insert(form.uuid, form);
        Ok(())
    }

    async fn get_form(&self, uuid: &Uuid) -> StoreResult<FormRecord> {
        self.forms
            .get(uuid)
            .map(|entry| entry.value().clone())
            .ok_or(StoreError::FormNotFound(*uuid))
    }

    async fn delete_form(&self, uuid: &Uuid) -> StoreResult<()> {
        self.forms
            .remove(uuid)
            .ok_or(StoreError::FormNotFound(*uuid))?;
        self.responses.remove(uuid);
        Ok(())
    }

    async fn insert_response(&self, response: ResponseRecord) -> StoreResult<()> {
        let mut list = self
            .responses
            .get_mut(&response.form_uuid)
            .ok_or(StoreError::FormNotFound(response.form_uuid))?;
        list.push(response);
        Ok(())
    }

    async fn responses_for(&self, form_uuid: &Uuid) -> StoreResult<Vec<ResponseRecord>> {
        self.responses
            .get(form_uuid)
            .map(|entry| entry.value().clone())
            .ok_or(StoreError::FormNotFound(*form_uuid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn form() -> FormRecord {
        FormRecord::new("T", json!({"q": {"type": "text"}}), None, None)
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let store = MemoryStore::new();
        let record = form();
        let uuid = record.uuid;

        store.insert_form(record).await.unwrap();
        let fetched = store.get_form(&uuid).await.unwrap();
        assert_eq!(fetched.uuid, uuid);
        assert_eq!(fetched.title, "T");
    }

    #[tokio::test]
    async fn test_get_unknown_form() {
        let store = MemoryStore::new();
        let err = store.get_form(&Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, StoreError::FormNotFound(_)));
    }

    #[tokio::test]
    async fn test_responses_keep_insertion_order() {
        let store = MemoryStore::new();
        let record = form();
        let uuid = record.uuid;
        store.insert_form(record).await.unwrap();

        for i in 0..5 {
            store
                .insert_response(ResponseRecord::new(uuid, json!({"q": i})))
                .await
                .unwrap();
        }

        let responses = store.responses_for(&uuid).await.unwrap();
        let answers: Vec<_> = responses.iter().map(|r| r.response_data["q"].clone()).collect();
        assert_eq!(answers, vec![json!(0), json!(1), json!(2), json!(3), json!(4)]);
    }

    #[tokio::test]
    async fn test_response_requires_existing_form() {
        let store = MemoryStore::new();
        let err = store
            .insert_response(ResponseRecord::new(Uuid::new_v4(), json!({})))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::FormNotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_cascades_to_responses() {
        let store = MemoryStore::new();
        let record = form();
        let uuid = record.uuid;
        store.insert_form(record).await.unwrap();
        store
            .insert_response(ResponseRecord::new(uuid, json!({"q": "a"})))
            .await
            .unwrap();

        store.delete_form(&uuid).await.unwrap();
        assert_eq!(store.form_count(), 0);
        let err = store.responses_for(&uuid).await.unwrap_err();
        assert!(matches!(err, StoreError::FormNotFound(_)));
    }
}
