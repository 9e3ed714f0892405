//! Form service
//!
//! Orchestrates the lifecycle operations over the store: create (from a
//! schema document or an uploaded spreadsheet), fetch, submit, view.
//! Owns the password hasher; handlers never see hashes or plaintext
//! beyond the request boundary.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::error::{FormsError, FormsResult};
use crate::model::{FormRecord, ResponseRecord};
use crate::password::PasswordHasher;
use crate::reconcile::{self, ViewResult};
use crate::schema::{self, FieldConfig};
use crate::spreadsheet;
use crate::store::FormStore;

/// Payload of a schema-based create
#[derive(Debug, Clone)]
pub struct NewForm {
    /// Display title, must be non-blank
    pub title: String,
    /// Raw `fields` document; any historical shape accepted
    pub fields: Value,
    /// Plaintext password; hashed before persistence
    pub password: Option<String>,
    /// Optional submission deadline
    pub expiry: Option<DateTime<Utc>>,
}

/// A form as returned to clients, with canonical typed fields
#[derive(Debug, Clone, Serialize)]
pub struct FormDetails {
    /// Form UUID
    pub uuid: Uuid,
    /// Display title
    pub title: String,
    /// Normalized field schema, insertion-ordered
    pub fields: IndexMap<String, FieldConfig>,
    /// Submission deadline, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Application service over the store
pub struct FormService {
    store: Arc<dyn FormStore>,
    hasher: PasswordHasher,
}

impl FormService {
    pub fn new(store: Arc<dyn FormStore>, hasher: PasswordHasher) -> Self {
        Self { store, hasher }
    }

    /// Create a form from a schema document. Fields are normalized
    /// strictly; the stored document is the canonical shape.
    pub async fn create_form(&self, new_form: NewForm) -> FormsResult<Uuid> {
        let fields = schema::normalize_fields(&new_form.fields)?;
        self.persist_form(&new_form.title, fields, new_form.password, new_form.expiry)
            .await
            .map(|(uuid, _)| uuid)
    }

    /// Create a form from an uploaded spreadsheet, returning the derived
    /// schema alongside the UUID.
    pub async fn create_form_from_spreadsheet(
        &self,
        title: &str,
        password: Option<String>,
        expiry: Option<DateTime<Utc>>,
        data: &[u8],
    ) -> FormsResult<(Uuid, IndexMap<String, FieldConfig>)> {
        let fields = spreadsheet::fields_from_upload(data)?;
        self.persist_form(title, fields, password, expiry).await
    }

    /// Fetch a form with its normalized schema
    pub async fn get_form(&self, uuid: Uuid) -> FormsResult<FormDetails> {
        let form = self.store.get_form(&uuid).await?;
        // Legacy rows normalize on read; one shape everywhere.
        let fields = schema::normalize_fields(&form.fields)?;
        Ok(FormDetails {
            uuid: form.uuid,
            title: form.title,
            fields,
            expiry: form.expiry,
            created_at: form.created_at,
        })
    }

    /// Record a submission. The expiry gate runs before anything is
    /// written; payload contents are stored as received.
    pub async fn submit_response(
        &self,
        form_uuid: Uuid,
        response_data: Value,
    ) -> FormsResult<ResponseRecord> {
        let form = self.store.get_form(&form_uuid).await?;
        reconcile::validate_submission(&form, Utc::now())?;

        let record = ResponseRecord::new(form_uuid, response_data);
        self.store.insert_response(record.clone()).await?;
        info!(form_uuid = %form_uuid, response_id = %record.id, "response recorded");
        Ok(record)
    }

    /// Password-gated display view of a form and its responses
    pub async fn view_responses(
        &self,
        form_uuid: Uuid,
        password: Option<String>,
    ) -> FormsResult<ViewResult> {
        let form = self.store.get_form(&form_uuid).await?;
        let responses = self.store.responses_for(&form_uuid).await?;
        reconcile::reconcile_for_display(&form, password.as_deref(), &responses, &self.hasher)
    }

    /// Delete a form, cascading to its responses
    pub async fn delete_form(&self, form_uuid: Uuid) -> FormsResult<()> {
        self.store.delete_form(&form_uuid).await?;
        info!(form_uuid = %form_uuid, "form deleted");
        Ok(())
    }

    async fn persist_form(
        &self,
        title: &str,
        fields: IndexMap<String, FieldConfig>,
        password: Option<String>,
        expiry: Option<DateTime<Utc>>,
    ) -> FormsResult<(Uuid, IndexMap<String, FieldConfig>)> {
        let title = title.trim();
        if title.is_empty() {
            return Err(FormsError::Validation("form title must not be empty".into()));
        }
        if fields.is_empty() {
            return Err(FormsError::Validation(
                "form needs at least one field".into(),
            ));
        }

        let password_hash = match password.as_deref().filter(|p| !p.is_empty()) {
            Some(plaintext) => Some(self.hasher.hash(plaintext)?),
            None => None,
        };

        let document = serde_json::to_value(&fields)
            .map_err(|e| FormsError::Internal(format!("failed to encode fields: {e}")))?;
        let record = FormRecord::new(title, document, password_hash, expiry);
        let uuid = record.uuid;
        let protected = record.password_hash.is_some();
        self.store.insert_form(record).await?;
        info!(form_uuid = %uuid, title, protected, "form created");
        Ok((uuid, fields))
    }
}
