//! Persisted records
//!
//! Mirrors the relational layout: a `forms` table keyed by UUID and a
//! `responses` table with a cascade-deleting foreign key on `form_uuid`.
//! The field schema and the response payload are JSON documents; their
//! interpretation lives in [`crate::schema`] and [`crate::reconcile`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// One stored form
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormRecord {
    /// Primary key, generated at creation and immutable afterwards
    pub uuid: Uuid,
    /// Display title
    pub title: String,
    /// Field schema: mapping of field name to configuration, insertion-ordered
    pub fields: Value,
    /// Argon2id PHC string; `None` means the form is open
    pub password_hash: Option<String>,
    /// Submissions are rejected after this instant
    pub expiry: Option<DateTime<Utc>>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last-modified timestamp
    pub updated_at: DateTime<Utc>,
}

impl FormRecord {
    /// Create a new form record with a fresh UUID
    pub fn new(
        title: &str,
        fields: Value,
        password_hash: Option<String>,
        expiry: Option<DateTime<Utc>>,
    ) -> Self {
        let now = Utc::now();
        Self {
            uuid: Uuid::new_v4(),
            title: title.to_string(),
            fields,
            password_hash,
            expiry,
            created_at: now,
            updated_at: now,
        }
    }
}

/// One stored response to a form
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseRecord {
    /// Primary key
    pub id: Uuid,
    /// Owning form; deleting the form deletes its responses
    pub form_uuid: Uuid,
    /// Submitted payload, stored exactly as received
    pub response_data: Value,
    /// Creation timestamp; display order is ascending on this
    pub created_at: DateTime<Utc>,
}

impl ResponseRecord {
    /// Create a new response record with a fresh UUID
    pub fn new(form_uuid: Uuid, response_data: Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            form_uuid,
            response_data,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_form_record_creation() {
        let form = FormRecord::new("Survey", json!({"q1": {"type": "text"}}), None, None);

        assert_eq!(form.title, "Survey");
        assert!(form.password_hash.is_none());
        assert_eq!(form.created_at, form.updated_at);
    }

    #[test]
    fn test_response_record_references_form() {
        let form = FormRecord::new("Survey", json!({}), None, None);
        let response = ResponseRecord::new(form.uuid, json!({"q1": "yes"}));

        assert_eq!(response.form_uuid, form.uuid);
        assert_ne!(response.id, form.uuid);
    }
}
