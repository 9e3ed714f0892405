//! Error types for the form builder

use thiserror::Error;
use uuid::Uuid;

use crate::password::PasswordError;
use crate::schema::SchemaError;
use crate::spreadsheet::SpreadsheetError;
use crate::store::StoreError;

/// Form builder error type
#[derive(Error, Debug)]
pub enum FormsError {
    /// Malformed input shape
    #[error("validation error: {0}")]
    Validation(String),

    /// Field-configuration rules violated
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Uploaded spreadsheet rejected
    #[error(transparent)]
    Spreadsheet(#[from] SpreadsheetError),

    /// Form or resource absent
    #[error("form not found: {0}")]
    FormNotFound(Uuid),

    /// Path parameter was not a UUID
    #[error("invalid form id: {0}")]
    InvalidUuid(String),

    /// Form past its expiry
    #[error("form has expired and no longer accepts responses")]
    FormExpired,

    /// Password-protected form viewed without a password
    #[error("password required to view responses")]
    PasswordRequired,

    /// Supplied password did not match
    #[error("invalid password")]
    InvalidPassword,

    /// Password hashing or verification failed
    #[error(transparent)]
    Password(#[from] PasswordError),

    /// Unexpected failure
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for FormsError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::FormNotFound(uuid) => FormsError::FormNotFound(uuid),
            StoreError::Storage(msg) => FormsError::Internal(msg),
        }
    }
}

/// Result type for the form builder
pub type FormsResult<T> = Result<T, FormsError>;
