//! Form Builder Core
//!
//! Domain layer for the form builder backend: the dynamic field-schema
//! model, the response reconciliation engine, spreadsheet ingestion,
//! password hashing, and the storage abstraction.
//!
//! A form is a small per-form schema: an ordered mapping of field names to
//! typed configurations (text, image, dropdown, multiselect, slider).
//! Responses are stored as submitted and normalized on read, so payloads
//! recorded under older schema revisions keep working.

pub mod error;
pub mod model;
pub mod password;
pub mod reconcile;
pub mod schema;
pub mod service;
pub mod spreadsheet;
pub mod store;

pub use error::{FormsError, FormsResult};
pub use model::{FormRecord, ResponseRecord};
pub use password::PasswordHasher;
pub use reconcile::{DisplayField, ResponseValue, ViewResult};
pub use schema::{FieldConfig, FieldKind, SubQuestion};
pub use service::{FormService, NewForm};
pub use store::{FormStore, MemoryStore};
