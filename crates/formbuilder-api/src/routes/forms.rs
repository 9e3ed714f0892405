//! Form endpoints
//!
//! UUID path parameters are taken as `String` and parsed explicitly so a
//! malformed id maps to 400 rather than a framework rejection.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::ApiError;
use crate::AppState;
use formbuilder_core::error::FormsError;
use formbuilder_core::service::NewForm;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/create-form", post(create_form))
        .route("/upload-file", post(upload_form))
        .route("/upload-form", post(upload_form))
        .route("/form/:uuid", get(get_form))
        .route("/submit-form/:uuid", post(submit_form))
        .route("/view-responses/:uuid", get(view_responses))
}

fn parse_uuid(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| FormsError::InvalidUuid(raw.to_string()).into())
}

#[derive(Deserialize)]
pub struct CreateFormRequest {
    pub title: String,
    pub fields: Value,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub expiry: Option<DateTime<Utc>>,
}

/// Create a form from a schema document
pub async fn create_form(
    State(state): State<AppState>,
    Json(req): Json<CreateFormRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let uuid = state
        .service
        .create_form(NewForm {
            title: req.title,
            fields: req.fields,
            password: req.password,
            expiry: req.expiry,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(json!({ "uuid": uuid }))))
}

/// Create a form from an uploaded spreadsheet.
///
/// Multipart parts: `file` (required), `title` (required), `password`
/// and `expiry` (optional, RFC 3339).
pub async fn upload_form(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut file: Option<Vec<u8>> = None;
    let mut title: Option<String> = None;
    let mut password: Option<String> = None;
    let mut expiry: Option<DateTime<Utc>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| FormsError::Validation(format!("malformed multipart payload: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| FormsError::Validation(format!("failed to read file: {e}")))?;
                file = Some(bytes.to_vec());
            }
            "title" => title = Some(read_text(field).await?),
            "password" => password = Some(read_text(field).await?),
            "expiry" => {
                let raw = read_text(field).await?;
                expiry = Some(raw.parse().map_err(|_| {
                    FormsError::Validation("expiry must be an RFC 3339 timestamp".into())
                })?);
            }
            _ => {}
        }
    }

    let file = file.ok_or_else(|| FormsError::Validation("missing `file` part".into()))?;
    let title = title.ok_or_else(|| FormsError::Validation("missing `title` part".into()))?;

    let (uuid, fields) = state
        .service
        .create_form_from_spreadsheet(&title, password, expiry, &file)
        .await?;
    Ok((StatusCode::CREATED, Json(json!({ "uuid": uuid, "fields": fields }))))
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String, ApiError> {
    field
        .text()
        .await
        .map_err(|e| FormsError::Validation(format!("malformed multipart payload: {e}")).into())
}

/// Fetch a form with its normalized schema
pub async fn get_form(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let uuid = parse_uuid(&raw)?;
    let details = state.service.get_form(uuid).await?;
    Ok(Json(details))
}

#[derive(Deserialize)]
pub struct SubmitRequest {
    pub response_data: Value,
}

/// Record a submission
pub async fn submit_form(
    State(state): State<AppState>,
    Path(raw): Path<String>,
    Json(req): Json<SubmitRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let uuid = parse_uuid(&raw)?;
    if !req.response_data.is_object() {
        return Err(FormsError::Validation("response_data must be a mapping".into()).into());
    }
    let record = state.service.submit_response(uuid, req.response_data).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

#[derive(Deserialize)]
pub struct ViewParams {
    pub password: Option<String>,
}

/// Password-gated view of a form's responses
pub async fn view_responses(
    State(state): State<AppState>,
    Path(raw): Path<String>,
    Query(params): Query<ViewParams>,
) -> Result<impl IntoResponse, ApiError> {
    let uuid = parse_uuid(&raw)?;
    let view = state.service.view_responses(uuid, params.password).await?;
    Ok(Json(view))
}
