//! API routes

pub mod forms;
pub mod health;

use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health::health_check))
        .merge(forms::router())
}

/// Service banner
async fn root() -> Json<Value> {
    Json(json!({ "message": "Form Builder API" }))
}
