//! Form Builder API
//!
//! Axum front end over `formbuilder-core`: thin request handlers, a
//! domain-error-to-status mapping, and permissive (but restrictable)
//! CORS. All state is the shared [`FormService`]; handlers hold no state
//! of their own.

pub mod config;
pub mod error;
pub mod routes;

use axum::http::HeaderValue;
use axum::Router;
use formbuilder_core::FormService;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Domain service
    pub service: Arc<FormService>,
}

impl AppState {
    pub fn new(service: FormService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}

/// Build the router. `allowed_origin` restricts CORS to one origin;
/// `None` allows any, matching the original deployment's open middleware.
pub fn build_router(state: AppState, allowed_origin: Option<HeaderValue>) -> Router {
    let cors = match allowed_origin {
        Some(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_methods(Any)
            .allow_headers(Any),
        None => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    };

    routes::router()
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
