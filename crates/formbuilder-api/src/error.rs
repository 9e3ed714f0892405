//! Domain-error-to-HTTP mapping
//!
//! Every domain error is recovered here and turned into a status code
//! plus a `{"code", "message"}` JSON body. A missing view password maps
//! to 401 (authentication required), as does a wrong one.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use formbuilder_core::error::FormsError;
use formbuilder_core::spreadsheet::SpreadsheetError;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Error body returned to clients
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Stable machine-readable code
    pub code: &'static str,
    /// Human-readable message
    pub message: String,
}

/// API-boundary error wrapper
#[derive(Debug, Error)]
#[error(transparent)]
pub struct ApiError(#[from] pub FormsError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self.0 {
            FormsError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            FormsError::Schema(_) => (StatusCode::BAD_REQUEST, "schema_error"),
            FormsError::Spreadsheet(SpreadsheetError::UnsupportedFormat(_)) => {
                (StatusCode::BAD_REQUEST, "unsupported_format")
            }
            FormsError::Spreadsheet(_) => (StatusCode::BAD_REQUEST, "spreadsheet_error"),
            FormsError::InvalidUuid(_) => (StatusCode::BAD_REQUEST, "invalid_uuid"),
            FormsError::FormExpired => (StatusCode::BAD_REQUEST, "form_expired"),
            FormsError::FormNotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            FormsError::PasswordRequired => (StatusCode::UNAUTHORIZED, "password_required"),
            FormsError::InvalidPassword => (StatusCode::UNAUTHORIZED, "invalid_password"),
            FormsError::Password(_) | FormsError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
            }
        };

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(error = %self.0, "request failed");
            "internal error".to_string()
        } else {
            self.0.to_string()
        };

        (status, Json(ErrorBody { code, message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: FormsError) -> StatusCode {
        ApiError(err).into_response().status()
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_of(FormsError::Validation("x".into())), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(FormsError::FormExpired), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(FormsError::InvalidUuid("x".into())), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_of(FormsError::FormNotFound(uuid::Uuid::new_v4())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(status_of(FormsError::PasswordRequired), StatusCode::UNAUTHORIZED);
        assert_eq!(status_of(FormsError::InvalidPassword), StatusCode::UNAUTHORIZED);
        assert_eq!(
            status_of(FormsError::Internal("x".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_wrapper_is_transparent() {
        let err = ApiError::from(FormsError::FormExpired);
        assert_eq!(err.to_string(), FormsError::FormExpired.to_string());
    }
}
