//! Conversion of application errors into HTTP responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use kasa_db::LedgerRepoError;
use kasa_shared::AppError;
use serde_json::json;
use tracing::error;

/// Error returned by handlers. Serializes as `{"error": CODE, "message": text}`.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<LedgerRepoError> for ApiError {
    fn from(err: LedgerRepoError) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let message = if self.0.is_internal() {
            error!(error = %self.0, code = self.0.error_code(), "Request failed");
            "An internal error occurred".to_string()
        } else {
            self.0.to_string()
        };
        (
            status,
            Json(json!({
                "error": self.0.error_code(),
                "message": message
            })),
        )
            .into_response()
    }
}

/// Handler result.
pub type ApiResult<T> = Result<T, ApiError>;
