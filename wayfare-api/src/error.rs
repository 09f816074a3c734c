use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use wayfare_core::CoreError;

/// Boundary wrapper over the domain error taxonomy. Handlers bubble
/// `CoreError` with `?`; this maps each kind onto an HTTP status and the
/// `{"status", "message"}` envelope the client expects.
#[derive(Debug)]
pub struct AppError(pub CoreError);

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        Self(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self.0 {
            CoreError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            CoreError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            CoreError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            CoreError::InvalidState(msg) => (StatusCode::BAD_REQUEST, msg),
            CoreError::GatewayUnavailable(msg) => {
                tracing::error!("payment gateway unavailable: {}", msg);
                (
                    StatusCode::BAD_GATEWAY,
                    "payment gateway unavailable".to_string(),
                )
            }
            CoreError::Internal(msg) => {
                tracing::error!("internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "status": if status.is_server_error() { "error" } else { "fail" },
            "message": message,
        }));

        (status, body).into_response()
    }
}
