pub mod discover;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};

/// `{"error": message}` with the given status.
pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(serde_json::json!({ "error": message.into() })),
    )
        .into_response()
}
