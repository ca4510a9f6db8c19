use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::geo::ResolveError;
use crate::store::StoreError;

/// Reason code returned when a claim loses the race.
pub const ORDER_ALREADY_TAKEN: &str = "ORDER_ALREADY_BEEN_TAKEN";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("order {0} already taken")]
    AlreadyTaken(i64),

    #[error("distance unavailable: {0}")]
    DistanceUnavailable(String),

    #[error("distance service failed: {0}")]
    Upstream(String),

    #[error("storage error: {0}")]
    Storage(#[from] StoreError),

    #[error("json encoding failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ResolveError> for AppError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::Unavailable(msg) => AppError::DistanceUnavailable(msg),
            ResolveError::Upstream(msg) => AppError::Upstream(msg),
        }
    }
}

impl AppError {
    /// Status code and the fixed caller-facing message. Internal detail never
    /// leaves the process.
    pub fn status_and_message(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "Bad Request"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "Not Found"),
            AppError::AlreadyTaken(_) => (StatusCode::CONFLICT, ORDER_ALREADY_TAKEN),
            AppError::DistanceUnavailable(_) | AppError::Upstream(_) | AppError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
            }
            AppError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Database Error"),
            AppError::Serialization(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "JSON Marshalling Error")
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, "request rejected");
        }

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_each_kind_to_fixed_wire_message() {
        let cases = [
            (AppError::BadRequest("x".into()), 400, "Bad Request"),
            (AppError::NotFound("x".into()), 404, "Not Found"),
            (AppError::AlreadyTaken(1), 409, "ORDER_ALREADY_BEEN_TAKEN"),
            (AppError::DistanceUnavailable("x".into()), 500, "Internal Server Error"),
            (AppError::Upstream("x".into()), 500, "Internal Server Error"),
            (AppError::Storage(StoreError::Backend("x".into())), 500, "Database Error"),
        ];

        for (err, code, message) in cases {
            let (status, body) = err.status_and_message();
            assert_eq!(status.as_u16(), code);
            assert_eq!(body, message);
        }
    }

    #[test]
    fn json_failures_use_marshalling_message() {
        let err = serde_json::from_str::<u8>("nope").unwrap_err();
        let (status, message) = AppError::from(err).status_and_message();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(message, "JSON Marshalling Error");
    }
}
