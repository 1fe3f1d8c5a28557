use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::store::StoreError;

// ===== Error Handling =====

#[derive(Debug)]
pub enum AppError {
    InvalidInput(String),
    NotFound(String),
    AlreadyExists(String),
    StoreUnavailable(StoreError),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => AppError::NotFound(format!("no such {what}")),
            StoreError::AlreadyExists(name) => AppError::AlreadyExists(format!("{name} already exists")),
            other => AppError::StoreUnavailable(other),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidInput(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::InvalidInput(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::InvalidInput(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, json!({ "error": msg })),
            AppError::AlreadyExists(msg) => (StatusCode::CONFLICT, json!({ "error": msg })),
            AppError::StoreUnavailable(err) => {
                tracing::error!("Store error: {:?}", err);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    json!({ "error": "store unavailable", "retry": true }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
