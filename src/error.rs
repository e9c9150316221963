//! Typed errors and HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Misconfiguration of presenters or their configuration store. Always fatal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("no presenter registered for '{record_type}'")]
    MissingPresenter { record_type: String },
    #[error("cannot override nested value '{key}'")]
    NestedOverride { key: String },
    #[error("cannot override inheritable array '{key}' once set")]
    ArrayOverride { key: String },
    #[error("key '{key}' already holds a value of another kind")]
    KindMismatch { key: String },
    #[error("missing key: {0}")]
    MissingKey(String),
    #[error("presenter registry is finalized")]
    RegistryFinalized,
    #[error("validation: {0}")]
    Validation(String),
}

/// Failure reported by the query layer behind a [`Scope`](crate::scope::Scope).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("query: {0}")]
pub struct ScopeError(pub String);

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Query(#[from] ScopeError),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("bad request: {0}")]
    BadRequest(String),
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl AppError {
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error"),
            AppError::Query(_) => (StatusCode::INTERNAL_SERVER_ERROR, "query_error"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            tracing::error!(error = %self, code, "presenting failed");
        }
        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
                details: None,
            },
        };
        (status, Json(body)).into_response()
    }
}
