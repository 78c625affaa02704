//! API error responses.
//!
//! Every failure renders as `{error, message, detail}` with the status code of
//! the underlying engine error. Storage failures are logged and reported as a
//! generic internal error.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use beneficio_core::EngineError;
use beneficio_db::LedgerStoreError;
use beneficio_shared::{AppError, FixedParseError};
use serde_json::{Value, json};
use tracing::error;

/// Result alias for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

/// Error returned by handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Rejected by the ledger, or failed in storage.
    #[error(transparent)]
    Ledger(#[from] LedgerStoreError),

    /// Malformed request detected before reaching the ledger.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Request could not be decoded.
    #[error(transparent)]
    App(#[from] AppError),
}

impl From<FixedParseError> for ApiError {
    fn from(err: FixedParseError) -> Self {
        Self::Engine(err.into())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::App(AppError::Validation(rejection.body_text()))
    }
}

fn status(code: u16) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

fn engine_response(err: &EngineError) -> Response {
    let code = status(err.http_status_code());
    if code.is_server_error() {
        error!(error = %err, "ledger request failed");
        return internal();
    }

    let detail = err.detail();
    let dependents = detail.get("dependents").cloned();
    let mut body = json!({
        "error": err.error_code(),
        "message": err.to_string(),
        "detail": detail,
    });
    if let Some(dependents) = dependents {
        body["dependents"] = dependents;
    }
    (code, Json(body)).into_response()
}

fn internal() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "error": "InternalError",
            "message": "An internal error occurred",
            "detail": Value::Null,
        })),
    )
        .into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::Ledger(err) => engine_response(&err.into_engine()),
            Self::Engine(err) => engine_response(&err),
            Self::App(err) => {
                let code = status(err.status_code());
                if code.is_server_error() {
                    error!(error = %err, "request failed");
                    return internal();
                }
                (
                    code,
                    Json(json!({
                        "error": err.error_code(),
                        "message": err.to_string(),
                        "detail": Value::Null,
                    })),
                )
                    .into_response()
            }
        }
    }
}
