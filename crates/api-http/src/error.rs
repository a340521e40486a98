//! HTTP Error Mapping
//!
//! Maps application errors to status codes and JSON bodies. Internal details
//! are logged, never returned.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tfdeploy_core::domain::DomainError;
use tfdeploy_core::error::AppError;
use tracing::error;

use crate::types::ErrorBody;

pub const JOB_NOT_FOUND: &str = "job not found";
pub const INVALID_SECRET: &str = "invalid agent secret";
pub const INTERNAL_ERROR: &str = "Internal server error";

#[derive(Error, Debug)]
pub enum ApiError {
    /// Malformed body or missing fields, before the core sees the request
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("unauthorized")]
    Unauthorized,

    /// Unknown id on the status endpoint
    #[error("job not found")]
    JobNotFound,

    #[error(transparent)]
    App(#[from] AppError),
}

/// Status code for an application error
pub fn status_for(err: &AppError) -> StatusCode {
    match err {
        AppError::Validation(_) => StatusCode::BAD_REQUEST,
        AppError::Domain(DomainError::ValidationError(_)) => StatusCode::BAD_REQUEST,
        AppError::NotFound(_) => StatusCode::NOT_FOUND,
        AppError::Conflict(_) => StatusCode::CONFLICT,
        AppError::QuotaExceeded(_) => StatusCode::FORBIDDEN,
        AppError::QuotaUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        AppError::Domain(_) | AppError::Io(_) | AppError::Execution(_) | AppError::Internal(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Caller-facing message: the error's own text for client errors, a generic one otherwise
fn public_message(err: &AppError) -> String {
    match err {
        AppError::Validation(msg)
        | AppError::NotFound(msg)
        | AppError::Conflict(msg)
        | AppError::QuotaExceeded(msg) => msg.clone(),
        AppError::Domain(DomainError::ValidationError(msg)) => msg.clone(),
        AppError::QuotaUnavailable(_) => "Quota check unavailable, try again later".to_string(),
        _ => INTERNAL_ERROR.to_string(),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, Json(ErrorBody::new(msg))).into_response()
            }
            ApiError::Unauthorized => {
                (StatusCode::UNAUTHORIZED, Json(ErrorBody::new(INVALID_SECRET))).into_response()
            }
            ApiError::JobNotFound => {
                (StatusCode::NOT_FOUND, Json(json!({ "error": JOB_NOT_FOUND }))).into_response()
            }
            ApiError::App(err) => {
                let status = status_for(&err);
                if status.is_server_error() {
                    error!(error = %err, status = %status.as_u16(), "Request failed");
                }
                (status, Json(ErrorBody::new(public_message(&err)))).into_response()
            }
        }
    }
}
