//! Response bodies and the mapping from account error kinds to HTTP statuses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use signbook_core::accounts::{AccountError, ErrorKind};
use tracing::error;

/// `{success, message}` body used by signup, login and reset.
#[derive(Debug, Serialize)]
pub struct StatusReply {
    pub success: bool,
    pub message: &'static str,
}

/// `{found, message}` body used by identity verification.
#[derive(Debug, Serialize)]
pub struct LookupReply {
    pub found: bool,
    pub message: &'static str,
}

/// `{message}` body for failures of routes that return bare data on success.
#[derive(Debug, Serialize)]
pub struct MessageReply {
    pub message: &'static str,
}

impl StatusReply {
    pub fn ok(status: StatusCode, message: &'static str) -> Response {
        (
            status,
            Json(Self {
                success: true,
                message,
            }),
        )
            .into_response()
    }

    pub fn failure(err: &AccountError, message: &'static str) -> Response {
        (
            status_for(err),
            Json(Self {
                success: false,
                message,
            }),
        )
            .into_response()
    }
}

impl LookupReply {
    pub fn found(message: &'static str) -> Response {
        (
            StatusCode::OK,
            Json(Self {
                found: true,
                message,
            }),
        )
            .into_response()
    }

    pub fn failure(err: &AccountError, message: &'static str) -> Response {
        (
            status_for(err),
            Json(Self {
                found: false,
                message,
            }),
        )
            .into_response()
    }
}

impl MessageReply {
    pub fn failure(err: &AccountError, message: &'static str) -> Response {
        (status_for(err), Json(Self { message })).into_response()
    }
}

/// Status for an account error. Storage failures are logged here, once.
pub fn status_for(err: &AccountError) -> StatusCode {
    match err.kind() {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::InvalidCredentials => StatusCode::UNAUTHORIZED,
        ErrorKind::StorageRead | ErrorKind::StorageWrite => {
            error!(error = %err, "storage failure while handling request");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}
