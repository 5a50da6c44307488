//! Two-tier error design (§10.2): wraps `longbox_core::error::CoreError`
//! (and `anyhow::Error` for handler-local failures) and maps the §7
//! taxonomy onto the HTTP status/body rules of §6.

use std::fmt;

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use longbox_core::error::CoreError;
use serde::Serialize;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
    /// Set only for `Unauthenticated`, so the 401 response carries a
    /// `WWW-Authenticate` challenge per §6/§7.
    www_authenticate: bool,
}

#[derive(Serialize)]
struct ErrorBody {
    detail: String,
}

impl AppError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self { status, message: message.into(), www_authenticate: false }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self { status: StatusCode::UNAUTHORIZED, message: message.into(), www_authenticate: true }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody { detail: self.message });
        if self.www_authenticate {
            let mut response = (self.status, body).into_response();
            response.headers_mut().insert(header::WWW_AUTHENTICATE, "Bearer".parse().unwrap());
            return response;
        }
        (self.status, body).into_response()
    }
}

/// §7's taxonomy-to-status mapping. `BadArchive`/`Transient` are internal
/// boundaries that should never reach a handler; they're mapped
/// defensively to 500 rather than panicking if one ever does leak through.
impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NotFound(msg) => Self::not_found(msg),
            CoreError::Forbidden(msg) => Self::forbidden(msg),
            CoreError::Unauthenticated => Self::unauthenticated("authentication required"),
            CoreError::BadRequest(msg) => Self::bad_request(msg),
            CoreError::Conflict(msg) => Self::new(StatusCode::CONFLICT, msg),
            CoreError::BadArchive(_) | CoreError::Transient(_) => {
                tracing::error!(error = %err, "internal-only error reached the HTTP layer");
                Self::internal("internal error")
            }
            CoreError::Io(_) | CoreError::Database(_) | CoreError::Serialization(_) | CoreError::Xml(_) => {
                tracing::error!(error = %err, "fatal error");
                Self::internal("internal error")
            }
            CoreError::Internal(msg) => {
                tracing::error!(%msg, "internal error");
                Self::internal("internal error")
            }
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        tracing::error!(error = %err, "unhandled error");
        Self::internal(err.to_string())
    }
}
