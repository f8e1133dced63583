//! Error types for backoffice-api

use axum::Json;
use axum::response::{IntoResponse, Response};
use http::StatusCode;
use serde_json::json;
use thiserror::Error;

use backoffice_auth::AuthError;

/// Result type alias for backoffice-api operations
pub type Result<T> = std::result::Result<T, ApiError>;

/// Message returned for every internal failure.
pub const INTERNAL_MESSAGE: &str = "Internal server error";

/// Request-level failures, each mapped to one HTTP status.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ApiError {
    /// No verifiable principal.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The principal lacks both scopes of the required base permission.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Absent, or excluded by the caller's ownership scope.
    #[error("not found")]
    NotFound,

    /// Malformed create/update input.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A unique field or a reference would be violated.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Repository or infrastructure failure; detail stays server-side.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// The HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code used in the `error` field.
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Unauthorized(_) => "unauthorized",
            ApiError::Forbidden(_) => "forbidden",
            ApiError::NotFound => "not_found",
            ApiError::Validation(_) => "validation_error",
            ApiError::Conflict(_) => "conflict",
            ApiError::Internal(_) => "internal_error",
        }
    }

    /// The message shown to the caller.
    pub fn public_message(&self) -> String {
        match self {
            ApiError::Unauthorized(m)
            | ApiError::Forbidden(m)
            | ApiError::Validation(m)
            | ApiError::Conflict(m) => m.clone(),
            ApiError::NotFound => "Not found".to_string(),
            ApiError::Internal(_) => INTERNAL_MESSAGE.to_string(),
        }
    }

    /// Shorthand for [`ApiError::Validation`].
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }

    /// Shorthand for [`ApiError::Internal`].
    pub fn internal(detail: impl std::fmt::Display) -> Self {
        ApiError::Internal(detail.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(detail) = &self {
            log::error!("internal error: {detail}");
        }
        let body = json!({
            "error": self.code(),
            "message": self.public_message(),
        });
        (self.status(), Json(body)).into_response()
    }
}

impl From<backoffice_storage::Error> for ApiError {
    fn from(e: backoffice_storage::Error) -> Self {
        match e {
            backoffice_storage::Error::Conflict { .. } => ApiError::Conflict(e.to_string()),
            backoffice_storage::Error::InvalidRecord { message, .. } => {
                ApiError::Validation(message)
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<backoffice_acl::Error> for ApiError {
    fn from(e: backoffice_acl::Error) -> Self {
        match e {
            backoffice_acl::Error::Forbidden { .. } => ApiError::Forbidden(e.to_string()),
            backoffice_acl::Error::PrincipalNotFound(_) => {
                ApiError::Unauthorized("principal no longer exists".to_string())
            }
            backoffice_acl::Error::InvalidPermissionKey(_)
            | backoffice_acl::Error::InvalidResource(_) => ApiError::Validation(e.to_string()),
            backoffice_acl::Error::Storage(inner) => inner.into(),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        if e.is_client_error() {
            ApiError::Unauthorized(e.to_string())
        } else {
            ApiError::Internal(e.to_string())
        }
    }
}
