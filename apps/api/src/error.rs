//! Error types for the HTTP API.
//!
//! Every handler returns `Result<_, ApiError>`. The response body is always
//! `{"error": "<message>"}`.
//!
//! | Variant      | Status | Message                     |
//! |--------------|--------|-----------------------------|
//! | Validation   | 400    | validation detail           |
//! | Unauthorized | 401    | detail                      |
//! | Forbidden    | 403    | detail                      |
//! | NotFound     | 404    | detail                      |
//! | Conflict     | 409    | detail                      |
//! | Unavailable  | 500    | generic, logged server-side |
//! | Internal     | 500    | generic, logged server-side |

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::{error, warn};

use carniceria_core::{CoreError, ValidationError};
use carniceria_db::DbError;

/// API errors.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Wrong password for an existing account.
    pub fn invalid_credentials() -> Self {
        ApiError::Unauthorized("Invalid email or password".to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Unavailable(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::Unavailable(detail) => {
                error!(target: "database", error = %detail, "Store unavailable");
                "Could not connect to the database".to_string()
            }
            ApiError::Internal(detail) => {
                error!(target: "internal", error = %detail, "Internal error occurred");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            err @ DbError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            DbError::UniqueViolation { field } => ApiError::Conflict(conflict_message(&field)),
            DbError::CheckViolation { message } => {
                warn!(error = %message, "Write rejected by a CHECK constraint");
                ApiError::Validation("A field value is out of range".to_string())
            }
            err if err.is_unavailable() => ApiError::Unavailable(err.to_string()),
            err => ApiError::Internal(err.to_string()),
        }
    }
}

fn conflict_message(field: &str) -> String {
    match field {
        "customers.email" => "Email already registered".to_string(),
        "cash_closings.closing_date" => "A cash closing already exists for that date".to_string(),
        other => format!("Duplicate {other}"),
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(inner) => inner.into(),
            other => ApiError::Validation(other.to_string()),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::Validation(err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

/// Result type for handlers.
pub type ApiResult<T> = Result<T, ApiError>;
