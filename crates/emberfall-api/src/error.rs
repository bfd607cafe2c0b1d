use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::error;

use emberfall_db::DbError;
use emberfall_types::api::Envelope;

use crate::validation::ValidationError;

pub const GENERIC_INTERNAL_MESSAGE: &str = "Internal server error";
pub const GENERIC_DATABASE_MESSAGE: &str = "Database error";

/// Every failure a handler can report. Rendered as the JSON envelope with the
/// matching status code.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Authentication(String),

    /// Role checks.
    #[error("{0}")]
    Authorization(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Database(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Authentication(_) => StatusCode::UNAUTHORIZED,
            Self::Authorization(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Authentication(_) => "AUTHENTICATION_ERROR",
            Self::Authorization(_) => "AUTHORIZATION_ERROR",
            Self::NotFound(_) => "NOT_FOUND",
            Self::MethodNotAllowed => "METHOD_NOT_ALLOWED",
            Self::Conflict(_) => "CONFLICT",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Map a storage failure. Duplicate keys become 409; everything else is a
    /// 500 whose text is only exposed when `expose` is set (development).
    pub fn from_db(err: DbError, conflict_message: &str, expose: bool) -> Self {
        match err {
            DbError::Conflict(detail) => {
                tracing::debug!("Duplicate key: {}", detail);
                Self::Conflict(conflict_message.to_string())
            }
            other => {
                error!("Database error: {}", other);
                Self::Database(if expose {
                    other.to_string()
                } else {
                    GENERIC_DATABASE_MESSAGE.to_string()
                })
            }
        }
    }

    pub fn internal(err: impl std::fmt::Display, expose: bool) -> Self {
        error!("Internal error: {}", err);
        Self::Internal(if expose {
            err.to_string()
        } else {
            GENERIC_INTERNAL_MESSAGE.to_string()
        })
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err.0)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(format!("Invalid request body: {}", rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Validation(format!("Invalid query string: {}", rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Envelope::failure(self.to_string(), self.code());
        (status, Json(body)).into_response()
    }
}
