use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::rubric::WeightError;
use common::storage::StorageError;
use sea_orm::DbErr;
use serde::Serialize;

/// Body of every non-2xx response.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// One of: `VALIDATION_ERROR`, `TOKEN_MISSING`, `TOKEN_INVALID`,
    /// `INVALID_CREDENTIALS`, `PERMISSION_DENIED`, `NOT_FOUND`, `CONFLICT`,
    /// `USERNAME_TAKEN`, `INTERNAL_ERROR`.
    #[schema(example = "VALIDATION_ERROR")]
    pub code: &'static str,
    #[schema(example = "Criterion weights must sum to 100, got 99")]
    pub message: String,
}

#[derive(Debug)]
pub enum AppError {
    /// Malformed input, a broken invariant, or a reference to a missing row.
    Validation(String),
    TokenMissing,
    TokenInvalid,
    InvalidCredentials,
    /// The row is visible to the caller but the operation is not allowed.
    PermissionDenied,
    /// Missing, or outside the caller's visibility.
    NotFound(String),
    Conflict(String),
    UsernameTaken,
    /// Logged server-side; the client only sees a generic message.
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::TokenMissing | Self::TokenInvalid | Self::InvalidCredentials => {
                StatusCode::UNAUTHORIZED
            }
            Self::PermissionDenied => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) | Self::UsernameTaken => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::TokenMissing => "TOKEN_MISSING",
            Self::TokenInvalid => "TOKEN_INVALID",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::PermissionDenied => "PERMISSION_DENIED",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Conflict(_) => "CONFLICT",
            Self::UsernameTaken => "USERNAME_TAKEN",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn into_message(self) -> String {
        match self {
            Self::Validation(msg) | Self::NotFound(msg) | Self::Conflict(msg) => msg,
            Self::TokenMissing => "Authentication required".into(),
            Self::TokenInvalid => "Invalid or expired token".into(),
            Self::InvalidCredentials => "Invalid username or password".into(),
            Self::PermissionDenied => "You do not have permission to perform this action".into(),
            Self::UsernameTaken => "Username is already taken".into(),
            Self::Internal(detail) => {
                tracing::error!(%detail, "Request failed with an internal error");
                "An unexpected error occurred".into()
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            code: self.code(),
            message: self.into_message(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(path) => {
                tracing::warn!(%path, "Stored file missing");
                Self::NotFound("File not found".into())
            }
            StorageError::SizeLimitExceeded { limit, .. } => {
                Self::Validation(format!("File exceeds maximum size of {limit} bytes"))
            }
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<WeightError> for AppError {
    fn from(err: WeightError) -> Self {
        Self::Validation(err.to_string())
    }
}
