use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use lumen_common::{CodeError, StorageError};
use sea_orm::DbErr;
use serde::Serialize;

use crate::repository::CreateCollectionError;

/// Structured error response returned by all endpoints on failure.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Machine-readable error code. One of: `VALIDATION_ERROR`, `TOKEN_MISSING`,
    /// `TOKEN_INVALID`, `INVALID_CREDENTIALS`, `NOT_FOUND`,
    /// `CODE_GENERATION_EXHAUSTED`, `INTERNAL_ERROR`.
    #[schema(example = "VALIDATION_ERROR")]
    pub code: &'static str,
    /// Human-readable error description.
    #[schema(example = "Name must be 3-100 characters")]
    pub message: String,
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    Validation(String),
    TokenMissing,
    TokenInvalid,
    InvalidCredentials,
    NotFound(String),
    /// The access code space looked exhausted for `attempts` tries in a row.
    CodeGenerationExhausted {
        attempts: u32,
    },
    Internal(String),
}

impl AppError {
    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        match self {
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "VALIDATION_ERROR",
                    message: msg,
                },
            ),
            AppError::TokenMissing => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    code: "TOKEN_MISSING",
                    message: "Authentication required".into(),
                },
            ),
            AppError::TokenInvalid => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    code: "TOKEN_INVALID",
                    message: "Invalid or expired token".into(),
                },
            ),
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    code: "INVALID_CREDENTIALS",
                    message: "Incorrect username or password".into(),
                },
            ),
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    code: "NOT_FOUND",
                    message: msg,
                },
            ),
            AppError::CodeGenerationExhausted { attempts } => {
                tracing::error!(attempts, "Access code generation exhausted");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        code: "CODE_GENERATION_EXHAUSTED",
                        message: "Could not allocate a unique collection code".into(),
                    },
                )
            }
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        code: "INTERNAL_ERROR",
                        message: "An unexpected error occurred".into(),
                    },
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let challenge = matches!(
            self,
            AppError::TokenMissing | AppError::TokenInvalid | AppError::InvalidCredentials
        );

        let (status, body) = self.status_and_body();

        if challenge {
            (status, [(header::WWW_AUTHENTICATE, "Bearer")], Json(body)).into_response()
        } else {
            (status, Json(body)).into_response()
        }
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<CodeError> for AppError {
    fn from(err: CodeError) -> Self {
        match err {
            CodeError::GenerationExhausted { attempts } => {
                AppError::CodeGenerationExhausted { attempts }
            }
        }
    }
}

impl From<CreateCollectionError> for AppError {
    fn from(err: CreateCollectionError) -> Self {
        match err {
            CreateCollectionError::Db(e) => e.into(),
            CreateCollectionError::Code(e) => e.into(),
        }
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(_) | StorageError::InvalidPath(_) => {
                AppError::NotFound("File not found".into())
            }
            StorageError::Io(e) => AppError::Internal(format!("Storage I/O error: {e}")),
        }
    }
}
