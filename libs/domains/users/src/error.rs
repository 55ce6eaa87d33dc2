use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_helpers::{ErrorCode, ErrorResponse, validation_error_response};
use sea_orm::DbErr;
use serde_json::json;
use thiserror::Error;
use validator::ValidationErrors;

use crate::validation::PasswordRequirement;

#[derive(Debug, Error)]
pub enum UserError {
    #[error("User not found: {0}")]
    NotFound(i64),

    #[error("Email already registered: {0}")]
    DuplicateEmail(String),

    #[error("Password is too weak: missing {}", join_requirements(.0))]
    WeakPassword(Vec<PasswordRequirement>),

    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Account is inactive")]
    AccountInactive,

    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

pub type UserResult<T> = Result<T, UserError>;

fn join_requirements(requirements: &[PasswordRequirement]) -> String {
    requirements
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl UserError {
    pub fn status(&self) -> StatusCode {
        match self {
            UserError::NotFound(_) => StatusCode::NOT_FOUND,
            UserError::DuplicateEmail(_) => StatusCode::CONFLICT,
            UserError::WeakPassword(_) | UserError::Validation(_) => StatusCode::BAD_REQUEST,
            UserError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            UserError::AccountInactive => StatusCode::FORBIDDEN,
            UserError::PasswordHash(_) | UserError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for UserError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match &self {
            UserError::Validation(errors) => return validation_error_response(errors),
            UserError::NotFound(_) => ErrorResponse::new(ErrorCode::NotFound, self.to_string()),
            UserError::DuplicateEmail(_) => {
                ErrorResponse::new(ErrorCode::Conflict, self.to_string())
            }
            UserError::WeakPassword(unmet) => {
                ErrorResponse::new(ErrorCode::WeakPassword, self.to_string())
                    .with_details(json!({ "unmet_requirements": unmet }))
            }
            UserError::InvalidCredentials => {
                ErrorResponse::new(ErrorCode::Unauthorized, self.to_string())
            }
            UserError::AccountInactive => {
                ErrorResponse::new(ErrorCode::Forbidden, self.to_string())
            }
            UserError::Database(e) => {
                tracing::error!(error_code = ErrorCode::DatabaseError.code(), "Database error: {}", e);
                ErrorResponse::new(
                    ErrorCode::DatabaseError,
                    ErrorCode::DatabaseError.default_message(),
                )
            }
            UserError::PasswordHash(_) => {
                tracing::error!(error_code = ErrorCode::InternalError.code(), "{}", self);
                ErrorResponse::new(
                    ErrorCode::InternalError,
                    ErrorCode::InternalError.default_message(),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
