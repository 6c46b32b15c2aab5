// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use axum::{
    extract::Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

pub mod auth;
pub mod comments;
pub mod events;
pub mod notifications;
pub mod projects;
pub mod tasks;
pub mod users;

/// Every handler failure maps onto one of these. The variants carry the
/// client-facing message; internal errors keep their cause for the log
/// but never leak it to the response.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Unauthenticated(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    InvalidArgument(String),
    #[error("{0}")]
    Conflict(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn unauthenticated() -> Self {
        Self::Unauthenticated("Authentication required".to_string())
    }

    pub fn not_found(what: &str, id: i64) -> Self {
        Self::NotFound(format!("{} with ID {} not found", what, id))
    }
}

impl From<crate::authz::Deny> for AppError {
    fn from(deny: crate::authz::Deny) -> Self {
        Self::Forbidden(deny.0)
    }
}

/// Allows Axum to convert our `AppError` into an HTTP `Response`.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (code, message) = match self {
            AppError::Unauthenticated(message) => (StatusCode::UNAUTHORIZED, message),
            AppError::Forbidden(message) => (StatusCode::FORBIDDEN, message),
            AppError::NotFound(message) => (StatusCode::NOT_FOUND, message),
            AppError::InvalidArgument(message) => (StatusCode::BAD_REQUEST, message),
            AppError::Conflict(message) => (StatusCode::CONFLICT, message),
            AppError::Internal(err) => {
                // Log the internal error for debugging.
                tracing::error!("Internal server error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred.".to_string(),
                )
            }
        };
        tracing::error!(
            "Responding with error: status_code={}, message={}",
            code.as_u16(),
            message
        );
        (code, Json(serde_json::json!({ "error": message }))).into_response()
    }
}
