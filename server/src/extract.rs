// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use common::User;
use sqlx::SqlitePool;

use crate::auth;
use crate::database;
use crate::handlers::AppError;

/// The authenticated caller, resolved from the `Authorization: Bearer`
/// header. Any failure along the way (missing header, malformed or
/// expired token, deleted user) collapses into the same 401 so the
/// response does not reveal which check failed.
pub struct AuthUser(pub User);

impl<S> FromRequestParts<S> for AuthUser
where
    SqlitePool: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or_else(AppError::unauthenticated)?;

        let user_id = auth::verify_access_token(token).ok_or_else(AppError::unauthenticated)?;

        let pool = SqlitePool::from_ref(state);
        let user = database::users::find_user_by_id(&pool, user_id)
            .await?
            .ok_or_else(AppError::unauthenticated)?;

        Ok(AuthUser(user))
    }
}
