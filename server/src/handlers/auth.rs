// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use axum::{
    extract::{Json, State},
    http::StatusCode,
};
use chrono::Utc;
use common::{LoginPayload, PublicUser, RefreshPayload, RegisterPayload, Role};
use serde_json::{Value, json};
use sqlx::SqlitePool;
use tracing::{error, info};

use super::AppError;
use crate::auth;
use crate::database::{tokens, users};

const MIN_PASSWORD_LEN: usize = 8;

/// Handler for registering a new account. Everyone starts as a worker;
/// only an admin can promote later.
pub async fn register(
    State(pool): State<SqlitePool>,
    Json(payload): Json<RegisterPayload>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let email = payload.email.trim().to_lowercase();
    let name = payload.name.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::InvalidArgument(
            "A valid email address is required".to_string(),
        ));
    }
    if name.is_empty() {
        return Err(AppError::InvalidArgument("Name cannot be empty".to_string()));
    }
    if payload.password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::InvalidArgument(format!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_LEN
        )));
    }

    if users::find_user_by_email(&pool, &email).await?.is_some() {
        return Err(AppError::Conflict(
            "An account with this email already exists".to_string(),
        ));
    }

    let password_hash = auth::hash_password(&payload.password)?;
    let user = users::create_user(&pool, &email, name, &password_hash, Role::Worker).await?;
    info!("Registered new user {} ({})", user.id, user.email);

    let (access_token, refresh_token) = issue_tokens(&pool, user.id).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "user": PublicUser::from(&user),
            "access_token": access_token,
            "refresh_token": refresh_token,
        })),
    ))
}

/// Handler for logging in. A wrong password and an unknown email produce
/// the same 401.
pub async fn login(
    State(pool): State<SqlitePool>,
    Json(payload): Json<LoginPayload>,
) -> Result<Json<Value>, AppError> {
    let email = payload.email.trim().to_lowercase();
    let user = users::find_user_by_email(&pool, &email).await?;
    let valid = user
        .as_ref()
        .is_some_and(|u| auth::verify_password(&payload.password, &u.password_hash));
    let Some(user) = user.filter(|_| valid) else {
        error!("Failed login attempt for {}", email);
        return Err(AppError::Unauthenticated(
            "Invalid email or password".to_string(),
        ));
    };

    info!("User {} logged in.", user.id);
    let (access_token, refresh_token) = issue_tokens(&pool, user.id).await?;
    Ok(Json(json!({
        "user": PublicUser::from(&user),
        "access_token": access_token,
        "refresh_token": refresh_token,
    })))
}

/// Handler for the refresh flow. The presented token is consumed and
/// replaced in one step, so it can never be used twice.
pub async fn refresh(
    State(pool): State<SqlitePool>,
    Json(payload): Json<RefreshPayload>,
) -> Result<Json<Value>, AppError> {
    let hashed = auth::hash_refresh_token(&payload.refresh_token);
    let Some(stored) = tokens::find_by_hash(&pool, &hashed).await? else {
        return Err(AppError::Unauthenticated(
            "Invalid refresh token".to_string(),
        ));
    };

    if stored.revoked_at.is_some() {
        return Err(AppError::Unauthenticated(
            "Refresh token has been revoked".to_string(),
        ));
    }
    if stored.expires_at <= Utc::now() {
        // Lazy cleanup; the row is dead either way.
        tokens::delete_refresh_token(&pool, stored.id).await?;
        return Err(AppError::Unauthenticated(
            "Refresh token has expired".to_string(),
        ));
    }

    let next = auth::generate_refresh_token();
    tokens::rotate_refresh_token(&pool, stored.id, stored.user_id, &next.hashed, next.expires_at)
        .await?;
    let access_token = auth::sign_access_token(stored.user_id)?;

    Ok(Json(json!({
        "access_token": access_token,
        "refresh_token": next.raw,
    })))
}

/// Handler for logout. Revoking an unknown or already revoked token is
/// still a success; the client's goal is already met.
pub async fn logout(
    State(pool): State<SqlitePool>,
    Json(payload): Json<RefreshPayload>,
) -> Result<StatusCode, AppError> {
    let hashed = auth::hash_refresh_token(&payload.refresh_token);
    tokens::revoke_by_hash(&pool, &hashed).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn issue_tokens(pool: &SqlitePool, user_id: i64) -> Result<(String, String), AppError> {
    let access_token = auth::sign_access_token(user_id)?;
    let refresh = auth::generate_refresh_token();
    tokens::insert_refresh_token(pool, user_id, &refresh.hashed, refresh.expires_at).await?;
    Ok((access_token, refresh.raw))
}
