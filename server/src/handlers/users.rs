// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
};
use common::{PublicUser, ResetPasswordPayload, Role, UpdateRolePayload};
use sqlx::SqlitePool;
use tracing::info;

use super::AppError;
use crate::auth;
use crate::authz;
use crate::database::{tokens, users};
use crate::extract::AuthUser;

const MIN_RESET_PASSWORD_LEN: usize = 6;

/// Handler for listing all users. Any authenticated user may see the
/// directory (it is how assignees and members are picked).
pub async fn list_users(
    State(pool): State<SqlitePool>,
    AuthUser(_user): AuthUser,
) -> Result<Json<Vec<PublicUser>>, AppError> {
    let listed = users::list_users(&pool).await?;
    Ok(Json(listed))
}

/// Handler for the caller's own profile.
pub async fn me(AuthUser(user): AuthUser) -> Json<PublicUser> {
    Json(PublicUser::from(&user))
}

/// Handler for changing a user's role. Admin only.
pub async fn update_role(
    State(pool): State<SqlitePool>,
    AuthUser(caller): AuthUser,
    Path(user_id): Path<i64>,
    Json(payload): Json<UpdateRolePayload>,
) -> Result<Json<PublicUser>, AppError> {
    authz::require_min_role(&caller, Role::Admin)?;
    let role = Role::parse(&payload.role).ok_or_else(|| {
        AppError::InvalidArgument(format!("Unknown role: {}", payload.role))
    })?;

    let Some(mut user) = users::find_user_by_id(&pool, user_id).await? else {
        return Err(AppError::not_found("User", user_id));
    };

    users::update_user_role(&pool, user_id, role).await?;
    user.role = role;
    info!("User {} role changed to {} by {}", user_id, role.as_str(), caller.id);
    Ok(Json(PublicUser::from(&user)))
}

/// Handler for resetting a user's password. Admin only. Every live
/// session of the target is invalidated.
pub async fn reset_password(
    State(pool): State<SqlitePool>,
    AuthUser(caller): AuthUser,
    Path(user_id): Path<i64>,
    Json(payload): Json<ResetPasswordPayload>,
) -> Result<StatusCode, AppError> {
    authz::require_min_role(&caller, Role::Admin)?;
    if payload.new_password.len() < MIN_RESET_PASSWORD_LEN {
        return Err(AppError::InvalidArgument(format!(
            "Password must be at least {} characters long",
            MIN_RESET_PASSWORD_LEN
        )));
    }

    if users::find_user_by_id(&pool, user_id).await?.is_none() {
        return Err(AppError::not_found("User", user_id));
    }

    let password_hash = auth::hash_password(&payload.new_password)?;
    users::update_user_password(&pool, user_id, &password_hash).await?;
    let revoked = tokens::delete_for_user(&pool, user_id).await?;
    info!(
        "Password reset for user {} by {}; {} refresh token(s) invalidated",
        user_id, caller.id, revoked
    );
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for deleting a user. Admin only, and admins cannot delete
/// themselves.
pub async fn delete_user(
    State(pool): State<SqlitePool>,
    AuthUser(caller): AuthUser,
    Path(user_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    authz::require_min_role(&caller, Role::Admin)?;
    if caller.id == user_id {
        return Err(AppError::InvalidArgument(
            "You cannot delete your own account".to_string(),
        ));
    }

    if users::delete_user(&pool, user_id).await? {
        info!("User {} deleted by {}", user_id, caller.id);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("User", user_id))
    }
}
