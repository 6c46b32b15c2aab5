// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use axum::extract::{Json, Path, State};
use chrono::Utc;
use common::Notification;
use serde_json::{Value, json};
use sqlx::SqlitePool;

use super::AppError;
use crate::database::notifications as db;
use crate::extract::AuthUser;
use crate::notifications;

/// Handler for listing the caller's live notifications together with
/// their unread count.
pub async fn list_notifications(
    State(pool): State<SqlitePool>,
    AuthUser(user): AuthUser,
) -> Result<Json<Value>, AppError> {
    let listed = db::list_active(&pool, user.id).await?;
    let unread = db::unread_count(&pool, user.id).await?;
    Ok(Json(json!({
        "notifications": listed,
        "unread_count": unread,
    })))
}

/// Handler for marking one notification read. Recipient only; anyone
/// else gets a 404 rather than a hint that the id exists.
pub async fn mark_read(
    State(pool): State<SqlitePool>,
    AuthUser(user): AuthUser,
    Path(notification_id): Path<i64>,
) -> Result<Json<Notification>, AppError> {
    let Some(mut notification) = db::find_notification(&pool, notification_id).await? else {
        return Err(AppError::not_found("Notification", notification_id));
    };
    if notification.user_id != user.id {
        return Err(AppError::not_found("Notification", notification_id));
    }

    db::mark_read(&pool, notification.id).await?;
    notification.is_read = true;
    Ok(Json(notification))
}

/// Handler for marking every notification of the caller read.
pub async fn mark_all_read(
    State(pool): State<SqlitePool>,
    AuthUser(user): AuthUser,
) -> Result<Json<Value>, AppError> {
    let updated = db::mark_all_read(&pool, user.id).await?;
    Ok(Json(json!({ "updated": updated })))
}

/// Handler for running the reminder and expiry sweeps on demand. Public,
/// like the background loop it mirrors; it exposes nothing but counts.
pub async fn check_reminders(
    State(pool): State<SqlitePool>,
) -> Result<Json<Value>, AppError> {
    let now = Utc::now();
    let reminders = notifications::run_reminder_sweep(&pool, now).await?;
    let purged = notifications::purge_expired(&pool, now).await?;
    Ok(Json(json!({
        "reminders_sent": reminders,
        "purged": purged,
    })))
}
