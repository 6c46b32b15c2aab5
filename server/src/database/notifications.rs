// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use common::{Notification, NotificationKind};
use sqlx::SqlitePool;

/// At most this many notifications are returned per listing.
const LIST_LIMIT: i64 = 50;

pub struct NewNotification {
    pub user_id: i64,
    pub task_id: Option<i64>,
    pub kind: NotificationKind,
    pub message: String,
    pub next_reminder_at: Option<DateTime<Utc>>,
    pub expires_at: DateTime<Utc>,
}

pub async fn insert_notification(pool: &SqlitePool, new: NewNotification) -> Result<Notification> {
    let created_at = Utc::now();
    let id = sqlx::query(
        "INSERT INTO notifications (user_id, task_id, kind, message, is_read, \
                                    next_reminder_at, expires_at, created_at) \
         VALUES (?, ?, ?, ?, 0, ?, ?, ?)",
    )
    .bind(new.user_id)
    .bind(new.task_id)
    .bind(new.kind)
    .bind(&new.message)
    .bind(new.next_reminder_at)
    .bind(new.expires_at)
    .bind(created_at)
    .execute(pool)
    .await
    .context("Failed to insert notification")?
    .last_insert_rowid();

    Ok(Notification {
        id,
        user_id: new.user_id,
        task_id: new.task_id,
        kind: new.kind,
        message: new.message,
        is_read: false,
        next_reminder_at: new.next_reminder_at,
        expires_at: new.expires_at,
        created_at,
    })
}

/// The user's live notifications, newest first. Expired rows are never
/// surfaced even if the purge sweep has not run yet.
pub async fn list_active(pool: &SqlitePool, user_id: i64) -> Result<Vec<Notification>> {
    sqlx::query_as::<_, Notification>(
        "SELECT * FROM notifications WHERE user_id = ? AND expires_at > ? \
         ORDER BY created_at DESC LIMIT ?",
    )
    .bind(user_id)
    .bind(Utc::now())
    .bind(LIST_LIMIT)
    .fetch_all(pool)
    .await
    .context("Failed to list notifications")
}

pub async fn unread_count(pool: &SqlitePool, user_id: i64) -> Result<i64> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM notifications \
         WHERE user_id = ? AND is_read = 0 AND expires_at > ?",
    )
    .bind(user_id)
    .bind(Utc::now())
    .fetch_one(pool)
    .await
    .context("Failed to count unread notifications")
}

pub async fn find_notification(pool: &SqlitePool, id: i64) -> Result<Option<Notification>> {
    sqlx::query_as::<_, Notification>("SELECT * FROM notifications WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to look up notification")
}

pub async fn mark_read(pool: &SqlitePool, id: i64) -> Result<()> {
    sqlx::query("UPDATE notifications SET is_read = 1 WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to mark notification as read")?;
    Ok(())
}

/// Returns the number of notifications that changed.
pub async fn mark_all_read(pool: &SqlitePool, user_id: i64) -> Result<u64> {
    let result = sqlx::query("UPDATE notifications SET is_read = 1 WHERE user_id = ? AND is_read = 0")
        .bind(user_id)
        .execute(pool)
        .await
        .context("Failed to mark notifications as read")?;
    Ok(result.rows_affected())
}

/// Assignment notifications whose reminder is due: the reminder clock
/// has passed and the notification itself has not yet expired.
pub async fn due_assigned(pool: &SqlitePool, now: DateTime<Utc>) -> Result<Vec<Notification>> {
    sqlx::query_as::<_, Notification>(
        "SELECT * FROM notifications \
         WHERE kind = 'assigned' AND next_reminder_at IS NOT NULL \
         AND next_reminder_at <= ? AND expires_at > ?",
    )
    .bind(now)
    .bind(now)
    .fetch_all(pool)
    .await
    .context("Failed to collect due reminders")
}

pub async fn set_next_reminder(
    pool: &SqlitePool,
    id: i64,
    next_reminder_at: Option<DateTime<Utc>>,
) -> Result<()> {
    sqlx::query("UPDATE notifications SET next_reminder_at = ? WHERE id = ?")
        .bind(next_reminder_at)
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to reschedule reminder")?;
    Ok(())
}

/// Hard-deletes notifications past their expiry. Returns the number of
/// rows removed.
pub async fn purge_expired(pool: &SqlitePool, now: DateTime<Utc>) -> Result<u64> {
    let result = sqlx::query("DELETE FROM notifications WHERE expires_at <= ?")
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to purge expired notifications")?;
    Ok(result.rows_affected())
}
