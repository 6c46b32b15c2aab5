// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use common::{Comment, NotificationKind, Task, TaskStatus, User};
use sqlx::SqlitePool;
use std::collections::BTreeSet;
use tracing::{error, info};

use crate::database::notifications::{self as db, NewNotification};
use crate::database::tasks;

/// How long after an assignment (and between reminders) the next nudge
/// fires.
pub const REMINDER_INTERVAL_HOURS: i64 = 3;
/// How long a notification stays visible before the purge removes it.
pub const NOTIFICATION_TTL_HOURS: i64 = 6;

fn task_location(task: &Task) -> String {
    match (task.equipment.as_deref(), task.area.as_deref()) {
        (Some(equipment), Some(area)) => format!(" ({} - {})", equipment, area),
        (Some(equipment), None) => format!(" ({})", equipment),
        (None, Some(area)) => format!(" ({})", area),
        (None, None) => String::new(),
    }
}

/// Notifies every assignee of a freshly assigned task. Best-effort:
/// a failure here is logged but never fails the request that caused it.
pub async fn notify_assignment(pool: &SqlitePool, task: &Task, assignee_ids: &[i64]) {
    let now = Utc::now();
    let message = format!(
        "You have been assigned to task: {}{}",
        task.title,
        task_location(task)
    );
    for &user_id in assignee_ids {
        let result = db::insert_notification(
            pool,
            NewNotification {
                user_id,
                task_id: Some(task.id),
                kind: NotificationKind::Assigned,
                message: message.clone(),
                next_reminder_at: Some(now + Duration::hours(REMINDER_INTERVAL_HOURS)),
                expires_at: now + Duration::hours(NOTIFICATION_TTL_HOURS),
            },
        )
        .await;
        if let Err(err) = result {
            error!(
                "Failed to create assignment notification for user {}: {:?}",
                user_id, err
            );
        }
    }
}

/// Notifies the task's assignees and creator of a new comment. The
/// commenter never hears about their own comment; on a reply the parent
/// comment's author is notified too. Best-effort like
/// [`notify_assignment`].
pub async fn notify_comment(
    pool: &SqlitePool,
    task: &Task,
    comment: &Comment,
    commenter: &User,
    parent_author_id: Option<i64>,
) {
    let mut recipients: BTreeSet<i64> = task.assigned_to.0.iter().copied().collect();
    recipients.insert(task.created_by);
    if let Some(author_id) = parent_author_id {
        recipients.insert(author_id);
    }
    recipients.remove(&commenter.id);

    let now = Utc::now();
    for user_id in recipients {
        let message = if comment.parent_id.is_some() && parent_author_id == Some(user_id) {
            format!("{} replied to a comment on \"{}\"", commenter.name, task.title)
        } else {
            format!("{} commented on \"{}\"", commenter.name, task.title)
        };
        let result = db::insert_notification(
            pool,
            NewNotification {
                user_id,
                task_id: Some(task.id),
                kind: NotificationKind::Comment,
                message,
                next_reminder_at: None,
                expires_at: now + Duration::hours(NOTIFICATION_TTL_HOURS),
            },
        )
        .await;
        if let Err(err) = result {
            error!(
                "Failed to create comment notification for user {}: {:?}",
                user_id, err
            );
        }
    }
}

/// One pass of the reminder clock. Each due assignment notification is
/// handled in isolation, so one bad row cannot stall the others:
/// unfinished tasks get a fresh reminder and a new deadline, finished
/// tasks have their clock cleared, and rows whose task has disappeared
/// are skipped. Returns the number of reminders created.
pub async fn run_reminder_sweep(pool: &SqlitePool, now: DateTime<Utc>) -> Result<u64> {
    let due = db::due_assigned(pool, now).await?;
    let mut sent = 0;

    for notification in due {
        let result = remind_one(pool, &notification, now).await;
        match result {
            Ok(true) => sent += 1,
            Ok(false) => {}
            Err(err) => {
                error!(
                    "Failed to process reminder for notification {}: {:?}",
                    notification.id, err
                );
            }
        }
    }

    if sent > 0 {
        info!("Reminder sweep created {} reminder(s).", sent);
    }
    Ok(sent)
}

async fn remind_one(
    pool: &SqlitePool,
    notification: &common::Notification,
    now: DateTime<Utc>,
) -> Result<bool> {
    let Some(task_id) = notification.task_id else {
        return Ok(false);
    };
    let Some(task) = tasks::find_task(pool, task_id).await? else {
        // Task was deleted since the assignment; nothing to remind about.
        return Ok(false);
    };

    if task.status == TaskStatus::Completed {
        db::set_next_reminder(pool, notification.id, None).await?;
        return Ok(false);
    }

    let status_label = match task.status {
        TaskStatus::Pending => "pending",
        TaskStatus::InProgress => "in progress",
        TaskStatus::Completed => unreachable!(),
    };
    db::insert_notification(
        pool,
        NewNotification {
            user_id: notification.user_id,
            task_id: Some(task.id),
            kind: NotificationKind::Reminder,
            message: format!(
                "Reminder: Task \"{}\"{} is still {}",
                task.title,
                task_location(&task),
                status_label
            ),
            next_reminder_at: None,
            expires_at: now + Duration::hours(NOTIFICATION_TTL_HOURS),
        },
    )
    .await?;
    db::set_next_reminder(
        pool,
        notification.id,
        Some(now + Duration::hours(REMINDER_INTERVAL_HOURS)),
    )
    .await?;
    Ok(true)
}

/// Removes notifications past their expiry. Called from the same
/// background loop as the reminder sweep.
pub async fn purge_expired(pool: &SqlitePool, now: DateTime<Utc>) -> Result<u64> {
    let purged = db::purge_expired(pool, now).await?;
    if purged > 0 {
        info!("Purged {} expired notification(s).", purged);
    }
    Ok(purged)
}
