// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
};
use common::{Comment, CreateCommentPayload, Task, UpdateCommentPayload};
use sqlx::SqlitePool;
use tracing::info;

use super::AppError;
use crate::authz;
use crate::database::{comments, projects, tasks};
use crate::extract::AuthUser;
use crate::notifications;

/// Comments are capped at this many characters after trimming.
const MAX_COMMENT_LEN: usize = 2000;

fn validate_content(content: &str) -> Result<&str, AppError> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(AppError::InvalidArgument(
            "Comment cannot be empty".to_string(),
        ));
    }
    if trimmed.chars().count() > MAX_COMMENT_LEN {
        return Err(AppError::InvalidArgument(format!(
            "Comment cannot exceed {} characters",
            MAX_COMMENT_LEN
        )));
    }
    Ok(trimmed)
}

/// Loads the task and checks the caller may view it; commenting rights
/// follow viewing rights.
async fn load_viewable_task(
    pool: &SqlitePool,
    user: &common::User,
    task_id: i64,
) -> Result<Task, AppError> {
    let Some(task) = tasks::find_task(pool, task_id).await? else {
        return Err(AppError::not_found("Task", task_id));
    };
    let project = match task.project_id {
        Some(project_id) => projects::find_project(pool, project_id).await?,
        None => None,
    };
    authz::can_view_task(user, &task, project.as_ref())?;
    Ok(task)
}

pub async fn list_comments(
    State(pool): State<SqlitePool>,
    AuthUser(user): AuthUser,
    Path(task_id): Path<i64>,
) -> Result<Json<Vec<Comment>>, AppError> {
    let task = load_viewable_task(&pool, &user, task_id).await?;
    Ok(Json(comments::list_for_task(&pool, task.id).await?))
}

/// Handler for posting a comment or a reply. The parent, when given,
/// must be a comment on the same task.
pub async fn create_comment(
    State(pool): State<SqlitePool>,
    AuthUser(user): AuthUser,
    Path(task_id): Path<i64>,
    Json(payload): Json<CreateCommentPayload>,
) -> Result<(StatusCode, Json<Comment>), AppError> {
    let task = load_viewable_task(&pool, &user, task_id).await?;
    let content = validate_content(&payload.content)?;

    let mut parent_author_id = None;
    if let Some(parent_id) = payload.parent_id {
        let Some(parent) = comments::find_comment(&pool, parent_id).await? else {
            return Err(AppError::not_found("Comment", parent_id));
        };
        if parent.task_id != task.id {
            return Err(AppError::InvalidArgument(
                "Parent comment belongs to a different task".to_string(),
            ));
        }
        parent_author_id = Some(parent.author_id);
    }

    let comment =
        comments::create_comment(&pool, content, task.id, user.id, payload.parent_id).await?;
    info!("Comment {} created on task {} by user {}", comment.id, task.id, user.id);

    notifications::notify_comment(&pool, &task, &comment, &user, parent_author_id).await;

    Ok((StatusCode::CREATED, Json(comment)))
}

/// Handler for editing a comment's content. Author only.
pub async fn update_comment(
    State(pool): State<SqlitePool>,
    AuthUser(user): AuthUser,
    Path((task_id, comment_id)): Path<(i64, i64)>,
    Json(payload): Json<UpdateCommentPayload>,
) -> Result<Json<Comment>, AppError> {
    load_viewable_task(&pool, &user, task_id).await?;
    let Some(mut comment) = comments::find_comment(&pool, comment_id).await? else {
        return Err(AppError::not_found("Comment", comment_id));
    };
    if comment.task_id != task_id {
        return Err(AppError::not_found("Comment", comment_id));
    }
    authz::can_edit_comment(&user, &comment)?;

    let content = validate_content(&payload.content)?;
    comments::update_content(&pool, comment.id, content).await?;
    comment.content = content.to_string();
    Ok(Json(comment))
}

/// Handler for deleting a comment and its whole reply subtree.
pub async fn delete_comment(
    State(pool): State<SqlitePool>,
    AuthUser(user): AuthUser,
    Path((task_id, comment_id)): Path<(i64, i64)>,
) -> Result<StatusCode, AppError> {
    let task = load_viewable_task(&pool, &user, task_id).await?;
    let Some(comment) = comments::find_comment(&pool, comment_id).await? else {
        return Err(AppError::not_found("Comment", comment_id));
    };
    if comment.task_id != task_id {
        return Err(AppError::not_found("Comment", comment_id));
    }
    authz::can_delete_comment(&user, &comment, &task)?;

    let removed = comments::delete_subtree(&pool, comment.id).await?;
    info!(
        "Comment {} deleted by user {} ({} comment(s) removed)",
        comment.id, user.id, removed
    );
    Ok(StatusCode::NO_CONTENT)
}
