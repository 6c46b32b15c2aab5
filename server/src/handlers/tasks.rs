// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use common::{
    CreateTaskPayload, Priority, Project, Task, TaskStatus, UpdateStatusPayload,
    UpdateTaskPayload,
};
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::info;

use super::AppError;
use crate::authz;
use crate::database::{
    projects,
    tasks::{self, NewTask, TaskFilter},
    users,
};
use crate::extract::AuthUser;
use crate::lifecycle;
use crate::notifications;

/// A task takes at most this many assignees.
const MAX_ASSIGNEES: usize = 2;

#[derive(Deserialize, Debug, Default)]
pub struct TaskListQuery {
    pub my_tasks: Option<bool>,
    pub created_by_me: Option<bool>,
    pub status: Option<String>,
}

/// Loads the task's project, when it has one, for the permission checks.
async fn load_project(pool: &SqlitePool, task: &Task) -> Result<Option<Project>, AppError> {
    match task.project_id {
        Some(project_id) => Ok(projects::find_project(pool, project_id).await?),
        None => Ok(None),
    }
}

fn validate_assignees(assigned_to: &[i64]) -> Result<Vec<i64>, AppError> {
    let mut cleaned: Vec<i64> = Vec::new();
    for &id in assigned_to {
        if !cleaned.contains(&id) {
            cleaned.push(id);
        }
    }
    if cleaned.is_empty() {
        return Err(AppError::InvalidArgument(
            "A task needs at least one assignee".to_string(),
        ));
    }
    if cleaned.len() > MAX_ASSIGNEES {
        return Err(AppError::InvalidArgument(format!(
            "A task can have at most {} assignees",
            MAX_ASSIGNEES
        )));
    }
    Ok(cleaned)
}

/// Handler for listing tasks, narrowed by role and the optional query
/// filters.
pub async fn list_tasks(
    State(pool): State<SqlitePool>,
    AuthUser(user): AuthUser,
    Query(query): Query<TaskListQuery>,
) -> Result<Json<Vec<Task>>, AppError> {
    let status = match query.status.as_deref() {
        Some(raw) => Some(TaskStatus::parse(raw).ok_or_else(|| {
            AppError::InvalidArgument(format!("Unknown status: {}", raw))
        })?),
        None => None,
    };
    let filter = TaskFilter {
        my_tasks: query.my_tasks.unwrap_or(false),
        created_by_me: query.created_by_me.unwrap_or(false),
        status,
    };
    let listed = tasks::list_tasks(&pool, &user, &filter).await?;
    info!("Successfully retrieved {} tasks.", listed.len());
    Ok(Json(listed))
}

/// Handler for creating a task. The creator picks up to two assignees;
/// each of them gets an assignment notification with a reminder clock.
pub async fn create_task(
    State(pool): State<SqlitePool>,
    AuthUser(user): AuthUser,
    Json(payload): Json<CreateTaskPayload>,
) -> Result<(StatusCode, Json<Task>), AppError> {
    let title = payload.title.trim();
    if title.is_empty() {
        return Err(AppError::InvalidArgument(
            "Task title cannot be empty".to_string(),
        ));
    }

    let assigned_to = validate_assignees(&payload.assigned_to)?;
    if !users::all_users_exist(&pool, &assigned_to).await? {
        return Err(AppError::InvalidArgument(
            "One or more assignees do not refer to an existing user".to_string(),
        ));
    }

    let priority = match payload.priority.as_deref() {
        Some(raw) => Priority::parse(raw).ok_or_else(|| {
            AppError::InvalidArgument(format!("Unknown priority: {}", raw))
        })?,
        None => Priority::Medium,
    };

    if let Some(project_id) = payload.project_id {
        let Some(project) = projects::find_project(&pool, project_id).await? else {
            return Err(AppError::InvalidArgument(format!(
                "Project with ID {} does not exist",
                project_id
            )));
        };
        authz::can_view_project(&user, &project)?;
    }

    let task = tasks::create_task(
        &pool,
        NewTask {
            title: title.to_string(),
            description: payload.description,
            equipment: payload.equipment,
            area: payload.area,
            priority,
            assigned_to: assigned_to.clone(),
            created_by: user.id,
            project_id: payload.project_id,
            due_date: payload.due_date,
        },
    )
    .await?;
    info!("Task created successfully with ID: {}", task.id);

    notifications::notify_assignment(&pool, &task, &assigned_to).await;

    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn get_task(
    State(pool): State<SqlitePool>,
    AuthUser(user): AuthUser,
    Path(task_id): Path<i64>,
) -> Result<Json<Task>, AppError> {
    let Some(task) = tasks::find_task(&pool, task_id).await? else {
        return Err(AppError::not_found("Task", task_id));
    };
    let project = load_project(&pool, &task).await?;
    authz::can_view_task(&user, &task, project.as_ref())?;
    Ok(Json(task))
}

/// Handler for the status-only update path. Assignees may move a task
/// through its lifecycle but nothing else: any extra field in the body
/// is rejected rather than silently dropped.
pub async fn update_status(
    State(pool): State<SqlitePool>,
    AuthUser(user): AuthUser,
    Path(task_id): Path<i64>,
    Json(payload): Json<UpdateStatusPayload>,
) -> Result<Json<Task>, AppError> {
    let Some(mut task) = tasks::find_task(&pool, task_id).await? else {
        return Err(AppError::not_found("Task", task_id));
    };
    let project = load_project(&pool, &task).await?;
    authz::can_update_status(&user, &task, project.as_ref())?;

    if !payload.extra.is_empty() {
        let fields: Vec<&str> = payload.extra.keys().map(String::as_str).collect();
        // Callers with full edit rights are pointed at the right
        // endpoint; assignee-only callers are refused outright.
        if authz::has_full_edit_rights(&user, &task, project.as_ref()) {
            return Err(AppError::InvalidArgument(format!(
                "Only the status can be changed here; unexpected field(s): {}",
                fields.join(", ")
            )));
        }
        return Err(AppError::Forbidden(format!(
            "Assignees may only change the status; unexpected field(s): {}",
            fields.join(", ")
        )));
    }

    let requested = TaskStatus::parse(&payload.status).ok_or_else(|| {
        AppError::InvalidArgument(format!("Unknown status: {}", payload.status))
    })?;

    let completed_at =
        lifecycle::completed_at_after_transition(task.status, task.completed_at, requested, Utc::now());
    tasks::set_status(&pool, task.id, requested, completed_at).await?;
    task.status = requested;
    task.completed_at = completed_at;
    info!("Task {} status set to {} by user {}", task.id, payload.status, user.id);
    Ok(Json(task))
}

/// Handler for the full edit path: title, description, location,
/// priority, assignees, due date and, optionally, status.
pub async fn update_task(
    State(pool): State<SqlitePool>,
    AuthUser(user): AuthUser,
    Path(task_id): Path<i64>,
    Json(payload): Json<UpdateTaskPayload>,
) -> Result<Json<Task>, AppError> {
    let Some(mut task) = tasks::find_task(&pool, task_id).await? else {
        return Err(AppError::not_found("Task", task_id));
    };
    let project = load_project(&pool, &task).await?;
    authz::can_edit_task(&user, &task, project.as_ref())?;

    if let Some(title) = payload.title {
        let title = title.trim().to_string();
        if title.is_empty() {
            return Err(AppError::InvalidArgument(
                "Task title cannot be empty".to_string(),
            ));
        }
        task.title = title;
    }
    // The outer Option is key presence; the inner one carries an
    // explicit null that clears the field.
    if let Some(description) = payload.description {
        task.description = description;
    }
    if let Some(equipment) = payload.equipment {
        task.equipment = equipment;
    }
    if let Some(area) = payload.area {
        task.area = area;
    }
    if let Some(raw) = payload.priority {
        task.priority = Priority::parse(&raw).ok_or_else(|| {
            AppError::InvalidArgument(format!("Unknown priority: {}", raw))
        })?;
    }
    if let Some(due_date) = payload.due_date {
        task.due_date = due_date;
    }

    let mut newly_assigned: Vec<i64> = Vec::new();
    if let Some(assigned_to) = payload.assigned_to {
        let cleaned = validate_assignees(&assigned_to)?;
        if !users::all_users_exist(&pool, &cleaned).await? {
            return Err(AppError::InvalidArgument(
                "One or more assignees do not refer to an existing user".to_string(),
            ));
        }
        newly_assigned = cleaned
            .iter()
            .copied()
            .filter(|id| !task.assigned_to.0.contains(id))
            .collect();
        task.assigned_to.0 = cleaned;
    }

    if let Some(raw) = payload.status {
        let requested = TaskStatus::parse(&raw).ok_or_else(|| {
            AppError::InvalidArgument(format!("Unknown status: {}", raw))
        })?;
        task.completed_at = lifecycle::completed_at_after_transition(
            task.status,
            task.completed_at,
            requested,
            Utc::now(),
        );
        task.status = requested;
    }

    tasks::save_task(&pool, &task).await?;
    info!("Task {} updated by user {}", task.id, user.id);

    if !newly_assigned.is_empty() {
        notifications::notify_assignment(&pool, &task, &newly_assigned).await;
    }

    Ok(Json(task))
}

pub async fn delete_task(
    State(pool): State<SqlitePool>,
    AuthUser(user): AuthUser,
    Path(task_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let Some(task) = tasks::find_task(&pool, task_id).await? else {
        return Err(AppError::not_found("Task", task_id));
    };
    let project = load_project(&pool, &task).await?;
    authz::can_delete_task(&user, &task, project.as_ref())?;

    tasks::delete_task(&pool, task_id).await?;
    info!("Task with ID {} deleted successfully.", task_id);
    Ok(StatusCode::NO_CONTENT)
}
