// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use common::{Priority, Role, Task, TaskStatus, User};
use sqlx::types::Json;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

/// Validated task fields, assembled by the handler before insertion.
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub equipment: Option<String>,
    pub area: Option<String>,
    pub priority: Priority,
    pub assigned_to: Vec<i64>,
    pub created_by: i64,
    pub project_id: Option<i64>,
    pub due_date: Option<DateTime<Utc>>,
}

/// Query-string filters for the task list, applied on top of the
/// role-based narrowing.
#[derive(Default)]
pub struct TaskFilter {
    pub my_tasks: bool,
    pub created_by_me: bool,
    pub status: Option<TaskStatus>,
}

pub async fn create_task(pool: &SqlitePool, new: NewTask) -> Result<Task> {
    let created_at = Utc::now();
    let assigned_to = Json(new.assigned_to);
    let id = sqlx::query(
        "INSERT INTO tasks (title, description, equipment, area, status, priority, assigned_to, \
                            created_by, project_id, due_date, completed_at, created_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, NULL, ?)",
    )
    .bind(&new.title)
    .bind(&new.description)
    .bind(&new.equipment)
    .bind(&new.area)
    .bind(TaskStatus::Pending)
    .bind(new.priority)
    .bind(&assigned_to)
    .bind(new.created_by)
    .bind(new.project_id)
    .bind(new.due_date)
    .bind(created_at)
    .execute(pool)
    .await
    .context("Failed to insert task into DB")?
    .last_insert_rowid();

    Ok(Task {
        id,
        title: new.title,
        description: new.description,
        equipment: new.equipment,
        area: new.area,
        status: TaskStatus::Pending,
        priority: new.priority,
        assigned_to,
        created_by: new.created_by,
        project_id: new.project_id,
        due_date: new.due_date,
        completed_at: None,
        created_at,
    })
}

pub async fn find_task(pool: &SqlitePool, id: i64) -> Result<Option<Task>> {
    sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to look up task")
}

/// Lists tasks visible to the viewer, newest first. Admin and supervisor
/// see everything; everyone else sees tasks they created, are assigned
/// to, or that belong to a project they own or are a member of.
pub async fn list_tasks(pool: &SqlitePool, viewer: &User, filter: &TaskFilter) -> Result<Vec<Task>> {
    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT * FROM tasks WHERE 1=1");

    if viewer.role < Role::Supervisor {
        builder
            .push(" AND (created_by = ")
            .push_bind(viewer.id)
            .push(" OR EXISTS (SELECT 1 FROM json_each(tasks.assigned_to) WHERE json_each.value = ")
            .push_bind(viewer.id)
            .push(") OR project_id IN (SELECT id FROM projects WHERE owner_id = ")
            .push_bind(viewer.id)
            .push(" OR EXISTS (SELECT 1 FROM json_each(projects.members) WHERE json_each.value = ")
            .push_bind(viewer.id)
            .push(")))");
    }

    if filter.my_tasks {
        builder
            .push(" AND EXISTS (SELECT 1 FROM json_each(tasks.assigned_to) WHERE json_each.value = ")
            .push_bind(viewer.id)
            .push(")");
    }
    if filter.created_by_me {
        builder.push(" AND created_by = ").push_bind(viewer.id);
    }
    if let Some(status) = filter.status {
        builder.push(" AND status = ").push_bind(status);
    }

    builder.push(" ORDER BY created_at DESC");

    builder
        .build_query_as::<Task>()
        .fetch_all(pool)
        .await
        .context("Failed to list tasks")
}

pub async fn set_status(
    pool: &SqlitePool,
    id: i64,
    status: TaskStatus,
    completed_at: Option<DateTime<Utc>>,
) -> Result<()> {
    sqlx::query("UPDATE tasks SET status = ?, completed_at = ? WHERE id = ?")
        .bind(status)
        .bind(completed_at)
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to update task status")?;
    Ok(())
}

/// Persists the mutable fields of a task after a full edit.
pub async fn save_task(pool: &SqlitePool, task: &Task) -> Result<()> {
    sqlx::query(
        "UPDATE tasks SET title = ?, description = ?, equipment = ?, area = ?, status = ?, \
         priority = ?, assigned_to = ?, due_date = ?, completed_at = ? WHERE id = ?",
    )
    .bind(&task.title)
    .bind(&task.description)
    .bind(&task.equipment)
    .bind(&task.area)
    .bind(task.status)
    .bind(task.priority)
    .bind(&task.assigned_to)
    .bind(task.due_date)
    .bind(task.completed_at)
    .bind(task.id)
    .execute(pool)
    .await
    .context("Failed to update task")?;
    Ok(())
}

pub async fn delete_task(pool: &SqlitePool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM tasks WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete task")?;
    Ok(result.rows_affected() > 0)
}
