// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use anyhow::{Context, Result};
use chrono::Utc;
use common::Project;
use sqlx::SqlitePool;
use sqlx::types::Json;

pub async fn create_project(
    pool: &SqlitePool,
    name: &str,
    description: Option<&str>,
    owner_id: i64,
    members: Vec<i64>,
) -> Result<Project> {
    let created_at = Utc::now();
    let members = Json(members);
    let id = sqlx::query(
        "INSERT INTO projects (name, description, owner_id, members, created_at) \
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(name)
    .bind(description)
    .bind(owner_id)
    .bind(&members)
    .bind(created_at)
    .execute(pool)
    .await
    .context("Failed to insert project into DB")?
    .last_insert_rowid();

    Ok(Project {
        id,
        name: name.to_string(),
        description: description.map(str::to_string),
        owner_id,
        members,
        created_at,
    })
}

pub async fn find_project(pool: &SqlitePool, id: i64) -> Result<Option<Project>> {
    sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to look up project")
}

pub async fn list_all(pool: &SqlitePool) -> Result<Vec<Project>> {
    sqlx::query_as::<_, Project>("SELECT * FROM projects ORDER BY created_at DESC")
        .fetch_all(pool)
        .await
        .context("Failed to list projects")
}

pub async fn list_owned(pool: &SqlitePool, owner_id: i64) -> Result<Vec<Project>> {
    sqlx::query_as::<_, Project>(
        "SELECT * FROM projects WHERE owner_id = ? ORDER BY created_at DESC",
    )
    .bind(owner_id)
    .fetch_all(pool)
    .await
    .context("Failed to list owned projects")
}

pub async fn list_member_of(pool: &SqlitePool, user_id: i64) -> Result<Vec<Project>> {
    sqlx::query_as::<_, Project>(
        "SELECT * FROM projects \
         WHERE EXISTS (SELECT 1 FROM json_each(projects.members) WHERE json_each.value = ?) \
         ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .context("Failed to list member projects")
}

/// Persists the mutable fields of a project after the handler has applied
/// its changes.
pub async fn save_project(pool: &SqlitePool, project: &Project) -> Result<()> {
    sqlx::query("UPDATE projects SET name = ?, description = ?, members = ? WHERE id = ?")
        .bind(&project.name)
        .bind(&project.description)
        .bind(&project.members)
        .bind(project.id)
        .execute(pool)
        .await
        .context("Failed to update project")?;
    Ok(())
}

pub async fn delete_project(pool: &SqlitePool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM projects WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete project")?;
    Ok(result.rows_affected() > 0)
}

/// Adds a member as a single atomic set-union: the guard clauses make the
/// statement a no-op when the user already is a member or is the owner,
/// so concurrent adds cannot produce duplicates. Returns true if the
/// membership actually changed.
pub async fn add_member(pool: &SqlitePool, project_id: i64, user_id: i64) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE projects SET members = json_insert(members, '$[#]', ?) \
         WHERE id = ? AND owner_id != ? \
         AND NOT EXISTS (SELECT 1 FROM json_each(projects.members) WHERE json_each.value = ?)",
    )
    .bind(user_id)
    .bind(project_id)
    .bind(user_id)
    .bind(user_id)
    .execute(pool)
    .await
    .context("Failed to add project member")?;
    Ok(result.rows_affected() > 0)
}

/// Removes a member as a single atomic set-difference. Returns true if
/// the membership actually changed.
pub async fn remove_member(pool: &SqlitePool, project_id: i64, user_id: i64) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE projects SET members = \
            (SELECT json_group_array(json_each.value) FROM json_each(projects.members) \
             WHERE json_each.value != ?) \
         WHERE id = ? \
         AND EXISTS (SELECT 1 FROM json_each(projects.members) WHERE json_each.value = ?)",
    )
    .bind(user_id)
    .bind(project_id)
    .bind(user_id)
    .execute(pool)
    .await
    .context("Failed to remove project member")?;
    Ok(result.rows_affected() > 0)
}
