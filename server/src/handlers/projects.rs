// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
};
use common::{CreateProjectPayload, MemberPayload, Project, Role, UpdateProjectPayload};
use sqlx::SqlitePool;
use tracing::info;

use super::AppError;
use crate::authz;
use crate::database::{projects, users};
use crate::extract::AuthUser;

/// Normalizes a member list: deduplicated, owner excluded, and every id
/// must refer to an existing user.
async fn validate_members(
    pool: &SqlitePool,
    owner_id: i64,
    members: Vec<i64>,
) -> Result<Vec<i64>, AppError> {
    let mut cleaned: Vec<i64> = Vec::new();
    for id in members {
        if id != owner_id && !cleaned.contains(&id) {
            cleaned.push(id);
        }
    }
    if !users::all_users_exist(pool, &cleaned).await? {
        return Err(AppError::InvalidArgument(
            "One or more member ids do not refer to an existing user".to_string(),
        ));
    }
    Ok(cleaned)
}

/// Handler for listing projects. Admin and supervisor see everything;
/// everyone else sees projects they own or are a member of.
pub async fn list_projects(
    State(pool): State<SqlitePool>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<Project>>, AppError> {
    if authz::has_min_role(&user, Role::Supervisor) {
        return Ok(Json(projects::list_all(&pool).await?));
    }

    let mut visible = projects::list_owned(&pool, user.id).await?;
    for project in projects::list_member_of(&pool, user.id).await? {
        if !visible.iter().any(|p| p.id == project.id) {
            visible.push(project);
        }
    }
    visible.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(Json(visible))
}

/// Handler for creating a project. Managers and above only; the creator
/// becomes the owner.
pub async fn create_project(
    State(pool): State<SqlitePool>,
    AuthUser(user): AuthUser,
    Json(payload): Json<CreateProjectPayload>,
) -> Result<(StatusCode, Json<Project>), AppError> {
    authz::require_min_role(&user, Role::Manager)?;
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(AppError::InvalidArgument(
            "Project name cannot be empty".to_string(),
        ));
    }

    let members = validate_members(&pool, user.id, payload.members.unwrap_or_default()).await?;
    let project =
        projects::create_project(&pool, name, payload.description.as_deref(), user.id, members)
            .await?;
    info!("Project {} created by user {}", project.id, user.id);
    Ok((StatusCode::CREATED, Json(project)))
}

pub async fn get_project(
    State(pool): State<SqlitePool>,
    AuthUser(user): AuthUser,
    Path(project_id): Path<i64>,
) -> Result<Json<Project>, AppError> {
    let Some(project) = projects::find_project(&pool, project_id).await? else {
        return Err(AppError::not_found("Project", project_id));
    };
    authz::can_view_project(&user, &project)?;
    Ok(Json(project))
}

/// Handler for updating a project's name, description or member list.
pub async fn update_project(
    State(pool): State<SqlitePool>,
    AuthUser(user): AuthUser,
    Path(project_id): Path<i64>,
    Json(payload): Json<UpdateProjectPayload>,
) -> Result<Json<Project>, AppError> {
    let Some(mut project) = projects::find_project(&pool, project_id).await? else {
        return Err(AppError::not_found("Project", project_id));
    };
    authz::can_update_project(&user, &project)?;

    if let Some(name) = payload.name {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::InvalidArgument(
                "Project name cannot be empty".to_string(),
            ));
        }
        project.name = name;
    }
    if let Some(description) = payload.description {
        project.description = Some(description);
    }
    if let Some(members) = payload.members {
        project.members.0 = validate_members(&pool, project.owner_id, members).await?;
    }

    projects::save_project(&pool, &project).await?;
    Ok(Json(project))
}

pub async fn delete_project(
    State(pool): State<SqlitePool>,
    AuthUser(user): AuthUser,
    Path(project_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let Some(project) = projects::find_project(&pool, project_id).await? else {
        return Err(AppError::not_found("Project", project_id));
    };
    authz::can_delete_project(&user, &project)?;

    projects::delete_project(&pool, project_id).await?;
    info!("Project {} deleted by user {}", project_id, user.id);
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for adding a member. Adding the owner or an existing member
/// is a conflict, not a silent no-op, so clients see the discrepancy.
pub async fn add_member(
    State(pool): State<SqlitePool>,
    AuthUser(user): AuthUser,
    Path(project_id): Path<i64>,
    Json(payload): Json<MemberPayload>,
) -> Result<Json<Project>, AppError> {
    let Some(project) = projects::find_project(&pool, project_id).await? else {
        return Err(AppError::not_found("Project", project_id));
    };
    authz::can_manage_members(&user, &project)?;

    if users::find_user_by_id(&pool, payload.user_id).await?.is_none() {
        return Err(AppError::not_found("User", payload.user_id));
    }

    if !projects::add_member(&pool, project_id, payload.user_id).await? {
        return Err(AppError::Conflict(
            "User is already a member or owns this project".to_string(),
        ));
    }

    let Some(project) = projects::find_project(&pool, project_id).await? else {
        return Err(AppError::not_found("Project", project_id));
    };
    Ok(Json(project))
}

pub async fn remove_member(
    State(pool): State<SqlitePool>,
    AuthUser(user): AuthUser,
    Path(project_id): Path<i64>,
    Json(payload): Json<MemberPayload>,
) -> Result<Json<Project>, AppError> {
    let Some(project) = projects::find_project(&pool, project_id).await? else {
        return Err(AppError::not_found("Project", project_id));
    };
    authz::can_manage_members(&user, &project)?;

    if !projects::remove_member(&pool, project_id, payload.user_id).await? {
        return Err(AppError::NotFound(format!(
            "User with ID {} is not a member of this project",
            payload.user_id
        )));
    }

    let Some(project) = projects::find_project(&pool, project_id).await? else {
        return Err(AppError::not_found("Project", project_id));
    };
    Ok(Json(project))
}
