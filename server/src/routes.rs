// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use crate::handlers::{auth, comments, events, notifications, projects, tasks, users};
use axum::{
    Router,
    extract::Json,
    routing::{delete, get, patch, post, put},
};
use sqlx::SqlitePool;

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Creates and configures the application router.
pub fn create_router(pool: SqlitePool) -> Router {
    Router::new()
        .route("/api/health", get(health))
        // Identity: register/login/refresh/logout are the only
        // unauthenticated JSON routes besides the reminder sweep.
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/refresh", post(auth::refresh))
        .route("/api/auth/logout", post(auth::logout))
        // Users
        .route("/api/users", get(users::list_users))
        .route("/api/users/me", get(users::me))
        .route("/api/users/{id}", put(users::update_role))
        .route("/api/users/{id}", delete(users::delete_user))
        .route("/api/users/{id}/reset-password", post(users::reset_password))
        // Projects and their member sets
        .route("/api/projects", get(projects::list_projects))
        .route("/api/projects", post(projects::create_project))
        .route("/api/projects/{id}", get(projects::get_project))
        .route("/api/projects/{id}", put(projects::update_project))
        .route("/api/projects/{id}", delete(projects::delete_project))
        .route("/api/projects/{id}/members", post(projects::add_member))
        .route("/api/projects/{id}/members", delete(projects::remove_member))
        // Tasks: PATCH is the status-only path, PUT the full edit
        .route("/api/tasks", get(tasks::list_tasks))
        .route("/api/tasks", post(tasks::create_task))
        .route("/api/tasks/{id}", get(tasks::get_task))
        .route("/api/tasks/{id}", patch(tasks::update_status))
        .route("/api/tasks/{id}", put(tasks::update_task))
        .route("/api/tasks/{id}", delete(tasks::delete_task))
        // Comment threads under a task
        .route("/api/tasks/{id}/comments", get(comments::list_comments))
        .route("/api/tasks/{id}/comments", post(comments::create_comment))
        .route(
            "/api/tasks/{id}/comments/{comment_id}",
            patch(comments::update_comment),
        )
        .route(
            "/api/tasks/{id}/comments/{comment_id}",
            delete(comments::delete_comment),
        )
        // Notifications
        .route("/api/notifications", get(notifications::list_notifications))
        .route("/api/notifications", post(notifications::mark_all_read))
        .route(
            "/api/notifications/{id}/read",
            patch(notifications::mark_read),
        )
        .route(
            "/api/notifications/check-reminders",
            post(notifications::check_reminders),
        )
        // Events
        .route("/api/events", get(events::list_events))
        .route("/api/events", post(events::create_event))
        .route("/api/events/{id}", delete(events::delete_event))
        // Adds the database pool to the application state
        .with_state(pool)
}
