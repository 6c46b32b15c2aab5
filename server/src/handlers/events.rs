// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
};
use common::{CreateEventPayload, Event, Role};
use sqlx::SqlitePool;
use tracing::info;

use super::AppError;
use crate::database::events;
use crate::extract::AuthUser;

pub async fn list_events(
    State(pool): State<SqlitePool>,
    AuthUser(_user): AuthUser,
) -> Result<Json<Vec<Event>>, AppError> {
    Ok(Json(events::list_events(&pool).await?))
}

pub async fn create_event(
    State(pool): State<SqlitePool>,
    AuthUser(user): AuthUser,
    Json(payload): Json<CreateEventPayload>,
) -> Result<(StatusCode, Json<Event>), AppError> {
    let title = payload.title.trim();
    if title.is_empty() {
        return Err(AppError::InvalidArgument(
            "Event title cannot be empty".to_string(),
        ));
    }

    let event = events::create_event(
        &pool,
        title,
        payload.description.as_deref(),
        payload.event_date,
        user.id,
    )
    .await?;
    info!("Event {} created by user {}", event.id, user.id);
    Ok((StatusCode::CREATED, Json(event)))
}

/// Handler for deleting an event. Creator or admin.
pub async fn delete_event(
    State(pool): State<SqlitePool>,
    AuthUser(user): AuthUser,
    Path(event_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let Some(event) = events::find_event(&pool, event_id).await? else {
        return Err(AppError::not_found("Event", event_id));
    };
    if event.created_by != user.id && user.role != Role::Admin {
        return Err(AppError::Forbidden(
            "Only the event creator or an admin can delete this event".to_string(),
        ));
    }

    events::delete_event(&pool, event_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
