// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use common::Event;
use sqlx::SqlitePool;

pub async fn create_event(
    pool: &SqlitePool,
    title: &str,
    description: Option<&str>,
    event_date: DateTime<Utc>,
    created_by: i64,
) -> Result<Event> {
    let created_at = Utc::now();
    let id = sqlx::query(
        "INSERT INTO events (title, description, event_date, created_by, created_at) \
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(title)
    .bind(description)
    .bind(event_date)
    .bind(created_by)
    .bind(created_at)
    .execute(pool)
    .await
    .context("Failed to insert event into DB")?
    .last_insert_rowid();

    Ok(Event {
        id,
        title: title.to_string(),
        description: description.map(str::to_string),
        event_date,
        created_by,
        created_at,
    })
}

pub async fn find_event(pool: &SqlitePool, id: i64) -> Result<Option<Event>> {
    sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to look up event")
}

pub async fn list_events(pool: &SqlitePool) -> Result<Vec<Event>> {
    sqlx::query_as::<_, Event>("SELECT * FROM events ORDER BY event_date ASC")
        .fetch_all(pool)
        .await
        .context("Failed to list events")
}

pub async fn delete_event(pool: &SqlitePool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM events WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete event")?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::testing;
    use common::Role;

    #[tokio::test]
    async fn events_are_listed_in_date_order() {
        let pool = testing::pool().await;
        let user = testing::seed_user(&pool, "john@company.com", Role::Manager).await;
        let later = Utc::now() + chrono::Duration::days(2);
        let sooner = Utc::now() + chrono::Duration::days(1);
        create_event(&pool, "Maintenance window", None, later, user.id)
            .await
            .unwrap();
        create_event(&pool, "Shift handover", None, sooner, user.id)
            .await
            .unwrap();

        let listed = list_events(&pool).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].title, "Shift handover");
    }

    #[tokio::test]
    async fn delete_reports_whether_a_row_was_removed() {
        let pool = testing::pool().await;
        let user = testing::seed_user(&pool, "john@company.com", Role::Manager).await;
        let event = create_event(&pool, "Audit", None, Utc::now(), user.id)
            .await
            .unwrap();

        assert!(delete_event(&pool, event.id).await.unwrap());
        assert!(!delete_event(&pool, event.id).await.unwrap());
        assert!(find_event(&pool, event.id).await.unwrap().is_none());
    }
}
