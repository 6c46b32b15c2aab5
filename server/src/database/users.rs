// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use anyhow::{Context, Result};
use chrono::Utc;
use common::{PublicUser, Role, User};
use sqlx::SqlitePool;

pub async fn create_user(
    pool: &SqlitePool,
    email: &str,
    name: &str,
    password_hash: &str,
    role: Role,
) -> Result<User> {
    let created_at = Utc::now();
    let id = sqlx::query(
        "INSERT INTO users (email, name, password_hash, role, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(email)
    .bind(name)
    .bind(password_hash)
    .bind(role)
    .bind(created_at)
    .execute(pool)
    .await
    .context("Failed to insert user into DB")?
    .last_insert_rowid();

    Ok(User {
        id,
        email: email.to_string(),
        name: name.to_string(),
        password_hash: password_hash.to_string(),
        role,
        created_at,
    })
}

pub async fn find_user_by_email(pool: &SqlitePool, email: &str) -> Result<Option<User>> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
        .bind(email)
        .fetch_optional(pool)
        .await
        .context("Failed to look up user by email")
}

pub async fn find_user_by_id(pool: &SqlitePool, id: i64) -> Result<Option<User>> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to look up user by id")
}

pub async fn list_users(pool: &SqlitePool) -> Result<Vec<PublicUser>> {
    sqlx::query_as::<_, PublicUser>("SELECT id, email, name, role FROM users ORDER BY name ASC")
        .fetch_all(pool)
        .await
        .context("Failed to list users")
}

/// Verifies that every id in `ids` refers to an existing user.
pub async fn all_users_exist(pool: &SqlitePool, ids: &[i64]) -> Result<bool> {
    if ids.is_empty() {
        return Ok(true);
    }
    let placeholders = vec!["?"; ids.len()].join(", ");
    let query = format!("SELECT COUNT(*) FROM users WHERE id IN ({placeholders})");
    let mut count = sqlx::query_scalar::<_, i64>(&query);
    for id in ids {
        count = count.bind(id);
    }
    let found = count
        .fetch_one(pool)
        .await
        .context("Failed to count users by id")?;
    Ok(found as usize == ids.len())
}

pub async fn update_user_role(pool: &SqlitePool, id: i64, role: Role) -> Result<()> {
    sqlx::query("UPDATE users SET role = ? WHERE id = ?")
        .bind(role)
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to update user role")?;
    Ok(())
}

pub async fn update_user_password(pool: &SqlitePool, id: i64, password_hash: &str) -> Result<()> {
    sqlx::query("UPDATE users SET password_hash = ? WHERE id = ?")
        .bind(password_hash)
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to update user password")?;
    Ok(())
}

/// Returns true if a user was deleted. Foreign keys cascade to the
/// user's refresh tokens, owned projects, created tasks, comments and
/// notifications.
pub async fn delete_user(pool: &SqlitePool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete user")?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::testing;

    #[tokio::test]
    async fn create_and_find_user() {
        let pool = testing::pool().await;
        let user = create_user(&pool, "john@company.com", "John Doe", "hash", Role::Worker)
            .await
            .unwrap();
        assert!(user.id > 0);
        assert_eq!(user.role, Role::Worker);

        let by_email = find_user_by_email(&pool, "john@company.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_email.id, user.id);
        assert!(
            find_user_by_email(&pool, "nobody@company.com")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected_by_unique_index() {
        let pool = testing::pool().await;
        create_user(&pool, "john@company.com", "John", "hash", Role::Worker)
            .await
            .unwrap();
        let result = create_user(&pool, "john@company.com", "Other", "hash", Role::Worker).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn deleting_a_user_cascades_to_refresh_tokens() {
        let pool = testing::pool().await;
        let user = testing::seed_user(&pool, "john@company.com", Role::Worker).await;
        crate::database::tokens::insert_refresh_token(
            &pool,
            user.id,
            "digest",
            Utc::now() + chrono::Duration::days(7),
        )
        .await
        .unwrap();

        assert!(delete_user(&pool, user.id).await.unwrap());
        assert!(
            crate::database::tokens::find_by_hash(&pool, "digest")
                .await
                .unwrap()
                .is_none()
        );
        // Deleting an unknown user is not an error, just a no-op.
        assert!(!delete_user(&pool, user.id).await.unwrap());
    }

    #[tokio::test]
    async fn all_users_exist_checks_every_id() {
        let pool = testing::pool().await;
        let a = testing::seed_user(&pool, "a@company.com", Role::Worker).await;
        let b = testing::seed_user(&pool, "b@company.com", Role::Worker).await;
        assert!(all_users_exist(&pool, &[a.id, b.id]).await.unwrap());
        assert!(!all_users_exist(&pool, &[a.id, 9999]).await.unwrap());
        assert!(all_users_exist(&pool, &[]).await.unwrap());
    }
}
