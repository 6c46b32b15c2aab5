// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use common::RefreshToken;
use sqlx::SqlitePool;

pub async fn insert_refresh_token(
    pool: &SqlitePool,
    user_id: i64,
    hashed_token: &str,
    expires_at: DateTime<Utc>,
) -> Result<()> {
    sqlx::query(
        "INSERT INTO refresh_tokens (hashed_token, user_id, expires_at, revoked_at, created_at) \
         VALUES (?, ?, ?, NULL, ?)",
    )
    .bind(hashed_token)
    .bind(user_id)
    .bind(expires_at)
    .bind(Utc::now())
    .execute(pool)
    .await
    .context("Failed to insert refresh token")?;
    Ok(())
}

pub async fn find_by_hash(pool: &SqlitePool, hashed_token: &str) -> Result<Option<RefreshToken>> {
    sqlx::query_as::<_, RefreshToken>("SELECT * FROM refresh_tokens WHERE hashed_token = ?")
        .bind(hashed_token)
        .fetch_optional(pool)
        .await
        .context("Failed to look up refresh token")
}

pub async fn delete_refresh_token(pool: &SqlitePool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM refresh_tokens WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete refresh token")?;
    Ok(())
}

/// Replaces a consumed token with its successor in one transaction, so
/// there is no window in which both are valid and a replayed old token
/// can never succeed after rotation.
pub async fn rotate_refresh_token(
    pool: &SqlitePool,
    consumed_id: i64,
    user_id: i64,
    new_hashed_token: &str,
    new_expires_at: DateTime<Utc>,
) -> Result<()> {
    let mut tx = pool.begin().await.context("Failed to begin rotation")?;
    sqlx::query("DELETE FROM refresh_tokens WHERE id = ?")
        .bind(consumed_id)
        .execute(&mut *tx)
        .await
        .context("Failed to delete consumed refresh token")?;
    sqlx::query(
        "INSERT INTO refresh_tokens (hashed_token, user_id, expires_at, revoked_at, created_at) \
         VALUES (?, ?, ?, NULL, ?)",
    )
    .bind(new_hashed_token)
    .bind(user_id)
    .bind(new_expires_at)
    .bind(Utc::now())
    .execute(&mut *tx)
    .await
    .context("Failed to insert rotated refresh token")?;
    tx.commit().await.context("Failed to commit rotation")?;
    Ok(())
}

/// Marks the token revoked. Idempotent: revoking an unknown or already
/// revoked token is a no-op.
pub async fn revoke_by_hash(pool: &SqlitePool, hashed_token: &str) -> Result<()> {
    sqlx::query(
        "UPDATE refresh_tokens SET revoked_at = ? WHERE hashed_token = ? AND revoked_at IS NULL",
    )
    .bind(Utc::now())
    .bind(hashed_token)
    .execute(pool)
    .await
    .context("Failed to revoke refresh token")?;
    Ok(())
}

/// Deletes every refresh token of a user (password reset, forced
/// re-authentication). Returns the number of tokens removed.
pub async fn delete_for_user(pool: &SqlitePool, user_id: i64) -> Result<u64> {
    let result = sqlx::query("DELETE FROM refresh_tokens WHERE user_id = ?")
        .bind(user_id)
        .execute(pool)
        .await
        .context("Failed to delete user's refresh tokens")?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::testing;
    use common::Role;

    #[tokio::test]
    async fn rotation_removes_the_consumed_token() {
        let pool = testing::pool().await;
        let user = testing::seed_user(&pool, "john@company.com", Role::Worker).await;
        let expires = Utc::now() + chrono::Duration::days(7);
        insert_refresh_token(&pool, user.id, "old-digest", expires)
            .await
            .unwrap();
        let stored = find_by_hash(&pool, "old-digest").await.unwrap().unwrap();

        rotate_refresh_token(&pool, stored.id, user.id, "new-digest", expires)
            .await
            .unwrap();

        assert!(find_by_hash(&pool, "old-digest").await.unwrap().is_none());
        assert!(find_by_hash(&pool, "new-digest").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn revoke_is_idempotent() {
        let pool = testing::pool().await;
        let user = testing::seed_user(&pool, "john@company.com", Role::Worker).await;
        let expires = Utc::now() + chrono::Duration::days(7);
        insert_refresh_token(&pool, user.id, "digest", expires)
            .await
            .unwrap();

        revoke_by_hash(&pool, "digest").await.unwrap();
        let first = find_by_hash(&pool, "digest").await.unwrap().unwrap();
        assert!(first.revoked_at.is_some());

        // A second revoke (or an unknown token) must not fail or move the
        // revocation timestamp.
        revoke_by_hash(&pool, "digest").await.unwrap();
        let second = find_by_hash(&pool, "digest").await.unwrap().unwrap();
        assert_eq!(first.revoked_at, second.revoked_at);
        revoke_by_hash(&pool, "unknown-digest").await.unwrap();
    }

    #[tokio::test]
    async fn delete_for_user_removes_all_tokens() {
        let pool = testing::pool().await;
        let user = testing::seed_user(&pool, "john@company.com", Role::Worker).await;
        let other = testing::seed_user(&pool, "sarah@company.com", Role::Worker).await;
        let expires = Utc::now() + chrono::Duration::days(7);
        insert_refresh_token(&pool, user.id, "a", expires).await.unwrap();
        insert_refresh_token(&pool, user.id, "b", expires).await.unwrap();
        insert_refresh_token(&pool, other.id, "c", expires).await.unwrap();

        assert_eq!(delete_for_user(&pool, user.id).await.unwrap(), 2);
        assert!(find_by_hash(&pool, "c").await.unwrap().is_some());
    }
}
