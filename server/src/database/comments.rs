// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use anyhow::{Context, Result};
use chrono::Utc;
use common::Comment;
use sqlx::SqlitePool;

pub async fn create_comment(
    pool: &SqlitePool,
    content: &str,
    task_id: i64,
    author_id: i64,
    parent_id: Option<i64>,
) -> Result<Comment> {
    let created_at = Utc::now();
    let id = sqlx::query(
        "INSERT INTO comments (content, task_id, author_id, parent_id, created_at) \
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(content)
    .bind(task_id)
    .bind(author_id)
    .bind(parent_id)
    .bind(created_at)
    .execute(pool)
    .await
    .context("Failed to insert comment into DB")?
    .last_insert_rowid();

    Ok(Comment {
        id,
        content: content.to_string(),
        task_id,
        author_id,
        parent_id,
        created_at,
    })
}

pub async fn find_comment(pool: &SqlitePool, id: i64) -> Result<Option<Comment>> {
    sqlx::query_as::<_, Comment>("SELECT * FROM comments WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to look up comment")
}

/// All comments of a task, oldest first so threads read top-down.
pub async fn list_for_task(pool: &SqlitePool, task_id: i64) -> Result<Vec<Comment>> {
    sqlx::query_as::<_, Comment>(
        "SELECT * FROM comments WHERE task_id = ? ORDER BY created_at ASC",
    )
    .bind(task_id)
    .fetch_all(pool)
    .await
    .context("Failed to list comments")
}

pub async fn update_content(pool: &SqlitePool, id: i64, content: &str) -> Result<()> {
    sqlx::query("UPDATE comments SET content = ? WHERE id = ?")
        .bind(content)
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to update comment")?;
    Ok(())
}

/// Deletes a comment together with its whole reply subtree. The tree is
/// walked breadth-first inside one transaction, so a concurrent reply
/// cannot survive as an orphan. Returns the number of comments removed.
pub async fn delete_subtree(pool: &SqlitePool, id: i64) -> Result<u64> {
    let mut tx = pool
        .begin()
        .await
        .context("Failed to begin comment deletion")?;

    let mut to_delete = vec![id];
    let mut frontier = vec![id];
    while !frontier.is_empty() {
        let placeholders = vec!["?"; frontier.len()].join(", ");
        let query = format!("SELECT id FROM comments WHERE parent_id IN ({placeholders})");
        let mut children = sqlx::query_scalar::<_, i64>(&query);
        for parent in &frontier {
            children = children.bind(parent);
        }
        frontier = children
            .fetch_all(&mut *tx)
            .await
            .context("Failed to collect comment replies")?;
        to_delete.extend_from_slice(&frontier);
    }

    let placeholders = vec!["?"; to_delete.len()].join(", ");
    let query = format!("DELETE FROM comments WHERE id IN ({placeholders})");
    let mut delete = sqlx::query(&query);
    for comment_id in &to_delete {
        delete = delete.bind(comment_id);
    }
    let result = delete
        .execute(&mut *tx)
        .await
        .context("Failed to delete comment subtree")?;

    tx.commit().await.context("Failed to commit comment deletion")?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::testing;
    use common::{Priority, Role};

    async fn seed_task(pool: &SqlitePool, created_by: i64) -> i64 {
        crate::database::tasks::create_task(
            pool,
            crate::database::tasks::NewTask {
                title: "Inspect pump".to_string(),
                description: None,
                equipment: None,
                area: None,
                priority: Priority::Medium,
                assigned_to: vec![created_by],
                created_by,
                project_id: None,
                due_date: None,
            },
        )
        .await
        .unwrap()
        .id
    }

    #[tokio::test]
    async fn comments_thread_under_a_task() {
        let pool = testing::pool().await;
        let author = testing::seed_user(&pool, "john@company.com", Role::Worker).await;
        let task_id = seed_task(&pool, author.id).await;

        let root = create_comment(&pool, "Started", task_id, author.id, None)
            .await
            .unwrap();
        let reply = create_comment(&pool, "Any update?", task_id, author.id, Some(root.id))
            .await
            .unwrap();
        assert_eq!(reply.parent_id, Some(root.id));

        let listed = list_for_task(&pool, task_id).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, root.id);
    }

    #[tokio::test]
    async fn deleting_a_comment_removes_its_reply_subtree() {
        let pool = testing::pool().await;
        let author = testing::seed_user(&pool, "john@company.com", Role::Worker).await;
        let task_id = seed_task(&pool, author.id).await;

        let root = create_comment(&pool, "root", task_id, author.id, None)
            .await
            .unwrap();
        let child = create_comment(&pool, "child", task_id, author.id, Some(root.id))
            .await
            .unwrap();
        create_comment(&pool, "grandchild", task_id, author.id, Some(child.id))
            .await
            .unwrap();
        let sibling = create_comment(&pool, "sibling", task_id, author.id, None)
            .await
            .unwrap();

        assert_eq!(delete_subtree(&pool, root.id).await.unwrap(), 3);

        let remaining = list_for_task(&pool, task_id).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, sibling.id);
    }

    #[tokio::test]
    async fn deleting_a_task_cascades_to_comments() {
        let pool = testing::pool().await;
        let author = testing::seed_user(&pool, "john@company.com", Role::Worker).await;
        let task_id = seed_task(&pool, author.id).await;
        create_comment(&pool, "doomed", task_id, author.id, None)
            .await
            .unwrap();

        crate::database::tasks::delete_task(&pool, task_id)
            .await
            .unwrap();
        assert!(list_for_task(&pool, task_id).await.unwrap().is_empty());
    }
}
