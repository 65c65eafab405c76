//! Post and comment repositories.
//!
//! Inserts happen inside the service's transaction together with id
//! allocation; everything else goes through these repositories.

use sqlx::SqlitePool;

use super::item::{CommentRow, ContentItem, PostRow};
use crate::{MmivError, Result};

const POST_COLUMNS: &str =
    "id, username, content, image_path, created_at, pinned, locked, is_anonymous, raw_markup";

const COMMENT_COLUMNS: &str =
    "id, parent_post_id, username, content, image_path, created_at, is_anonymous, raw_markup";

/// Repository for the `posts` table.
pub struct PostRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> PostRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, id: i64) -> Result<Option<ContentItem>> {
        let row = sqlx::query_as::<_, PostRow>(&format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| MmivError::Database(e.to_string()))?;

        Ok(row.map(PostRow::into_item))
    }

    /// One page of posts: pinned first, then newest first.
    pub async fn list(&self, offset: i64, limit: i64) -> Result<Vec<ContentItem>> {
        let rows = sqlx::query_as::<_, PostRow>(&format!(
            "SELECT {POST_COLUMNS} FROM posts ORDER BY pinned DESC, id DESC LIMIT ? OFFSET ?"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool)
        .await
        .map_err(|e| MmivError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(PostRow::into_item).collect())
    }

    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts")
            .fetch_one(self.pool)
            .await
            .map_err(|e| MmivError::Database(e.to_string()))?;
        Ok(count)
    }

    /// Returns `false` if the post does not exist.
    pub async fn set_pinned(&self, id: i64, pinned: bool) -> Result<bool> {
        let result = sqlx::query("UPDATE posts SET pinned = ? WHERE id = ?")
            .bind(pinned)
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| MmivError::Database(e.to_string()))?;
        Ok(result.rows_affected() > 0)
    }

    /// Returns `false` if the post does not exist.
    pub async fn set_locked(&self, id: i64, locked: bool) -> Result<bool> {
        let result = sqlx::query("UPDATE posts SET locked = ? WHERE id = ?")
            .bind(locked)
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| MmivError::Database(e.to_string()))?;
        Ok(result.rows_affected() > 0)
    }
}

/// Repository for the `comments` table.
pub struct CommentRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> CommentRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, id: i64) -> Result<Option<ContentItem>> {
        let row = sqlx::query_as::<_, CommentRow>(&format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| MmivError::Database(e.to_string()))?;

        Ok(row.map(CommentRow::into_item))
    }

    /// Comments of a post in creation order.
    pub async fn list_for_post(&self, post_id: i64) -> Result<Vec<ContentItem>> {
        let rows = sqlx::query_as::<_, CommentRow>(&format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE parent_post_id = ? ORDER BY id ASC"
        ))
        .bind(post_id)
        .fetch_all(self.pool)
        .await
        .map_err(|e| MmivError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(CommentRow::into_item).collect())
    }

    pub async fn count_for_post(&self, post_id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE parent_post_id = ?")
            .bind(post_id)
            .fetch_one(self.pool)
            .await
            .map_err(|e| MmivError::Database(e.to_string()))?;
        Ok(count)
    }

    /// Returns `false` if the comment does not exist.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM comments WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| MmivError::Database(e.to_string()))?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    async fn insert_post(db: &Database, id: i64, pinned: bool) {
        sqlx::query("INSERT INTO posts (id, username, content, pinned) VALUES (?, 'alice', 'p', ?)")
            .bind(id)
            .bind(pinned)
            .execute(db.pool())
            .await
            .unwrap();
    }

    async fn insert_comment(db: &Database, id: i64, post_id: i64) {
        sqlx::query("INSERT INTO comments (id, parent_post_id, username, content) VALUES (?, ?, 'bob', 'c')")
            .bind(id)
            .bind(post_id)
            .execute(db.pool())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_post_listing_order() {
        let db = Database::open_in_memory().await.unwrap();
        insert_post(&db, 1, false).await;
        insert_post(&db, 2, true).await;
        insert_post(&db, 3, false).await;
        insert_post(&db, 4, true).await;
        insert_post(&db, 5, false).await;

        let repo = PostRepository::new(db.pool());
        let ids: Vec<i64> = repo.list(0, 10).await.unwrap().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![4, 2, 5, 3, 1]);

        let page: Vec<i64> = repo.list(1, 2).await.unwrap().iter().map(|p| p.id).collect();
        assert_eq!(page, vec![2, 5]);
        assert_eq!(repo.count().await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_set_flags() {
        let db = Database::open_in_memory().await.unwrap();
        insert_post(&db, 1, false).await;
        let repo = PostRepository::new(db.pool());

        assert!(repo.set_pinned(1, true).await.unwrap());
        assert!(repo.set_locked(1, true).await.unwrap());
        let post = repo.get(1).await.unwrap().unwrap();
        assert!(post.is_pinned() && post.is_locked());

        assert!(!repo.set_pinned(99, true).await.unwrap());
        assert!(!repo.set_locked(99, true).await.unwrap());
    }

    #[tokio::test]
    async fn test_comments_for_post() {
        let db = Database::open_in_memory().await.unwrap();
        insert_post(&db, 1, false).await;
        insert_post(&db, 2, false).await;
        insert_comment(&db, 5, 1).await;
        insert_comment(&db, 3, 1).await;
        insert_comment(&db, 4, 2).await;

        let repo = CommentRepository::new(db.pool());
        let ids: Vec<i64> = repo
            .list_for_post(1)
            .await
            .unwrap()
            .iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(ids, vec![3, 5]);
        assert_eq!(repo.count_for_post(1).await.unwrap(), 2);
        assert_eq!(repo.count_for_post(7).await.unwrap(), 0);

        assert!(repo.delete(3).await.unwrap());
        assert!(!repo.delete(3).await.unwrap());
        assert!(repo.get(3).await.unwrap().is_none());
        assert!(repo.get(4).await.unwrap().unwrap().is_comment());
    }
}
