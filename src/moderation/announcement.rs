//! The board announcement.
//!
//! There is at most one announcement. It is written by moderators and shown
//! to members as-is.

use serde::Serialize;
use sqlx::SqlitePool;
use tracing::info;

use crate::auth::{require_member, require_moderator, Actor};
use crate::db::Database;
use crate::{MmivError, Outcome, Result};

/// Maximum announcement length (in characters).
pub const MAX_ANNOUNCEMENT_LENGTH: usize = 2_000;

/// The current announcement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Announcement {
    pub content: String,
    pub updated_at: String,
}

/// Repository for the single-row `announcements` table.
pub struct AnnouncementRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> AnnouncementRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get(&self) -> Result<Option<Announcement>> {
        let row = sqlx::query_as::<_, Announcement>(
            "SELECT content, updated_at FROM announcements WHERE id = 1",
        )
        .fetch_optional(self.pool)
        .await
        .map_err(|e| MmivError::Database(e.to_string()))?;
        Ok(row)
    }

    /// Insert or replace the announcement.
    pub async fn set(&self, content: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO announcements (id, content, updated_at) VALUES (1, ?, datetime('now')) \
             ON CONFLICT(id) DO UPDATE SET content = excluded.content, updated_at = excluded.updated_at",
        )
        .bind(content)
        .execute(self.pool)
        .await
        .map_err(|e| MmivError::Database(e.to_string()))?;
        Ok(())
    }

    /// Returns `false` if there was nothing to clear.
    pub async fn clear(&self) -> Result<bool> {
        let result = sqlx::query("DELETE FROM announcements")
            .execute(self.pool)
            .await
            .map_err(|e| MmivError::Database(e.to_string()))?;
        Ok(result.rows_affected() > 0)
    }
}

/// Announcement reads and moderator writes.
pub struct AnnouncementService<'a> {
    db: &'a Database,
}

impl<'a> AnnouncementService<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Current announcement text, or an empty string when none is set.
    pub async fn get(&self, actor: &Actor) -> Result<Outcome<String>> {
        if let Err(e) = require_member(actor) {
            return Ok(Outcome::denied(e.to_string()));
        }
        let current = AnnouncementRepository::new(self.db.pool()).get().await?;
        Ok(Outcome::Done(current.map(|a| a.content).unwrap_or_default()))
    }

    pub async fn set(&self, actor: &Actor, content: &str) -> Result<Outcome<()>> {
        if let Err(e) = require_moderator(actor) {
            return Ok(Outcome::denied(e.to_string()));
        }
        if content.trim().is_empty() {
            return Ok(Outcome::invalid("announcement is empty"));
        }
        if content.chars().count() > MAX_ANNOUNCEMENT_LENGTH {
            return Ok(Outcome::invalid(format!(
                "announcement is too long (max {MAX_ANNOUNCEMENT_LENGTH} characters)"
            )));
        }

        AnnouncementRepository::new(self.db.pool()).set(content).await?;
        info!(actor = ?actor.username(), "Announcement updated");
        Ok(Outcome::Done(()))
    }

    /// Remove the announcement. Clearing an empty slot is not an error.
    pub async fn clear(&self, actor: &Actor) -> Result<Outcome<()>> {
        if let Err(e) = require_moderator(actor) {
            return Ok(Outcome::denied(e.to_string()));
        }
        if AnnouncementRepository::new(self.db.pool()).clear().await? {
            info!(actor = ?actor.username(), "Announcement cleared");
        }
        Ok(Outcome::Done(()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Rank;

    #[tokio::test]
    async fn test_announcement_lifecycle() {
        let db = Database::open_in_memory().await.unwrap();
        let service = AnnouncementService::new(&db);
        let moderator = Actor::user("mod", Rank::MODERATOR);
        let member = Actor::user("alice", Rank::MEMBER);

        assert_eq!(service.get(&member).await.unwrap(), Outcome::Done(String::new()));

        assert!(service.set(&moderator, "first").await.unwrap().is_done());
        assert!(service.set(&moderator, "second").await.unwrap().is_done());
        assert_eq!(
            service.get(&member).await.unwrap(),
            Outcome::Done("second".to_string())
        );

        assert!(service.clear(&moderator).await.unwrap().is_done());
        assert!(service.clear(&moderator).await.unwrap().is_done());
        assert_eq!(service.get(&member).await.unwrap(), Outcome::Done(String::new()));
    }

    #[tokio::test]
    async fn test_announcement_permissions() {
        let db = Database::open_in_memory().await.unwrap();
        let service = AnnouncementService::new(&db);
        let member = Actor::user("alice", Rank::MEMBER);

        assert!(service.set(&member, "hi").await.unwrap().is_denied());
        assert!(service.clear(&member).await.unwrap().is_denied());
        assert!(service.get(&Actor::Anonymous).await.unwrap().is_denied());
        assert!(AnnouncementRepository::new(db.pool()).get().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_announcement_validation() {
        let db = Database::open_in_memory().await.unwrap();
        let service = AnnouncementService::new(&db);
        let moderator = Actor::user("mod", Rank::MODERATOR);

        assert!(service.set(&moderator, "  ").await.unwrap().is_invalid());
        let long = "x".repeat(MAX_ANNOUNCEMENT_LENGTH + 1);
        assert!(service.set(&moderator, &long).await.unwrap().is_invalid());
    }
}
