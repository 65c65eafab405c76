//! User repository for mmiv.

use sqlx::SqlitePool;
use tracing::warn;

use super::user::{NewUser, Rank, User};
use crate::{MmivError, Result};

/// Raw account row. The rank is read as text so that a malformed value
/// surfaces as an unresolved rank instead of a decode failure.
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i64,
    username: String,
    password: String,
    rank: Option<String>,
    created_at: String,
}

impl UserRow {
    fn into_user(self) -> User {
        let rank = parse_stored_rank(&self.username, self.rank.as_deref());
        User {
            id: self.id,
            username: self.username,
            password: self.password,
            rank,
            created_at: self.created_at,
        }
    }
}

fn parse_stored_rank(username: &str, raw: Option<&str>) -> Option<Rank> {
    match raw.map(str::parse::<Rank>) {
        Some(Ok(rank)) => Some(rank),
        Some(Err(e)) => {
            warn!(username = %username, error = %e, "Stored rank is not an integer");
            None
        }
        None => {
            warn!(username = %username, "Stored rank is missing");
            None
        }
    }
}

const USER_COLUMNS: &str = "id, username, password, CAST(rank AS TEXT) AS rank, created_at";

/// Repository for account CRUD operations.
pub struct UserRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> UserRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new account and return it with the assigned ID.
    pub async fn create(&self, new_user: &NewUser) -> Result<User> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO users (username, password, rank) VALUES (?, ?, ?) RETURNING id",
        )
        .bind(&new_user.username)
        .bind(&new_user.password)
        .bind(new_user.rank.value())
        .fetch_one(self.pool)
        .await
        .map_err(|e| MmivError::Database(e.to_string()))?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| MmivError::NotFound("user".to_string()))
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| MmivError::Database(e.to_string()))?;

        Ok(row.map(UserRow::into_user))
    }

    /// Get an account by username (case-insensitive).
    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = ? COLLATE NOCASE"
        ))
        .bind(username)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| MmivError::Database(e.to_string()))?;

        Ok(row.map(UserRow::into_user))
    }

    /// Look up the rank of `username`.
    ///
    /// Returns `None` for an unknown account or an unreadable rank.
    pub async fn rank_of(&self, username: &str) -> Result<Option<Rank>> {
        let raw: Option<Option<String>> = sqlx::query_scalar(
            "SELECT CAST(rank AS TEXT) FROM users WHERE username = ? COLLATE NOCASE",
        )
        .bind(username)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| MmivError::Database(e.to_string()))?;

        Ok(raw.and_then(|raw| parse_stored_rank(username, raw.as_deref())))
    }

    /// Delete an account by username. Content it owns is left in place.
    pub async fn delete_by_username(&self, username: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE username = ? COLLATE NOCASE")
            .bind(username)
            .execute(self.pool)
            .await
            .map_err(|e| MmivError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    /// List all accounts ordered by username.
    pub async fn list(&self) -> Result<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY username COLLATE NOCASE"
        ))
        .fetch_all(self.pool)
        .await
        .map_err(|e| MmivError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(UserRow::into_user).collect())
    }

    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(self.pool)
            .await
            .map_err(|e| MmivError::Database(e.to_string()))?;
        Ok(count)
    }

    pub async fn username_exists(&self, username: &str) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM users WHERE username = ? COLLATE NOCASE)",
        )
        .bind(username)
        .fetch_one(self.pool)
        .await
        .map_err(|e| MmivError::Database(e.to_string()))?;
        Ok(exists)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    async fn setup_db() -> Database {
        Database::open_in_memory().await.unwrap()
    }

    #[tokio::test]
    async fn test_create_and_get_user() {
        let db = setup_db().await;
        let repo = UserRepository::new(db.pool());

        let user = repo
            .create(&NewUser::new("alice", "hash").with_rank(Rank::MODERATOR))
            .await
            .unwrap();
        assert_eq!(user.username, "alice");
        assert_eq!(user.rank, Some(Rank::MODERATOR));

        let found = repo.get_by_username("ALICE").await.unwrap().unwrap();
        assert_eq!(found.id, user.id);
        assert!(repo.get_by_username("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_username_is_rejected() {
        let db = setup_db().await;
        let repo = UserRepository::new(db.pool());

        repo.create(&NewUser::new("alice", "hash")).await.unwrap();
        let result = repo.create(&NewUser::new("Alice", "hash")).await;
        assert!(matches!(result, Err(MmivError::Database(_))));
    }

    #[tokio::test]
    async fn test_rank_of() {
        let db = setup_db().await;
        let repo = UserRepository::new(db.pool());

        repo.create(&NewUser::new("bob", "hash")).await.unwrap();
        assert_eq!(repo.rank_of("bob").await.unwrap(), Some(Rank::MEMBER));
        assert_eq!(repo.rank_of("ghost").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_non_numeric_rank_is_unresolved() {
        let db = setup_db().await;
        let repo = UserRepository::new(db.pool());

        sqlx::query("INSERT INTO users (username, password, rank) VALUES ('mallory', 'x', 'admin')")
            .execute(db.pool())
            .await
            .unwrap();

        assert_eq!(repo.rank_of("mallory").await.unwrap(), None);
        let user = repo.get_by_username("mallory").await.unwrap().unwrap();
        assert_eq!(user.rank, None);
        assert_eq!(user.effective_rank(), Rank::ANONYMOUS);
    }

    #[tokio::test]
    async fn test_delete_and_count() {
        let db = setup_db().await;
        let repo = UserRepository::new(db.pool());

        repo.create(&NewUser::new("alice", "hash")).await.unwrap();
        repo.create(&NewUser::new("bob", "hash")).await.unwrap();
        assert_eq!(repo.count().await.unwrap(), 2);

        assert!(repo.delete_by_username("alice").await.unwrap());
        assert!(!repo.delete_by_username("alice").await.unwrap());
        assert!(!repo.username_exists("alice").await.unwrap());
        assert!(repo.username_exists("BOB").await.unwrap());

        let names: Vec<String> = repo
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|u| u.username)
            .collect();
        assert_eq!(names, vec!["bob"]);
    }
}
