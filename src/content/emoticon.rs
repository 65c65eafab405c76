//! Emoticon registry and `:name:` substitution.

use std::collections::HashSet;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use regex::{Captures, Regex};
use sqlx::SqlitePool;
use tokio::sync::Mutex;
use tracing::debug;

use crate::{MmivError, Result};

/// A `:name:` token. Names are letters, digits, `_`, `+` or `-`.
const TOKEN_PATTERN: &str = r":([a-zA-Z0-9_+-]+):";

fn token_regex() -> &'static Regex {
    static TOKEN: OnceLock<Regex> = OnceLock::new();
    TOKEN.get_or_init(|| Regex::new(TOKEN_PATTERN).expect("emoticon token pattern compiles"))
}

/// Normalize an emoticon name as supplied by a moderator.
///
/// A trailing `.png` is dropped. Returns `None` if what remains is not a
/// valid name.
pub fn normalize_name(name: &str) -> Option<String> {
    let name = name.trim();
    let name = name.strip_suffix(".png").unwrap_or(name);
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '+' | '-'));
    valid.then(|| name.to_string())
}

/// In-memory set of registered emoticon names.
///
/// Shared by every request; clones refer to the same set. The set is rebuilt
/// from the store after each add or remove.
#[derive(Debug, Clone, Default)]
pub struct EmoticonSet {
    names: Arc<RwLock<HashSet<String>>>,
    // Held from the store read to the swap, so an older snapshot can never
    // overwrite a newer one.
    reload_lock: Arc<Mutex<()>>,
}

impl EmoticonSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let set = Self::new();
        set.replace(names.into_iter().filter_map(|n| normalize_name(n.as_ref())).collect());
        set
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .names
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.names.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn replace(&self, names: HashSet<String>) {
        *self.names.write().unwrap_or_else(PoisonError::into_inner) = names;
    }

    /// Rebuild the set from the store. Returns the number of names loaded.
    pub async fn reload(&self, pool: &SqlitePool) -> Result<usize> {
        let _guard = self.reload_lock.lock().await;
        let names: HashSet<String> = EmoticonRepository::new(pool)
            .list_names()
            .await?
            .iter()
            .filter_map(|n| normalize_name(n))
            .collect();
        let count = names.len();
        self.replace(names);
        debug!(count, "Reloaded emoticons");
        Ok(count)
    }

    /// Replace each `:name:` token whose name is registered with an image
    /// reference under `url_prefix`. Unknown tokens are left verbatim.
    pub fn replace_tokens(&self, text: &str, url_prefix: &str) -> String {
        let names = self.names.read().unwrap_or_else(PoisonError::into_inner);
        if names.is_empty() {
            return text.to_string();
        }
        let prefix = url_prefix.trim_end_matches('/');

        token_regex()
            .replace_all(text, |caps: &Captures<'_>| {
                let name = &caps[1];
                if names.contains(name) {
                    format!(r#"<img class="emoticon" src="{prefix}/{name}.png" alt="{name}">"#)
                } else {
                    caps[0].to_string()
                }
            })
            .into_owned()
    }
}

/// Repository for the `emoticons` table.
pub struct EmoticonRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> EmoticonRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn list_names(&self) -> Result<Vec<String>> {
        let names = sqlx::query_scalar("SELECT name FROM emoticons ORDER BY name")
            .fetch_all(self.pool)
            .await
            .map_err(|e| MmivError::Database(e.to_string()))?;
        Ok(names)
    }

    /// Register a name. Returns `false` if it already existed.
    pub async fn add(&self, name: &str) -> Result<bool> {
        let result = sqlx::query("INSERT OR IGNORE INTO emoticons (name) VALUES (?)")
            .bind(name)
            .execute(self.pool)
            .await
            .map_err(|e| MmivError::Database(e.to_string()))?;
        Ok(result.rows_affected() > 0)
    }

    /// Unregister a name. Returns `false` if it was not registered.
    pub async fn remove(&self, name: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM emoticons WHERE name = ?")
            .bind(name)
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

    const PREFIX: &str = "/static/img/emoticons";

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("smile"), Some("smile".to_string()));
        assert_eq!(normalize_name("smile.png"), Some("smile".to_string()));
        assert_eq!(normalize_name(" +1 "), Some("+1".to_string()));
        assert_eq!(normalize_name("thumbs_up-2"), Some("thumbs_up-2".to_string()));
        assert_eq!(normalize_name(""), None);
        assert_eq!(normalize_name(".png"), None);
        assert_eq!(normalize_name("no space"), None);
        assert_eq!(normalize_name("../etc"), None);
    }

    #[test]
    fn test_replace_known_token() {
        let set = EmoticonSet::from_names(["smile"]);
        assert_eq!(
            set.replace_tokens("hello :smile:", PREFIX),
            r#"hello <img class="emoticon" src="/static/img/emoticons/smile.png" alt="smile">"#
        );
    }

    #[test]
    fn test_unknown_token_left_verbatim() {
        let set = EmoticonSet::from_names(["smile"]);
        assert_eq!(
            set.replace_tokens("what :unknownemoji: :smile", PREFIX),
            "what :unknownemoji: :smile"
        );
    }

    #[test]
    fn test_adjacent_tokens() {
        let set = EmoticonSet::from_names(["a", "b"]);
        let out = set.replace_tokens(":a::b:", "/e/");
        assert_eq!(
            out,
            r#"<img class="emoticon" src="/e/a.png" alt="a"><img class="emoticon" src="/e/b.png" alt="b">"#
        );
    }

    #[test]
    fn test_replacement_is_stable() {
        let set = EmoticonSet::from_names(["smile"]);
        let once = set.replace_tokens("hi :smile: :nope:", PREFIX);
        assert_eq!(set.replace_tokens(&once, PREFIX), once);
    }

    #[test]
    fn test_clones_share_state() {
        let set = EmoticonSet::new();
        let clone = set.clone();
        set.replace(["wave".to_string()].into_iter().collect());
        assert!(clone.contains("wave"));
        assert_eq!(clone.len(), 1);
    }

    #[tokio::test]
    async fn test_repository_and_reload() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = EmoticonRepository::new(db.pool());

        assert!(repo.add("smile").await.unwrap());
        assert!(!repo.add("smile").await.unwrap());
        assert!(repo.add("wave").await.unwrap());
        sqlx::query("INSERT INTO emoticons (name) VALUES ('grin.png')")
            .execute(db.pool())
            .await
            .unwrap();

        let set = EmoticonSet::new();
        assert_eq!(set.reload(db.pool()).await.unwrap(), 3);
        assert_eq!(set.names(), vec!["grin", "smile", "wave"]);

        assert!(repo.remove("wave").await.unwrap());
        assert!(!repo.remove("wave").await.unwrap());
        set.reload(db.pool()).await.unwrap();
        assert!(!set.contains("wave"));
    }
}
