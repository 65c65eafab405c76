//! Emoticon administration.

use tracing::info;

use crate::auth::{require_member, require_moderator, Actor};
use crate::content::{normalize_name, EmoticonRepository, EmoticonSet};
use crate::db::Database;
use crate::{Outcome, Result};

/// Registers and unregisters emoticon names.
///
/// The shared [`EmoticonSet`] is reloaded from the store after every change.
pub struct EmoticonAdminService<'a> {
    db: &'a Database,
    emoticons: &'a EmoticonSet,
}

impl<'a> EmoticonAdminService<'a> {
    pub fn new(db: &'a Database, emoticons: &'a EmoticonSet) -> Self {
        Self { db, emoticons }
    }

    /// Registered names, sorted.
    pub fn list(&self, actor: &Actor) -> Outcome<Vec<String>> {
        match require_member(actor) {
            Ok(()) => Outcome::Done(self.emoticons.names()),
            Err(e) => Outcome::denied(e.to_string()),
        }
    }

    /// Register a name. Returns the normalized name.
    pub async fn add(&self, actor: &Actor, name: &str) -> Result<Outcome<String>> {
        if let Err(e) = require_moderator(actor) {
            return Ok(Outcome::denied(e.to_string()));
        }
        let Some(name) = normalize_name(name) else {
            return Ok(Outcome::invalid("invalid emoticon name"));
        };

        if !EmoticonRepository::new(self.db.pool()).add(&name).await? {
            return Ok(Outcome::invalid("emoticon already exists"));
        }
        self.emoticons.reload(self.db.pool()).await?;

        info!(actor = ?actor.username(), name = %name, "Emoticon added");
        Ok(Outcome::Done(name))
    }

    /// Unregister a name.
    pub async fn remove(&self, actor: &Actor, name: &str) -> Result<Outcome<()>> {
        if let Err(e) = require_moderator(actor) {
            return Ok(Outcome::denied(e.to_string()));
        }
        let Some(name) = normalize_name(name) else {
            return Ok(Outcome::invalid("invalid emoticon name"));
        };

        if !EmoticonRepository::new(self.db.pool()).remove(&name).await? {
            return Ok(Outcome::invalid("emoticon not found"));
        }
        self.emoticons.reload(self.db.pool()).await?;

        info!(actor = ?actor.username(), name = %name, "Emoticon removed");
        Ok(Outcome::Done(()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::Enricher;
    use crate::db::Rank;

    fn moderator() -> Actor {
        Actor::user("mod", Rank::MODERATOR)
    }

    #[tokio::test]
    async fn test_add_and_remove_reload_the_set() {
        let db = Database::open_in_memory().await.unwrap();
        let set = EmoticonSet::new();
        let service = EmoticonAdminService::new(&db, &set);
        let enricher = Enricher::new(set.clone(), "/e");

        assert_eq!(
            service.add(&moderator(), "smile.png").await.unwrap(),
            Outcome::Done("smile".to_string())
        );
        assert!(set.contains("smile"));
        assert_eq!(
            enricher.render("hi :smile:", false),
            r#"hi <img class="emoticon" src="/e/smile.png" alt="smile">"#
        );

        assert!(service.remove(&moderator(), "smile").await.unwrap().is_done());
        assert!(!set.contains("smile"));
        assert_eq!(enricher.render("hi :smile:", false), "hi :smile:");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_changes_leave_set_matching_store() {
        let db = Database::open_in_memory().await.unwrap();
        let set = EmoticonSet::new();
        let service = EmoticonAdminService::new(&db, &set);
        service.add(&moderator(), "wave").await.unwrap();

        for round in 0..20 {
            let (a, b) = (format!("a{round}"), format!("b{round}"));
            let mod_actor = moderator();
            let (added_a, added_b, removed) = tokio::join!(
                service.add(&mod_actor, &a),
                service.add(&mod_actor, &b),
                service.remove(&mod_actor, "wave"),
            );
            assert!(added_a.unwrap().is_done());
            assert!(added_b.unwrap().is_done());
            removed.unwrap();

            let stored = EmoticonRepository::new(db.pool()).list_names().await.unwrap();
            assert_eq!(set.names(), stored, "round {round}");
            service.add(&moderator(), "wave").await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_requires_moderator() {
        let db = Database::open_in_memory().await.unwrap();
        let set = EmoticonSet::new();
        let service = EmoticonAdminService::new(&db, &set);
        let member = Actor::user("alice", Rank::MEMBER);

        assert!(service.add(&member, "smile").await.unwrap().is_denied());
        assert!(service.remove(&member, "smile").await.unwrap().is_denied());
        assert!(set.is_empty());

        assert!(service.list(&member).is_done());
        assert!(service.list(&Actor::Anonymous).is_denied());
    }

    #[tokio::test]
    async fn test_invalid_and_duplicate_names() {
        let db = Database::open_in_memory().await.unwrap();
        let set = EmoticonSet::new();
        let service = EmoticonAdminService::new(&db, &set);

        assert!(service.add(&moderator(), "bad name").await.unwrap().is_invalid());
        assert!(service.add(&moderator(), "wink").await.unwrap().is_done());
        assert!(service.add(&moderator(), "wink").await.unwrap().is_invalid());
        assert!(service.remove(&moderator(), "grin").await.unwrap().is_invalid());
        assert_eq!(service.list(&moderator()), Outcome::Done(vec!["wink".to_string()]));
    }
}
