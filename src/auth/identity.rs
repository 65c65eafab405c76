//! Identity and rank resolution.

use sqlx::SqlitePool;
use tracing::debug;

use super::session::SessionManager;
use crate::db::{Rank, UserRepository};
use crate::Result;

/// The party performing an operation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Actor {
    /// No valid session. Ranks below every tier.
    #[default]
    Anonymous,
    /// A logged-in account.
    User { username: String, rank: Rank },
}

impl Actor {
    pub fn user(username: impl Into<String>, rank: Rank) -> Self {
        Actor::User {
            username: username.into(),
            rank,
        }
    }

    pub fn rank(&self) -> Rank {
        match self {
            Actor::Anonymous => Rank::ANONYMOUS,
            Actor::User { rank, .. } => *rank,
        }
    }

    pub fn username(&self) -> Option<&str> {
        match self {
            Actor::Anonymous => None,
            Actor::User { username, .. } => Some(username),
        }
    }

    pub fn is_anonymous(&self) -> bool {
        matches!(self, Actor::Anonymous)
    }

    pub fn is_moderator(&self) -> bool {
        self.rank().is_moderator()
    }

    /// Whether this actor is the account named `owner`.
    pub fn owns(&self, owner: &str) -> bool {
        self.username()
            .is_some_and(|name| name.eq_ignore_ascii_case(owner))
    }
}

/// Maps a session token to an [`Actor`].
///
/// Credential problems never raise: a missing, unknown or expired token, a
/// deleted account or an unreadable rank all resolve to
/// [`Actor::Anonymous`]. Only store failures are errors.
pub struct IdentityResolver<'a> {
    sessions: &'a SessionManager,
    pool: &'a SqlitePool,
}

impl<'a> IdentityResolver<'a> {
    pub fn new(sessions: &'a SessionManager, pool: &'a SqlitePool) -> Self {
        Self { sessions, pool }
    }

    pub async fn resolve(&self, token: Option<&str>) -> Result<Actor> {
        let Some(token) = token.filter(|t| !t.is_empty()) else {
            return Ok(Actor::Anonymous);
        };
        let Some(session) = self.sessions.lookup(token) else {
            debug!("Unknown or expired session token");
            return Ok(Actor::Anonymous);
        };

        match self.rank_of(&session.username).await? {
            Some(rank) => Ok(Actor::user(session.username, rank)),
            None => {
                debug!(username = %session.username, "Session has no resolvable rank");
                Ok(Actor::Anonymous)
            }
        }
    }

    /// Current rank of `username`, or `None` if the account is gone or its
    /// rank cannot be read.
    pub async fn rank_of(&self, username: &str) -> Result<Option<Rank>> {
        UserRepository::new(self.pool).rank_of(username).await
    }
}
