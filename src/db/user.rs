//! Account model for mmiv.
//!
//! Defines the `User` record and the integer `Rank` used for every
//! authorization decision.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Privilege tier of an actor.
///
/// Ranks form a total order on integers; a higher rank holds every permission
/// of the lower ones. Only two tiers are used by the board itself, but any
/// integer is a valid rank.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Rank(pub i64);

impl Rank {
    /// Rank of an actor without a valid session. Below every defined tier.
    pub const ANONYMOUS: Rank = Rank(0);
    /// Authenticated user.
    pub const MEMBER: Rank = Rank(1);
    /// Moderator / administrator.
    pub const MODERATOR: Rank = Rank(2);

    pub fn value(self) -> i64 {
        self.0
    }

    /// Check if this rank meets `required`.
    ///
    /// # Examples
    ///
    /// ```
    /// use mmiv::db::Rank;
    ///
    /// assert!(Rank::MODERATOR.can_access(Rank::MEMBER));
    /// assert!(Rank::MEMBER.can_access(Rank::MEMBER));
    /// assert!(!Rank::ANONYMOUS.can_access(Rank::MEMBER));
    /// ```
    pub fn can_access(self, required: Rank) -> bool {
        self >= required
    }

    pub fn is_moderator(self) -> bool {
        self.can_access(Rank::MODERATOR)
    }

    /// Human readable tier name.
    pub fn display_name(self) -> &'static str {
        match self.0 {
            i64::MIN..=0 => "anonymous",
            1 => "member",
            _ => "moderator",
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Rank {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<i64>()
            .map(Rank)
            .map_err(|_| format!("invalid rank: {s:?}"))
    }
}

/// Registered account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    /// Login username (unique, case-insensitive).
    pub username: String,
    /// Password hash (Argon2 PHC string).
    pub password: String,
    /// `None` when the stored value is not a valid integer.
    pub rank: Option<Rank>,
    pub created_at: String,
}

impl User {
    /// Effective rank; an unreadable rank counts as anonymous.
    pub fn effective_rank(&self) -> Rank {
        self.rank.unwrap_or(Rank::ANONYMOUS)
    }
}

/// Data for creating a new account.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    /// Password hash (must already be hashed).
    pub password: String,
    pub rank: Rank,
}

impl NewUser {
    /// Create a member account record.
    pub fn new(username: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password_hash.into(),
            rank: Rank::MEMBER,
        }
    }

    pub fn with_rank(mut self, rank: Rank) -> Self {
        self.rank = rank;
        self
    }
}
