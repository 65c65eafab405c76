//! Authorization policy.
//!
//! Every guarded operation reduces to one numeric comparison,
//! `actor_rank >= required_rank`. Ownership is a separate fact that callers
//! fold in through [`can_moderate`].

use thiserror::Error;

use super::identity::Actor;
use crate::db::Rank;

/// Reasons a permission check can fail.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PermissionError {
    /// The actor has no valid session.
    #[error("login required")]
    NotAuthenticated,

    /// The actor's rank is below the requirement.
    #[error("{0} rank required")]
    InsufficientRank(&'static str),

    /// The actor neither owns the item nor moderates.
    #[error("only the owner or a moderator may do this")]
    NotOwner,
}

/// Decide whether `actor_rank` meets `required`.
///
/// An unresolved rank (`None`) never passes.
///
/// # Examples
///
/// ```
/// use mmiv::auth::authorize;
/// use mmiv::db::Rank;
///
/// assert!(authorize(Some(Rank::MODERATOR), Rank::MEMBER));
/// assert!(!authorize(Some(Rank::MEMBER), Rank::MODERATOR));
/// assert!(!authorize(None, Rank::ANONYMOUS));
/// ```
pub fn authorize(actor_rank: Option<Rank>, required: Rank) -> bool {
    match actor_rank {
        Some(rank) => rank.can_access(required),
        None => false,
    }
}

/// Check that `actor` meets `required`, reporting why not.
pub fn check_permission(actor: &Actor, required: Rank) -> Result<(), PermissionError> {
    if authorize(Some(actor.rank()), required) {
        return Ok(());
    }
    if actor.is_anonymous() {
        return Err(PermissionError::NotAuthenticated);
    }
    Err(PermissionError::InsufficientRank(required.display_name()))
}

pub fn require_member(actor: &Actor) -> Result<(), PermissionError> {
    check_permission(actor, Rank::MEMBER)
}

pub fn require_moderator(actor: &Actor) -> Result<(), PermissionError> {
    check_permission(actor, Rank::MODERATOR)
}

/// Owner-or-moderator rule for mutating a content item.
///
/// Usernames compare case-insensitively, matching account lookup. Anonymous
/// actors never own anything.
pub fn can_moderate(actor: &Actor, owner: &str) -> bool {
    actor.owns(owner) || authorize(Some(actor.rank()), Rank::MODERATOR)
}

/// [`can_moderate`] as a checked result.
pub fn check_owner_or_moderator(actor: &Actor, owner: &str) -> Result<(), PermissionError> {
    if can_moderate(actor, owner) {
        Ok(())
    } else if actor.is_anonymous() {
        Err(PermissionError::NotAuthenticated)
    } else {
        Err(PermissionError::NotOwner)
    }
}
