//! Account and session management.

use tracing::{info, warn};

use super::password::{hash_password, validate_password};
use super::permission::require_moderator;
use super::session::{Session, SessionManager};
use super::validation::validate_username;
use super::Actor;
use crate::db::{Database, NewUser, Rank, User, UserRepository};
use crate::{MmivError, Outcome, Result};

/// Request to create an account.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: String,
    /// Plain-text password; hashed before storage.
    pub password: String,
    pub rank: Rank,
}

impl NewAccount {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            rank: Rank::MEMBER,
        }
    }

    pub fn with_rank(mut self, rank: Rank) -> Self {
        self.rank = rank;
        self
    }
}

/// Login, logout and moderator-driven account administration.
pub struct AccountService<'a> {
    db: &'a Database,
    sessions: &'a SessionManager,
}

impl<'a> AccountService<'a> {
    pub fn new(db: &'a Database, sessions: &'a SessionManager) -> Self {
        Self { db, sessions }
    }

    /// Verify credentials and open a session.
    ///
    /// Wrong password and unknown user both yield `MmivError::Auth`.
    pub async fn login(&self, username: &str, password: &str) -> Result<Session> {
        let user = UserRepository::new(self.db.pool())
            .get_by_username(username)
            .await?;

        self.sessions
            .login(username, password, user.as_ref())
            .map_err(|e| MmivError::Auth(e.to_string()))
    }

    /// Revoke the session behind `token`.
    pub fn logout(&self, token: &str) -> bool {
        self.sessions.logout(token)
    }

    /// Create an account. Moderator only.
    ///
    /// The new rank must be at least [`Rank::MEMBER`] and may not exceed the
    /// creating actor's own rank.
    pub async fn add_user(&self, actor: &Actor, account: &NewAccount) -> Result<Outcome<User>> {
        if let Err(e) = require_moderator(actor) {
            warn!(actor = ?actor.username(), "Add user denied");
            return Ok(Outcome::denied(e.to_string()));
        }

        if let Err(e) = validate_username(&account.username) {
            return Ok(Outcome::invalid(e.to_string()));
        }
        if account.rank < Rank::MEMBER {
            return Ok(Outcome::invalid(format!(
                "rank must be at least {}",
                Rank::MEMBER
            )));
        }
        if account.rank > actor.rank() {
            return Ok(Outcome::denied("cannot grant a rank above your own"));
        }
        if let Err(e) = validate_password(&account.password) {
            return Ok(Outcome::invalid(e.to_string()));
        }

        let repo = UserRepository::new(self.db.pool());
        if repo.username_exists(&account.username).await? {
            return Ok(Outcome::invalid("username is already taken"));
        }

        let hash =
            hash_password(&account.password).map_err(|e| MmivError::Auth(e.to_string()))?;
        let user = repo
            .create(&NewUser::new(&account.username, hash).with_rank(account.rank))
            .await?;

        info!(
            actor = ?actor.username(),
            username = %user.username,
            rank = %account.rank,
            "User created"
        );
        Ok(Outcome::Done(user))
    }

    /// Delete an account and revoke its sessions. Moderator only.
    ///
    /// Content owned by the account is kept.
    pub async fn delete_user(&self, actor: &Actor, username: &str) -> Result<Outcome<()>> {
        if let Err(e) = require_moderator(actor) {
            warn!(actor = ?actor.username(), target = %username, "Delete user denied");
            return Ok(Outcome::denied(e.to_string()));
        }

        let deleted = UserRepository::new(self.db.pool())
            .delete_by_username(username)
            .await?;
        if !deleted {
            return Ok(Outcome::invalid("user not found"));
        }

        let revoked = self.sessions.logout_user(username);
        info!(
            actor = ?actor.username(),
            username = %username,
            revoked,
            "User deleted"
        );
        Ok(Outcome::Done(()))
    }

    /// Create the first moderator account if there are no accounts yet.
    ///
    /// Returns the created account, or `None` if accounts already exist.
    pub async fn bootstrap_admin(&self, username: &str, password: &str) -> Result<Option<User>> {
        let repo = UserRepository::new(self.db.pool());
        if repo.count().await? > 0 {
            return Ok(None);
        }

        validate_username(username).map_err(|e| MmivError::Config(e.to_string()))?;
        let hash = hash_password(password).map_err(|e| MmivError::Config(e.to_string()))?;
        let user = repo
            .create(&NewUser::new(username, hash).with_rank(Rank::MODERATOR))
            .await?;

        info!(username = %user.username, "Bootstrapped moderator account");
        Ok(Some(user))
    }
}
