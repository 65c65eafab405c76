//! Login sessions.
//!
//! Sessions live in memory only and are lost on restart. Storage sits behind
//! the [`SessionStore`] trait so a shared cache can replace the in-process
//! table without touching callers.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::password::verify_password;
use crate::db::User;

/// Session-related errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Wrong username or password. The two cases are not distinguished.
    #[error("invalid credentials")]
    InvalidCredentials,
}

/// Default session duration (24 hours).
pub const DEFAULT_SESSION_DURATION_SECS: u64 = 24 * 60 * 60;

/// Longest accepted session duration (one year).
const MAX_SESSION_DURATION_SECS: u64 = 365 * 24 * 60 * 60;

/// A logged-in session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Opaque token (UUID v4).
    pub token: String,
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn new(username: impl Into<String>, duration: Duration) -> Self {
        let now = Utc::now();
        Self {
            token: Uuid::new_v4().to_string(),
            username: username.into(),
            created_at: now,
            expires_at: now + duration,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Storage for sessions, shared by all request handlers.
pub trait SessionStore: Send + Sync {
    fn insert(&self, session: Session);

    fn get(&self, token: &str) -> Option<Session>;

    fn remove(&self, token: &str) -> Option<Session>;

    /// Remove every session of `username`. Returns how many were removed.
    fn remove_user(&self, username: &str) -> usize;

    /// Drop sessions expired at `now`. Returns how many were removed.
    fn purge_expired(&self, now: DateTime<Utc>) -> usize;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-process session table guarded by a read/write lock.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

// A panic while holding the lock cannot leave the map half-updated, so a
// poisoned lock is recovered rather than propagated.
impl SessionStore for MemorySessionStore {
    fn insert(&self, session: Session) {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        sessions.insert(session.token.clone(), session);
    }

    fn get(&self, token: &str) -> Option<Session> {
        let sessions = self.sessions.read().unwrap_or_else(PoisonError::into_inner);
        sessions.get(token).cloned()
    }

    fn remove(&self, token: &str) -> Option<Session> {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        sessions.remove(token)
    }

    fn remove_user(&self, username: &str) -> usize {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        let before = sessions.len();
        sessions.retain(|_, s| !s.username.eq_ignore_ascii_case(username));
        before - sessions.len()
    }

    fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired_at(now));
        before - sessions.len()
    }

    fn len(&self) -> usize {
        self.sessions.read().unwrap_or_else(PoisonError::into_inner).len()
    }
}

/// Issues, resolves and revokes sessions.
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    duration: Duration,
}

impl fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionManager")
            .field("sessions", &self.store.len())
            .field("duration", &self.duration)
            .finish()
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_DURATION_SECS)
    }
}

impl SessionManager {
    /// Create a manager backed by an in-memory table.
    pub fn new(duration_secs: u64) -> Self {
        Self::with_store(Arc::new(MemorySessionStore::new()), duration_secs)
    }

    pub fn with_store(store: Arc<dyn SessionStore>, duration_secs: u64) -> Self {
        let secs = duration_secs.clamp(1, MAX_SESSION_DURATION_SECS) as i64;
        Self {
            store,
            duration: Duration::seconds(secs),
        }
    }

    /// Verify credentials and open a session.
    ///
    /// `user` is the account looked up by `username`, if any.
    pub fn login(
        &self,
        username: &str,
        password: &str,
        user: Option<&User>,
    ) -> Result<Session, SessionError> {
        let Some(user) = user else {
            warn!(username = %username, "Login failed: user not found");
            return Err(SessionError::InvalidCredentials);
        };

        if let Err(e) = verify_password(password, &user.password) {
            warn!(username = %username, error = %e, "Login failed: wrong password");
            return Err(SessionError::InvalidCredentials);
        }

        let session = Session::new(&user.username, self.duration);
        info!(
            username = %user.username,
            expires_at = %session.expires_at,
            "User logged in"
        );
        self.store.insert(session.clone());
        Ok(session)
    }

    /// Revoke a session. Returns whether it existed.
    pub fn logout(&self, token: &str) -> bool {
        match self.store.remove(token) {
            Some(session) => {
                info!(username = %session.username, "User logged out");
                true
            }
            None => {
                debug!("Logout: session not found");
                false
            }
        }
    }

    /// Revoke every session of `username`.
    pub fn logout_user(&self, username: &str) -> usize {
        let removed = self.store.remove_user(username);
        if removed > 0 {
            info!(username = %username, removed, "Revoked user sessions");
        }
        removed
    }

    /// Find a live session. Expired sessions are dropped on sight.
    pub fn lookup(&self, token: &str) -> Option<Session> {
        let session = self.store.get(token)?;
        if session.is_expired() {
            debug!(username = %session.username, "Session expired");
            self.store.remove(token);
            return None;
        }
        Some(session)
    }

    /// Drop every expired session.
    pub fn cleanup(&self) -> usize {
        let removed = self.store.purge_expired(Utc::now());
        if removed > 0 {
            debug!(removed, "Cleaned up expired sessions");
        }
        removed
    }

    pub fn session_count(&self) -> usize {
        self.store.len()
    }

    /// Lifetime given to new sessions.
    pub fn duration(&self) -> Duration {
        self.duration
    }
}
