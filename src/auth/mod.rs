//! Authentication and authorization.
//!
//! Password hashing, sessions, identity resolution, the rank policy and
//! account administration.

mod account;
mod identity;
mod password;
pub mod permission;
mod session;
pub mod validation;

pub use account::{AccountService, NewAccount};
pub use identity::{Actor, IdentityResolver};
pub use password::{hash_password, validate_password, verify_password, PasswordError};
pub use permission::{
    authorize, can_moderate, check_owner_or_moderator, check_permission, require_member,
    require_moderator, PermissionError,
};
pub use session::{
    MemorySessionStore, Session, SessionError, SessionManager, SessionStore,
    DEFAULT_SESSION_DURATION_SECS,
};
pub use validation::ValidationError;
