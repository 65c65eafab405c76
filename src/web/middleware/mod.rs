//! Middleware for the Web API.

pub mod auth;
pub mod cors;

pub use auth::{require_member_session, session_token, CurrentActor};
pub use cors::create_cors_layer;
