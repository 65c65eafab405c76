//! mmiv - a small self-hosted bulletin board.
//!
//! Registered accounts post text and image messages and comment on them.
//! Posts may be anonymous, and moderators can pin, lock and delete content,
//! manage accounts, emoticons and the board announcement.

pub mod auth;
pub mod board;
pub mod config;
pub mod content;
pub mod db;
pub mod error;
pub mod logging;
pub mod moderation;
pub mod upload;
pub mod web;

pub use auth::{Actor, SessionManager};
pub use config::Config;
pub use db::{Database, Rank, User};
pub use error::{MmivError, Outcome, Result};
