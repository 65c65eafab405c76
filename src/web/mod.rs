//! Web API module.
//!
//! A thin HTTP layer over the board, account and moderation services. Every
//! rule lives in those services; handlers only translate requests and map
//! [`crate::Outcome`] values to status codes.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod server;
pub mod state;

pub use error::ApiError;
pub use router::create_router;
pub use server::WebServer;
pub use state::AppState;
