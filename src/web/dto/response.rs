//! Response DTOs for the Web API.
//!
//! Reads are wrapped as `{"data": ...}`; writes answer
//! `{"status": "success", ...}`.

use serde::Serialize;

use crate::board::{PaginatedResult, PostView};
use crate::db::User;

/// Status string of every successful write.
pub const STATUS_SUCCESS: &str = "success";

// ============================================================================
// Generic Response Wrappers
// ============================================================================

/// Generic API response wrapper.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// Acknowledgement of a write.
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub status: &'static str,
}

impl SuccessResponse {
    pub fn new() -> Self {
        Self {
            status: STATUS_SUCCESS,
        }
    }
}

impl Default for SuccessResponse {
    fn default() -> Self {
        Self::new()
    }
}

/// Acknowledgement of a post or comment creation.
#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub status: &'static str,
    pub id: i64,
}

impl CreatedResponse {
    pub fn new(id: i64) -> Self {
        Self {
            status: STATUS_SUCCESS,
            id,
        }
    }
}

// ============================================================================
// Auth
// ============================================================================

/// Login response. The token is also set as the session cookie.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub status: &'static str,
    pub username: String,
    pub token: String,
    /// RFC 3339 expiry time.
    pub expires_at: String,
}

/// The current actor.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    /// Absent for anonymous callers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub rank: i64,
    pub rank_name: &'static str,
}

/// Acknowledgement of an account creation.
#[derive(Debug, Serialize)]
pub struct UserCreatedResponse {
    pub status: &'static str,
    pub username: String,
    pub rank: i64,
}

impl UserCreatedResponse {
    pub fn new(user: &User) -> Self {
        Self {
            status: STATUS_SUCCESS,
            username: user.username.clone(),
            rank: user.effective_rank().value(),
        }
    }
}

// ============================================================================
// Board
// ============================================================================

/// A page of posts.
#[derive(Debug, Serialize)]
pub struct PostPage {
    pub posts: Vec<PostView>,
    pub total: i64,
    pub offset: i64,
    pub limit: i64,
    pub has_more: bool,
}

impl From<PaginatedResult<PostView>> for PostPage {
    fn from(page: PaginatedResult<PostView>) -> Self {
        let has_more = page.has_more();
        Self {
            posts: page.items,
            total: page.total,
            offset: page.offset,
            limit: page.limit,
            has_more,
        }
    }
}

/// The current announcement. Empty when none is set.
#[derive(Debug, Serialize)]
pub struct AnnouncementResponse {
    pub content: String,
}
