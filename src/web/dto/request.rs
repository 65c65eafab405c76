//! Request DTOs for the Web API.
//!
//! Post and comment submissions are multipart forms and are read field by
//! field in the board handlers; everything else is JSON.

use serde::Deserialize;

use crate::db::Rank;

/// Login request.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Account creation request.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    /// Defaults to member.
    #[serde(default)]
    pub rank: Option<Rank>,
}

/// Post listing query.
#[derive(Debug, Default, Deserialize)]
pub struct ListPostsQuery {
    pub offset: Option<i64>,
    pub limit: Option<i64>,
}

/// Body of the pin and lock endpoints.
#[derive(Debug, Deserialize)]
pub struct FlagRequest {
    pub value: bool,
}

/// Emoticon registration request.
#[derive(Debug, Deserialize)]
pub struct EmoticonRequest {
    pub name: String,
}

/// Announcement update request.
#[derive(Debug, Deserialize)]
pub struct AnnouncementRequest {
    pub content: String,
}
