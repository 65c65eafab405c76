//! Posts, comments and their lifecycle.
//!
//! This module provides:
//! - [`ContentItem`], the shared shape of posts and comments
//! - repositories for the `posts` and `comments` tables
//! - [`BoardService`], which applies the rank rules to every read and write
//! - per-viewer projections ([`PostView`], [`CommentView`])

mod item;
mod repository;
mod service;
mod view;

pub use item::{ContentItem, ContentKind, NewComment, NewPost};
pub use repository::{CommentRepository, PostRepository};
pub use service::{
    BoardService, PaginatedResult, Pagination, DEFAULT_PAGE_SIZE, MAX_BODY_LENGTH, MAX_PAGE_SIZE,
};
pub use view::{display_name, CommentView, ItemView, PostView, HIDDEN_NAME, UPLOADS_URL_PREFIX};
