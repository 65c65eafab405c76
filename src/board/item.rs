//! Moderatable content items.
//!
//! Posts and comments share ownership, anonymity, image and rendering rules,
//! so both are loaded into one [`ContentItem`]; [`ContentKind`] carries what
//! differs.

use crate::upload::ImageUpload;

/// What kind of item this is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    /// Top-level post; may be pinned, and locked against new comments.
    Post { pinned: bool, locked: bool },
    /// Reply to a post.
    Comment { parent_id: i64 },
}

/// A post or comment as stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentItem {
    /// Drawn from the id sequence shared by posts and comments.
    pub id: i64,
    /// Username of the author. Kept even when the item is anonymous.
    pub owner: String,
    /// Raw text as submitted.
    pub body: String,
    /// Stored upload name.
    pub image: Option<String>,
    pub created_at: String,
    pub is_anonymous: bool,
    /// Body is rendered without HTML escaping.
    pub raw_markup: bool,
    pub kind: ContentKind,
}

impl ContentItem {
    pub fn is_post(&self) -> bool {
        matches!(self.kind, ContentKind::Post { .. })
    }

    pub fn is_comment(&self) -> bool {
        matches!(self.kind, ContentKind::Comment { .. })
    }

    pub fn is_locked(&self) -> bool {
        matches!(self.kind, ContentKind::Post { locked: true, .. })
    }

    pub fn is_pinned(&self) -> bool {
        matches!(self.kind, ContentKind::Post { pinned: true, .. })
    }

    /// Word used in log lines and messages.
    pub fn noun(&self) -> &'static str {
        match self.kind {
            ContentKind::Post { .. } => "post",
            ContentKind::Comment { .. } => "comment",
        }
    }
}

/// Row of the `posts` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct PostRow {
    pub id: i64,
    pub username: String,
    pub content: String,
    pub image_path: Option<String>,
    pub created_at: String,
    pub pinned: bool,
    pub locked: bool,
    pub is_anonymous: bool,
    pub raw_markup: bool,
}

impl PostRow {
    pub fn into_item(self) -> ContentItem {
        ContentItem {
            id: self.id,
            owner: self.username,
            body: self.content,
            image: self.image_path.filter(|p| !p.is_empty()),
            created_at: self.created_at,
            is_anonymous: self.is_anonymous,
            raw_markup: self.raw_markup,
            kind: ContentKind::Post {
                pinned: self.pinned,
                locked: self.locked,
            },
        }
    }
}

/// Row of the `comments` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct CommentRow {
    pub id: i64,
    pub parent_post_id: i64,
    pub username: String,
    pub content: String,
    pub image_path: Option<String>,
    pub created_at: String,
    pub is_anonymous: bool,
    pub raw_markup: bool,
}

impl CommentRow {
    pub fn into_item(self) -> ContentItem {
        ContentItem {
            id: self.id,
            owner: self.username,
            body: self.content,
            image: self.image_path.filter(|p| !p.is_empty()),
            created_at: self.created_at,
            is_anonymous: self.is_anonymous,
            raw_markup: self.raw_markup,
            kind: ContentKind::Comment {
                parent_id: self.parent_post_id,
            },
        }
    }
}

/// Submission of a new post.
///
/// `pinned`, `locked` and `raw_markup` are honoured for moderators only and
/// silently cleared for everyone else.
#[derive(Debug, Clone, Default)]
pub struct NewPost {
    pub content: String,
    pub image: Option<ImageUpload>,
    pub is_anonymous: bool,
    pub pinned: bool,
    pub locked: bool,
    pub raw_markup: bool,
}

impl NewPost {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn with_image(mut self, image: ImageUpload) -> Self {
        self.image = Some(image);
        self
    }

    pub fn anonymous(mut self) -> Self {
        self.is_anonymous = true;
        self
    }

    pub fn pinned(mut self) -> Self {
        self.pinned = true;
        self
    }

    pub fn locked(mut self) -> Self {
        self.locked = true;
        self
    }

    pub fn raw_markup(mut self) -> Self {
        self.raw_markup = true;
        self
    }
}

/// Submission of a new comment.
#[derive(Debug, Clone)]
pub struct NewComment {
    pub post_id: i64,
    pub content: String,
    pub image: Option<ImageUpload>,
    pub is_anonymous: bool,
    /// Honoured for moderators only.
    pub raw_markup: bool,
}

impl NewComment {
    pub fn new(post_id: i64, content: impl Into<String>) -> Self {
        Self {
            post_id,
            content: content.into(),
            image: None,
            is_anonymous: false,
            raw_markup: false,
        }
    }

    pub fn with_image(mut self, image: ImageUpload) -> Self {
        self.image = Some(image);
        self
    }

    pub fn anonymous(mut self) -> Self {
        self.is_anonymous = true;
        self
    }

    pub fn raw_markup(mut self) -> Self {
        self.raw_markup = true;
        self
    }
}
