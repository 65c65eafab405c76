//! Lifecycle of posts and comments.
//!
//! Every operation takes the acting [`Actor`], checks it against the rank
//! rules first and reports a refusal as an [`Outcome`] rather than an error.
//! Nothing is written to the store or to the upload directory unless every
//! check has passed.

use tracing::{debug, info, warn};

use super::item::{ContentItem, NewComment, NewPost};
use super::repository::{CommentRepository, PostRepository};
use super::view::{CommentView, PostView};
use crate::auth::{can_moderate, require_member, require_moderator, Actor};
use crate::content::Enricher;
use crate::db::{next_global_id, Database};
use crate::upload::{validate_image, ImageUpload, UploadStorage};
use crate::{Outcome, Result};

/// Maximum length for post and comment text (in characters).
pub const MAX_BODY_LENGTH: usize = 10_000;

/// Page size used when the caller does not ask for one.
pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// Largest page a caller may ask for.
pub const MAX_PAGE_SIZE: i64 = 100;

/// Validate submitted text. Empty text is fine when an image is attached.
fn validate_body(body: &str, has_image: bool) -> std::result::Result<(), String> {
    if body.chars().count() > MAX_BODY_LENGTH {
        return Err(format!("text is too long (max {MAX_BODY_LENGTH} characters)"));
    }
    if body.trim().is_empty() && !has_image {
        return Err("text or an image is required".to_string());
    }
    Ok(())
}

/// Pagination parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// Number of items to skip.
    pub offset: i64,
    /// Maximum number of items to return.
    pub limit: i64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Pagination {
    /// Build pagination, clamping `offset` to be non-negative and `limit`
    /// into `1..=MAX_PAGE_SIZE`.
    pub fn new(offset: i64, limit: i64) -> Self {
        Self {
            offset: offset.max(0),
            limit: limit.clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Like [`Pagination::new`], with defaults for missing values.
    pub fn from_query(offset: Option<i64>, limit: Option<i64>) -> Self {
        Self::new(offset.unwrap_or(0), limit.unwrap_or(DEFAULT_PAGE_SIZE))
    }
}

/// Result of a paginated query.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    /// The items in this page.
    pub items: Vec<T>,
    /// Total number of items (across all pages).
    pub total: i64,
    pub offset: i64,
    pub limit: i64,
}

impl<T> PaginatedResult<T> {
    /// Check if there are more items after this page.
    pub fn has_more(&self) -> bool {
        self.offset + (self.items.len() as i64) < self.total
    }
}

/// Post and comment operations with permission checking.
pub struct BoardService<'a> {
    db: &'a Database,
    storage: &'a UploadStorage,
    enricher: &'a Enricher,
    max_upload_bytes: usize,
}

impl<'a> BoardService<'a> {
    pub fn new(
        db: &'a Database,
        storage: &'a UploadStorage,
        enricher: &'a Enricher,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            db,
            storage,
            enricher,
            max_upload_bytes,
        }
    }

    /// Create a post. Returns the new id.
    ///
    /// `pinned`, `locked` and `raw_markup` are cleared unless the actor is a
    /// moderator.
    pub async fn create_post(&self, actor: &Actor, post: NewPost) -> Result<Outcome<i64>> {
        if let Err(e) = require_member(actor) {
            warn!(actor = ?actor.username(), "Create post denied");
            return Ok(Outcome::denied(e.to_string()));
        }
        let Some(owner) = actor.username() else {
            return Ok(Outcome::denied("login required"));
        };

        if let Err(reason) = validate_body(&post.content, post.image.is_some()) {
            return Ok(Outcome::invalid(reason));
        }

        let moderator = actor.is_moderator();
        if !moderator && (post.pinned || post.locked || post.raw_markup) {
            debug!(actor = %owner, "Ignoring moderator-only flags on post");
        }
        let pinned = post.pinned && moderator;
        let locked = post.locked && moderator;
        let raw_markup = post.raw_markup && moderator;

        let image = match self.store_image(post.image.as_ref()).await? {
            Outcome::Done(image) => image,
            Outcome::Denied(reason) => return Ok(Outcome::Denied(reason)),
            Outcome::Invalid(reason) => return Ok(Outcome::Invalid(reason)),
        };

        let inserted = async {
            let mut tx = self.db.begin().await?;
            let id = next_global_id(&mut tx).await?;
            sqlx::query(
                "INSERT INTO posts (id, username, content, image_path, pinned, locked, is_anonymous, raw_markup) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(id)
            .bind(owner)
            .bind(&post.content)
            .bind(image.as_deref())
            .bind(pinned)
            .bind(locked)
            .bind(post.is_anonymous)
            .bind(raw_markup)
            .execute(&mut *tx)
            .await?;
            tx.commit().await?;
            Ok::<_, crate::MmivError>(id)
        }
        .await;

        match inserted {
            Ok(id) => {
                info!(id, actor = %owner, pinned, locked, "Post created");
                Ok(Outcome::Done(id))
            }
            Err(e) => {
                self.discard_image(image.as_deref()).await;
                Err(e)
            }
        }
    }

    /// Create a comment on an existing post. Returns the new id.
    ///
    /// Locked posts accept comments from moderators only.
    pub async fn create_comment(&self, actor: &Actor, comment: NewComment) -> Result<Outcome<i64>> {
        if let Err(e) = require_member(actor) {
            warn!(actor = ?actor.username(), post_id = comment.post_id, "Create comment denied");
            return Ok(Outcome::denied(e.to_string()));
        }
        let Some(owner) = actor.username() else {
            return Ok(Outcome::denied("login required"));
        };

        if let Err(reason) = validate_body(&comment.content, comment.image.is_some()) {
            return Ok(Outcome::invalid(reason));
        }

        let moderator = actor.is_moderator();
        let Some(parent) = PostRepository::new(self.db.pool()).get(comment.post_id).await? else {
            return Ok(Outcome::invalid("post not found"));
        };
        if parent.is_locked() && !moderator {
            warn!(actor = %owner, post_id = parent.id, "Comment on locked post denied");
            return Ok(Outcome::denied("post is locked"));
        }

        if comment.raw_markup && !moderator {
            debug!(actor = %owner, "Ignoring raw markup flag on comment");
        }
        let raw_markup = comment.raw_markup && moderator;

        let image = match self.store_image(comment.image.as_ref()).await? {
            Outcome::Done(image) => image,
            Outcome::Denied(reason) => return Ok(Outcome::Denied(reason)),
            Outcome::Invalid(reason) => return Ok(Outcome::Invalid(reason)),
        };

        // The parent may be deleted or locked after the checks above, so the
        // insert only happens if it still qualifies at write time.
        let inserted = async {
            let mut tx = self.db.begin().await?;
            let id = next_global_id(&mut tx).await?;
            let written = sqlx::query(
                "INSERT INTO comments (id, parent_post_id, username, content, image_path, is_anonymous, raw_markup) \
                 SELECT ?, id, ?, ?, ?, ?, ? FROM posts WHERE id = ? AND (locked = 0 OR ?)",
            )
            .bind(id)
            .bind(owner)
            .bind(&comment.content)
            .bind(image.as_deref())
            .bind(comment.is_anonymous)
            .bind(raw_markup)
            .bind(parent.id)
            .bind(moderator)
            .execute(&mut *tx)
            .await?
            .rows_affected();
            if written == 0 {
                return Ok::<_, crate::MmivError>(None);
            }
            tx.commit().await?;
            Ok::<_, crate::MmivError>(Some(id))
        }
        .await;

        match inserted {
            Ok(Some(id)) => {
                info!(id, post_id = parent.id, actor = %owner, "Comment created");
                Ok(Outcome::Done(id))
            }
            Ok(None) => {
                self.discard_image(image.as_deref()).await;
                match PostRepository::new(self.db.pool()).get(parent.id).await? {
                    None => Ok(Outcome::invalid("post not found")),
                    Some(_) => {
                        warn!(actor = %owner, post_id = parent.id, "Comment on locked post denied");
                        Ok(Outcome::denied("post is locked"))
                    }
                }
            }
            Err(e) => {
                self.discard_image(image.as_deref()).await;
                Err(e)
            }
        }
    }

    /// Delete a post together with its comments.
    ///
    /// Allowed for the owner and for moderators. Image files are removed
    /// after the rows; a failed removal is logged and otherwise ignored.
    pub async fn delete_post(&self, actor: &Actor, id: i64) -> Result<Outcome<()>> {
        let Some(post) = PostRepository::new(self.db.pool()).get(id).await? else {
            return Ok(Outcome::invalid("post not found"));
        };
        if let Some(denied) = self.check_delete(actor, &post) {
            return Ok(denied);
        }

        // Starting with a write takes the write lock up front, so no comment
        // can land between clearing the children and removing the post.
        let mut tx = self.db.begin().await?;
        let removed: Vec<Option<String>> =
            sqlx::query_scalar("DELETE FROM comments WHERE parent_post_id = ? RETURNING image_path")
                .bind(id)
                .fetch_all(&mut *tx)
                .await?;
        let comments = removed.len();
        let mut images: Vec<String> = removed
            .into_iter()
            .flatten()
            .filter(|name| !name.is_empty())
            .collect();
        sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        images.extend(post.image.clone());
        for image in &images {
            self.discard_image(Some(image)).await;
        }

        info!(id, actor = ?actor.username(), comments, "Post deleted");
        Ok(Outcome::Done(()))
    }

    /// Delete a comment. Allowed for the owner and for moderators.
    pub async fn delete_comment(&self, actor: &Actor, id: i64) -> Result<Outcome<()>> {
        let repo = CommentRepository::new(self.db.pool());
        let Some(comment) = repo.get(id).await? else {
            return Ok(Outcome::invalid("comment not found"));
        };
        if let Some(denied) = self.check_delete(actor, &comment) {
            return Ok(denied);
        }

        repo.delete(id).await?;
        self.discard_image(comment.image.as_deref()).await;

        info!(id, actor = ?actor.username(), "Comment deleted");
        Ok(Outcome::Done(()))
    }

    /// One page of posts as seen by `actor`: pinned first, then newest first.
    pub async fn list_posts(
        &self,
        actor: &Actor,
        pagination: Pagination,
    ) -> Result<Outcome<PaginatedResult<PostView>>> {
        if let Err(e) = require_member(actor) {
            return Ok(Outcome::denied(e.to_string()));
        }

        let posts = PostRepository::new(self.db.pool());
        let comments = CommentRepository::new(self.db.pool());
        let items = posts.list(pagination.offset, pagination.limit).await?;
        let total = posts.count().await?;

        let mut views = Vec::with_capacity(items.len());
        for item in &items {
            let comment_count = match comments.count_for_post(item.id).await {
                Ok(count) => count,
                Err(e) => {
                    warn!(post_id = item.id, error = %e, "Failed to count comments");
                    0
                }
            };
            views.extend(PostView::project(item, comment_count, actor, self.enricher));
        }

        Ok(Outcome::Done(PaginatedResult {
            items: views,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        }))
    }

    /// Comments of a post in creation order, as seen by `actor`.
    pub async fn list_comments(&self, actor: &Actor, post_id: i64) -> Result<Outcome<Vec<CommentView>>> {
        if let Err(e) = require_member(actor) {
            return Ok(Outcome::denied(e.to_string()));
        }
        if PostRepository::new(self.db.pool()).get(post_id).await?.is_none() {
            return Ok(Outcome::invalid("post not found"));
        }

        let items = CommentRepository::new(self.db.pool())
            .list_for_post(post_id)
            .await?;
        let views = items
            .iter()
            .filter_map(|item| CommentView::project(item, actor, self.enricher))
            .collect();
        Ok(Outcome::Done(views))
    }

    /// Pin or unpin a post. Moderator only.
    pub async fn set_pinned(&self, actor: &Actor, id: i64, pinned: bool) -> Result<Outcome<()>> {
        if let Err(e) = require_moderator(actor) {
            warn!(actor = ?actor.username(), id, "Pin denied");
            return Ok(Outcome::denied(e.to_string()));
        }
        if !PostRepository::new(self.db.pool()).set_pinned(id, pinned).await? {
            return Ok(Outcome::invalid("post not found"));
        }
        info!(id, pinned, actor = ?actor.username(), "Post pin changed");
        Ok(Outcome::Done(()))
    }

    /// Lock or unlock a post. Moderator only.
    pub async fn set_locked(&self, actor: &Actor, id: i64, locked: bool) -> Result<Outcome<()>> {
        if let Err(e) = require_moderator(actor) {
            warn!(actor = ?actor.username(), id, "Lock denied");
            return Ok(Outcome::denied(e.to_string()));
        }
        if !PostRepository::new(self.db.pool()).set_locked(id, locked).await? {
            return Ok(Outcome::invalid("post not found"));
        }
        info!(id, locked, actor = ?actor.username(), "Post lock changed");
        Ok(Outcome::Done(()))
    }

    fn check_delete<T>(&self, actor: &Actor, item: &ContentItem) -> Option<Outcome<T>> {
        if can_moderate(actor, &item.owner) {
            return None;
        }
        warn!(
            actor = ?actor.username(),
            id = item.id,
            kind = item.noun(),
            "Delete denied"
        );
        Some(Outcome::denied(format!(
            "only the author or a moderator may delete this {}",
            item.noun()
        )))
    }

    /// Validate and store an optional upload. Returns the stored name.
    async fn store_image(&self, upload: Option<&ImageUpload>) -> Result<Outcome<Option<String>>> {
        let Some(upload) = upload else {
            return Ok(Outcome::Done(None));
        };
        if let Err(e) = validate_image(upload, self.max_upload_bytes) {
            debug!(file = %upload.file_name, error = %e, "Upload rejected");
            return Ok(Outcome::invalid(e.to_string()));
        }
        let stored = self.storage.save(upload).await?;
        Ok(Outcome::Done(Some(stored)))
    }

    async fn discard_image(&self, stored_name: Option<&str>) {
        let Some(name) = stored_name else {
            return;
        };
        match self.storage.remove(name).await {
            Ok(true) => debug!(file = %name, "Image removed"),
            Ok(false) => debug!(file = %name, "Image already gone"),
            Err(e) => warn!(file = %name, error = %e, "Failed to remove image"),
        }
    }
}
