//! Per-viewer projections of posts and comments.

use serde::Serialize;

use super::item::{ContentItem, ContentKind};
use crate::auth::{can_moderate, Actor};
use crate::content::Enricher;

/// Name shown in place of an anonymous author to non-moderators.
pub const HIDDEN_NAME: &str = "Hidden";

/// URL prefix uploaded images are served under.
pub const UPLOADS_URL_PREFIX: &str = "/uploads";

/// Author name as `viewer` may see it.
///
/// Moderators see the real name of an anonymous author with a
/// `" (hidden)"` suffix; everyone else sees [`HIDDEN_NAME`].
pub fn display_name(item: &ContentItem, viewer: &Actor) -> String {
    if !item.is_anonymous {
        item.owner.clone()
    } else if viewer.is_moderator() {
        format!("{} (hidden)", item.owner)
    } else {
        HIDDEN_NAME.to_string()
    }
}

/// Fields shared by post and comment views.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ItemView {
    pub id: i64,
    pub username: String,
    /// Rendered, display-safe content.
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
    pub timestamp: String,
    pub is_anonymous: bool,
    /// Viewer is the author or a moderator.
    pub has_ownership: bool,
}

impl ItemView {
    pub fn project(item: &ContentItem, viewer: &Actor, enricher: &Enricher) -> Self {
        Self {
            id: item.id,
            username: display_name(item, viewer),
            content: enricher.render(&item.body, item.raw_markup),
            image_path: item
                .image
                .as_ref()
                .map(|name| format!("{UPLOADS_URL_PREFIX}/{name}")),
            timestamp: item.created_at.clone(),
            is_anonymous: item.is_anonymous,
            has_ownership: can_moderate(viewer, &item.owner),
        }
    }
}

/// A post as returned by a listing.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PostView {
    #[serde(flatten)]
    pub item: ItemView,
    pub pinned: bool,
    pub locked: bool,
    pub comment_count: i64,
    /// Present, and `true`, only for moderators.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub can_pin: Option<bool>,
    /// Present, and `true`, only for moderators.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub can_lock: Option<bool>,
}

impl PostView {
    /// Project a post. Returns `None` for a comment.
    pub fn project(
        item: &ContentItem,
        comment_count: i64,
        viewer: &Actor,
        enricher: &Enricher,
    ) -> Option<Self> {
        let ContentKind::Post { pinned, locked } = item.kind else {
            return None;
        };
        let moderator = viewer.is_moderator().then_some(true);
        Some(Self {
            item: ItemView::project(item, viewer, enricher),
            pinned,
            locked,
            comment_count,
            can_pin: moderator,
            can_lock: moderator,
        })
    }
}

/// A comment as returned by a listing.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CommentView {
    #[serde(flatten)]
    pub item: ItemView,
    pub parent_post_id: i64,
    /// Always `true`; lets clients tell comments from posts in a merged feed.
    pub is_comment: bool,
}

impl CommentView {
    /// Project a comment. Returns `None` for a post.
    pub fn project(item: &ContentItem, viewer: &Actor, enricher: &Enricher) -> Option<Self> {
        let ContentKind::Comment { parent_id } = item.kind else {
            return None;
        };
        Some(Self {
            item: ItemView::project(item, viewer, enricher),
            parent_post_id: parent_id,
            is_comment: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::EmoticonSet;
    use crate::db::Rank;

    fn enricher() -> Enricher {
        Enricher::new(EmoticonSet::from_names(["smile"]), "/e")
    }

    fn post(owner: &str, anonymous: bool) -> ContentItem {
        ContentItem {
            id: 5,
            owner: owner.to_string(),
            body: "hello :smile: <b>".to_string(),
            image: Some("abc_cat.png".to_string()),
            created_at: "2024-05-01 12:00:00".to_string(),
            is_anonymous: anonymous,
            raw_markup: false,
            kind: ContentKind::Post {
                pinned: false,
                locked: true,
            },
        }
    }

    fn comment(owner: &str, anonymous: bool) -> ContentItem {
        ContentItem {
            id: 6,
            kind: ContentKind::Comment { parent_id: 5 },
            ..post(owner, anonymous)
        }
    }

    #[test]
    fn test_display_name_masking() {
        let alice = Actor::user("alice", Rank::MEMBER);
        let bob = Actor::user("bob", Rank::MEMBER);
        let moderator = Actor::user("mod", Rank::MODERATOR);

        assert_eq!(display_name(&post("alice", false), &bob), "alice");
        assert_eq!(display_name(&post("alice", true), &bob), "Hidden");
        assert_eq!(display_name(&post("alice", true), &alice), "Hidden");
        assert_eq!(display_name(&post("alice", true), &moderator), "alice (hidden)");
    }

    #[test]
    fn test_post_view_for_member() {
        let viewer = Actor::user("bob", Rank::MEMBER);
        let view = PostView::project(&post("alice", false), 2, &viewer, &enricher()).unwrap();

        assert_eq!(view.item.username, "alice");
        assert!(!view.item.has_ownership);
        assert_eq!(view.item.image_path.as_deref(), Some("/uploads/abc_cat.png"));
        assert!(view.item.content.contains(r#"<img class="emoticon""#));
        assert!(view.item.content.ends_with("&lt;b&gt;"));
        assert_eq!(view.comment_count, 2);
        assert!(view.locked);

        let json = serde_json::to_value(&view).unwrap();
        assert!(json.get("can_pin").is_none());
        assert!(json.get("can_lock").is_none());
        assert_eq!(json["id"], 5);
        assert_eq!(json["has_ownership"], false);
    }

    #[test]
    fn test_post_view_for_moderator() {
        let viewer = Actor::user("mod", Rank::MODERATOR);
        let view = PostView::project(&post("alice", true), 0, &viewer, &enricher()).unwrap();

        assert_eq!(view.item.username, "alice (hidden)");
        assert!(view.item.has_ownership);

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["can_pin"], true);
        assert_eq!(json["can_lock"], true);
    }

    #[test]
    fn test_ownership_survives_anonymity() {
        let owner = Actor::user("alice", Rank::MEMBER);
        let view = PostView::project(&post("alice", true), 0, &owner, &enricher()).unwrap();
        assert_eq!(view.item.username, "Hidden");
        assert!(view.item.has_ownership);
    }

    #[test]
    fn test_comment_view() {
        let viewer = Actor::user("bob", Rank::MEMBER);
        let view = CommentView::project(&comment("bob", true), &viewer, &enricher()).unwrap();

        assert_eq!(view.item.username, "Hidden");
        assert!(view.item.has_ownership);
        assert_eq!(view.parent_post_id, 5);

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["is_comment"], true);
        assert_eq!(json["parent_post_id"], 5);
        assert!(json.get("can_pin").is_none());
    }

    #[test]
    fn test_projection_rejects_wrong_kind() {
        let viewer = Actor::Anonymous;
        assert!(PostView::project(&comment("a", false), 0, &viewer, &enricher()).is_none());
        assert!(CommentView::project(&post("a", false), &viewer, &enricher()).is_none());
    }
}
