//! Post and comment handlers.

use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartError, Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::board::{CommentView, NewComment, NewPost, Pagination};
use crate::upload::ImageUpload;
use crate::web::dto::{
    ApiResponse, CreatedResponse, FlagRequest, ListPostsQuery, PostPage, SuccessResponse,
};
use crate::web::error::{done, ApiError};
use crate::web::middleware::CurrentActor;
use crate::web::state::AppState;

/// Fields of a post or comment form.
#[derive(Debug, Default)]
struct Submission {
    content: String,
    image: Option<ImageUpload>,
    is_anonymous: bool,
    pinned: bool,
    locked: bool,
    raw_markup: bool,
}

/// Checkbox and boolean form values. Anything unrecognized is `false`.
fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "t" | "true" | "on" | "yes"
    )
}

fn multipart_error(e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::payload_too_large("Upload is too large")
    } else {
        ApiError::bad_request(e.body_text())
    }
}

async fn read_submission(mut multipart: Multipart) -> Result<Submission, ApiError> {
    let mut submission = Submission::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "image" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(multipart_error)?;
                // An untouched file input still sends an empty part.
                if !file_name.is_empty() || !bytes.is_empty() {
                    submission.image = Some(ImageUpload::new(file_name, bytes.to_vec()));
                }
            }
            "postcontent" | "content" => {
                submission.content = field.text().await.map_err(multipart_error)?;
            }
            "isanonymous" => {
                submission.is_anonymous = parse_flag(&field.text().await.map_err(multipart_error)?);
            }
            "pinned" => {
                submission.pinned = parse_flag(&field.text().await.map_err(multipart_error)?);
            }
            "locked" => {
                submission.locked = parse_flag(&field.text().await.map_err(multipart_error)?);
            }
            "reject-sanitize" => {
                submission.raw_markup = parse_flag(&field.text().await.map_err(multipart_error)?);
            }
            _ => {}
        }
    }

    Ok(submission)
}

/// GET /api/posts - One page of posts.
pub async fn list_posts(
    State(state): State<Arc<AppState>>,
    CurrentActor(actor): CurrentActor,
    Query(query): Query<ListPostsQuery>,
) -> Result<Json<ApiResponse<PostPage>>, ApiError> {
    let pagination = Pagination::from_query(query.offset, query.limit);
    let page = done(state.board().list_posts(&actor, pagination).await?)?;
    Ok(Json(ApiResponse::new(page.into())))
}

/// POST /api/posts - Create a post from a multipart form.
pub async fn create_post(
    State(state): State<Arc<AppState>>,
    CurrentActor(actor): CurrentActor,
    multipart: Multipart,
) -> Result<Json<CreatedResponse>, ApiError> {
    let submission = read_submission(multipart).await?;
    let post = NewPost {
        content: submission.content,
        image: submission.image,
        is_anonymous: submission.is_anonymous,
        pinned: submission.pinned,
        locked: submission.locked,
        raw_markup: submission.raw_markup,
    };

    let id = done(state.board().create_post(&actor, post).await?)?;
    Ok(Json(CreatedResponse::new(id)))
}

/// DELETE /api/posts/:id - Delete a post and its comments.
pub async fn delete_post(
    State(state): State<Arc<AppState>>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<i64>,
) -> Result<Json<SuccessResponse>, ApiError> {
    done(state.board().delete_post(&actor, id).await?)?;
    Ok(Json(SuccessResponse::new()))
}

/// PUT /api/posts/:id/pinned - Pin or unpin a post.
pub async fn set_pinned(
    State(state): State<Arc<AppState>>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<i64>,
    Json(req): Json<FlagRequest>,
) -> Result<Json<SuccessResponse>, ApiError> {
    done(state.board().set_pinned(&actor, id, req.value).await?)?;
    Ok(Json(SuccessResponse::new()))
}

/// PUT /api/posts/:id/locked - Lock or unlock a post.
pub async fn set_locked(
    State(state): State<Arc<AppState>>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<i64>,
    Json(req): Json<FlagRequest>,
) -> Result<Json<SuccessResponse>, ApiError> {
    done(state.board().set_locked(&actor, id, req.value).await?)?;
    Ok(Json(SuccessResponse::new()))
}

/// GET /api/posts/:id/comments - Comments of a post.
pub async fn list_comments(
    State(state): State<Arc<AppState>>,
    CurrentActor(actor): CurrentActor,
    Path(post_id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<CommentView>>>, ApiError> {
    let comments = done(state.board().list_comments(&actor, post_id).await?)?;
    Ok(Json(ApiResponse::new(comments)))
}

/// POST /api/posts/:id/comments - Comment on a post from a multipart form.
pub async fn create_comment(
    State(state): State<Arc<AppState>>,
    CurrentActor(actor): CurrentActor,
    Path(post_id): Path<i64>,
    multipart: Multipart,
) -> Result<Json<CreatedResponse>, ApiError> {
    let submission = read_submission(multipart).await?;
    let comment = NewComment {
        post_id,
        content: submission.content,
        image: submission.image,
        is_anonymous: submission.is_anonymous,
        raw_markup: submission.raw_markup,
    };

    let id = done(state.board().create_comment(&actor, comment).await?)?;
    Ok(Json(CreatedResponse::new(id)))
}

/// DELETE /api/comments/:id - Delete a comment.
pub async fn delete_comment(
    State(state): State<Arc<AppState>>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<i64>,
) -> Result<Json<SuccessResponse>, ApiError> {
    done(state.board().delete_comment(&actor, id).await?)?;
    Ok(Json(SuccessResponse::new()))
}
