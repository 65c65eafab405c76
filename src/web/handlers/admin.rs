//! Account, emoticon and announcement handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};

use crate::auth::NewAccount;
use crate::db::Rank;
use crate::web::dto::{
    AnnouncementRequest, AnnouncementResponse, ApiResponse, CreateUserRequest, EmoticonRequest,
    SuccessResponse, UserCreatedResponse,
};
use crate::web::error::{done, ApiError};
use crate::web::middleware::CurrentActor;
use crate::web::state::AppState;

// ============================================================================
// Accounts
// ============================================================================

/// POST /api/admin/users - Create an account.
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    CurrentActor(actor): CurrentActor,
    Json(req): Json<CreateUserRequest>,
) -> Result<Json<UserCreatedResponse>, ApiError> {
    let account =
        NewAccount::new(req.username, req.password).with_rank(req.rank.unwrap_or(Rank::MEMBER));
    let user = done(state.accounts().add_user(&actor, &account).await?)?;
    Ok(Json(UserCreatedResponse::new(&user)))
}

/// DELETE /api/admin/users/:username - Delete an account.
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    CurrentActor(actor): CurrentActor,
    Path(username): Path<String>,
) -> Result<Json<SuccessResponse>, ApiError> {
    done(state.accounts().delete_user(&actor, &username).await?)?;
    Ok(Json(SuccessResponse::new()))
}

// ============================================================================
// Emoticons
// ============================================================================

/// GET /api/emoticons - Registered emoticon names.
pub async fn list_emoticons(
    State(state): State<Arc<AppState>>,
    CurrentActor(actor): CurrentActor,
) -> Result<Json<ApiResponse<Vec<String>>>, ApiError> {
    let names = done(state.emoticon_admin().list(&actor))?;
    Ok(Json(ApiResponse::new(names)))
}

/// POST /api/admin/emoticons - Register an emoticon.
pub async fn add_emoticon(
    State(state): State<Arc<AppState>>,
    CurrentActor(actor): CurrentActor,
    Json(req): Json<EmoticonRequest>,
) -> Result<Json<SuccessResponse>, ApiError> {
    done(state.emoticon_admin().add(&actor, &req.name).await?)?;
    Ok(Json(SuccessResponse::new()))
}

/// DELETE /api/admin/emoticons/:name - Unregister an emoticon.
pub async fn remove_emoticon(
    State(state): State<Arc<AppState>>,
    CurrentActor(actor): CurrentActor,
    Path(name): Path<String>,
) -> Result<Json<SuccessResponse>, ApiError> {
    done(state.emoticon_admin().remove(&actor, &name).await?)?;
    Ok(Json(SuccessResponse::new()))
}

// ============================================================================
// Announcement
// ============================================================================

/// GET /api/announcement - The current announcement.
pub async fn get_announcement(
    State(state): State<Arc<AppState>>,
    CurrentActor(actor): CurrentActor,
) -> Result<Json<ApiResponse<AnnouncementResponse>>, ApiError> {
    let content = done(state.announcements().get(&actor).await?)?;
    Ok(Json(ApiResponse::new(AnnouncementResponse { content })))
}

/// PUT /api/admin/announcement - Set the announcement.
pub async fn set_announcement(
    State(state): State<Arc<AppState>>,
    CurrentActor(actor): CurrentActor,
    Json(req): Json<AnnouncementRequest>,
) -> Result<Json<SuccessResponse>, ApiError> {
    done(state.announcements().set(&actor, &req.content).await?)?;
    Ok(Json(SuccessResponse::new()))
}

/// DELETE /api/admin/announcement - Clear the announcement.
pub async fn clear_announcement(
    State(state): State<Arc<AppState>>,
    CurrentActor(actor): CurrentActor,
) -> Result<Json<SuccessResponse>, ApiError> {
    done(state.announcements().clear(&actor).await?)?;
    Ok(Json(SuccessResponse::new()))
}
