//! Router configuration for the Web API.

use std::path::Path;
use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use super::handlers::{
    add_emoticon, clear_announcement, create_comment, create_post, create_user, delete_comment,
    delete_post, delete_user, get_announcement, list_comments, list_emoticons, list_posts, login,
    logout, me, remove_emoticon, set_announcement, set_locked, set_pinned,
};
use super::middleware::{create_cors_layer, require_member_session};
use super::state::AppState;
use crate::board::UPLOADS_URL_PREFIX;

/// Room for the text fields of a multipart form on top of the image limit.
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

/// Create the main API router.
pub fn create_router(app_state: Arc<AppState>, cors_origins: &[String]) -> Router {
    let auth_routes = Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(me));

    let board_routes = Router::new()
        .route("/posts", get(list_posts).post(create_post))
        .route("/posts/:id", delete(delete_post))
        .route("/posts/:id/pinned", put(set_pinned))
        .route("/posts/:id/locked", put(set_locked))
        .route("/posts/:id/comments", get(list_comments).post(create_comment))
        .route("/comments/:id", delete(delete_comment))
        .route("/emoticons", get(list_emoticons))
        .route("/announcement", get(get_announcement));

    let admin_routes = Router::new()
        .route("/users", post(create_user))
        .route("/users/:username", delete(delete_user))
        .route("/emoticons", post(add_emoticon))
        .route("/emoticons/:name", delete(remove_emoticon))
        .route(
            "/announcement",
            put(set_announcement).delete(clear_announcement),
        );

    let api_routes = Router::new()
        .nest("/auth", auth_routes)
        .nest("/admin", admin_routes)
        .merge(board_routes)
        .layer(DefaultBodyLimit::max(
            app_state.max_upload_bytes.saturating_add(FORM_OVERHEAD_BYTES),
        ));

    Router::new()
        .nest("/api", api_routes)
        .merge(create_uploads_router(app_state.clone()))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer(cors_origins)),
        )
        .with_state(app_state)
}

/// Serve stored uploads to members only.
pub fn create_uploads_router(app_state: Arc<AppState>) -> Router<Arc<AppState>> {
    let dir = app_state.storage.base_path().to_path_buf();
    Router::new()
        .nest_service(UPLOADS_URL_PREFIX, ServeDir::new(dir))
        .route_layer(middleware::from_fn_with_state(
            app_state,
            require_member_session,
        ))
}

/// Serve the front-end and emoticon images from `static_path`.
///
/// Returns `None` if the directory does not exist.
pub fn create_static_router(static_path: &str) -> Option<Router> {
    if !Path::new(static_path).is_dir() {
        tracing::warn!(path = %static_path, "Static directory not found, not serving static files");
        return None;
    }
    Some(Router::new().nest_service("/static", ServeDir::new(static_path)))
}

/// Create a health check router.
pub fn create_health_router() -> Router {
    Router::new().route("/health", get(health_check))
}

/// Health check handler.
async fn health_check() -> &'static str {
    "OK"
}
