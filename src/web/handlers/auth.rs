//! Authentication handlers.

use std::sync::Arc;

use axum::{extract::State, http::HeaderMap, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::web::dto::{ApiResponse, LoginRequest, LoginResponse, MeResponse, SuccessResponse};
use crate::web::error::ApiError;
use crate::web::middleware::{session_token, CurrentActor};
use crate::web::state::AppState;

/// POST /api/auth/login - Open a session.
///
/// The token is returned in the body and set as the session cookie.
pub async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>), ApiError> {
    if req.username.is_empty() || req.password.is_empty() {
        return Err(ApiError::bad_request("Username and password are required"));
    }

    let session = state
        .accounts()
        .login(&req.username, &req.password)
        .await
        .map_err(|e| match e {
            crate::MmivError::Auth(_) => ApiError::unauthorized("Invalid username or password"),
            other => other.into(),
        })?;

    let cookie = Cookie::build((state.cookie_name.clone(), session.token.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();

    let response = LoginResponse {
        status: crate::web::dto::STATUS_SUCCESS,
        username: session.username,
        token: session.token,
        expires_at: session.expires_at.to_rfc3339(),
    };
    Ok((jar.add(cookie), Json(response)))
}

/// POST /api/auth/logout - Close the session and clear the cookie.
pub async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    jar: CookieJar,
) -> (CookieJar, Json<SuccessResponse>) {
    if let Some(token) = session_token(&headers, &state.cookie_name) {
        state.accounts().logout(&token);
    }
    let jar = jar.remove(Cookie::build(state.cookie_name.clone()).path("/"));
    (jar, Json(SuccessResponse::new()))
}

/// GET /api/auth/me - The acting user, or anonymous.
pub async fn me(CurrentActor(actor): CurrentActor) -> Json<ApiResponse<MeResponse>> {
    let rank = actor.rank();
    Json(ApiResponse::new(MeResponse {
        username: actor.username().map(str::to_string),
        rank: rank.value(),
        rank_name: rank.display_name(),
    }))
}
