//! Session authentication.
//!
//! The session token is read from the session cookie, or failing that from
//! an `Authorization: Bearer` header.

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;

use crate::auth::{authorize, Actor, IdentityResolver};
use crate::db::Rank;
use crate::web::error::ApiError;
use crate::web::state::AppState;

/// Session token carried by a request, if any.
pub fn session_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let jar = CookieJar::from_headers(headers);
    if let Some(cookie) = jar.get(cookie_name) {
        if !cookie.value().is_empty() {
            return Some(cookie.value().to_string());
        }
    }

    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

/// Extractor for the acting party.
///
/// Never rejects because of credentials: a missing, unknown or expired token
/// yields [`Actor::Anonymous`]. Only a store failure is an error.
#[derive(Debug, Clone)]
pub struct CurrentActor(pub Actor);

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for CurrentActor {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        if let Some(actor) = parts.extensions.get::<Actor>() {
            return Ok(CurrentActor(actor.clone()));
        }

        let token = session_token(&parts.headers, &state.cookie_name);
        let actor = IdentityResolver::new(&state.sessions, state.db.pool())
            .resolve(token.as_deref())
            .await?;
        parts.extensions.insert(actor.clone());
        Ok(CurrentActor(actor))
    }
}

/// Middleware that lets only members through.
///
/// Used for routes that are not handlers of their own, such as the upload
/// file service.
pub async fn require_member_session(
    State(_state): State<Arc<AppState>>,
    CurrentActor(actor): CurrentActor,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if !authorize(Some(actor.rank()), Rank::MEMBER) {
        return Err(ApiError::unauthorized("login required"));
    }
    Ok(next.run(request).await)
}
