//! Test helpers for Web API tests.
//!
//! Builds an application over an in-memory database and a temporary upload
//! directory, seeded with two members and one moderator.

#![allow(dead_code)]

use std::sync::Arc;

use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::{HeaderName, HeaderValue};
use axum_test::TestServer;
use serde_json::{json, Value};
use tempfile::TempDir;

use mmiv::auth::{hash_password, SessionManager};
use mmiv::content::{EmoticonSet, Enricher};
use mmiv::db::{NewUser, Rank, UserRepository};
use mmiv::upload::UploadStorage;
use mmiv::web::router::{create_health_router, create_router};
use mmiv::web::AppState;
use mmiv::Database;

/// Password of every seeded account.
pub const PASSWORD: &str = "password123";

/// Upload limit used by test servers.
pub const MAX_UPLOAD_BYTES: usize = 64 * 1024;

pub const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
pub const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0, 0x10, b'J', b'F', b'I', b'F'];

/// A running test application.
pub struct TestApp {
    pub server: TestServer,
    pub state: AppState,
    _dir: TempDir,
}

/// Create a test server with seeded accounts `alice`, `bob` (members) and
/// `mod` (moderator).
pub async fn create_test_app() -> TestApp {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let db = Database::open_in_memory()
        .await
        .expect("Failed to create test database");

    let repo = UserRepository::new(db.pool());
    for (name, rank) in [
        ("alice", Rank::MEMBER),
        ("bob", Rank::MEMBER),
        ("mod", Rank::MODERATOR),
    ] {
        let hash = hash_password(PASSWORD).unwrap();
        repo.create(&NewUser::new(name, hash).with_rank(rank))
            .await
            .unwrap();
    }

    let storage = UploadStorage::new(dir.path().join("uploads")).unwrap();
    let enricher = Enricher::new(EmoticonSet::new(), "/static/img/emoticons");
    let state = AppState::new(
        db,
        SessionManager::default(),
        enricher,
        storage,
        MAX_UPLOAD_BYTES,
    );

    let router = create_router(Arc::new(state.clone()), &[]).merge(create_health_router());
    let server = TestServer::new(router).expect("Failed to create test server");

    TestApp {
        server,
        state,
        _dir: dir,
    }
}

/// Log in and return the session token.
pub async fn login(server: &TestServer, username: &str) -> String {
    let response = server
        .post("/api/auth/login")
        .json(&json!({
            "username": username,
            "password": PASSWORD
        }))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    body["token"].as_str().unwrap().to_string()
}

/// `Authorization: Bearer` header for a token.
pub fn bearer(token: &str) -> (HeaderName, HeaderValue) {
    (
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
    )
}

/// Session cookie header for a token.
pub fn session_cookie(token: &str) -> (HeaderName, HeaderValue) {
    (
        COOKIE,
        HeaderValue::from_str(&format!("userSessionToken={token}")).unwrap(),
    )
}
