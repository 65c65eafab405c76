//! CORS configuration.

use axum::http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use tower_http::cors::{Any, CorsLayer};

const METHODS: [Method; 5] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::DELETE,
    Method::OPTIONS,
];

/// Build the CORS layer for the configured origins.
///
/// With no usable origins, any origin is allowed but credentials are not,
/// so the session cookie is never sent cross-site. With explicit origins,
/// credentials are allowed for those origins only.
pub fn create_cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if allowed.is_empty() {
        return CorsLayer::new()
            .allow_methods(METHODS)
            .allow_headers(Any)
            .allow_origin(Any);
    }

    CorsLayer::new()
        .allow_methods(METHODS)
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT])
        .allow_credentials(true)
        .allow_origin(allowed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permissive_without_origins() {
        let _layer = create_cors_layer(&[]);
    }

    #[test]
    fn test_invalid_origins_fall_back() {
        let _layer = create_cors_layer(&["not a\nheader".to_string()]);
    }

    #[test]
    fn test_explicit_origins() {
        let _layer = create_cors_layer(&["http://localhost:1759".to_string()]);
    }
}
