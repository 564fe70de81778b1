//! Storehouse storefront library.
//!
//! Cart, checkout and vendor integrations behind a JSON API. The binary in
//! `main.rs` wires this library to `PostgreSQL`, Shipwire and Stripe; the
//! integration tests wire it to in-memory stand-ins.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod payments;
pub mod routes;
pub mod services;
pub mod shipping;
pub mod state;
pub mod views;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

use axum::Router;
use tower_http::trace::TraceLayer;
use tower_sessions::{SessionManagerLayer, SessionStore};

use crate::state::AppState;

/// Build the application router with sessions and request tracing.
///
/// Sentry layers are added by the binary, outside this router.
pub fn app<Store>(state: AppState, session_layer: SessionManagerLayer<Store>) -> Router
where
    Store: SessionStore + Clone,
{
    routes::routes()
        .layer(session_layer)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use tower::ServiceExt;

    use super::*;
    use crate::config::StorefrontConfig;
    use crate::db::MemoryStore;
    use crate::middleware::{SESSION_COOKIE_NAME, create_session_layer};
    use crate::testing::{FakePayments, FakeShipping};

    fn test_app() -> Router {
        let config = StorefrontConfig::default();
        let session_layer = create_session_layer(tower_sessions::MemoryStore::default(), &config);
        let state = AppState::new(
            config,
            Arc::new(MemoryStore::new()),
            Arc::new(FakeShipping::enabled()),
            Arc::new(FakePayments::approving()),
        );
        app(state, session_layer)
    }

    #[tokio::test]
    async fn test_readiness_with_memory_store() {
        let response = test_app()
            .oneshot(Request::get("/health/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_nonce_starts_a_session() {
        let response = test_app()
            .oneshot(Request::get("/api/nonce/login").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap();
        assert!(cookie.starts_with(&format!("{SESSION_COOKIE_NAME}=")));
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let response = test_app()
            .oneshot(Request::get("/api/nowhere").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
