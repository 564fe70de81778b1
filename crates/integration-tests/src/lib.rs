//! Integration tests for Storehouse.
//!
//! # Running Tests
//!
//! ```bash
//! # In-process tests (in-memory store, fake vendors)
//! cargo test -p storehouse-integration-tests
//!
//! # Database-backed tests (requires a migrated PostgreSQL)
//! STOREFRONT_DATABASE_URL=postgres://... cargo test -p storehouse-integration-tests -- --ignored
//! ```
//!
//! [`TestContext`] drives the storefront router in-process with
//! `tower::ServiceExt::oneshot`, carrying the session cookie from one request
//! to the next the way a browser would.

#![allow(clippy::missing_panics_doc, clippy::unwrap_used, clippy::must_use_candidate)]

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, Bytes};
use axum::http::{Method, Request, StatusCode, header};
use serde_json::Value;
use tower::ServiceExt;

use storehouse_core::{Cents, ProductId, ResponseEnvelope};
use storehouse_storefront::config::StorefrontConfig;
use storehouse_storefront::db::{MemoryStore, Store};
use storehouse_storefront::middleware::{SESSION_COOKIE_NAME, create_session_layer};
use storehouse_storefront::models::{NewProduct, Product};
use storehouse_storefront::state::AppState;
use storehouse_storefront::testing::{FakePayments, FakeShipping};

/// One simulated client of an in-process storefront.
pub struct TestContext {
    pub store: Arc<MemoryStore>,
    pub shipping: Arc<FakeShipping>,
    pub payments: Arc<FakePayments>,
    router: Router,
    cookie: Option<String>,
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl TestContext {
    /// Shipping enabled, payments approved, default configuration.
    pub fn new() -> Self {
        Self::with(
            StorefrontConfig::default(),
            FakeShipping::enabled(),
            FakePayments::approving(),
        )
    }

    pub fn with(config: StorefrontConfig, shipping: FakeShipping, payments: FakePayments) -> Self {
        let store = Arc::new(MemoryStore::new());
        let shipping = Arc::new(shipping);
        let payments = Arc::new(payments);

        let session_layer = create_session_layer(tower_sessions::MemoryStore::default(), &config);
        let state = AppState::new(config, store.clone(), shipping.clone(), payments.clone());
        let router = storehouse_storefront::app(state, session_layer);

        Self {
            store,
            shipping,
            payments,
            router,
            cookie: None,
        }
    }

    /// A second client against the same store and vendors, with no session.
    pub fn fresh_client(&self) -> Self {
        Self {
            store: self.store.clone(),
            shipping: self.shipping.clone(),
            payments: self.payments.clone(),
            router: self.router.clone(),
            cookie: None,
        }
    }

    /// Insert a product.
    pub async fn product(&self, title: &str, sku: Option<&str>, price: Option<i64>) -> Product {
        self.store
            .create_product(&NewProduct {
                title: title.to_string(),
                sku: sku.map(str::to_string),
                price: price.map(Cents::new),
                available: true,
                ..NewProduct::default()
            })
            .await
            .unwrap()
    }

    /// Insert a product that cannot be bought.
    pub async fn unavailable_product(&self, title: &str) -> Product {
        self.store
            .create_product(&NewProduct {
                title: title.to_string(),
                price: Some(Cents::new(100)),
                available: false,
                ..NewProduct::default()
            })
            .await
            .unwrap()
    }

    /// Insert a variant of `parent` selected by `options`.
    pub async fn variant(
        &self,
        parent: ProductId,
        title: &str,
        sku: &str,
        options: &[(&str, &str)],
    ) -> Product {
        self.store
            .create_product(&NewProduct {
                parent_id: Some(parent),
                title: title.to_string(),
                sku: Some(sku.to_string()),
                price: Some(Cents::new(2500)),
                available: true,
                options: options
                    .iter()
                    .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                    .collect(),
            })
            .await
            .unwrap()
    }

    pub async fn get(&mut self, path: &str) -> TestResponse {
        self.send(Method::GET, path, Body::empty()).await
    }

    pub async fn post(&mut self, path: &str, body: &Value) -> TestResponse {
        self.send(Method::POST, path, Body::from(body.to_string())).await
    }

    pub async fn delete(&mut self, path: &str) -> TestResponse {
        self.send(Method::DELETE, path, Body::empty()).await
    }

    /// Fetch a nonce for `purpose` into this client's session.
    pub async fn nonce(&mut self, purpose: &str) -> String {
        let response = self.get(&format!("/api/nonce/{purpose}")).await;
        response.json()["nonce"].as_str().unwrap().to_string()
    }

    async fn send(&mut self, method: Method, path: &str, body: Body) -> TestResponse {
        let mut request = Request::builder()
            .method(method)
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(cookie) = &self.cookie {
            request = request.header(header::COOKIE, cookie);
        }

        let response = self
            .router
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();

        for value in response.headers().get_all(header::SET_COOKIE) {
            let pair = value.to_str().unwrap().split(';').next().unwrap_or_default();
            if pair.starts_with(&format!("{SESSION_COOKIE_NAME}=")) {
                self.cookie = Some(pair.to_string());
            }
        }

        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        TestResponse {
            status,
            content_type,
            body,
        }
    }
}

/// A buffered response.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub content_type: String,
    pub body: Bytes,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }

    pub fn envelope(&self) -> ResponseEnvelope {
        assert_eq!(self.status, StatusCode::OK);
        serde_json::from_slice(&self.body).unwrap()
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}
