//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                     - Liveness check
//! GET    /health/ready               - Store readiness check
//!
//! # Cart
//! POST   /api/cart/add               - Add a product or variant
//! POST   /api/cart/remove            - Remove a product (all, or a count)
//! POST   /api/cart/empty             - Remove every item
//! GET    /api/cart/mini              - Mini cart (view or JSON)
//! POST   /api/cart/status            - Set cart status by name or id
//!
//! # Views
//! GET    /api/views/{name}           - Render an allow-listed view
//!
//! # Customers
//! GET    /api/nonce/{purpose}        - Issue a signup/login nonce
//! POST   /api/customers/sign-on      - Sign on
//! POST   /api/customers              - Create a customer
//!
//! # Addresses
//! POST   /api/addresses              - Attach an address to the cart
//! POST   /api/addresses/{id}/detach  - Detach an address from its cart
//! DELETE /api/addresses/{id}         - Delete an address
//!
//! # Vendors
//! POST   /api/inventory/sync         - Pull stock levels
//! POST   /api/shipping/quote         - Rate quote for the cart
//! POST   /api/payments/charge        - Charge the cart total
//! POST   /api/orders                 - Place an order
//! ```
//!
//! Everything under `/api` answers with the response envelope except the
//! mini cart, views and nonces.

pub mod addresses;
pub mod cart;
pub mod checkout;
pub mod customers;
pub mod shipping;
pub mod views;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/add", post(cart::add))
        .route("/remove", post(cart::remove))
        .route("/empty", post(cart::empty))
        .route("/mini", get(cart::mini))
        .route("/status", post(cart::set_status))
}

/// Create the customer routes router.
pub fn customer_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(customers::create))
        .route("/sign-on", post(customers::sign_on))
}

/// Create the address routes router.
pub fn address_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(addresses::save))
        .route("/{id}", axum::routing::delete(addresses::delete))
        .route("/{id}/detach", post(addresses::detach))
}

/// Create the `/api` router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/cart", cart_routes())
        .route("/views/{name}", get(views::show))
        .route("/nonce/{purpose}", get(customers::nonce))
        .nest("/customers", customer_routes())
        .nest("/addresses", address_routes())
        .route("/inventory/sync", post(shipping::sync_inventory))
        .route("/shipping/quote", post(shipping::quote))
        .route("/payments/charge", post(checkout::charge))
        .route("/orders", post(checkout::submit_order))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest("/api", api_routes())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the store is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.store().ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
