//! Cart route handlers.
//!
//! Handlers that may create or drop the caller's active cart commit the
//! updated [`Owner`](crate::services::Owner) back to the session before the
//! response is built.

use std::collections::BTreeMap;

use axum::{
    Json,
    extract::State,
    response::{Html, IntoResponse, Response},
};
use serde::Deserialize;
use tracing::instrument;

use storehouse_core::{CartId, ProductId, RemoveQuantity, ResponseEnvelope, StatusRef, codes};

use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::{Identity, Payload};
use crate::routes::views::{cart_products, cart_view};
use crate::state::AppState;
use crate::views::{MiniCartJson, View};

// =============================================================================
// Request bodies
// =============================================================================

/// Add-to-cart request.
#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    pub product_id: Option<ProductId>,
    pub quantity: Option<i64>,
    /// Variant option name to value; selects a variant of `product_id`.
    #[serde(default)]
    pub options: BTreeMap<String, String>,
    pub cart_id: Option<CartId>,
}

/// Remove-from-cart request. A missing quantity removes the whole line.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartRequest {
    pub product_id: Option<ProductId>,
    pub quantity: Option<i64>,
    pub cart_id: Option<CartId>,
}

/// Request naming a cart. Only the caller's active cart resolves, and it is
/// the default.
#[derive(Debug, Default, Deserialize)]
pub struct CartRequest {
    pub cart_id: Option<CartId>,
}

/// Set-status request. `status` is a name or a numeric id.
#[derive(Debug, Deserialize)]
pub struct SetStatusRequest {
    pub status: Option<StatusRef>,
    pub cart_id: Option<CartId>,
}

// =============================================================================
// Handlers
// =============================================================================

/// Add a product (or the variant matching `options`) to a cart.
#[instrument(skip(state, identity, request), fields(product_id = ?request.product_id, customer_id = tracing::field::Empty))]
pub async fn add(
    State(state): State<AppState>,
    mut identity: Identity,
    Payload(request): Payload<AddToCartRequest>,
) -> Result<Json<ResponseEnvelope>> {
    let product = request
        .product_id
        .ok_or_else(|| AppError::invalid("A product_id is required."))?;

    let mut owner = identity.owner();
    let added = state
        .carts()
        .add_item(
            &mut owner,
            request.cart_id,
            product,
            request.quantity,
            &request.options,
        )
        .await?;
    identity.commit(owner).await?;

    let cart_id = added.cart.id.to_string();
    add_breadcrumb("cart", "add", Some(&[("cart_id", cart_id.as_str())]));

    Ok(Json(ResponseEnvelope::ok(format!(
        "{} successfully added to cart.",
        added.product.title
    ))))
}

/// Remove a product from a cart.
#[instrument(skip(state, identity, request), fields(product_id = ?request.product_id, customer_id = tracing::field::Empty))]
pub async fn remove(
    State(state): State<AppState>,
    identity: Identity,
    Payload(request): Payload<RemoveFromCartRequest>,
) -> Result<Json<ResponseEnvelope>> {
    let product = request
        .product_id
        .ok_or_else(|| AppError::invalid("A product_id is required."))?;
    let quantity = RemoveQuantity::from_wire(request.quantity)
        .ok_or_else(|| AppError::invalid("Quantity must be a positive number or -1."))?;

    let removed = state
        .carts()
        .remove_item(&identity.owner(), request.cart_id, product, quantity)
        .await?;

    Ok(Json(if removed {
        ResponseEnvelope::ok("Product successfully removed from cart.")
    } else {
        ResponseEnvelope::default()
    }))
}

/// Remove every item from a cart.
#[instrument(skip(state, identity, request), fields(customer_id = tracing::field::Empty))]
pub async fn empty(
    State(state): State<AppState>,
    identity: Identity,
    Payload(request): Payload<CartRequest>,
) -> Result<Json<ResponseEnvelope>> {
    let emptied = state
        .carts()
        .empty_cart(&identity.owner(), request.cart_id)
        .await?;

    Ok(Json(if emptied {
        ResponseEnvelope::ok("Cart successfully emptied.")
    } else {
        ResponseEnvelope::default()
    }))
}

/// Mini cart: the `mini-cart` view when enabled, JSON otherwise.
#[instrument(skip(state, identity), fields(customer_id = tracing::field::Empty))]
pub async fn mini(State(state): State<AppState>, identity: Identity) -> Result<Response> {
    let cart = state.carts().get_active_cart(&identity.owner()).await?;

    if state.config().view_enabled(View::MiniCart) {
        let view = cart_view(&state, cart.as_ref()).await?;
        return Ok(Html(View::MiniCart.render(&view)?).into_response());
    }

    let Some(cart) = cart else {
        return Ok(Json(MiniCartJson::new(None, &BTreeMap::new(), None)).into_response());
    };
    let products = cart_products(state.store(), &cart).await?;
    let total = state.pricing().total(&cart).await?;
    Ok(Json(MiniCartJson::new(Some(&cart), &products, total)).into_response())
}

/// Move a cart to another status, creating a named status on first use.
#[instrument(skip(state, identity, request), fields(status = ?request.status, customer_id = tracing::field::Empty))]
pub async fn set_status(
    State(state): State<AppState>,
    identity: Identity,
    Payload(request): Payload<SetStatusRequest>,
) -> Result<Json<ResponseEnvelope>> {
    let status = request.status.ok_or_else(|| AppError::Rejected {
        code: codes::INVALID_REQUEST,
        message: "A status name or id is required.".to_string(),
    })?;

    let status = state
        .carts()
        .set_status(&identity.owner(), request.cart_id, &status)
        .await?;

    Ok(Json(ResponseEnvelope::ok(format!(
        "Cart status set to {}.",
        status.name
    ))))
}
