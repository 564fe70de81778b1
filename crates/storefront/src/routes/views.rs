//! Named view handler.

use std::collections::BTreeMap;

use axum::{
    Json,
    extract::{Path, State},
    response::{Html, IntoResponse, Response},
};
use tracing::{debug, instrument};

use storehouse_core::{ProductId, ResponseEnvelope, codes};

use crate::db::{RepositoryError, Store};
use crate::error::Result;
use crate::middleware::Identity;
use crate::models::{Cart, Product};
use crate::state::AppState;
use crate::views::{CartView, View};

/// Answer for a view name that is unknown or not enabled.
fn no_template() -> Response {
    Json(ResponseEnvelope::failure(
        codes::NO_TEMPLATE,
        "No matching view found",
    ))
    .into_response()
}

/// Render an allow-listed view for the caller's active cart.
#[instrument(skip(state, identity), fields(customer_id = tracing::field::Empty))]
pub async fn show(
    State(state): State<AppState>,
    identity: Identity,
    Path(name): Path<String>,
) -> Result<Response> {
    let Ok(view) = name.parse::<View>() else {
        debug!(view = %name, "Unknown view requested");
        return Ok(no_template());
    };
    if !state.config().view_enabled(view) {
        return Ok(no_template());
    }

    let cart = state.carts().get_active_cart(&identity.owner()).await?;
    let data = cart_view(&state, cart.as_ref()).await?;
    Ok(Html(view.render(&data)?).into_response())
}

/// The products behind a cart's lines. Missing products are skipped.
pub(crate) async fn cart_products(
    store: &dyn Store,
    cart: &Cart,
) -> std::result::Result<BTreeMap<ProductId, Product>, RepositoryError> {
    let mut products = BTreeMap::new();
    for (id, _) in cart.items.iter() {
        if let Some(product) = store.get_product(id).await? {
            products.insert(id, product);
        }
    }
    Ok(products)
}

/// Display data for a cart, or the empty view when there is none.
pub(crate) async fn cart_view(
    state: &AppState,
    cart: Option<&Cart>,
) -> std::result::Result<CartView, RepositoryError> {
    let Some(cart) = cart else {
        return Ok(CartView::empty());
    };
    let products = cart_products(state.store(), cart).await?;
    let totals = state.pricing().totals(cart).await?;
    Ok(CartView::new(cart, &products, &totals))
}
