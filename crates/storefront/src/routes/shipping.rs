//! Shipping vendor handlers: rate quotes and inventory sync.

use axum::{Json, extract::State};
use serde::Deserialize;
use serde_json::Value;
use tracing::instrument;

use storehouse_core::{
    AddressFields, CartId, ProductId, ResponseEnvelope, codes, envelope::DEFAULT_ERROR_MESSAGE,
};

use crate::error::{AppError, Result};
use crate::middleware::{Identity, Payload};
use crate::shipping::{RateQuote, ShippingError};
use crate::state::AppState;

/// Quote request. Without an address the cart's stored shipping address is
/// used.
#[derive(Debug, Deserialize)]
pub struct QuoteRequest {
    pub address: Option<AddressFields>,
    pub cart_id: Option<CartId>,
}

/// Inventory sync request. Without a product every product is synced.
#[derive(Debug, Default, Deserialize)]
pub struct InventorySyncRequest {
    pub product_id: Option<ProductId>,
}

/// Quote the caller's cart.
///
/// The first vendor warning, when present, is reported as a success with
/// the warning's code and message. Options are returned in vendor order.
#[instrument(skip(state, identity, request), fields(customer_id = tracing::field::Empty))]
pub async fn quote(
    State(state): State<AppState>,
    identity: Identity,
    Payload(request): Payload<QuoteRequest>,
) -> Result<Json<ResponseEnvelope>> {
    let cart = state
        .carts()
        .get_cart(&identity.owner(), request.cart_id)
        .await?
        .ok_or_else(|| AppError::Rejected {
            code: codes::NOT_AVAILABLE,
            message: "No active cart.".to_string(),
        })?;

    let shipping = state.shipping_service();
    let quote = match &request.address {
        Some(address) => shipping.quote_for_address(&cart, address).await?,
        None => shipping
            .quote_for_cart(&cart)
            .await?
            .ok_or(ShippingError::NothingToShip)?,
    };

    Ok(Json(quote_envelope(state.shipping().vendor(), quote)))
}

fn quote_envelope(vendor: &str, quote: RateQuote) -> ResponseEnvelope {
    let envelope = match quote.warnings.first() {
        Some(warning) => {
            ResponseEnvelope::success(warning.code.to_uppercase(), warning.message.clone())
        }
        None if quote.is_success() => ResponseEnvelope::ok("This is a useable address."),
        None => ResponseEnvelope::failure(
            codes::ERROR,
            quote
                .error_message
                .clone()
                .unwrap_or_else(|| DEFAULT_ERROR_MESSAGE.to_string()),
        ),
    };

    envelope
        .with_vendor_response(vendor, Value::String(quote.body))
        .with_options(quote.options)
}

/// Pull stock levels from the vendor for one product or all of them.
#[instrument(skip(state, identity, request), fields(product_id = ?request.product_id, customer_id = tracing::field::Empty))]
pub async fn sync_inventory(
    State(state): State<AppState>,
    identity: Identity,
    Payload(request): Payload<InventorySyncRequest>,
) -> Result<Json<ResponseEnvelope>> {
    let session_key = identity.session_key();
    let inventory = state.inventory();
    let synced = match request.product_id {
        Some(id) => inventory.sync_product(id, &session_key).await?,
        None => inventory.sync_all(&session_key).await?,
    };

    Ok(Json(if synced > 0 {
        ResponseEnvelope::ok("All inventory updated.")
    } else {
        ResponseEnvelope::default()
    }))
}
