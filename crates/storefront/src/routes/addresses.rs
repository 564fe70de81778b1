//! Address route handlers.
//!
//! Addresses hang off a cart. Callers may only touch addresses attached to
//! their own active cart.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use tracing::{info, instrument};

use storehouse_core::{AddressFields, AddressId, CartId, ResponseEnvelope, codes};

use crate::error::{AppError, Result};
use crate::middleware::{Identity, Payload};
use crate::state::AppState;

/// Save-address request.
#[derive(Debug, Deserialize)]
pub struct SaveAddressRequest {
    pub address: Option<AddressFields>,
    #[serde(default)]
    pub shipping: bool,
    #[serde(default)]
    pub billing: bool,
    pub cart_id: Option<CartId>,
}

fn address_not_found() -> AppError {
    AppError::Rejected {
        code: codes::NOT_AVAILABLE,
        message: "Address not found.".to_string(),
    }
}

/// Attach a new address to a cart (the active cart by default).
#[instrument(skip(state, identity, request), fields(shipping = request.shipping, billing = request.billing, customer_id = tracing::field::Empty))]
pub async fn save(
    State(state): State<AppState>,
    identity: Identity,
    Payload(request): Payload<SaveAddressRequest>,
) -> Result<Json<ResponseEnvelope>> {
    let fields = request
        .address
        .ok_or_else(|| AppError::invalid("An address is required."))?;

    let Some(cart) = state
        .carts()
        .get_cart(&identity.owner(), request.cart_id)
        .await?
    else {
        return Ok(Json(ResponseEnvelope::failure(
            codes::ERROR,
            "Failed to save address.",
        )));
    };

    let address = state
        .addresses()
        .save(&fields, cart.id, request.shipping, request.billing)
        .await?;
    info!(address_id = %address.id, cart_id = %cart.id, "Address saved");

    Ok(Json(ResponseEnvelope::ok("Address successfully added.")))
}

/// Resolve an address the caller's active cart owns.
async fn owned_address(state: &AppState, identity: &Identity, id: &str) -> Result<AddressId> {
    let id: AddressId = id
        .parse()
        .map_err(|_| AppError::invalid("Invalid address id."))?;
    let active = state
        .carts()
        .get_active_cart(&identity.owner())
        .await?
        .ok_or_else(address_not_found)?;
    let address = state
        .store()
        .get_address(id)
        .await?
        .ok_or_else(address_not_found)?;
    if address.cart_id != Some(active.id) {
        return Err(address_not_found());
    }
    Ok(address.id)
}

/// Detach an address from its cart, keeping the record.
#[instrument(skip(state, identity), fields(customer_id = tracing::field::Empty))]
pub async fn detach(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<String>,
) -> Result<Json<ResponseEnvelope>> {
    let id = owned_address(&state, &identity, &id).await?;
    state.addresses().detach(id).await?;
    Ok(Json(ResponseEnvelope::ok("Address successfully detached.")))
}

/// Delete an address permanently.
#[instrument(skip(state, identity), fields(customer_id = tracing::field::Empty))]
pub async fn delete(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<String>,
) -> Result<Json<ResponseEnvelope>> {
    let id = owned_address(&state, &identity, &id).await?;
    state.addresses().delete(id).await?;
    Ok(Json(ResponseEnvelope::ok("Address successfully deleted.")))
}
