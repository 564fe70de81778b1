//! Payment and order handlers.

use axum::{Json, extract::State};
use serde::Deserialize;
use tracing::{info, instrument};

use storehouse_core::{AddressFields, ResponseEnvelope};

use crate::error::{Result, add_breadcrumb};
use crate::middleware::{Identity, Payload};
use crate::services::CheckoutRequest;
use crate::state::AppState;

/// Charge request.
#[derive(Debug, Deserialize)]
pub struct ChargeCartRequest {
    pub token: Option<String>,
}

/// Submit-order request.
#[derive(Debug, Deserialize)]
pub struct SubmitOrderRequest {
    pub shipping_address: Option<AddressFields>,
    pub billing_address: Option<AddressFields>,
    pub shipping_method: Option<String>,
    pub stripe_token: Option<String>,
}

impl From<SubmitOrderRequest> for CheckoutRequest {
    fn from(request: SubmitOrderRequest) -> Self {
        Self {
            shipping_address: request.shipping_address,
            billing_address: request.billing_address,
            shipping_method: request.shipping_method,
            payment_token: request.stripe_token,
        }
    }
}

/// Charge the active cart's total. The vendor's verdict is returned as is.
#[instrument(skip(state, identity, request), fields(customer_id = tracing::field::Empty))]
pub async fn charge(
    State(state): State<AppState>,
    identity: Identity,
    Payload(request): Payload<ChargeCartRequest>,
) -> Result<Json<ResponseEnvelope>> {
    let charge = state
        .checkout()
        .charge_cart(&identity.owner(), request.token.as_deref())
        .await?;
    Ok(Json(charge.into_envelope()))
}

/// Place an order from the active cart: save addresses, charge, create the
/// order and hand it to fulfillment.
#[instrument(skip(state, identity, request), fields(customer_id = tracing::field::Empty))]
pub async fn submit_order(
    State(state): State<AppState>,
    mut identity: Identity,
    Payload(request): Payload<SubmitOrderRequest>,
) -> Result<Json<ResponseEnvelope>> {
    let email = identity.customer().map(|c| c.email.to_string());
    let mut owner = identity.owner();

    let placed = state
        .checkout()
        .submit_order(&mut owner, email.as_deref(), &request.into())
        .await?;
    identity.commit(owner).await?;

    let order_id = placed.order.id.to_string();
    add_breadcrumb("checkout", "order placed", Some(&[("order_id", order_id.as_str())]));
    info!(
        order_id = %placed.order.id,
        fulfilled = placed.fulfillment.is_some(),
        "Order submitted"
    );

    Ok(Json(placed.charge.into_envelope()))
}
