//! Orders produced by checkout.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storehouse_core::{CartId, CartItems, Cents, CustomerId, OrderId, StatusId};

/// A completed checkout.
///
/// `source_cart` is a non-owning back-reference; the cart record survives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub source_cart: CartId,
    pub customer_id: CustomerId,
    pub status_id: StatusId,
    pub shipping_method: String,
    pub total: Cents,
    pub charge_id: Option<String>,
    /// Raw body of the fulfillment vendor's acceptance.
    pub fulfillment_receipt: Option<String>,
    pub items: CartItems,
    pub created_at: DateTime<Utc>,
}

/// Data for creating an order.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub source_cart: CartId,
    pub customer_id: CustomerId,
    pub status_id: StatusId,
    pub shipping_method: String,
    pub total: Cents,
    pub charge_id: Option<String>,
    pub items: CartItems,
}
