//! The cart record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storehouse_core::{CartId, CartItems, CustomerId, StatusId};

/// A cart: one owner's evolving product → quantity selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cart {
    pub id: CartId,
    /// Customer that created the cart (the guest customer for anonymous owners).
    pub author: CustomerId,
    pub status_id: StatusId,
    pub items: CartItems,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
