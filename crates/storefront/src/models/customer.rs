//! Customer records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storehouse_core::{CartId, CustomerId, Email};

/// A storefront customer.
///
/// The configured guest customer has no password and authors every cart
/// created for an anonymous owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub email: Email,
    pub first_name: String,
    pub last_name: String,
    /// The customer's current cart, if any.
    pub active_cart_id: Option<CartId>,
    pub created_at: DateTime<Utc>,
}

/// Data for creating a customer.
#[derive(Debug, Clone)]
pub struct NewCustomer {
    pub email: Email,
    pub password_hash: Option<String>,
    pub first_name: String,
    pub last_name: String,
}
