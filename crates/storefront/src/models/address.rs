//! Postal addresses attached to carts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storehouse_core::{AddressFields, AddressId, CartId};

/// Which flag an address query filters on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressKind {
    Shipping,
    Billing,
}

/// A saved address.
///
/// `cart_id` is cleared by detaching; the row itself stays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub id: AddressId,
    pub cart_id: Option<CartId>,
    #[serde(flatten)]
    pub fields: AddressFields,
    pub is_shipping: bool,
    pub is_billing: bool,
    pub created_at: DateTime<Utc>,
}

impl Address {
    /// Whether this address carries the given flag.
    #[must_use]
    pub const fn is(&self, kind: AddressKind) -> bool {
        match kind {
            AddressKind::Shipping => self.is_shipping,
            AddressKind::Billing => self.is_billing,
        }
    }
}
