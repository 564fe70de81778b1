//! Normalized shipping-quote records.

use serde::{Deserialize, Serialize};

use crate::types::Cents;

/// Delivery window reported by the carrier, passed through as text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryEstimate {
    pub min: String,
    pub max: String,
}

/// One shipping option from a quote, in the order the vendor listed it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingOption {
    /// Carrier/service code.
    pub service: String,
    /// Shipping method code (e.g. `GD`, `2D`, `1D`).
    pub method: String,
    /// Cost as quoted, a decimal dollar string.
    pub cost: String,
    pub delivery: DeliveryEstimate,
}

impl ShippingOption {
    /// Quoted cost in cents, if the vendor's string is numeric.
    #[must_use]
    pub fn cost_cents(&self) -> Option<Cents> {
        Cents::from_dollars_str(&self.cost)
    }
}

/// A line sent to the shipping vendor: SKU and quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipmentLine {
    pub sku: String,
    pub quantity: u32,
}
