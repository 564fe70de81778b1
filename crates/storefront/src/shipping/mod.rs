//! Shipping/fulfillment vendor integration.
//!
//! The storefront talks to the vendor through [`ShippingGateway`]:
//!
//! - rate quotes for a cart or an order and a destination address
//! - fulfillment order submission
//! - the raw inventory feed used by inventory sync
//!
//! [`ShipwireClient`] implements it over Shipwire's XML services. Every call
//! short-circuits with [`ShippingError::Disabled`] when shipping is turned off.

pub mod shipwire;
pub mod xml;

pub use shipwire::ShipwireClient;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use storehouse_core::{AddressFields, Cents, ShipmentLine, ShippingOption};

/// Country used when an order's stored address has none.
pub const DEFAULT_COUNTRY: &str = "us";

/// Shipping method used when checkout does not choose one.
pub const DEFAULT_METHOD: &str = "GD";

/// Errors that can occur when talking to the shipping vendor.
#[derive(Debug, Error)]
pub enum ShippingError {
    /// Shipping is disabled in configuration.
    #[error("shipping is disabled")]
    Disabled,

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Request could not be built or response could not be parsed.
    #[error("XML error: {0}")]
    Xml(String),

    /// No SKU-bearing lines, or no destination address.
    #[error("nothing to ship")]
    NothingToShip,

    /// The order already holds a fulfillment receipt.
    #[error("order already submitted for fulfillment")]
    AlreadySubmitted,

    /// Loading the cart, order or address failed.
    #[error("database error: {0}")]
    Repository(#[from] crate::db::RepositoryError),
}

/// Destination and lines for a quote or fulfillment request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shipment {
    /// Vendor-side reference, `order-{id}`.
    pub reference: String,
    pub address: AddressFields,
    /// SKU-bearing lines only.
    pub lines: Vec<ShipmentLine>,
}

/// A fulfillment order submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FulfillmentRequest {
    pub shipment: Shipment,
    pub email: String,
    pub method: String,
}

/// A warning attached to a vendor response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VendorWarning {
    pub code: String,
    pub message: String,
}

/// Parsed rate response, keeping the raw body for pass-through.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RateQuote {
    /// Present on a successful response.
    pub status: Option<String>,
    pub error_message: Option<String>,
    /// Options in vendor order.
    pub options: Vec<ShippingOption>,
    pub warnings: Vec<VendorWarning>,
    #[serde(skip)]
    pub body: String,
}

impl RateQuote {
    /// A `Status`-bearing response is a success.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status.is_some()
    }

    /// Cost of the first listed option, in cents.
    #[must_use]
    pub fn first_cost(&self) -> Option<Cents> {
        self.options.first().and_then(ShippingOption::cost_cents)
    }
}

/// Parsed fulfillment response, keeping the raw body as the receipt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FulfillmentReceipt {
    pub status: Option<String>,
    pub transaction_id: Option<String>,
    pub error_message: Option<String>,
    #[serde(skip)]
    pub body: String,
}

impl FulfillmentReceipt {
    #[must_use]
    pub const fn is_accepted(&self) -> bool {
        self.status.is_some()
    }
}

/// One SKU's stock level from the inventory feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InventoryLevel {
    pub sku: String,
    pub quantity: i32,
}

/// Parsed inventory feed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InventoryFeed {
    pub status: Option<String>,
    pub levels: Vec<InventoryLevel>,
}

impl InventoryFeed {
    /// Stock level for a SKU, if the feed lists it.
    #[must_use]
    pub fn quantity_of(&self, sku: &str) -> Option<i32> {
        self.levels.iter().find(|l| l.sku == sku).map(|l| l.quantity)
    }
}

/// Shipping/fulfillment vendor.
#[async_trait]
pub trait ShippingGateway: Send + Sync {
    /// Vendor name used to tag raw responses.
    fn vendor(&self) -> &'static str;

    /// Whether vendor calls are allowed at all.
    fn is_enabled(&self) -> bool;

    /// Request rate quotes for a shipment.
    async fn quote(&self, shipment: &Shipment) -> Result<RateQuote, ShippingError>;

    /// Submit an order for fulfillment.
    async fn submit_order(
        &self,
        request: &FulfillmentRequest,
    ) -> Result<FulfillmentReceipt, ShippingError>;

    /// Fetch the inventory feed. Raw responses may be cached per `session_key`.
    async fn inventory(&self, session_key: &str) -> Result<InventoryFeed, ShippingError>;
}
