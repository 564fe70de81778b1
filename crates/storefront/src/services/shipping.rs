//! Rate quotes and fulfillment for carts and orders.

use tracing::{info, instrument, warn};

use storehouse_core::{AddressFields, CartId, CartItems, ShipmentLine};

use crate::db::Store;
use crate::models::{AddressKind, Cart, Order};
use crate::shipping::{
    DEFAULT_COUNTRY, DEFAULT_METHOD, FulfillmentReceipt, FulfillmentRequest, RateQuote,
    ShippingError, ShippingGateway, Shipment, xml,
};

/// Vendor reference for a cart or order id.
fn reference(id: impl std::fmt::Display) -> String {
    format!("order-{id}")
}

pub struct ShippingService<'a> {
    store: &'a dyn Store,
    gateway: &'a dyn ShippingGateway,
}

impl<'a> ShippingService<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn Store, gateway: &'a dyn ShippingGateway) -> Self {
        Self { store, gateway }
    }

    /// SKU-bearing lines of an item mapping. Items without a product or SKU
    /// are skipped.
    ///
    /// # Errors
    ///
    /// Returns `ShippingError::Repository` if a product lookup fails.
    pub async fn shipment_lines(&self, items: &CartItems) -> Result<Vec<ShipmentLine>, ShippingError> {
        let mut lines = Vec::with_capacity(items.line_count());
        for (id, quantity) in items.iter() {
            let Some(product) = self.store.get_product(id).await? else {
                continue;
            };
            if let Some(sku) = product.sku() {
                lines.push(ShipmentLine {
                    sku: sku.to_string(),
                    quantity,
                });
            }
        }
        Ok(lines)
    }

    async fn shipment(
        &self,
        reference: String,
        items: &CartItems,
        address: AddressFields,
    ) -> Result<Shipment, ShippingError> {
        if !self.gateway.is_enabled() {
            return Err(ShippingError::Disabled);
        }
        if !address.is_deliverable() {
            return Err(ShippingError::NothingToShip);
        }
        let lines = self.shipment_lines(items).await?;
        if lines.is_empty() {
            return Err(ShippingError::NothingToShip);
        }
        Ok(Shipment {
            reference,
            address,
            lines,
        })
    }

    /// Quote a cart to an address that is not attached to any order.
    ///
    /// # Errors
    ///
    /// Returns `ShippingError::NothingToShip` when the cart has no shippable
    /// lines or the address is incomplete, and vendor errors otherwise.
    #[instrument(skip(self, cart, address), fields(cart_id = %cart.id))]
    pub async fn quote_for_address(
        &self,
        cart: &Cart,
        address: &AddressFields,
    ) -> Result<RateQuote, ShippingError> {
        let shipment = self
            .shipment(reference(cart.id), &cart.items, address.clone())
            .await?;
        self.gateway.quote(&shipment).await
    }

    /// Quote a cart to its stored shipping address. `None` when the cart has
    /// no shipping address.
    ///
    /// # Errors
    ///
    /// See [`quote_for_address`](Self::quote_for_address).
    pub async fn quote_for_cart(&self, cart: &Cart) -> Result<Option<RateQuote>, ShippingError> {
        let Some(address) = self.shipping_fields(cart.id).await? else {
            return Ok(None);
        };
        self.quote_for_address(cart, &address).await.map(Some)
    }

    /// Quote an existing order to the shipping address of its source cart.
    ///
    /// # Errors
    ///
    /// Returns `ShippingError::NothingToShip` when the order has no shipping
    /// address or no shippable lines.
    #[instrument(skip(self, order), fields(order_id = %order.id))]
    pub async fn quote_for_order(&self, order: &Order) -> Result<RateQuote, ShippingError> {
        let address = self
            .shipping_fields(order.source_cart)
            .await?
            .ok_or(ShippingError::NothingToShip)?;
        let shipment = self
            .shipment(reference(order.id), &order.items, address)
            .await?;
        self.gateway.quote(&shipment).await
    }

    /// Submit an order for fulfillment and store the vendor's acceptance as
    /// the order's receipt.
    ///
    /// # Errors
    ///
    /// Returns `ShippingError::AlreadySubmitted` if the order already holds a
    /// receipt, `ShippingError::NothingToShip` if it cannot be shipped, and
    /// vendor errors otherwise.
    #[instrument(skip(self, order, email), fields(order_id = %order.id))]
    pub async fn submit_order(
        &self,
        order: &Order,
        email: &str,
    ) -> Result<FulfillmentReceipt, ShippingError> {
        if order.fulfillment_receipt.is_some() {
            return Err(ShippingError::AlreadySubmitted);
        }
        let address = self
            .shipping_fields(order.source_cart)
            .await?
            .ok_or(ShippingError::NothingToShip)?;
        let method = if order.shipping_method.trim().is_empty() {
            DEFAULT_METHOD.to_string()
        } else {
            order.shipping_method.clone()
        };
        let request = FulfillmentRequest {
            shipment: self
                .shipment(reference(order.id), &order.items, address)
                .await?,
            email: email.to_string(),
            method,
        };

        let receipt = self.gateway.submit_order(&request).await?;
        if receipt.is_accepted() {
            self.store
                .save_fulfillment_receipt(order.id, &receipt.body)
                .await?;
            info!(transaction_id = ?receipt.transaction_id, "Order accepted for fulfillment");
        } else {
            warn!(error = ?receipt.error_message, "Fulfillment vendor refused order");
        }
        Ok(receipt)
    }

    /// The order's stored fulfillment receipt, parsed.
    ///
    /// # Errors
    ///
    /// Returns `ShippingError::Xml` if the stored body no longer parses.
    pub fn receipt(order: &Order) -> Result<Option<FulfillmentReceipt>, ShippingError> {
        order
            .fulfillment_receipt
            .as_deref()
            .map(xml::parse_fulfillment_response)
            .transpose()
    }

    /// Stored shipping address of a cart, with the default country filled in.
    async fn shipping_fields(&self, cart: CartId) -> Result<Option<AddressFields>, ShippingError> {
        Ok(self
            .store
            .first_address(cart, AddressKind::Shipping)
            .await?
            .map(|address| {
                let mut fields = address.fields;
                if fields.country.trim().is_empty() {
                    fields.country = DEFAULT_COUNTRY.to_string();
                }
                fields
            }))
    }
}
