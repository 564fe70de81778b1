//! Inventory sync against the fulfillment vendor's stock feed.
//!
//! A product with variants syncs each variant; a product without syncs
//! itself. A line found in the feed stores its quantity and is marked synced.
//! A line that is missing (or has no SKU) is marked unsynced and keeps the
//! quantity it had.

use tracing::{info, instrument, warn};

use storehouse_core::ProductId;

use crate::db::Store;
use crate::models::Product;
use crate::shipping::{InventoryFeed, ShippingError, ShippingGateway};

pub struct InventoryService<'a> {
    store: &'a dyn Store,
    gateway: &'a dyn ShippingGateway,
}

impl<'a> InventoryService<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn Store, gateway: &'a dyn ShippingGateway) -> Self {
        Self { store, gateway }
    }

    /// Fetch the feed. Vendor failures other than "disabled" yield an empty
    /// feed, so every line is marked unsynced.
    async fn feed(&self, session_key: &str) -> Result<InventoryFeed, ShippingError> {
        match self.gateway.inventory(session_key).await {
            Ok(feed) => Ok(feed),
            Err(ShippingError::Disabled) => Err(ShippingError::Disabled),
            Err(e) => {
                warn!(error = %e, "Inventory feed unavailable");
                Ok(InventoryFeed::default())
            }
        }
    }

    async fn sync_line(&self, product: &Product, feed: &InventoryFeed) -> Result<bool, ShippingError> {
        let quantity = product.sku().and_then(|sku| feed.quantity_of(sku));
        self.store
            .record_inventory(product.id, quantity, quantity.is_some())
            .await?;
        Ok(quantity.is_some())
    }

    async fn sync_with(&self, product: &Product, feed: &InventoryFeed) -> Result<u32, ShippingError> {
        let variants = self.store.list_variants(product.id).await?;
        let mut synced = 0;
        if variants.is_empty() {
            if self.sync_line(product, feed).await? {
                synced += 1;
            }
        } else {
            for variant in &variants {
                if self.sync_line(variant, feed).await? {
                    synced += 1;
                }
            }
        }
        Ok(synced)
    }

    /// Sync one product. Returns how many lines were synced; an unknown
    /// product syncs nothing.
    ///
    /// # Errors
    ///
    /// Returns `ShippingError::Disabled` when shipping is off and
    /// `ShippingError::Repository` if the store fails.
    #[instrument(skip(self))]
    pub async fn sync_product(&self, id: ProductId, session_key: &str) -> Result<u32, ShippingError> {
        let Some(product) = self.store.get_product(id).await? else {
            return Ok(0);
        };
        let feed = self.feed(session_key).await?;
        self.sync_with(&product, &feed).await
    }

    /// Sync every top-level product, one after another.
    ///
    /// # Errors
    ///
    /// Same as [`sync_product`](Self::sync_product).
    #[instrument(skip(self))]
    pub async fn sync_all(&self, session_key: &str) -> Result<u32, ShippingError> {
        let feed = self.feed(session_key).await?;
        let mut synced = 0;
        for product in self.store.list_top_level_products().await? {
            synced += self.sync_with(&product, &feed).await?;
        }
        info!(synced, "Inventory sync complete");
        Ok(synced)
    }
}
