//! Inventory sync against the shipping vendor.
//!
//! # Environment Variables
//!
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string
//! - `SHIPWIRE_ENABLED`, `SHIPWIRE_USERNAME`, `SHIPWIRE_PASSWORD` - vendor access

use tracing::info;

use storehouse_core::ProductId;
use storehouse_storefront::config::ShipwireConfig;
use storehouse_storefront::db::PgStore;
use storehouse_storefront::services::InventoryService;
use storehouse_storefront::shipping::ShipwireClient;

use super::connect;

/// Cache key for the vendor feed; one sync run shares one feed.
const SESSION_KEY: &str = "sh-cli";

/// Sync one product, or every top-level product.
///
/// # Errors
///
/// Returns an error if shipping is disabled or misconfigured, or the
/// database fails.
pub async fn sync(product: Option<i32>) -> Result<(), Box<dyn std::error::Error>> {
    let shipwire = ShipwireClient::new(&ShipwireConfig::from_env()?)?;
    let store = PgStore::new(connect().await?);
    let inventory = InventoryService::new(&store, &shipwire);

    let synced = match product {
        Some(id) => inventory.sync_product(ProductId::new(id), SESSION_KEY).await?,
        None => inventory.sync_all(SESSION_KEY).await?,
    };

    info!(synced, "Inventory sync complete");
    Ok(())
}
