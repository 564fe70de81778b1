//! Status management.
//!
//! Statuses are normally created on first use by name; this command creates
//! one ahead of time so it can be referenced by id.

use tracing::info;

use storehouse_core::StatusRef;
use storehouse_storefront::db::PgStore;
use storehouse_storefront::services::StatusService;

use super::connect;

/// Create a status by name, or report the existing one.
///
/// # Errors
///
/// Returns an error if the name is blank or the database fails.
pub async fn create(name: &str) -> Result<(), Box<dyn std::error::Error>> {
    let name = name.trim();
    if name.is_empty() {
        return Err("status name must not be empty".into());
    }

    let store = PgStore::new(connect().await?);
    let status = StatusService::new(&store)
        .resolve(&StatusRef::name(name))
        .await?
        .ok_or("status could not be created")?;

    info!(id = %status.id, slug = %status.slug, "Status ready: {}", status.name);
    Ok(())
}
