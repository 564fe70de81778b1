//! Status resolution.

use storehouse_core::{Status, StatusRef};

use crate::db::{RepositoryError, Store};

/// Resolves [`StatusRef`]s into stored statuses.
pub struct StatusService<'a> {
    store: &'a dyn Store,
}

impl<'a> StatusService<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// Resolve a status.
    ///
    /// A name without a stored status creates it. An unknown id resolves to
    /// `None`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the store fails.
    pub async fn resolve(&self, status: &StatusRef) -> Result<Option<Status>, RepositoryError> {
        if let Some(found) = self.store.find_status(status).await? {
            return Ok(Some(found));
        }
        match status {
            StatusRef::ById(_) => Ok(None),
            StatusRef::ByName(name) => {
                let created = self.store.create_status(name).await?;
                tracing::info!(status = %created.slug, "Created status");
                Ok(Some(created))
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use storehouse_core::StatusId;

    use super::*;
    use crate::db::MemoryStore;

    #[tokio::test]
    async fn test_name_is_created_once() {
        let store = MemoryStore::new();
        let statuses = StatusService::new(&store);

        let first = statuses.resolve(&StatusRef::name("Awaiting Pickup")).await.unwrap().unwrap();
        let again = statuses.resolve(&StatusRef::name("awaiting pickup")).await.unwrap().unwrap();
        assert_eq!(first.id, again.id);
        assert_eq!(first.slug, "awaiting-pickup");
    }

    #[tokio::test]
    async fn test_unknown_id_is_none() {
        let store = MemoryStore::new();
        let statuses = StatusService::new(&store);
        let missing = statuses.resolve(&StatusRef::ById(StatusId::new(999))).await.unwrap();
        assert!(missing.is_none());
    }
}
