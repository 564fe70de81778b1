//! Address store.
//!
//! Saving never upserts: a second shipping address on the same cart is a
//! second row, and lookups pick the lowest id.

use storehouse_core::{AddressFields, AddressId, CartId};

use crate::db::{RepositoryError, Store};
use crate::models::{Address, AddressKind};

pub struct AddressService<'a> {
    store: &'a dyn Store,
}

impl<'a> AddressService<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// Save a new address attached to `cart`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the insert fails.
    pub async fn save(
        &self,
        fields: &AddressFields,
        cart: CartId,
        is_shipping: bool,
        is_billing: bool,
    ) -> Result<Address, RepositoryError> {
        self.store.insert_address(cart, fields, is_shipping, is_billing).await
    }

    /// The cart's current shipping address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the lookup fails.
    pub async fn shipping_address(&self, cart: CartId) -> Result<Option<Address>, RepositoryError> {
        self.store.first_address(cart, AddressKind::Shipping).await
    }

    /// The cart's current billing address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the lookup fails.
    pub async fn billing_address(&self, cart: CartId) -> Result<Option<Address>, RepositoryError> {
        self.store.first_address(cart, AddressKind::Billing).await
    }

    /// Clear an address's cart link, keeping the row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the update fails.
    pub async fn detach(&self, id: AddressId) -> Result<bool, RepositoryError> {
        self.store.detach_address(id).await
    }

    /// Delete an address permanently.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the delete fails.
    pub async fn delete(&self, id: AddressId) -> Result<bool, RepositoryError> {
        self.store.delete_address(id).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use storehouse_core::CustomerId;

    use super::*;
    use crate::db::MemoryStore;
    use crate::services::{CartService, Owner};

    fn fields(line_1: &str) -> AddressFields {
        AddressFields {
            line_1: line_1.to_string(),
            line_2: "Apt 4".to_string(),
            city: "Portland".to_string(),
            state: "OR".to_string(),
            zip: "97201".to_string(),
            country: "us".to_string(),
        }
    }

    async fn cart(store: &MemoryStore) -> CartId {
        let mut owner = Owner::default();
        CartService::new(store, CustomerId::new(1))
            .create_cart(&mut owner)
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_saved_shipping_address_reads_back() {
        let store = MemoryStore::new();
        let addresses = AddressService::new(&store);
        let cart = cart(&store).await;

        addresses.save(&fields("1 Main St"), cart, true, false).await.unwrap();

        let shipping = addresses.shipping_address(cart).await.unwrap().unwrap();
        assert_eq!(shipping.fields, fields("1 Main St"));
        assert!(addresses.billing_address(cart).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_second_save_adds_a_row_and_first_wins() {
        let store = MemoryStore::new();
        let addresses = AddressService::new(&store);
        let cart = cart(&store).await;

        let first = addresses.save(&fields("1 Main St"), cart, true, true).await.unwrap();
        let second = addresses.save(&fields("2 Side St"), cart, true, false).await.unwrap();
        assert_ne!(first.id, second.id);

        let shipping = addresses.shipping_address(cart).await.unwrap().unwrap();
        assert_eq!(shipping.id, first.id);
    }

    #[tokio::test]
    async fn test_detach_keeps_row_delete_removes_it() {
        let store = MemoryStore::new();
        let addresses = AddressService::new(&store);
        let cart = cart(&store).await;
        let saved = addresses.save(&fields("1 Main St"), cart, true, false).await.unwrap();

        assert!(addresses.detach(saved.id).await.unwrap());
        assert!(addresses.shipping_address(cart).await.unwrap().is_none());
        let row = store.get_address(saved.id).await.unwrap().unwrap();
        assert_eq!(row.cart_id, None);

        assert!(addresses.delete(saved.id).await.unwrap());
        assert!(store.get_address(saved.id).await.unwrap().is_none());
        assert!(!addresses.delete(saved.id).await.unwrap());
    }
}
