//! Cart/order aggregate service.
//!
//! An [`Owner`] is the caller's identity for cart purposes: a signed-in
//! customer (whose active cart lives on the customer record) or an anonymous
//! caller (whose active cart id lives in the session). Operations that create
//! or drop the active cart update the `Owner` in place; the HTTP layer then
//! writes it back to the session before the response is sent.

use std::collections::BTreeMap;

use thiserror::Error;
use tracing::{debug, instrument, warn};

use storehouse_core::{
    CartId, CartItems, CustomerId, DEFAULT_STATUS, OrderId, ProductId, RemoveQuantity, Status,
    StatusRef,
};

use crate::db::{RepositoryError, Store};
use crate::models::{Cart, Product};
use crate::services::status::StatusService;

/// Errors that can occur during cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// The product (or selected variant) is missing or not available.
    #[error("product not available")]
    NotAvailable,

    /// The requested quantity is negative or too large.
    #[error("invalid quantity: {0}")]
    InvalidQuantity(i64),

    /// The cart could not be resolved.
    #[error("cart not found")]
    CartNotFound,

    /// A status id that does not exist.
    #[error("status not found")]
    StatusNotFound,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Caller identity for cart operations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Owner {
    /// Signed-in customer, if any.
    pub customer: Option<CustomerId>,
    /// Anonymous caller's active cart.
    pub guest_cart: Option<CartId>,
}

impl Owner {
    /// An anonymous owner.
    #[must_use]
    pub const fn guest(cart: Option<CartId>) -> Self {
        Self {
            customer: None,
            guest_cart: cart,
        }
    }

    /// A signed-in owner.
    #[must_use]
    pub const fn customer(id: CustomerId) -> Self {
        Self {
            customer: Some(id),
            guest_cart: None,
        }
    }
}

/// Result of a successful add-to-cart.
#[derive(Debug, Clone)]
pub struct AddedItem {
    pub cart: Cart,
    /// The product actually added (the variant, when options were given).
    pub product: Product,
}

/// Cart/order aggregate operations.
pub struct CartService<'a> {
    store: &'a dyn Store,
    guest: CustomerId,
}

impl<'a> CartService<'a> {
    /// Create a cart service. `guest` authors carts of anonymous owners.
    #[must_use]
    pub const fn new(store: &'a dyn Store, guest: CustomerId) -> Self {
        Self { store, guest }
    }

    /// The owner's active cart, if the stored association still points at a cart.
    ///
    /// Never creates a cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if the store fails.
    pub async fn get_active_cart(&self, owner: &Owner) -> Result<Option<Cart>, CartError> {
        let id = match owner.customer {
            Some(customer) => self
                .store
                .get_customer(customer)
                .await?
                .and_then(|c| c.active_cart_id),
            None => owner.guest_cart,
        };
        match id {
            Some(id) => Ok(self.store.get_cart(id).await?),
            None => Ok(None),
        }
    }

    /// Create a cart for the owner, make it active, and give it the default status.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if the store fails.
    #[instrument(skip(self))]
    pub async fn create_cart(&self, owner: &mut Owner) -> Result<Cart, CartError> {
        let status = StatusService::new(self.store)
            .resolve(&StatusRef::name(DEFAULT_STATUS))
            .await?
            .ok_or(CartError::StatusNotFound)?;

        let author = owner.customer.unwrap_or(self.guest);
        let cart = self.store.create_cart(author, status.id).await?;
        self.associate(owner, Some(cart.id)).await?;

        debug!(cart_id = %cart.id, "Created active cart");
        Ok(cart)
    }

    /// Drop the owner's active-cart association.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if the store fails.
    pub async fn unset_active_cart(&self, owner: &mut Owner) -> Result<(), CartError> {
        self.associate(owner, None).await
    }

    /// Make `cart` the owner's active cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if the store fails.
    pub async fn set_active_cart(&self, owner: &mut Owner, cart: CartId) -> Result<(), CartError> {
        self.associate(owner, Some(cart)).await
    }

    async fn associate(&self, owner: &mut Owner, cart: Option<CartId>) -> Result<(), CartError> {
        if let Some(customer) = owner.customer {
            self.store.set_active_cart(customer, cart).await?;
        }
        owner.guest_cart = if owner.customer.is_some() { None } else { cart };
        Ok(())
    }

    /// An explicit cart, or the owner's active cart.
    ///
    /// An explicit id only resolves when it names the owner's active cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::CartNotFound` for an explicit id the owner does
    /// not hold, and `CartError::Repository` if the store fails.
    pub async fn get_cart(
        &self,
        owner: &Owner,
        cart: Option<CartId>,
    ) -> Result<Option<Cart>, CartError> {
        let active = self.get_active_cart(owner).await?;
        match (cart, active) {
            (None, active) => Ok(active),
            (Some(id), Some(active)) if active.id == id => Ok(Some(active)),
            (Some(id), _) => {
                warn!(cart_id = %id, "Rejected cart the owner does not hold");
                Err(CartError::CartNotFound)
            }
        }
    }

    /// The variant of `base` whose options equal `options`.
    ///
    /// # Errors
    ///
    /// Returns `CartError::NotAvailable` if no variant matches.
    pub async fn select_variant(
        &self,
        base: ProductId,
        options: &BTreeMap<String, String>,
    ) -> Result<Product, CartError> {
        self.store
            .list_variants(base)
            .await?
            .into_iter()
            .find(|variant| variant.matches_options(options))
            .ok_or(CartError::NotAvailable)
    }

    /// Add a product to a cart.
    ///
    /// A missing or zero quantity adds one unit. When `options` are given the
    /// matching variant is added instead of `product`. Without an explicit
    /// cart the owner's active cart is used, created if needed.
    ///
    /// # Errors
    ///
    /// Returns `CartError::InvalidQuantity` for a negative quantity,
    /// `CartError::NotAvailable` if the product cannot be bought, and
    /// `CartError::CartNotFound` if an explicit cart is not the owner's. The item
    /// mapping is untouched in every error case.
    #[instrument(skip(self, options))]
    pub async fn add_item(
        &self,
        owner: &mut Owner,
        cart: Option<CartId>,
        product: ProductId,
        quantity: Option<i64>,
        options: &BTreeMap<String, String>,
    ) -> Result<AddedItem, CartError> {
        let quantity = match quantity {
            None | Some(0) => 1,
            Some(n) => u32::try_from(n).map_err(|_| CartError::InvalidQuantity(n))?,
        };

        let product = if options.is_empty() {
            self.store
                .get_product(product)
                .await?
                .ok_or(CartError::NotAvailable)?
        } else {
            self.select_variant(product, options).await?
        };
        if !product.available {
            return Err(CartError::NotAvailable);
        }

        let mut cart = match cart {
            Some(id) => self
                .get_cart(owner, Some(id))
                .await?
                .ok_or(CartError::CartNotFound)?,
            None => match self.get_active_cart(owner).await? {
                Some(active) => active,
                None => self.create_cart(owner).await?,
            },
        };

        cart.items.add(product.id, quantity);
        self.store.save_cart_items(cart.id, &cart.items).await?;

        debug!(cart_id = %cart.id, product_id = %product.id, quantity, "Added to cart");
        Ok(AddedItem { cart, product })
    }

    /// Remove units of a product. Returns `false` if there is no cart or the
    /// product is not in it.
    ///
    /// # Errors
    ///
    /// Returns `CartError::CartNotFound` for an explicit cart the owner does
    /// not hold, and `CartError::Repository` if the store fails.
    #[instrument(skip(self))]
    pub async fn remove_item(
        &self,
        owner: &Owner,
        cart: Option<CartId>,
        product: ProductId,
        quantity: RemoveQuantity,
    ) -> Result<bool, CartError> {
        let Some(mut cart) = self.get_cart(owner, cart).await? else {
            return Ok(false);
        };
        if !cart.items.remove(product, quantity) {
            return Ok(false);
        }
        self.store.save_cart_items(cart.id, &cart.items).await?;
        Ok(true)
    }

    /// Remove every line. Returns `false` if there was nothing to remove.
    ///
    /// # Errors
    ///
    /// Returns `CartError::CartNotFound` for an explicit cart the owner does
    /// not hold, and `CartError::Repository` if the store fails.
    pub async fn empty_cart(&self, owner: &Owner, cart: Option<CartId>) -> Result<bool, CartError> {
        let Some(mut cart) = self.get_cart(owner, cart).await? else {
            return Ok(false);
        };
        if !cart.items.clear() {
            return Ok(false);
        }
        self.store.save_cart_items(cart.id, &cart.items).await?;
        Ok(true)
    }

    /// Set a cart's status, creating a named status on first use.
    ///
    /// # Errors
    ///
    /// Returns `CartError::CartNotFound` if the cart cannot be resolved and
    /// `CartError::StatusNotFound` for an unknown status id.
    #[instrument(skip(self))]
    pub async fn set_status(
        &self,
        owner: &Owner,
        cart: Option<CartId>,
        status: &StatusRef,
    ) -> Result<Status, CartError> {
        let cart = self
            .get_cart(owner, cart)
            .await?
            .ok_or(CartError::CartNotFound)?;
        let status = StatusService::new(self.store)
            .resolve(status)
            .await?
            .ok_or(CartError::StatusNotFound)?;
        self.store.set_cart_status(cart.id, status.id).await?;
        Ok(status)
    }

    /// The order created from this cart, if any.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if the store fails.
    pub async fn cart_to_order(&self, cart: CartId) -> Result<Option<OrderId>, CartError> {
        Ok(self.store.find_order_by_source_cart(cart).await?)
    }

    /// Total units in a cart; 0 when there is no cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if the store fails.
    pub async fn item_count(&self, owner: &Owner, cart: Option<CartId>) -> Result<u32, CartError> {
        Ok(self
            .get_cart(owner, cart)
            .await?
            .map_or(0, |c| c.items.total_quantity()))
    }

    /// Items of the resolved cart, or an empty mapping.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if the store fails.
    pub async fn items(&self, owner: &Owner, cart: Option<CartId>) -> Result<CartItems, CartError> {
        Ok(self
            .get_cart(owner, cart)
            .await?
            .map(|c| c.items)
            .unwrap_or_default())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use storehouse_core::{Cents, Email, StatusId};

    use super::*;
    use crate::db::MemoryStore;
    use crate::models::{NewCustomer, NewProduct};

    const GUEST: CustomerId = CustomerId::new(1);

    async fn product(store: &MemoryStore, title: &str, available: bool) -> Product {
        store
            .create_product(&NewProduct {
                title: title.to_string(),
                price: Some(Cents::new(1000)),
                available,
                ..NewProduct::default()
            })
            .await
            .unwrap()
    }

    fn no_options() -> BTreeMap<String, String> {
        BTreeMap::new()
    }

    #[tokio::test]
    async fn test_first_add_creates_active_cart() {
        let store = MemoryStore::new();
        let carts = CartService::new(&store, GUEST);
        let mug = product(&store, "Mug", true).await;
        let mut owner = Owner::default();

        let added = carts
            .add_item(&mut owner, None, mug.id, Some(2), &no_options())
            .await
            .unwrap();

        assert_eq!(owner.guest_cart, Some(added.cart.id));
        assert_eq!(added.cart.author, GUEST);
        assert_eq!(added.cart.items.quantity(mug.id), 2);
        assert_eq!(added.cart.items.line_count(), 1);

        let stored = store.get_cart(added.cart.id).await.unwrap().unwrap();
        assert_eq!(stored.items, added.cart.items);
        let active = store.find_status(&StatusRef::name("active")).await.unwrap().unwrap();
        assert_eq!(stored.status_id, active.id);
    }

    #[tokio::test]
    async fn test_unavailable_product_leaves_cart_untouched() {
        let store = MemoryStore::new();
        let carts = CartService::new(&store, GUEST);
        let mug = product(&store, "Mug", true).await;
        let gone = product(&store, "Retired", false).await;
        let mut owner = Owner::default();
        carts.add_item(&mut owner, None, mug.id, None, &no_options()).await.unwrap();

        let result = carts.add_item(&mut owner, None, gone.id, Some(1), &no_options()).await;
        assert!(matches!(result, Err(CartError::NotAvailable)));

        let items = carts.items(&owner, None).await.unwrap();
        assert_eq!(items.line_count(), 1);
        assert!(!items.contains(gone.id));
    }

    #[tokio::test]
    async fn test_missing_product_is_not_available() {
        let store = MemoryStore::new();
        let carts = CartService::new(&store, GUEST);
        let mut owner = Owner::default();
        let result = carts
            .add_item(&mut owner, None, ProductId::new(4242), None, &no_options())
            .await;
        assert!(matches!(result, Err(CartError::NotAvailable)));
        assert_eq!(owner.guest_cart, None);
    }

    #[tokio::test]
    async fn test_negative_quantity_is_rejected() {
        let store = MemoryStore::new();
        let carts = CartService::new(&store, GUEST);
        let mug = product(&store, "Mug", true).await;
        let mut owner = Owner::default();
        let result = carts.add_item(&mut owner, None, mug.id, Some(-3), &no_options()).await;
        assert!(matches!(result, Err(CartError::InvalidQuantity(-3))));
    }

    #[tokio::test]
    async fn test_options_select_variant() {
        let store = MemoryStore::new();
        let carts = CartService::new(&store, GUEST);
        let tee = product(&store, "Tee", true).await;
        let medium = store
            .create_product(&NewProduct {
                parent_id: Some(tee.id),
                title: "Tee / M".to_string(),
                available: true,
                options: BTreeMap::from([("size".to_string(), "M".to_string())]),
                ..NewProduct::default()
            })
            .await
            .unwrap();
        let mut owner = Owner::default();

        let options = BTreeMap::from([("size".to_string(), "M".to_string())]);
        let added = carts.add_item(&mut owner, None, tee.id, None, &options).await.unwrap();
        assert_eq!(added.product.id, medium.id);
        assert!(added.cart.items.contains(medium.id));
        assert!(!added.cart.items.contains(tee.id));

        let options = BTreeMap::from([("size".to_string(), "XXL".to_string())]);
        let result = carts.add_item(&mut owner, None, tee.id, None, &options).await;
        assert!(matches!(result, Err(CartError::NotAvailable)));
    }

    #[tokio::test]
    async fn test_remove_all_and_partial() {
        let store = MemoryStore::new();
        let carts = CartService::new(&store, GUEST);
        let mug = product(&store, "Mug", true).await;
        let tee = product(&store, "Tee", true).await;
        let mut owner = Owner::default();
        carts.add_item(&mut owner, None, mug.id, Some(5), &no_options()).await.unwrap();
        carts.add_item(&mut owner, None, tee.id, Some(3), &no_options()).await.unwrap();

        assert!(carts.remove_item(&owner, None, tee.id, RemoveQuantity::Count(2)).await.unwrap());
        assert!(carts.remove_item(&owner, None, mug.id, RemoveQuantity::All).await.unwrap());

        let items = carts.items(&owner, None).await.unwrap();
        assert!(!items.contains(mug.id));
        assert_eq!(items.quantity(tee.id), 1);

        assert!(!carts.remove_item(&owner, None, mug.id, RemoveQuantity::All).await.unwrap());
    }

    #[tokio::test]
    async fn test_empty_cart_signals_noop() {
        let store = MemoryStore::new();
        let carts = CartService::new(&store, GUEST);
        let mug = product(&store, "Mug", true).await;
        let mut owner = Owner::default();

        assert!(!carts.empty_cart(&owner, None).await.unwrap());
        carts.add_item(&mut owner, None, mug.id, Some(1), &no_options()).await.unwrap();
        assert!(carts.empty_cart(&owner, None).await.unwrap());
        assert!(!carts.empty_cart(&owner, None).await.unwrap());
        assert_eq!(carts.item_count(&owner, None).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_get_active_cart_is_stable() {
        let store = MemoryStore::new();
        let carts = CartService::new(&store, GUEST);
        let mut owner = Owner::default();
        let created = carts.create_cart(&mut owner).await.unwrap();

        let first = carts.get_active_cart(&owner).await.unwrap().unwrap();
        let second = carts.get_active_cart(&owner).await.unwrap().unwrap();
        assert_eq!(first.id, created.id);
        assert_eq!(first.id, second.id);
    }

    #[tokio::test]
    async fn test_stale_association_resolves_to_none() {
        let store = MemoryStore::new();
        let carts = CartService::new(&store, GUEST);
        let owner = Owner::guest(Some(CartId::new(9999)));
        assert!(carts.get_active_cart(&owner).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_customer_association_lives_on_customer() {
        let store = MemoryStore::new();
        let carts = CartService::new(&store, GUEST);
        let customer = store
            .create_customer(&NewCustomer {
                email: Email::parse("a@b.test").unwrap(),
                password_hash: None,
                first_name: String::new(),
                last_name: String::new(),
            })
            .await
            .unwrap();
        let mut owner = Owner::customer(customer.id);

        let cart = carts.create_cart(&mut owner).await.unwrap();
        assert_eq!(cart.author, customer.id);
        assert_eq!(owner.guest_cart, None);
        let stored = store.get_customer(customer.id).await.unwrap().unwrap();
        assert_eq!(stored.active_cart_id, Some(cart.id));

        carts.unset_active_cart(&mut owner).await.unwrap();
        assert!(carts.get_active_cart(&owner).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_set_status_by_name_and_id() {
        let store = MemoryStore::new();
        let carts = CartService::new(&store, GUEST);
        let mut owner = Owner::default();
        let cart = carts.create_cart(&mut owner).await.unwrap();

        let shipped = carts.set_status(&owner, None, &StatusRef::name("Shipped")).await.unwrap();
        assert_eq!(store.get_cart(cart.id).await.unwrap().unwrap().status_id, shipped.id);

        let again = carts.set_status(&owner, None, &StatusRef::ById(shipped.id)).await.unwrap();
        assert_eq!(again.id, shipped.id);

        let unknown = carts.set_status(&owner, None, &StatusRef::ById(StatusId::new(777))).await;
        assert!(matches!(unknown, Err(CartError::StatusNotFound)));

        let missing = carts
            .set_status(&Owner::default(), None, &StatusRef::name("Shipped"))
            .await;
        assert!(matches!(missing, Err(CartError::CartNotFound)));
    }

    #[tokio::test]
    async fn test_explicit_cart_must_be_the_owners() {
        let store = MemoryStore::new();
        let carts = CartService::new(&store, GUEST);
        let mug = product(&store, "Mug", true).await;
        let mut shopper = Owner::default();
        let added = carts.add_item(&mut shopper, None, mug.id, Some(3), &no_options()).await.unwrap();
        let target = Some(added.cart.id);

        let mut stranger = Owner::default();
        assert!(matches!(
            carts.add_item(&mut stranger, target, mug.id, Some(1), &no_options()).await,
            Err(CartError::CartNotFound)
        ));
        assert!(matches!(
            carts.remove_item(&stranger, target, mug.id, RemoveQuantity::All).await,
            Err(CartError::CartNotFound)
        ));
        assert!(matches!(carts.empty_cart(&stranger, target).await, Err(CartError::CartNotFound)));
        assert!(matches!(
            carts.set_status(&stranger, target, &StatusRef::name("Shipped")).await,
            Err(CartError::CartNotFound)
        ));

        let cart = store.get_cart(added.cart.id).await.unwrap().unwrap();
        assert_eq!(cart.items.quantity(mug.id), 3);
        assert_eq!(cart.status_id, added.cart.status_id);
        assert!(carts.empty_cart(&shopper, target).await.unwrap());
    }
}
