//! In-memory implementation of [`Store`].
//!
//! Mirrors the `PostgreSQL` schema closely enough for tests and local runs:
//! a fresh store holds the guest customer (id 1) and the `active` status, as
//! the initial migration does.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use storehouse_core::{
    AddressFields, AddressId, CartId, CartItems, CustomerId, DEFAULT_STATUS, Email, OrderId,
    ProductId, Status, StatusId, StatusRef, slugify,
};

use super::{RepositoryError, Store};
use crate::models::{
    Address, AddressKind, Cart, Customer, NewCustomer, NewOrder, NewProduct, Order, Product,
};

/// Email of the guest customer seeded into every fresh store.
pub const GUEST_EMAIL: &str = "guest@storehouse.invalid";

#[derive(Default)]
struct Tables {
    customers: BTreeMap<CustomerId, (Customer, Option<String>)>,
    statuses: BTreeMap<StatusId, Status>,
    products: BTreeMap<ProductId, Product>,
    carts: BTreeMap<CartId, Cart>,
    orders: BTreeMap<OrderId, Order>,
    addresses: BTreeMap<AddressId, Address>,
    next_id: i32,
}

impl Tables {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }
}

/// Store held entirely in memory.
#[derive(Clone)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create a store holding only the guest customer and the default status.
    #[must_use]
    pub fn new() -> Self {
        let mut tables = Tables::default();

        let guest_id = CustomerId::new(tables.next_id());
        if let Ok(email) = Email::parse(GUEST_EMAIL) {
            tables.customers.insert(
                guest_id,
                (
                    Customer {
                        id: guest_id,
                        email,
                        first_name: String::new(),
                        last_name: String::new(),
                        active_cart_id: None,
                        created_at: Utc::now(),
                    },
                    None,
                ),
            );
        }

        let status_id = StatusId::new(tables.next_id());
        tables.statuses.insert(
            status_id,
            Status {
                id: status_id,
                name: DEFAULT_STATUS.to_string(),
                slug: DEFAULT_STATUS.to_string(),
            },
        );

        Self {
            tables: Arc::new(RwLock::new(tables)),
        }
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }

    async fn get_customer(&self, id: CustomerId) -> Result<Option<Customer>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.customers.get(&id).map(|(c, _)| c.clone()))
    }

    async fn get_customer_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<(Customer, Option<String>)>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .customers
            .values()
            .find(|(c, _)| c.email == *email)
            .cloned())
    }

    async fn create_customer(&self, customer: &NewCustomer) -> Result<Customer, RepositoryError> {
        let mut tables = self.tables.write().await;
        if tables.customers.values().any(|(c, _)| c.email == customer.email) {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }

        let id = CustomerId::new(tables.next_id());
        let record = Customer {
            id,
            email: customer.email.clone(),
            first_name: customer.first_name.clone(),
            last_name: customer.last_name.clone(),
            active_cart_id: None,
            created_at: Utc::now(),
        };
        tables
            .customers
            .insert(id, (record.clone(), customer.password_hash.clone()));
        Ok(record)
    }

    async fn set_active_cart(
        &self,
        customer: CustomerId,
        cart: Option<CartId>,
    ) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;
        let (record, _) = tables
            .customers
            .get_mut(&customer)
            .ok_or(RepositoryError::NotFound)?;
        record.active_cart_id = cart;
        Ok(())
    }

    async fn find_status(&self, status: &StatusRef) -> Result<Option<Status>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(match status {
            StatusRef::ById(id) => tables.statuses.get(id).cloned(),
            StatusRef::ByName(name) => {
                let slug = slugify(name);
                tables.statuses.values().find(|s| s.slug == slug).cloned()
            }
        })
    }

    async fn create_status(&self, name: &str) -> Result<Status, RepositoryError> {
        let slug = slugify(name);
        if slug.is_empty() {
            return Err(RepositoryError::Conflict("status name has no usable characters".to_owned()));
        }

        let mut tables = self.tables.write().await;
        if let Some(existing) = tables.statuses.values().find(|s| s.slug == slug) {
            return Ok(existing.clone());
        }

        let id = StatusId::new(tables.next_id());
        let status = Status {
            id,
            name: name.trim().to_string(),
            slug,
        };
        tables.statuses.insert(id, status.clone());
        Ok(status)
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        Ok(self.tables.read().await.products.get(&id).cloned())
    }

    async fn list_top_level_products(&self) -> Result<Vec<Product>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .products
            .values()
            .filter(|p| p.parent_id.is_none())
            .cloned()
            .collect())
    }

    async fn list_variants(&self, parent: ProductId) -> Result<Vec<Product>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .products
            .values()
            .filter(|p| p.parent_id == Some(parent))
            .cloned()
            .collect())
    }

    async fn create_product(&self, product: &NewProduct) -> Result<Product, RepositoryError> {
        let mut tables = self.tables.write().await;
        let id = ProductId::new(tables.next_id());
        let record = Product {
            id,
            parent_id: product.parent_id,
            title: product.title.clone(),
            sku: product.sku.clone(),
            price: product.price,
            available: product.available,
            quantity: None,
            shipwire_synced: false,
            options: product.options.clone(),
        };
        tables.products.insert(id, record.clone());
        Ok(record)
    }

    async fn record_inventory(
        &self,
        id: ProductId,
        quantity: Option<i32>,
        synced: bool,
    ) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;
        let product = tables.products.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        if quantity.is_some() {
            product.quantity = quantity;
        }
        product.shipwire_synced = synced;
        Ok(())
    }

    async fn create_cart(&self, author: CustomerId, status: StatusId) -> Result<Cart, RepositoryError> {
        let mut tables = self.tables.write().await;
        let id = CartId::new(tables.next_id());
        let now = Utc::now();
        let cart = Cart {
            id,
            author,
            status_id: status,
            items: CartItems::new(),
            created_at: now,
            updated_at: now,
        };
        tables.carts.insert(id, cart.clone());
        Ok(cart)
    }

    async fn get_cart(&self, id: CartId) -> Result<Option<Cart>, RepositoryError> {
        Ok(self.tables.read().await.carts.get(&id).cloned())
    }

    async fn save_cart_items(&self, id: CartId, items: &CartItems) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;
        let cart = tables.carts.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        cart.items = items.clone();
        cart.updated_at = Utc::now();
        Ok(())
    }

    async fn set_cart_status(&self, id: CartId, status: StatusId) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;
        let cart = tables.carts.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        cart.status_id = status;
        cart.updated_at = Utc::now();
        Ok(())
    }

    async fn create_order(&self, order: &NewOrder) -> Result<Order, RepositoryError> {
        let mut tables = self.tables.write().await;
        let id = OrderId::new(tables.next_id());
        let record = Order {
            id,
            source_cart: order.source_cart,
            customer_id: order.customer_id,
            status_id: order.status_id,
            shipping_method: order.shipping_method.clone(),
            total: order.total,
            charge_id: order.charge_id.clone(),
            fulfillment_receipt: None,
            items: order.items.clone(),
            created_at: Utc::now(),
        };
        tables.orders.insert(id, record.clone());
        Ok(record)
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        Ok(self.tables.read().await.orders.get(&id).cloned())
    }

    async fn find_order_by_source_cart(&self, cart: CartId) -> Result<Option<OrderId>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .orders
            .values()
            .find(|o| o.source_cart == cart)
            .map(|o| o.id))
    }

    async fn save_fulfillment_receipt(&self, id: OrderId, receipt: &str) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;
        let order = tables.orders.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        order.fulfillment_receipt = Some(receipt.to_string());
        Ok(())
    }

    async fn insert_address(
        &self,
        cart: CartId,
        fields: &AddressFields,
        is_shipping: bool,
        is_billing: bool,
    ) -> Result<Address, RepositoryError> {
        let mut tables = self.tables.write().await;
        if !tables.carts.contains_key(&cart) {
            return Err(RepositoryError::NotFound);
        }
        let id = AddressId::new(tables.next_id());
        let address = Address {
            id,
            cart_id: Some(cart),
            fields: fields.clone(),
            is_shipping,
            is_billing,
            created_at: Utc::now(),
        };
        tables.addresses.insert(id, address.clone());
        Ok(address)
    }

    async fn get_address(&self, id: AddressId) -> Result<Option<Address>, RepositoryError> {
        Ok(self.tables.read().await.addresses.get(&id).cloned())
    }

    async fn first_address(
        &self,
        cart: CartId,
        kind: AddressKind,
    ) -> Result<Option<Address>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .addresses
            .values()
            .find(|a| a.cart_id == Some(cart) && a.is(kind))
            .cloned())
    }

    async fn detach_address(&self, id: AddressId) -> Result<bool, RepositoryError> {
        let mut tables = self.tables.write().await;
        let Some(address) = tables.addresses.get_mut(&id) else {
            return Ok(false);
        };
        address.cart_id = None;
        Ok(true)
    }

    async fn delete_address(&self, id: AddressId) -> Result<bool, RepositoryError> {
        Ok(self.tables.write().await.addresses.remove(&id).is_some())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fresh_store_has_guest_and_active_status() {
        let store = MemoryStore::new();
        let guest = store.get_customer(CustomerId::new(1)).await.unwrap().unwrap();
        assert_eq!(guest.email.as_str(), GUEST_EMAIL);

        let status = store
            .find_status(&StatusRef::name("Active"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(status.slug, "active");
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let store = MemoryStore::new();
        let new = NewCustomer {
            email: Email::parse("a@b.test").unwrap(),
            password_hash: None,
            first_name: String::new(),
            last_name: String::new(),
        };
        store.create_customer(&new).await.unwrap();
        assert!(matches!(
            store.create_customer(&new).await,
            Err(RepositoryError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_create_status_is_idempotent_by_slug() {
        let store = MemoryStore::new();
        let first = store.create_status("On Hold").await.unwrap();
        let second = store.create_status("on hold").await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(first.slug, "on-hold");
    }

    #[tokio::test]
    async fn test_first_address_picks_lowest_id() {
        let store = MemoryStore::new();
        let cart = store.create_cart(CustomerId::new(1), StatusId::new(2)).await.unwrap();
        let a = AddressFields {
            line_1: "1 First St".into(),
            ..AddressFields::default()
        };
        let b = AddressFields {
            line_1: "2 Second St".into(),
            ..AddressFields::default()
        };
        store.insert_address(cart.id, &a, true, false).await.unwrap();
        store.insert_address(cart.id, &b, true, true).await.unwrap();

        let shipping = store.first_address(cart.id, AddressKind::Shipping).await.unwrap().unwrap();
        assert_eq!(shipping.fields, a);
        let billing = store.first_address(cart.id, AddressKind::Billing).await.unwrap().unwrap();
        assert_eq!(billing.fields, b);
    }

    #[tokio::test]
    async fn test_record_inventory_keeps_quantity_on_failure() {
        let store = MemoryStore::new();
        let product = store
            .create_product(&NewProduct {
                title: "Mug".into(),
                sku: Some("MUG-1".into()),
                available: true,
                ..NewProduct::default()
            })
            .await
            .unwrap();
        store.record_inventory(product.id, Some(12), true).await.unwrap();
        store.record_inventory(product.id, None, false).await.unwrap();

        let product = store.get_product(product.id).await.unwrap().unwrap();
        assert_eq!(product.quantity, Some(12));
        assert!(!product.shipwire_synced);
    }
}
