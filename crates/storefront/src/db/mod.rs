//! Persistence for the storefront.
//!
//! # Tables
//!
//! - `customer` - Customers, including the guest customer that authors anonymous carts
//! - `status` - Cart/order statuses, created on demand by name
//! - `product` - Catalog products and their variants
//! - `cart` / `cart_item` - Carts and their product → quantity mapping
//! - `customer_order` / `order_item` - Orders and a copy of their items
//! - `address` - Postal addresses attached to carts
//! - `tower_sessions.session` - Session storage
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p storehouse-cli -- migrate
//! ```
//!
//! Every operation goes through the [`Store`] trait. [`PgStore`] is the
//! production implementation; [`MemoryStore`] backs tests and local runs.

pub mod memory;
pub mod postgres;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use storehouse_core::{
    AddressFields, AddressId, CartId, CartItems, CustomerId, Email, OrderId, ProductId, Status,
    StatusId, StatusRef,
};

use crate::models::{Address, AddressKind, Cart, Customer, NewCustomer, NewOrder, NewProduct, Order, Product};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Storage operations used by the storefront services.
///
/// Lookups return `Ok(None)` for missing records; mutations of a missing
/// record return [`RepositoryError::NotFound`].
#[async_trait]
pub trait Store: Send + Sync {
    /// Check that the backing store is reachable.
    async fn ping(&self) -> Result<(), RepositoryError>;

    // -------------------------------------------------------------------------
    // Customers
    // -------------------------------------------------------------------------

    async fn get_customer(&self, id: CustomerId) -> Result<Option<Customer>, RepositoryError>;

    /// Customer and password hash by email.
    async fn get_customer_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<(Customer, Option<String>)>, RepositoryError>;

    /// Create a customer. Duplicate emails are a [`RepositoryError::Conflict`].
    async fn create_customer(&self, customer: &NewCustomer) -> Result<Customer, RepositoryError>;

    /// Set or clear a customer's active cart.
    async fn set_active_cart(
        &self,
        customer: CustomerId,
        cart: Option<CartId>,
    ) -> Result<(), RepositoryError>;

    // -------------------------------------------------------------------------
    // Statuses
    // -------------------------------------------------------------------------

    /// Find a status by id, or by slug of the given name.
    async fn find_status(&self, status: &StatusRef) -> Result<Option<Status>, RepositoryError>;

    /// Create a status. An existing slug returns the existing status.
    async fn create_status(&self, name: &str) -> Result<Status, RepositoryError>;

    // -------------------------------------------------------------------------
    // Products
    // -------------------------------------------------------------------------

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;

    /// Products without a parent, ordered by id.
    async fn list_top_level_products(&self) -> Result<Vec<Product>, RepositoryError>;

    /// Variants of a product, ordered by id.
    async fn list_variants(&self, parent: ProductId) -> Result<Vec<Product>, RepositoryError>;

    async fn create_product(&self, product: &NewProduct) -> Result<Product, RepositoryError>;

    /// Record an inventory sync result. `quantity: None` keeps the stored level.
    async fn record_inventory(
        &self,
        id: ProductId,
        quantity: Option<i32>,
        synced: bool,
    ) -> Result<(), RepositoryError>;

    // -------------------------------------------------------------------------
    // Carts
    // -------------------------------------------------------------------------

    async fn create_cart(&self, author: CustomerId, status: StatusId) -> Result<Cart, RepositoryError>;

    async fn get_cart(&self, id: CartId) -> Result<Option<Cart>, RepositoryError>;

    /// Replace a cart's item mapping and touch its modification time.
    async fn save_cart_items(&self, id: CartId, items: &CartItems) -> Result<(), RepositoryError>;

    async fn set_cart_status(&self, id: CartId, status: StatusId) -> Result<(), RepositoryError>;

    // -------------------------------------------------------------------------
    // Orders
    // -------------------------------------------------------------------------

    async fn create_order(&self, order: &NewOrder) -> Result<Order, RepositoryError>;

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>, RepositoryError>;

    /// The first order (by id) whose `source_cart` is `cart`.
    async fn find_order_by_source_cart(&self, cart: CartId) -> Result<Option<OrderId>, RepositoryError>;

    async fn save_fulfillment_receipt(&self, id: OrderId, receipt: &str) -> Result<(), RepositoryError>;

    // -------------------------------------------------------------------------
    // Addresses
    // -------------------------------------------------------------------------

    /// Insert a new address attached to `cart`. Never upserts.
    async fn insert_address(
        &self,
        cart: CartId,
        fields: &AddressFields,
        is_shipping: bool,
        is_billing: bool,
    ) -> Result<Address, RepositoryError>;

    async fn get_address(&self, id: AddressId) -> Result<Option<Address>, RepositoryError>;

    /// The lowest-id address of `kind` attached to `cart`.
    async fn first_address(
        &self,
        cart: CartId,
        kind: AddressKind,
    ) -> Result<Option<Address>, RepositoryError>;

    /// Clear an address's cart link. Returns false if no such address.
    async fn detach_address(&self, id: AddressId) -> Result<bool, RepositoryError>;

    /// Delete an address. Returns false if no such address.
    async fn delete_address(&self, id: AddressId) -> Result<bool, RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
