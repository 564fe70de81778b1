//! `PostgreSQL` implementation of [`Store`].
//!
//! Queries are runtime-checked (`sqlx::query_as::<_, Row>`) so the crate
//! builds without a live database.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;

use storehouse_core::{
    AddressFields, AddressId, CartId, CartItems, Cents, CustomerId, Email, OrderId, ProductId,
    Status, StatusId, StatusRef, slugify,
};

use super::{RepositoryError, Store};
use crate::models::{
    Address, AddressKind, Cart, Customer, NewCustomer, NewOrder, NewProduct, Order, Product,
};

/// Store backed by the `storefront` schema.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Create a new store over a connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn load_cart_items(&self, cart: CartId) -> Result<CartItems, RepositoryError> {
        let rows = sqlx::query_as::<_, ItemRow>(
            r"
            SELECT product_id, quantity
            FROM storefront.cart_item
            WHERE cart_id = $1
            ",
        )
        .bind(cart.as_i32())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| (ProductId::new(r.product_id), r.quantity))
            .collect())
    }

    async fn load_order_items(&self, order: OrderId) -> Result<CartItems, RepositoryError> {
        let rows = sqlx::query_as::<_, ItemRow>(
            r"
            SELECT product_id, quantity
            FROM storefront.order_item
            WHERE order_id = $1
            ",
        )
        .bind(order.as_i32())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| (ProductId::new(r.product_id), r.quantity))
            .collect())
    }
}

// =============================================================================
// Rows
// =============================================================================

#[derive(sqlx::FromRow)]
struct CustomerRow {
    id: i32,
    email: String,
    password_hash: Option<String>,
    first_name: String,
    last_name: String,
    active_cart_id: Option<i32>,
    created_at: DateTime<Utc>,
}

impl CustomerRow {
    fn into_customer(self) -> Result<(Customer, Option<String>), RepositoryError> {
        let email = Email::parse(&self.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        Ok((
            Customer {
                id: CustomerId::new(self.id),
                email,
                first_name: self.first_name,
                last_name: self.last_name,
                active_cart_id: self.active_cart_id.map(CartId::new),
                created_at: self.created_at,
            },
            self.password_hash,
        ))
    }
}

#[derive(sqlx::FromRow)]
struct StatusRow {
    id: i32,
    name: String,
    slug: String,
}

impl From<StatusRow> for Status {
    fn from(row: StatusRow) -> Self {
        Self {
            id: StatusId::new(row.id),
            name: row.name,
            slug: row.slug,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: i32,
    parent_id: Option<i32>,
    title: String,
    sku: Option<String>,
    price_cents: Option<i64>,
    available: bool,
    quantity: Option<i32>,
    shipwire_synced: bool,
    options: Json<BTreeMap<String, String>>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: ProductId::new(row.id),
            parent_id: row.parent_id.map(ProductId::new),
            title: row.title,
            sku: row.sku,
            price: row.price_cents.map(Cents::new),
            available: row.available,
            quantity: row.quantity,
            shipwire_synced: row.shipwire_synced,
            options: row.options.0,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CartRow {
    id: i32,
    author_id: i32,
    status_id: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct ItemRow {
    product_id: i32,
    quantity: i32,
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: i32,
    source_cart: i32,
    customer_id: i32,
    status_id: i32,
    shipping_method: String,
    total_cents: i64,
    charge_id: Option<String>,
    fulfillment_receipt: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct AddressRow {
    id: i32,
    cart_id: Option<i32>,
    line_1: String,
    line_2: String,
    city: String,
    state: String,
    zip: String,
    country: String,
    is_shipping: bool,
    is_billing: bool,
    created_at: DateTime<Utc>,
}

impl From<AddressRow> for Address {
    fn from(row: AddressRow) -> Self {
        Self {
            id: AddressId::new(row.id),
            cart_id: row.cart_id.map(CartId::new),
            fields: AddressFields {
                line_1: row.line_1,
                line_2: row.line_2,
                city: row.city,
                state: row.state,
                zip: row.zip,
                country: row.country,
            },
            is_shipping: row.is_shipping,
            is_billing: row.is_billing,
            created_at: row.created_at,
        }
    }
}

const CUSTOMER_COLUMNS: &str =
    "id, email, password_hash, first_name, last_name, active_cart_id, created_at";
const PRODUCT_COLUMNS: &str =
    "id, parent_id, title, sku, price_cents, available, quantity, shipwire_synced, options";
const ADDRESS_COLUMNS: &str = "id, cart_id, line_1, line_2, city, state, zip, country, is_shipping, is_billing, created_at";

fn map_unique_violation(e: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(format!("{what} already exists"));
    }
    RepositoryError::Database(e)
}

fn not_found_unless_affected(rows_affected: u64) -> Result<(), RepositoryError> {
    if rows_affected == 0 {
        Err(RepositoryError::NotFound)
    } else {
        Ok(())
    }
}

// =============================================================================
// Store
// =============================================================================

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }

    async fn get_customer(&self, id: CustomerId) -> Result<Option<Customer>, RepositoryError> {
        let row = sqlx::query_as::<_, CustomerRow>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM storefront.customer WHERE id = $1"
        ))
        .bind(id.as_i32())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_customer().map(|(c, _)| c)).transpose()
    }

    async fn get_customer_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<(Customer, Option<String>)>, RepositoryError> {
        let row = sqlx::query_as::<_, CustomerRow>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM storefront.customer WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(CustomerRow::into_customer).transpose()
    }

    async fn create_customer(&self, customer: &NewCustomer) -> Result<Customer, RepositoryError> {
        let row = sqlx::query_as::<_, CustomerRow>(&format!(
            r"
            INSERT INTO storefront.customer (email, password_hash, first_name, last_name)
            VALUES ($1, $2, $3, $4)
            RETURNING {CUSTOMER_COLUMNS}
            "
        ))
        .bind(customer.email.as_str())
        .bind(customer.password_hash.as_deref())
        .bind(&customer.first_name)
        .bind(&customer.last_name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "email"))?;

        row.into_customer().map(|(c, _)| c)
    }

    async fn set_active_cart(
        &self,
        customer: CustomerId,
        cart: Option<CartId>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE storefront.customer
            SET active_cart_id = $2, updated_at = now()
            WHERE id = $1
            ",
        )
        .bind(customer.as_i32())
        .bind(cart.map(|c| c.as_i32()))
        .execute(&self.pool)
        .await?;

        not_found_unless_affected(result.rows_affected())
    }

    async fn find_status(&self, status: &StatusRef) -> Result<Option<Status>, RepositoryError> {
        let row = match status {
            StatusRef::ById(id) => {
                sqlx::query_as::<_, StatusRow>(
                    "SELECT id, name, slug FROM storefront.status WHERE id = $1",
                )
                .bind(id.as_i32())
                .fetch_optional(&self.pool)
                .await?
            }
            StatusRef::ByName(name) => {
                sqlx::query_as::<_, StatusRow>(
                    "SELECT id, name, slug FROM storefront.status WHERE slug = $1",
                )
                .bind(slugify(name))
                .fetch_optional(&self.pool)
                .await?
            }
        };

        Ok(row.map(Status::from))
    }

    async fn create_status(&self, name: &str) -> Result<Status, RepositoryError> {
        let slug = slugify(name);
        if slug.is_empty() {
            return Err(RepositoryError::Conflict("status name has no usable characters".to_owned()));
        }

        // The no-op update makes RETURNING yield the existing row on conflict.
        let row = sqlx::query_as::<_, StatusRow>(
            r"
            INSERT INTO storefront.status (name, slug)
            VALUES ($1, $2)
            ON CONFLICT (slug) DO UPDATE SET slug = EXCLUDED.slug
            RETURNING id, name, slug
            ",
        )
        .bind(name.trim())
        .bind(&slug)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM storefront.product WHERE id = $1"
        ))
        .bind(id.as_i32())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Product::from))
    }

    async fn list_top_level_products(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM storefront.product WHERE parent_id IS NULL ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn list_variants(&self, parent: ProductId) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM storefront.product WHERE parent_id = $1 ORDER BY id"
        ))
        .bind(parent.as_i32())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn create_product(&self, product: &NewProduct) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            INSERT INTO storefront.product (parent_id, title, sku, price_cents, available, options)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(product.parent_id.map(|p| p.as_i32()))
        .bind(&product.title)
        .bind(product.sku.as_deref())
        .bind(product.price.map(Cents::get))
        .bind(product.available)
        .bind(Json(&product.options))
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn record_inventory(
        &self,
        id: ProductId,
        quantity: Option<i32>,
        synced: bool,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE storefront.product
            SET quantity = COALESCE($2, quantity), shipwire_synced = $3
            WHERE id = $1
            ",
        )
        .bind(id.as_i32())
        .bind(quantity)
        .bind(synced)
        .execute(&self.pool)
        .await?;

        not_found_unless_affected(result.rows_affected())
    }

    async fn create_cart(&self, author: CustomerId, status: StatusId) -> Result<Cart, RepositoryError> {
        let row = sqlx::query_as::<_, CartRow>(
            r"
            INSERT INTO storefront.cart (author_id, status_id)
            VALUES ($1, $2)
            RETURNING id, author_id, status_id, created_at, updated_at
            ",
        )
        .bind(author.as_i32())
        .bind(status.as_i32())
        .fetch_one(&self.pool)
        .await?;

        Ok(Cart {
            id: CartId::new(row.id),
            author: CustomerId::new(row.author_id),
            status_id: StatusId::new(row.status_id),
            items: CartItems::new(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }

    async fn get_cart(&self, id: CartId) -> Result<Option<Cart>, RepositoryError> {
        let row = sqlx::query_as::<_, CartRow>(
            r"
            SELECT id, author_id, status_id, created_at, updated_at
            FROM storefront.cart
            WHERE id = $1
            ",
        )
        .bind(id.as_i32())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(Some(Cart {
            id,
            author: CustomerId::new(row.author_id),
            status_id: StatusId::new(row.status_id),
            items: self.load_cart_items(id).await?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }))
    }

    async fn save_cart_items(&self, id: CartId, items: &CartItems) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let touched = sqlx::query("UPDATE storefront.cart SET updated_at = now() WHERE id = $1")
            .bind(id.as_i32())
            .execute(&mut *tx)
            .await?;
        not_found_unless_affected(touched.rows_affected())?;

        sqlx::query("DELETE FROM storefront.cart_item WHERE cart_id = $1")
            .bind(id.as_i32())
            .execute(&mut *tx)
            .await?;

        for (product, quantity) in items.iter() {
            let quantity = i32::try_from(quantity).map_err(|_| {
                RepositoryError::DataCorruption(format!("quantity {quantity} out of range"))
            })?;
            sqlx::query(
                "INSERT INTO storefront.cart_item (cart_id, product_id, quantity) VALUES ($1, $2, $3)",
            )
            .bind(id.as_i32())
            .bind(product.as_i32())
            .bind(quantity)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn set_cart_status(&self, id: CartId, status: StatusId) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE storefront.cart SET status_id = $2, updated_at = now() WHERE id = $1",
        )
        .bind(id.as_i32())
        .bind(status.as_i32())
        .execute(&self.pool)
        .await?;

        not_found_unless_affected(result.rows_affected())
    }

    async fn create_order(&self, order: &NewOrder) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, OrderRow>(
            r"
            INSERT INTO storefront.customer_order
                (source_cart, customer_id, status_id, shipping_method, total_cents, charge_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, source_cart, customer_id, status_id, shipping_method,
                      total_cents, charge_id, fulfillment_receipt, created_at
            ",
        )
        .bind(order.source_cart.as_i32())
        .bind(order.customer_id.as_i32())
        .bind(order.status_id.as_i32())
        .bind(&order.shipping_method)
        .bind(order.total.get())
        .bind(order.charge_id.as_deref())
        .fetch_one(&mut *tx)
        .await?;

        for (product, quantity) in order.items.iter() {
            let quantity = i32::try_from(quantity).map_err(|_| {
                RepositoryError::DataCorruption(format!("quantity {quantity} out of range"))
            })?;
            sqlx::query(
                "INSERT INTO storefront.order_item (order_id, product_id, quantity) VALUES ($1, $2, $3)",
            )
            .bind(row.id)
            .bind(product.as_i32())
            .bind(quantity)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(Order {
            id: OrderId::new(row.id),
            source_cart: CartId::new(row.source_cart),
            customer_id: CustomerId::new(row.customer_id),
            status_id: StatusId::new(row.status_id),
            shipping_method: row.shipping_method,
            total: Cents::new(row.total_cents),
            charge_id: row.charge_id,
            fulfillment_receipt: row.fulfillment_receipt,
            items: order.items.clone(),
            created_at: row.created_at,
        })
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT id, source_cart, customer_id, status_id, shipping_method,
                   total_cents, charge_id, fulfillment_receipt, created_at
            FROM storefront.customer_order
            WHERE id = $1
            ",
        )
        .bind(id.as_i32())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(Some(Order {
            id,
            source_cart: CartId::new(row.source_cart),
            customer_id: CustomerId::new(row.customer_id),
            status_id: StatusId::new(row.status_id),
            shipping_method: row.shipping_method,
            total: Cents::new(row.total_cents),
            charge_id: row.charge_id,
            fulfillment_receipt: row.fulfillment_receipt,
            items: self.load_order_items(id).await?,
            created_at: row.created_at,
        }))
    }

    async fn find_order_by_source_cart(&self, cart: CartId) -> Result<Option<OrderId>, RepositoryError> {
        let id = sqlx::query_scalar::<_, i32>(
            r"
            SELECT id FROM storefront.customer_order
            WHERE source_cart = $1
            ORDER BY id
            LIMIT 1
            ",
        )
        .bind(cart.as_i32())
        .fetch_optional(&self.pool)
        .await?;

        Ok(id.map(OrderId::new))
    }

    async fn save_fulfillment_receipt(&self, id: OrderId, receipt: &str) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE storefront.customer_order
            SET fulfillment_receipt = $2, updated_at = now()
            WHERE id = $1
            ",
        )
        .bind(id.as_i32())
        .bind(receipt)
        .execute(&self.pool)
        .await?;

        not_found_unless_affected(result.rows_affected())
    }

    async fn insert_address(
        &self,
        cart: CartId,
        fields: &AddressFields,
        is_shipping: bool,
        is_billing: bool,
    ) -> Result<Address, RepositoryError> {
        let row = sqlx::query_as::<_, AddressRow>(&format!(
            r"
            INSERT INTO storefront.address
                (cart_id, line_1, line_2, city, state, zip, country, is_shipping, is_billing)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {ADDRESS_COLUMNS}
            "
        ))
        .bind(cart.as_i32())
        .bind(&fields.line_1)
        .bind(&fields.line_2)
        .bind(&fields.city)
        .bind(&fields.state)
        .bind(&fields.zip)
        .bind(&fields.country)
        .bind(is_shipping)
        .bind(is_billing)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn get_address(&self, id: AddressId) -> Result<Option<Address>, RepositoryError> {
        let row = sqlx::query_as::<_, AddressRow>(&format!(
            "SELECT {ADDRESS_COLUMNS} FROM storefront.address WHERE id = $1"
        ))
        .bind(id.as_i32())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Address::from))
    }

    async fn first_address(
        &self,
        cart: CartId,
        kind: AddressKind,
    ) -> Result<Option<Address>, RepositoryError> {
        let flag = match kind {
            AddressKind::Shipping => "is_shipping",
            AddressKind::Billing => "is_billing",
        };
        let row = sqlx::query_as::<_, AddressRow>(&format!(
            r"
            SELECT {ADDRESS_COLUMNS} FROM storefront.address
            WHERE cart_id = $1 AND {flag}
            ORDER BY id
            LIMIT 1
            "
        ))
        .bind(cart.as_i32())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Address::from))
    }

    async fn detach_address(&self, id: AddressId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("UPDATE storefront.address SET cart_id = NULL WHERE id = $1")
            .bind(id.as_i32())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_address(&self, id: AddressId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM storefront.address WHERE id = $1")
            .bind(id.as_i32())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
