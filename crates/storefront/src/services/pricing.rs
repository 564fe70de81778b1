//! Cart totals.
//!
//! Prices come from the catalog; a product whose price cannot be found adds
//! nothing. Shipping is the first option the vendor lists for the cart's
//! current shipping address, when one can be quoted.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use storehouse_core::{Cents, ProductId, pricing};

use crate::db::{RepositoryError, Store};
use crate::models::Cart;
use crate::services::shipping::ShippingService;
use crate::shipping::{ShippingError, ShippingGateway};

/// Derived totals for one cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartTotals {
    pub subtotal: Cents,
    /// First quoted option's cost, when a quote was obtainable.
    pub shipping: Option<Cents>,
    /// Displayed only; not added to `total`.
    pub tax: Decimal,
    /// `None` for a cart with no items.
    pub total: Option<Cents>,
}

pub struct PricingService<'a> {
    store: &'a dyn Store,
    shipping: &'a dyn ShippingGateway,
    tax_percent: u32,
}

impl<'a> PricingService<'a> {
    /// Create a pricing service taxing at [`pricing::DEFAULT_TAX_PERCENT`].
    #[must_use]
    pub const fn new(store: &'a dyn Store, shipping: &'a dyn ShippingGateway) -> Self {
        Self {
            store,
            shipping,
            tax_percent: pricing::DEFAULT_TAX_PERCENT,
        }
    }

    #[must_use]
    pub const fn with_tax_percent(mut self, percent: u32) -> Self {
        self.tax_percent = percent;
        self
    }

    /// Unit prices for every product in the cart.
    async fn prices(&self, cart: &Cart) -> Result<HashMap<ProductId, Cents>, RepositoryError> {
        let mut prices = HashMap::with_capacity(cart.items.line_count());
        for (id, _) in cart.items.iter() {
            if let Some(price) = self.store.get_product(id).await?.and_then(|p| p.price) {
                prices.insert(id, price);
            }
        }
        Ok(prices)
    }

    /// Shipping cost for the cart's stored shipping address, if quotable.
    ///
    /// Vendor failures and a disabled gateway both mean "no shipping cost".
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if loading the address or products fails.
    pub async fn shipping_cost(&self, cart: &Cart) -> Result<Option<Cents>, RepositoryError> {
        if !self.shipping.is_enabled() {
            return Ok(None);
        }
        match ShippingService::new(self.store, self.shipping)
            .quote_for_cart(cart)
            .await
        {
            Ok(quote) => Ok(quote.and_then(|q| q.first_cost())),
            Err(ShippingError::Repository(e)) => Err(e),
            Err(e) => {
                debug!(error = %e, "No shipping quote for totals");
                Ok(None)
            }
        }
    }

    /// Subtotal, shipping, tax and total for a cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if a lookup fails.
    pub async fn totals(&self, cart: &Cart) -> Result<CartTotals, RepositoryError> {
        let prices = self.prices(cart).await?;
        let price_of = |id: ProductId| prices.get(&id).copied();

        let subtotal = pricing::subtotal(&cart.items, price_of);
        let shipping = if cart.items.is_empty() {
            None
        } else {
            self.shipping_cost(cart).await?
        };

        Ok(CartTotals {
            subtotal,
            shipping,
            tax: pricing::tax(subtotal, self.tax_percent),
            total: pricing::total(&cart.items, price_of, shipping),
        })
    }

    /// Cart total including shipping; `None` when the cart has no items.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if a lookup fails.
    pub async fn total(&self, cart: &Cart) -> Result<Option<Cents>, RepositoryError> {
        Ok(self.totals(cart).await?.total)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeMap;

    use storehouse_core::{AddressFields, CustomerId};

    use super::*;
    use crate::db::MemoryStore;
    use crate::models::NewProduct;
    use crate::services::{AddressService, CartService, Owner};
    use crate::testing::FakeShipping;

    async fn priced(store: &MemoryStore, price: Option<i64>, sku: Option<&str>) -> ProductId {
        store
            .create_product(&NewProduct {
                title: "Item".to_string(),
                sku: sku.map(str::to_string),
                price: price.map(Cents::new),
                available: true,
                ..NewProduct::default()
            })
            .await
            .unwrap()
            .id
    }

    async fn cart(store: &MemoryStore, lines: &[(ProductId, i64)]) -> Cart {
        let carts = CartService::new(store, CustomerId::new(1));
        let mut owner = Owner::default();
        let mut cart = carts.create_cart(&mut owner).await.unwrap();
        for (id, qty) in lines {
            cart = carts
                .add_item(&mut owner, None, *id, Some(*qty), &BTreeMap::new())
                .await
                .unwrap()
                .cart;
        }
        cart
    }

    #[tokio::test]
    async fn test_total_without_shipping() {
        let store = MemoryStore::new();
        let gateway = FakeShipping::disabled();
        let five = priced(&store, Some(1000), None).await;
        let seven = priced(&store, Some(500), None).await;
        let cart = cart(&store, &[(five, 1), (seven, 3)]).await;

        let totals = PricingService::new(&store, &gateway).totals(&cart).await.unwrap();
        assert_eq!(totals.subtotal, Cents::new(2500));
        assert_eq!(totals.shipping, None);
        assert_eq!(totals.total, Some(Cents::new(2500)));
        assert_eq!(totals.tax, Decimal::new(200, 2));
    }

    #[tokio::test]
    async fn test_missing_price_contributes_nothing() {
        let store = MemoryStore::new();
        let gateway = FakeShipping::disabled();
        let priced_id = priced(&store, Some(1000), None).await;
        let free = priced(&store, None, None).await;
        let cart = cart(&store, &[(priced_id, 2), (free, 4)]).await;

        let total = PricingService::new(&store, &gateway).total(&cart).await.unwrap();
        assert_eq!(total, Some(Cents::new(2000)));
    }

    #[tokio::test]
    async fn test_empty_cart_has_no_total() {
        let store = MemoryStore::new();
        let gateway = FakeShipping::enabled();
        let cart = cart(&store, &[]).await;

        let total = PricingService::new(&store, &gateway).total(&cart).await.unwrap();
        assert_eq!(total, None);
    }

    #[tokio::test]
    async fn test_first_quoted_option_is_added() {
        let store = MemoryStore::new();
        let gateway = FakeShipping::enabled();
        let mug = priced(&store, Some(1000), Some("MUG-1")).await;
        let cart = cart(&store, &[(mug, 1)]).await;
        AddressService::new(&store)
            .save(
                &AddressFields {
                    line_1: "1 Main St".to_string(),
                    city: "Portland".to_string(),
                    zip: "97201".to_string(),
                    ..AddressFields::default()
                },
                cart.id,
                true,
                false,
            )
            .await
            .unwrap();

        let totals = PricingService::new(&store, &gateway).totals(&cart).await.unwrap();
        assert_eq!(totals.shipping, Some(Cents::new(595)));
        assert_eq!(totals.total, Some(Cents::new(1595)));
    }
}
