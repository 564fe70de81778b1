//! Named views.
//!
//! Callers may ask for a rendered fragment by name, but only names in the
//! [`View`] allow-list exist, and only those enabled in configuration render.
//! Nothing about a caller's name reaches the filesystem.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use askama::Template;
use serde::Serialize;

use storehouse_core::{Cents, ProductId};

use crate::models::{Cart, Product};
use crate::services::CartTotals;

/// The allow-list of renderable views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum View {
    MiniCart,
    CartSummary,
    CheckoutTotals,
}

impl View {
    pub const ALL: [Self; 3] = [Self::MiniCart, Self::CartSummary, Self::CheckoutTotals];

    /// The name callers use for this view.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::MiniCart => "mini-cart",
            Self::CartSummary => "cart-summary",
            Self::CheckoutTotals => "checkout-totals",
        }
    }

    /// Render this view for a cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the template fails to render.
    pub fn render(self, cart: &CartView) -> Result<String, askama::Error> {
        match self {
            Self::MiniCart => MiniCartTemplate { cart }.render(),
            Self::CartSummary => CartSummaryTemplate { cart }.render(),
            Self::CheckoutTotals => CheckoutTotalsTemplate { cart }.render(),
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A view name outside the allow-list.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown view: {0}")]
pub struct UnknownView(pub String);

impl FromStr for View {
    type Err = UnknownView;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|view| view.name() == s)
            .ok_or_else(|| UnknownView(s.to_string()))
    }
}

// =============================================================================
// View data
// =============================================================================

/// Cart line display data for templates.
#[derive(Debug, Clone)]
pub struct CartItemView {
    pub id: ProductId,
    pub title: String,
    pub sku: String,
    pub quantity: u32,
    pub price: String,
    pub line_price: String,
}

/// Cart display data for templates. Amounts are pre-formatted.
#[derive(Debug, Clone)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub item_count: u32,
    pub subtotal: String,
    pub shipping: Option<String>,
    pub tax: String,
    pub total: String,
}

impl CartView {
    /// An empty cart.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            item_count: 0,
            subtotal: Cents::ZERO.to_string(),
            shipping: None,
            tax: Cents::ZERO.to_string(),
            total: Cents::ZERO.to_string(),
        }
    }

    /// Build from a cart, its products and its totals. Lines whose product
    /// no longer exists are left out.
    #[must_use]
    pub fn new(cart: &Cart, products: &BTreeMap<ProductId, Product>, totals: &CartTotals) -> Self {
        let items = cart
            .items
            .iter()
            .filter_map(|(id, quantity)| {
                let product = products.get(&id)?;
                let price = product.price.unwrap_or(Cents::ZERO);
                Some(CartItemView {
                    id,
                    title: product.title.clone(),
                    sku: product.sku().unwrap_or_default().to_string(),
                    quantity,
                    price: price.to_string(),
                    line_price: price.times(quantity).to_string(),
                })
            })
            .collect();

        Self {
            items,
            item_count: cart.items.total_quantity(),
            subtotal: totals.subtotal.to_string(),
            shipping: totals.shipping.map(|s| s.to_string()),
            tax: format!("${:.2}", totals.tax),
            total: totals.total.unwrap_or(Cents::ZERO).to_string(),
        }
    }
}

/// JSON fallback for the mini cart when its view is disabled.
#[derive(Debug, Clone, Serialize)]
pub struct MiniCartJson {
    /// `null` for a cart with no items.
    pub total: Option<Cents>,
    /// Distinct lines.
    pub count: usize,
    /// Units across all lines.
    pub quantity: u32,
    pub items: BTreeMap<ProductId, MiniCartItem>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MiniCartItem {
    pub name: String,
    pub sku: Option<String>,
    pub qty: u32,
    pub price: Option<Cents>,
}

impl MiniCartJson {
    #[must_use]
    pub fn new(cart: Option<&Cart>, products: &BTreeMap<ProductId, Product>, total: Option<Cents>) -> Self {
        let Some(cart) = cart else {
            return Self {
                total: None,
                count: 0,
                quantity: 0,
                items: BTreeMap::new(),
            };
        };
        let items = cart
            .items
            .iter()
            .map(|(id, qty)| {
                let product = products.get(&id);
                let item = MiniCartItem {
                    name: product.map(|p| p.title.clone()).unwrap_or_default(),
                    sku: product.and_then(Product::sku).map(str::to_string),
                    qty,
                    price: product.and_then(|p| p.price),
                };
                (id, item)
            })
            .collect();

        Self {
            total,
            count: cart.items.line_count(),
            quantity: cart.items.total_quantity(),
            items,
        }
    }
}

// =============================================================================
// Templates
// =============================================================================

#[derive(Template)]
#[template(path = "views/mini-cart.html")]
struct MiniCartTemplate<'a> {
    cart: &'a CartView,
}

#[derive(Template)]
#[template(path = "views/cart-summary.html")]
struct CartSummaryTemplate<'a> {
    cart: &'a CartView,
}

#[derive(Template)]
#[template(path = "views/checkout-totals.html")]
struct CheckoutTotalsTemplate<'a> {
    cart: &'a CartView,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;
    use storehouse_core::{CartId, CartItems, CustomerId, StatusId};

    use super::*;

    fn product(id: i32, title: &str, price: i64) -> Product {
        Product {
            id: ProductId::new(id),
            parent_id: None,
            title: title.to_string(),
            sku: Some(format!("SKU-{id}")),
            price: Some(Cents::new(price)),
            available: true,
            quantity: None,
            shipwire_synced: false,
            options: BTreeMap::new(),
        }
    }

    fn cart() -> (Cart, BTreeMap<ProductId, Product>, CartTotals) {
        let items: CartItems = [(ProductId::new(5), 1), (ProductId::new(7), 3)].into_iter().collect();
        let cart = Cart {
            id: CartId::new(1),
            author: CustomerId::new(1),
            status_id: StatusId::new(1),
            items,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let products = BTreeMap::from([
            (ProductId::new(5), product(5, "Mug", 1000)),
            (ProductId::new(7), product(7, "Sticker <3", 500)),
        ]);
        let totals = CartTotals {
            subtotal: Cents::new(2500),
            shipping: None,
            tax: Decimal::new(200, 2),
            total: Some(Cents::new(2500)),
        };
        (cart, products, totals)
    }

    #[test]
    fn test_allow_list() {
        assert_eq!("mini-cart".parse(), Ok(View::MiniCart));
        assert_eq!("checkout-totals".parse(), Ok(View::CheckoutTotals));
        assert!("../../etc/passwd".parse::<View>().is_err());
        assert!("Mini-Cart".parse::<View>().is_err());
    }

    #[test]
    fn test_cart_view_formats_amounts() {
        let (cart, products, totals) = cart();
        let view = CartView::new(&cart, &products, &totals);
        assert_eq!(view.item_count, 4);
        assert_eq!(view.items[1].line_price, "$15.00");
        assert_eq!(view.total, "$25.00");
        assert_eq!(view.tax, "$2.00");
    }

    #[test]
    fn test_rendered_views_escape_titles() {
        let (cart, products, totals) = cart();
        let view = CartView::new(&cart, &products, &totals);
        for name in View::ALL {
            let html = name.render(&view).unwrap();
            assert!(html.contains("$25.00"), "{name} is missing the total");
        }
        let html = View::MiniCart.render(&view).unwrap();
        assert!(html.contains("Sticker &#60;3") || html.contains("Sticker &lt;3"));
    }

    #[test]
    fn test_mini_cart_json_shape() {
        let (cart, products, totals) = cart();
        let json = serde_json::to_value(MiniCartJson::new(Some(&cart), &products, totals.total)).unwrap();
        assert_eq!(json["count"], 2);
        assert_eq!(json["quantity"], 4);
        assert_eq!(json["items"]["7"]["qty"], 3);
        assert_eq!(json["items"]["7"]["sku"], "SKU-7");

        let empty = serde_json::to_value(MiniCartJson::new(None, &products, None)).unwrap();
        assert!(empty["total"].is_null());
        assert_eq!(empty["count"], 0);
    }
}
