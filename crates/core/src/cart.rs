//! The cart item mapping and its mutation rules.
//!
//! A cart's contents are a map from product id to a positive quantity.
//! Absence of a key means zero; a quantity is never stored as zero or less,
//! any mutation that would get there removes the key instead.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::ProductId;

/// How much of a line to remove.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveQuantity {
    /// Remove the whole line regardless of quantity.
    All,
    /// Remove this many units (removes the line if it has no more than this).
    Count(u32),
}

impl RemoveQuantity {
    /// Wire value meaning "remove all".
    pub const ALL_SENTINEL: i64 = -1;

    /// Interpret a caller-supplied quantity: `-1` (or absent) is "all",
    /// positive values are a count. Anything else is rejected.
    #[must_use]
    pub fn from_wire(value: Option<i64>) -> Option<Self> {
        match value {
            None | Some(Self::ALL_SENTINEL) => Some(Self::All),
            Some(n) if n >= 1 => Some(Self::Count(u32::try_from(n).unwrap_or(u32::MAX))),
            Some(_) => None,
        }
    }
}

/// Product id → quantity mapping for a cart or order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CartItems(BTreeMap<ProductId, u32>);

impl CartItems {
    /// An empty mapping.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Add `quantity` units of a product, inserting the line if needed.
    /// Adding zero units is a no-op.
    pub fn add(&mut self, product: ProductId, quantity: u32) {
        if quantity == 0 {
            return;
        }
        let line = self.0.entry(product).or_insert(0);
        *line = line.saturating_add(quantity);
    }

    /// Remove units of a product.
    ///
    /// Returns `false` (and changes nothing) if the product is not in the cart.
    pub fn remove(&mut self, product: ProductId, quantity: RemoveQuantity) -> bool {
        let Some(current) = self.0.get_mut(&product) else {
            return false;
        };
        match quantity {
            RemoveQuantity::Count(n) if n < *current => *current -= n,
            _ => {
                self.0.remove(&product);
            }
        }
        true
    }

    /// Remove every line. Returns `false` if there was nothing to remove.
    pub fn clear(&mut self) -> bool {
        if self.0.is_empty() {
            return false;
        }
        self.0.clear();
        true
    }

    /// Quantity of a product (zero if absent).
    #[must_use]
    pub fn quantity(&self, product: ProductId) -> u32 {
        self.0.get(&product).copied().unwrap_or(0)
    }

    /// Whether the product has a line.
    #[must_use]
    pub fn contains(&self, product: ProductId) -> bool {
        self.0.contains_key(&product)
    }

    /// Sum of all quantities.
    #[must_use]
    pub fn total_quantity(&self) -> u32 {
        self.0.values().fold(0, |acc, q| acc.saturating_add(*q))
    }

    /// Number of distinct products.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Lines in product id order.
    pub fn iter(&self) -> impl Iterator<Item = (ProductId, u32)> + '_ {
        self.0.iter().map(|(id, qty)| (*id, *qty))
    }
}

/// Builds a mapping from stored rows; non-positive quantities are dropped so
/// the invariant holds whatever the source.
impl FromIterator<(ProductId, i32)> for CartItems {
    fn from_iter<T: IntoIterator<Item = (ProductId, i32)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .filter_map(|(id, qty)| u32::try_from(qty).ok().filter(|q| *q > 0).map(|q| (id, q)))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(lines: &[(i32, u32)]) -> CartItems {
        let mut items = CartItems::new();
        for (id, qty) in lines {
            items.add(ProductId::new(*id), *qty);
        }
        items
    }

    #[test]
    fn test_add_inserts_then_increments() {
        let mut cart = CartItems::new();
        cart.add(ProductId::new(42), 2);
        assert_eq!(cart.quantity(ProductId::new(42)), 2);
        cart.add(ProductId::new(42), 3);
        assert_eq!(cart.quantity(ProductId::new(42)), 5);
        assert_eq!(cart.line_count(), 1);
    }

    #[test]
    fn test_add_zero_is_noop() {
        let mut cart = CartItems::new();
        cart.add(ProductId::new(1), 0);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_remove_all_ignores_quantity() {
        for qty in [1, 2, 99] {
            let mut cart = items(&[(5, qty), (7, 1)]);
            assert!(cart.remove(ProductId::new(5), RemoveQuantity::All));
            assert!(!cart.contains(ProductId::new(5)));
            assert!(cart.contains(ProductId::new(7)));
        }
    }

    #[test]
    fn test_remove_fewer_decrements_exactly() {
        let mut cart = items(&[(5, 10)]);
        assert!(cart.remove(ProductId::new(5), RemoveQuantity::Count(3)));
        assert_eq!(cart.quantity(ProductId::new(5)), 7);
    }

    #[test]
    fn test_remove_at_least_current_drops_line() {
        let mut cart = items(&[(5, 3), (6, 3)]);
        assert!(cart.remove(ProductId::new(5), RemoveQuantity::Count(3)));
        assert!(cart.remove(ProductId::new(6), RemoveQuantity::Count(8)));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_remove_missing_product_is_false() {
        let mut cart = items(&[(5, 1)]);
        assert!(!cart.remove(ProductId::new(9), RemoveQuantity::All));
        assert_eq!(cart, items(&[(5, 1)]));
    }

    #[test]
    fn test_clear_signals_noop() {
        let mut cart = CartItems::new();
        assert!(!cart.clear());
        let mut cart = items(&[(1, 1), (2, 4)]);
        assert!(cart.clear());
        assert!(cart.is_empty());
    }

    #[test]
    fn test_totals() {
        let cart = items(&[(5, 1), (7, 3)]);
        assert_eq!(cart.total_quantity(), 4);
        assert_eq!(cart.line_count(), 2);
    }

    #[test]
    fn test_remove_quantity_from_wire() {
        assert_eq!(RemoveQuantity::from_wire(None), Some(RemoveQuantity::All));
        assert_eq!(RemoveQuantity::from_wire(Some(-1)), Some(RemoveQuantity::All));
        assert_eq!(RemoveQuantity::from_wire(Some(2)), Some(RemoveQuantity::Count(2)));
        assert_eq!(RemoveQuantity::from_wire(Some(0)), None);
        assert_eq!(RemoveQuantity::from_wire(Some(-4)), None);
    }

    #[test]
    fn test_from_rows_drops_non_positive() {
        let cart: CartItems = [(ProductId::new(1), 2), (ProductId::new(2), 0), (ProductId::new(3), -1)]
            .into_iter()
            .collect();
        assert_eq!(cart, items(&[(1, 2)]));
    }

    #[test]
    fn test_serializes_as_map() {
        let cart = items(&[(42, 2)]);
        assert_eq!(serde_json::to_string(&cart).unwrap_or_default(), r#"{"42":2}"#);
    }
}
