//! Catalog products and variants.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use storehouse_core::{Cents, ProductId};

/// A purchasable product, or a variant of one.
///
/// Variants carry a `parent_id` and an option map (e.g. `size → M`). Only
/// SKU-bearing products can be shipped or inventory-synced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub parent_id: Option<ProductId>,
    pub title: String,
    pub sku: Option<String>,
    /// Unit price; `None` means the price lookup fails and the line adds 0.
    pub price: Option<Cents>,
    pub available: bool,
    /// Stock level last reported by the fulfillment vendor.
    pub quantity: Option<i32>,
    pub shipwire_synced: bool,
    pub options: BTreeMap<String, String>,
}

impl Product {
    /// The SKU, if present and non-blank.
    #[must_use]
    pub fn sku(&self) -> Option<&str> {
        self.sku.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    /// Whether `options` selects this variant exactly.
    #[must_use]
    pub fn matches_options(&self, options: &BTreeMap<String, String>) -> bool {
        !self.options.is_empty() && self.options == *options
    }
}

/// Data for creating a product (catalog seeding).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NewProduct {
    pub parent_id: Option<ProductId>,
    pub title: String,
    pub sku: Option<String>,
    pub price: Option<Cents>,
    pub available: bool,
    pub options: BTreeMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variant(options: &[(&str, &str)]) -> Product {
        Product {
            id: ProductId::new(2),
            parent_id: Some(ProductId::new(1)),
            title: "Tee / M".to_string(),
            sku: Some("  ".to_string()),
            price: Some(Cents::new(1500)),
            available: true,
            quantity: None,
            shipwire_synced: false,
            options: options
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
        }
    }

    #[test]
    fn test_blank_sku_is_none() {
        assert_eq!(variant(&[]).sku(), None);
    }

    #[test]
    fn test_matches_options_exactly() {
        let product = variant(&[("size", "M"), ("color", "red")]);
        let mut wanted = BTreeMap::new();
        wanted.insert("color".to_string(), "red".to_string());
        assert!(!product.matches_options(&wanted));
        wanted.insert("size".to_string(), "M".to_string());
        assert!(product.matches_options(&wanted));
    }

    #[test]
    fn test_base_product_never_matches() {
        assert!(!variant(&[]).matches_options(&BTreeMap::new()));
    }
}
