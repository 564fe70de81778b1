//! Seed the catalog from a YAML file.
//!
//! ```yaml
//! products:
//!   - title: Enamel Mug
//!     sku: MUG-ENAMEL
//!     price: 1000          # cents
//!   - title: T-Shirt
//!     price: 2500
//!     variants:
//!       - sku: TEE-S
//!         options: { size: S }
//!       - sku: TEE-XL
//!         price: 2700      # overrides the parent price
//!         options: { size: XL }
//! ```
//!
//! Variants inherit the parent's price and availability unless they set
//! their own, and are titled after the parent and their option values.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use tracing::info;

use storehouse_core::{Cents, ProductId};
use storehouse_storefront::db::{PgStore, Store};
use storehouse_storefront::models::NewProduct;

use super::connect;

/// Top-level catalog file.
#[derive(Debug, Deserialize)]
pub struct Catalog {
    pub products: Vec<SeedProduct>,
}

#[derive(Debug, Deserialize)]
pub struct SeedProduct {
    pub title: String,
    pub sku: Option<String>,
    pub price: Option<i64>,
    #[serde(default = "available_by_default")]
    pub available: bool,
    #[serde(default)]
    pub variants: Vec<SeedVariant>,
}

#[derive(Debug, Deserialize)]
pub struct SeedVariant {
    pub title: Option<String>,
    pub sku: Option<String>,
    pub price: Option<i64>,
    pub available: Option<bool>,
    pub options: BTreeMap<String, String>,
}

const fn available_by_default() -> bool {
    true
}

impl SeedProduct {
    fn to_new_product(&self) -> NewProduct {
        NewProduct {
            parent_id: None,
            title: self.title.clone(),
            sku: self.sku.clone(),
            price: self.price.map(Cents::new),
            available: self.available,
            options: BTreeMap::new(),
        }
    }

    fn variant(&self, parent: ProductId, variant: &SeedVariant) -> NewProduct {
        let title = variant.title.clone().unwrap_or_else(|| {
            let values: Vec<&str> = variant.options.values().map(String::as_str).collect();
            format!("{} - {}", self.title, values.join(" / "))
        });
        NewProduct {
            parent_id: Some(parent),
            title,
            sku: variant.sku.clone(),
            price: variant.price.or(self.price).map(Cents::new),
            available: variant.available.unwrap_or(self.available),
            options: variant.options.clone(),
        }
    }
}

/// Check a catalog before touching the database.
fn validate(catalog: &Catalog) -> Vec<String> {
    let mut errors = Vec::new();
    for product in &catalog.products {
        if product.title.trim().is_empty() {
            errors.push("product with an empty title".to_string());
        }
        if product.price.is_some_and(|p| p < 0) {
            errors.push(format!("{}: negative price", product.title));
        }
        for variant in &product.variants {
            if variant.options.is_empty() {
                errors.push(format!("{}: variant without options", product.title));
            }
            if variant.price.is_some_and(|p| p < 0) {
                errors.push(format!("{}: variant with a negative price", product.title));
            }
        }
    }
    errors
}

/// Seed products and variants from `file_path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, fails validation,
/// or an insert fails.
pub async fn catalog(file_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    info!(path = %file_path, "Loading catalog from file");
    let content = tokio::fs::read_to_string(path).await?;
    let catalog: Catalog = serde_yaml::from_str(&content)?;

    let errors = validate(&catalog);
    if !errors.is_empty() {
        for err in &errors {
            tracing::error!("  - {err}");
        }
        return Err(format!("{} validation errors found", errors.len()).into());
    }

    let store = PgStore::new(connect().await?);
    let mut inserted = 0usize;
    for product in &catalog.products {
        let parent = store.create_product(&product.to_new_product()).await?;
        inserted += 1;
        for variant in &product.variants {
            store.create_product(&product.variant(parent.id, variant)).await?;
            inserted += 1;
        }
    }

    info!("Seeding complete!");
    info!("  Products inserted: {inserted}");
    Ok(())
}
