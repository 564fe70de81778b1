//! Storehouse Core - Shared domain types.
//!
//! This crate provides the types used across all Storehouse components:
//! - `storefront` - The cart, checkout and vendor-integration HTTP service
//! - `cli` - Command-line tools for migrations, seeding and inventory sync
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no
//! database access, no HTTP clients. The cart mutation rules and the totals
//! calculation live here so they can be tested without a store.
//!
//! # Modules
//!
//! - [`types`] - Newtype ids, money, email, statuses, address fields
//! - [`cart`] - The product → quantity item mapping
//! - [`pricing`] - Subtotal, total and tax
//! - [`shipping`] / [`payment`] - Normalized vendor results
//! - [`envelope`] - The response envelope every operation returns

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod envelope;
pub mod payment;
pub mod pricing;
pub mod shipping;
pub mod types;

pub use cart::{CartItems, RemoveQuantity};
pub use envelope::{ResponseEnvelope, codes};
pub use payment::ChargeResult;
pub use shipping::{DeliveryEstimate, ShipmentLine, ShippingOption};
pub use types::*;
