//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `cart` - Cart/order aggregate: active-cart association, item mutation, status
//! - `status` - Status resolution by name or id
//! - `address` - Address store
//! - `pricing` - Subtotal, shipping, tax and total for a cart
//! - `shipping` - Rate quotes and fulfillment submission
//! - `inventory` - Vendor stock sync
//! - `customers` - Registration, sign-on, anti-forgery nonces
//! - `checkout` - Order submission
//!
//! Services borrow the [`Store`](crate::db::Store) and vendor gateways for the
//! duration of one request and hold no state of their own.

pub mod address;
pub mod cart;
pub mod checkout;
pub mod customers;
pub mod inventory;
pub mod pricing;
pub mod shipping;
pub mod status;

pub use address::AddressService;
pub use cart::{CartError, CartService, Owner};
pub use checkout::{CheckoutError, CheckoutRequest, CheckoutService};
pub use customers::{AuthError, CustomerService, Registration};
pub use inventory::InventoryService;
pub use pricing::{CartTotals, PricingService};
pub use shipping::ShippingService;
pub use status::StatusService;
