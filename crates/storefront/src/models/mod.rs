//! Domain models for the storefront.
//!
//! These are the persisted records behind the cart/order aggregate. Rows are
//! decoded in `db::postgres` and converted into these types; the in-memory
//! store holds them directly.

pub mod address;
pub mod cart;
pub mod customer;
pub mod order;
pub mod product;
pub mod session;

pub use address::{Address, AddressKind};
pub use cart::Cart;
pub use customer::{Customer, NewCustomer};
pub use order::{NewOrder, Order};
pub use product::{NewProduct, Product};
pub use session::{CurrentCustomer, NoncePurpose, keys as session_keys};
