//! Core value types.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod address;
pub mod email;
pub mod id;
pub mod money;
pub mod status;

pub use address::AddressFields;
pub use email::{Email, EmailError};
pub use id::*;
pub use money::Cents;
pub use status::{DEFAULT_STATUS, Status, StatusRef, slugify};
