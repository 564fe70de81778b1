//! Session-related types.
//!
//! Types stored in the session for identity and anti-forgery state.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use storehouse_core::{CustomerId, Email};

/// Session-stored customer identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentCustomer {
    pub id: CustomerId,
    pub email: Email,
}

/// What an anti-forgery nonce guards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoncePurpose {
    Signup,
    Login,
}

impl NoncePurpose {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Signup => "signup",
            Self::Login => "login",
        }
    }

    /// Session key holding this purpose's nonce.
    #[must_use]
    pub const fn session_key(self) -> &'static str {
        match self {
            Self::Signup => keys::SIGNUP_NONCE,
            Self::Login => keys::LOGIN_NONCE,
        }
    }
}

impl fmt::Display for NoncePurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NoncePurpose {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "signup" => Ok(Self::Signup),
            "login" => Ok(Self::Login),
            other => Err(format!("unknown nonce purpose: {other}")),
        }
    }
}

/// Session keys.
pub mod keys {
    /// Key for storing the signed-in customer.
    pub const CURRENT_CUSTOMER: &str = "current_customer";

    /// Key for an anonymous owner's active cart id.
    pub const GUEST_CART: &str = "guest_cart_id";

    /// Key for the create-customer nonce.
    pub const SIGNUP_NONCE: &str = "signup_nonce";

    /// Key for the sign-on nonce.
    pub const LOGIN_NONCE: &str = "login_nonce";
}
