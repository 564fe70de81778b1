//! Payment gateway integration.
//!
//! A [`PaymentGateway`] turns a single-use card token into a captured charge.
//! Vendor refusals are not errors: they come back as a declined
//! [`ChargeResult`]. [`PaymentError`] covers transport and protocol failures.

pub mod stripe;

pub use stripe::StripeClient;

use async_trait::async_trait;
use thiserror::Error;

use storehouse_core::{Cents, ChargeResult};

/// Errors that prevent a charge from producing any vendor verdict.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The vendor answered with something that is neither a charge nor an error.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),
}

/// A single charge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChargeRequest {
    /// Client-side card token.
    pub token: String,
    pub amount: Cents,
    pub description: String,
}

/// Card payment processor.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Vendor name used to tag raw responses.
    fn vendor(&self) -> &'static str;

    /// Submit the charge and normalize the vendor's answer.
    async fn charge(&self, request: &ChargeRequest) -> Result<ChargeResult, PaymentError>;
}
