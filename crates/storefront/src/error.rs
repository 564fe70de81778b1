//! Unified error handling with Sentry integration.
//!
//! Every handler returns `Result<T, AppError>`. An `AppError` never becomes an
//! HTTP error status: it renders as the response envelope with
//! `success: false` and a `200 OK`, so callers only ever parse one shape.
//! Server-side failures are captured to Sentry first and their details are
//! replaced by the generic message.

use axum::{
    Json,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use storehouse_core::{ResponseEnvelope, codes};

use crate::db::RepositoryError;
use crate::payments::PaymentError;
use crate::services::{AuthError, CartError, CheckoutError};
use crate::shipping::ShippingError;

/// Message for a product or variant that cannot be bought.
pub const NOT_AVAILABLE_MESSAGE: &str =
    "This product is not available, please choose a different option.";

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// A request refused before anything was changed.
    #[error("{code}: {message}")]
    Rejected { code: &'static str, message: String },

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Cart operation failed.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Registration or sign-on failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Shipping vendor call failed.
    #[error("Shipping error: {0}")]
    Shipping(#[from] ShippingError),

    /// Payment vendor call failed.
    #[error("Payment error: {0}")]
    Payment(#[from] PaymentError),

    /// Checkout stopped.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Session store failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// View rendering failed.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Shorthand for an `INVALID_REQUEST` rejection.
    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Rejected {
            code: codes::INVALID_REQUEST,
            message: message.into(),
        }
    }

    /// Whether this error is a server-side failure worth reporting.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        match self {
            Self::Database(_) | Self::Session(_) | Self::Template(_) | Self::Internal(_) => true,
            Self::Cart(err) => matches!(err, CartError::Repository(_)),
            Self::Auth(err) => matches!(err, AuthError::Repository(_) | AuthError::PasswordHash),
            Self::Shipping(err) => matches!(
                err,
                ShippingError::Http(_) | ShippingError::Xml(_) | ShippingError::Repository(_)
            ),
            Self::Payment(_) => true,
            Self::Checkout(err) => matches!(
                err,
                CheckoutError::Payment(_)
                    | CheckoutError::Repository(_)
                    | CheckoutError::Cart(CartError::Repository(_))
            ),
            Self::Rejected { .. } => false,
        }
    }

    /// The envelope this error renders as.
    #[must_use]
    pub fn envelope(&self) -> ResponseEnvelope {
        if self.is_server_error() {
            return ResponseEnvelope::default();
        }
        match self {
            Self::Rejected { code, message } => ResponseEnvelope::failure(*code, message.clone()),
            Self::Cart(err) => cart_envelope(err),
            Self::Auth(err) => auth_envelope(err),
            Self::Shipping(err) => shipping_envelope(err),
            Self::Checkout(err) => checkout_envelope(err),
            _ => ResponseEnvelope::default(),
        }
    }
}

fn cart_envelope(err: &CartError) -> ResponseEnvelope {
    match err {
        CartError::NotAvailable => ResponseEnvelope::failure(codes::NOT_AVAILABLE, NOT_AVAILABLE_MESSAGE),
        CartError::InvalidQuantity(_) => {
            ResponseEnvelope::failure(codes::INVALID_REQUEST, "Quantity must be a positive number.")
        }
        CartError::CartNotFound => ResponseEnvelope::failure(codes::NOT_AVAILABLE, "Cart not found."),
        CartError::StatusNotFound => ResponseEnvelope::failure(codes::INVALID_REQUEST, "Unknown status."),
        CartError::Repository(_) => ResponseEnvelope::default(),
    }
}

fn auth_envelope(err: &AuthError) -> ResponseEnvelope {
    match err {
        AuthError::FailedNonce => ResponseEnvelope::failure(
            codes::FAILED_NONCE,
            "Customer not created, failed to validate nonce.",
        ),
        AuthError::InvalidCredentials => {
            ResponseEnvelope::failure(codes::ERROR, "Wrong username or password")
        }
        AuthError::InvalidEmail(_) => {
            ResponseEnvelope::failure(codes::INVALID_EMAIL, "Invalid email address")
        }
        AuthError::WeakPassword(msg) => ResponseEnvelope::failure(codes::WEAK_PASSWORD, msg.clone()),
        AuthError::CustomerAlreadyExists => ResponseEnvelope::failure(
            codes::CUSTOMER_EXISTS,
            "An account with this email already exists",
        ),
        AuthError::Repository(_) | AuthError::PasswordHash => ResponseEnvelope::default(),
    }
}

fn shipping_envelope(err: &ShippingError) -> ResponseEnvelope {
    match err {
        ShippingError::Disabled => {
            ResponseEnvelope::failure(codes::SHIPPING_DISABLED, "Shipping is not enabled.")
        }
        ShippingError::NothingToShip => ResponseEnvelope::failure(
            codes::INVALID_REQUEST,
            "A cart with shippable items and a complete address is required.",
        ),
        ShippingError::AlreadySubmitted => ResponseEnvelope::failure(
            codes::ALREADY_ORDERED,
            "This order was already submitted for fulfillment.",
        ),
        ShippingError::Http(_) | ShippingError::Xml(_) | ShippingError::Repository(_) => {
            ResponseEnvelope::default()
        }
    }
}

fn checkout_envelope(err: &CheckoutError) -> ResponseEnvelope {
    match err {
        CheckoutError::NoCart => ResponseEnvelope::failure(codes::NOT_AVAILABLE, "No active cart."),
        CheckoutError::EmptyCart => ResponseEnvelope::failure(codes::EMPTY_CART, "Cart is empty."),
        CheckoutError::AlreadyOrdered => {
            ResponseEnvelope::failure(codes::ALREADY_ORDERED, "This cart has already been ordered.")
        }
        CheckoutError::MissingToken => {
            ResponseEnvelope::failure(codes::INVALID_REQUEST, "A payment token is required.")
        }
        CheckoutError::Declined(charge) => charge.clone().into_envelope(),
        CheckoutError::Cart(err) => cart_envelope(err),
        CheckoutError::Payment(_) | CheckoutError::Repository(_) => ResponseEnvelope::default(),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::debug!(error = %self, "Request rejected");
        }

        Json(self.envelope()).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a customer ID.
///
/// Call this after sign-on to associate errors with customers.
pub fn set_sentry_user(customer_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(customer_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Add a breadcrumb for customer actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of actions
/// leading up to an error.
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;
    use storehouse_core::ChargeResult;
    use storehouse_core::envelope::DEFAULT_ERROR_MESSAGE;

    use super::*;

    #[test]
    fn test_every_error_is_a_200_envelope() {
        let response = AppError::Internal("boom".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_server_errors_hide_details() {
        let envelope = AppError::Internal("connection refused on 10.0.0.3".to_string()).envelope();
        assert!(!envelope.success);
        assert_eq!(envelope.code, codes::ERROR);
        assert_eq!(envelope.message, DEFAULT_ERROR_MESSAGE);
    }

    #[test]
    fn test_domain_codes() {
        assert_eq!(AppError::from(CartError::NotAvailable).envelope().code, codes::NOT_AVAILABLE);
        assert_eq!(
            AppError::from(CheckoutError::EmptyCart).envelope().code,
            codes::EMPTY_CART
        );
        assert_eq!(
            AppError::from(AuthError::FailedNonce).envelope().code,
            codes::FAILED_NONCE
        );
        assert_eq!(
            AppError::from(ShippingError::Disabled).envelope().code,
            codes::SHIPPING_DISABLED
        );
        assert_eq!(AppError::invalid("bad").envelope().message, "bad");
    }

    #[test]
    fn test_declined_charge_passes_vendor_payload_through() {
        let charge = ChargeResult::declined(
            "stripe",
            "card_declined",
            "Your card was declined.",
            json!({"error": {"code": "card_declined"}}),
        );
        let envelope = AppError::from(CheckoutError::Declined(charge)).envelope();
        assert_eq!(envelope.code, "CARD_DECLINED");
        assert_eq!(envelope.message, "Your card was declined.");
        assert_eq!(envelope.vendor_response.unwrap()["vendor"], "stripe");
    }
}
