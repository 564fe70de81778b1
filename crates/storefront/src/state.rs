//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::StorefrontConfig;
use crate::db::{PgStore, Store};
use crate::payments::{PaymentError, PaymentGateway, StripeClient};
use crate::services::{
    AddressService, CartService, CheckoutService, CustomerService, InventoryService,
    PricingService, ShippingService,
};
use crate::shipping::{ShippingError, ShippingGateway, ShipwireClient};

/// Error building the production state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("shipping client: {0}")]
    Shipping(#[from] ShippingError),
    #[error("payment client: {0}")]
    Payment(#[from] PaymentError),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`. The store and both vendor
/// gateways are trait objects so tests can swap in in-memory versions.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    store: Arc<dyn Store>,
    shipping: Arc<dyn ShippingGateway>,
    payments: Arc<dyn PaymentGateway>,
}

impl AppState {
    /// Assemble state from explicit parts.
    #[must_use]
    pub fn new(
        config: StorefrontConfig,
        store: Arc<dyn Store>,
        shipping: Arc<dyn ShippingGateway>,
        payments: Arc<dyn PaymentGateway>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                shipping,
                payments,
            }),
        }
    }

    /// Production state: `PostgreSQL`, Shipwire and Stripe.
    ///
    /// # Errors
    ///
    /// Returns an error if a vendor HTTP client cannot be built.
    pub fn connect(config: StorefrontConfig, pool: PgPool) -> Result<Self, StateError> {
        let shipping = ShipwireClient::new(&config.shipwire)?;
        let payments = StripeClient::new(&config.stripe)?;
        Ok(Self::new(
            config,
            Arc::new(PgStore::new(pool)),
            Arc::new(shipping),
            Arc::new(payments),
        ))
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn store(&self) -> &dyn Store {
        self.inner.store.as_ref()
    }

    #[must_use]
    pub fn shipping(&self) -> &dyn ShippingGateway {
        self.inner.shipping.as_ref()
    }

    #[must_use]
    pub fn payments(&self) -> &dyn PaymentGateway {
        self.inner.payments.as_ref()
    }

    // -------------------------------------------------------------------------
    // Services
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn carts(&self) -> CartService<'_> {
        CartService::new(self.store(), self.config().guest_customer_id)
    }

    #[must_use]
    pub fn addresses(&self) -> AddressService<'_> {
        AddressService::new(self.store())
    }

    #[must_use]
    pub fn pricing(&self) -> PricingService<'_> {
        PricingService::new(self.store(), self.shipping()).with_tax_percent(self.config().tax_percent)
    }

    #[must_use]
    pub fn shipping_service(&self) -> ShippingService<'_> {
        ShippingService::new(self.store(), self.shipping())
    }

    #[must_use]
    pub fn inventory(&self) -> InventoryService<'_> {
        InventoryService::new(self.store(), self.shipping())
    }

    #[must_use]
    pub fn customers(&self) -> CustomerService<'_> {
        CustomerService::new(self.store())
    }

    #[must_use]
    pub fn checkout(&self) -> CheckoutService<'_> {
        CheckoutService::new(
            self.store(),
            self.shipping(),
            self.payments(),
            self.config().guest_customer_id,
        )
    }
}
