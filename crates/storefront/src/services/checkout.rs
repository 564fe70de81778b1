//! Order submission.
//!
//! Checkout turns the owner's active cart into an order:
//!
//! 1. resolve the active cart (it must hold items and not already be ordered)
//! 2. save any supplied shipping/billing address to the cart
//! 3. charge the cart total; a declined charge stops here
//! 4. create the order with a back-reference to the cart
//! 5. mark the order `processing` and the cart `ordered`
//! 6. submit fulfillment when shipping is enabled (a failure is logged, the order stands)
//! 7. clear the owner's active cart

use thiserror::Error;
use tracing::{info, instrument, warn};

use storehouse_core::{AddressFields, Cents, ChargeResult, CustomerId, StatusRef};

use crate::db::{RepositoryError, Store};
use crate::models::{Cart, NewOrder, Order};
use crate::payments::{ChargeRequest, PaymentError, PaymentGateway};
use crate::services::address::AddressService;
use crate::services::cart::{CartError, CartService, Owner};
use crate::services::pricing::PricingService;
use crate::services::shipping::ShippingService;
use crate::services::status::StatusService;
use crate::shipping::{DEFAULT_METHOD, FulfillmentReceipt, ShippingGateway};

/// Status given to a newly placed order.
pub const ORDER_STATUS: &str = "processing";

/// Status given to a cart once it has been ordered.
pub const ORDERED_CART_STATUS: &str = "ordered";

/// Errors that stop a checkout or charge.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The owner has no active cart.
    #[error("no active cart")]
    NoCart,

    /// The active cart has no items.
    #[error("cart is empty")]
    EmptyCart,

    /// An order already exists for this cart.
    #[error("cart already ordered")]
    AlreadyOrdered,

    /// No payment token was supplied.
    #[error("missing payment token")]
    MissingToken,

    /// The payment vendor refused the charge.
    #[error("charge declined: {}", .0.code)]
    Declined(ChargeResult),

    #[error(transparent)]
    Cart(#[from] CartError),

    #[error(transparent)]
    Payment(#[from] PaymentError),

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Checkout inputs.
#[derive(Debug, Clone, Default)]
pub struct CheckoutRequest {
    pub shipping_address: Option<AddressFields>,
    pub billing_address: Option<AddressFields>,
    pub shipping_method: Option<String>,
    pub payment_token: Option<String>,
}

/// A placed order.
#[derive(Debug, Clone)]
pub struct PlacedOrder {
    pub order: Order,
    pub charge: ChargeResult,
    /// Present when fulfillment was submitted and answered.
    pub fulfillment: Option<FulfillmentReceipt>,
}

pub struct CheckoutService<'a> {
    store: &'a dyn Store,
    shipping: &'a dyn ShippingGateway,
    payments: &'a dyn PaymentGateway,
    guest: CustomerId,
}

impl<'a> CheckoutService<'a> {
    #[must_use]
    pub const fn new(
        store: &'a dyn Store,
        shipping: &'a dyn ShippingGateway,
        payments: &'a dyn PaymentGateway,
        guest: CustomerId,
    ) -> Self {
        Self {
            store,
            shipping,
            payments,
            guest,
        }
    }

    const fn carts(&self) -> CartService<'a> {
        CartService::new(self.store, self.guest)
    }

    /// The owner's active cart, if it can still be ordered.
    async fn orderable_cart(&self, owner: &Owner) -> Result<Cart, CheckoutError> {
        let carts = self.carts();
        let cart = carts.get_active_cart(owner).await?.ok_or(CheckoutError::NoCart)?;
        if cart.items.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        if carts.cart_to_order(cart.id).await?.is_some() {
            return Err(CheckoutError::AlreadyOrdered);
        }
        Ok(cart)
    }

    async fn charge(&self, cart: &Cart, token: Option<&str>) -> Result<(Cents, ChargeResult), CheckoutError> {
        let token = token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(CheckoutError::MissingToken)?;
        let amount = PricingService::new(self.store, self.shipping)
            .total(cart)
            .await?
            .ok_or(CheckoutError::EmptyCart)?;

        let charge = self
            .payments
            .charge(&ChargeRequest {
                token: token.to_string(),
                amount,
                description: format!("Order from cart {}", cart.id),
            })
            .await?;
        Ok((amount, charge))
    }

    /// Charge the owner's active cart total without placing an order.
    ///
    /// The vendor's verdict is returned either way.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::NoCart`/`EmptyCart`/`AlreadyOrdered` when
    /// there is nothing to charge and `CheckoutError::Payment` when the vendor
    /// cannot be reached.
    #[instrument(skip(self, token))]
    pub async fn charge_cart(&self, owner: &Owner, token: Option<&str>) -> Result<ChargeResult, CheckoutError> {
        let cart = self.orderable_cart(owner).await?;
        let (_, charge) = self.charge(&cart, token).await?;
        Ok(charge)
    }

    /// Email on the order's author record, empty when there is none.
    async fn author_email(&self, author: CustomerId) -> Result<String, CheckoutError> {
        Ok(self
            .store
            .get_customer(author)
            .await?
            .map(|customer| customer.email.to_string())
            .unwrap_or_default())
    }

    /// Place an order from the owner's active cart.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::Declined` with the vendor's verdict when the
    /// charge is refused; nothing is created in that case.
    #[instrument(skip(self, email, request))]
    pub async fn submit_order(
        &self,
        owner: &mut Owner,
        email: Option<&str>,
        request: &CheckoutRequest,
    ) -> Result<PlacedOrder, CheckoutError> {
        let cart = self.orderable_cart(owner).await?;

        let addresses = AddressService::new(self.store);
        if let Some(fields) = &request.shipping_address {
            let same = request.billing_address.as_ref() == Some(fields);
            addresses.save(fields, cart.id, true, same).await?;
        }
        if let Some(fields) = &request.billing_address {
            if request.shipping_address.as_ref() != Some(fields) {
                addresses.save(fields, cart.id, false, true).await?;
            }
        }

        let (total, charge) = self.charge(&cart, request.payment_token.as_deref()).await?;
        if !charge.success {
            return Err(CheckoutError::Declined(charge));
        }

        let statuses = StatusService::new(self.store);
        let order_status = statuses
            .resolve(&StatusRef::name(ORDER_STATUS))
            .await?
            .ok_or(CartError::StatusNotFound)?;

        let order = self
            .store
            .create_order(&NewOrder {
                source_cart: cart.id,
                customer_id: owner.customer.unwrap_or(cart.author),
                status_id: order_status.id,
                shipping_method: request
                    .shipping_method
                    .clone()
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_METHOD.to_string()),
                total,
                charge_id: charge.charge_id.clone(),
                items: cart.items.clone(),
            })
            .await?;
        info!(order_id = %order.id, cart_id = %cart.id, total = %total, "Order placed");

        let carts = self.carts();
        carts
            .set_status(owner, Some(cart.id), &StatusRef::name(ORDERED_CART_STATUS))
            .await?;

        let fulfillment = if self.shipping.is_enabled() {
            let email = match email {
                Some(email) => email.to_string(),
                None => self.author_email(order.customer_id).await?,
            };
            match ShippingService::new(self.store, self.shipping)
                .submit_order(&order, &email)
                .await
            {
                Ok(receipt) => Some(receipt),
                Err(e) => {
                    warn!(order_id = %order.id, error = %e, "Fulfillment submission failed");
                    None
                }
            }
        } else {
            None
        };

        carts.unset_active_cart(owner).await?;

        Ok(PlacedOrder {
            order,
            charge,
            fulfillment,
        })
    }
}
