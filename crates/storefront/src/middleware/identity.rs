//! Caller identity extractor.
//!
//! [`Identity`] reads the session once per request and exposes the signed-in
//! customer and the cart [`Owner`]. Handlers that may create or drop the
//! active cart call [`Identity::commit`] before building their response, so
//! the session cookie goes out with the same response.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;
use tracing::Span;

use storehouse_core::CartId;

use crate::error::AppError;
use crate::models::{CurrentCustomer, NoncePurpose, session_keys};
use crate::services::Owner;
use crate::services::customers::{issue_nonce, nonce_matches};

/// The caller's session, signed-in customer and cart owner.
pub struct Identity {
    session: Session,
    customer: Option<CurrentCustomer>,
    owner: Owner,
}

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Get the session from extensions (set by SessionManagerLayer)
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or_else(|| AppError::Internal("session layer missing".to_string()))?;

        let customer: Option<CurrentCustomer> = session.get(session_keys::CURRENT_CUSTOMER).await?;
        let owner = match &customer {
            Some(customer) => {
                Span::current().record("customer_id", customer.id.as_i32());
                Owner::customer(customer.id)
            }
            None => Owner::guest(session.get::<CartId>(session_keys::GUEST_CART).await?),
        };

        Ok(Self {
            session,
            customer,
            owner,
        })
    }
}

impl Identity {
    /// The signed-in customer, if any.
    #[must_use]
    pub const fn customer(&self) -> Option<&CurrentCustomer> {
        self.customer.as_ref()
    }

    /// The cart owner, to be passed to cart operations.
    #[must_use]
    pub const fn owner(&self) -> Owner {
        self.owner
    }

    /// The session id, used as the inventory feed's cache key.
    #[must_use]
    pub fn session_key(&self) -> String {
        self.session
            .id()
            .map_or_else(|| "anonymous".to_string(), |id| id.to_string())
    }

    /// Persist an owner's anonymous active-cart association.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be modified.
    pub async fn commit(&mut self, owner: Owner) -> Result<(), AppError> {
        if owner.guest_cart != self.owner.guest_cart {
            match owner.guest_cart {
                Some(cart) => self.session.insert(session_keys::GUEST_CART, cart).await?,
                None => {
                    self.session.remove::<CartId>(session_keys::GUEST_CART).await?;
                }
            }
        }
        self.owner = owner;
        Ok(())
    }

    /// Sign a customer on. The session id is cycled and the anonymous cart
    /// slot is cleared.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be modified.
    pub async fn sign_in(&mut self, customer: CurrentCustomer) -> Result<(), AppError> {
        self.session.cycle_id().await?;
        self.session
            .insert(session_keys::CURRENT_CUSTOMER, &customer)
            .await?;
        self.session.remove::<CartId>(session_keys::GUEST_CART).await?;
        self.owner = Owner::customer(customer.id);
        self.customer = Some(customer);
        Ok(())
    }

    /// Issue a fresh nonce for `purpose`, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be modified.
    pub async fn issue_nonce(&self, purpose: NoncePurpose) -> Result<String, AppError> {
        let nonce = issue_nonce();
        self.session.insert(purpose.session_key(), &nonce).await?;
        Ok(nonce)
    }

    /// Whether `supplied` matches the session's nonce for `purpose`.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be read.
    pub async fn verify_nonce(
        &self,
        purpose: NoncePurpose,
        supplied: Option<&str>,
    ) -> Result<bool, AppError> {
        let expected: Option<String> = self.session.get(purpose.session_key()).await?;
        Ok(nonce_matches(expected.as_deref(), supplied))
    }
}
