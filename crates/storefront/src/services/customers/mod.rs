//! Customer registration and sign-on.
//!
//! Both operations are guarded by a per-purpose anti-forgery nonce held in
//! the session. The HTTP layer checks the nonce with [`nonce_matches`] before
//! calling into this service, so a failed check never reaches the store.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::RngCore;
use tracing::{info, instrument};

use storehouse_core::{CartId, Email};

use crate::db::{RepositoryError, Store};
use crate::models::{Customer, NewCustomer};

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Random bytes per nonce.
const NONCE_BYTES: usize = 24;

/// Registration details.
#[derive(Debug, Clone, Default)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

/// Customer service.
pub struct CustomerService<'a> {
    store: &'a dyn Store,
}

impl<'a> CustomerService<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// Register a new customer with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::CustomerAlreadyExists` if the email is already registered.
    #[instrument(skip(self, registration), fields(email = %registration.email))]
    pub async fn register(&self, registration: &Registration) -> Result<Customer, AuthError> {
        let email = Email::parse(&registration.email)?;
        validate_password(&registration.password)?;
        let password_hash = hash_password(&registration.password)?;

        let customer = self
            .store
            .create_customer(&NewCustomer {
                email,
                password_hash: Some(password_hash),
                first_name: registration.first_name.trim().to_string(),
                last_name: registration.last_name.trim().to_string(),
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::CustomerAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        info!(customer_id = %customer.id, "Customer registered");
        Ok(customer)
    }

    /// Check an email/password pair.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    #[instrument(skip(self, password))]
    pub async fn sign_on(&self, email: &str, password: &str) -> Result<Customer, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let (customer, password_hash) = self
            .store
            .get_customer_credentials(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;
        let password_hash = password_hash.ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;
        Ok(customer)
    }

    /// Make an anonymous caller's cart the customer's active cart, unless the
    /// customer already has one. Returns the customer's active cart.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the store fails.
    pub async fn adopt_guest_cart(
        &self,
        customer: &Customer,
        guest_cart: Option<CartId>,
    ) -> Result<Option<CartId>, AuthError> {
        if let Some(active) = customer.active_cart_id {
            if self.store.get_cart(active).await?.is_some() {
                return Ok(Some(active));
            }
        }
        let Some(cart) = guest_cart else {
            return Ok(None);
        };
        if self.store.get_cart(cart).await?.is_none() {
            return Ok(None);
        }
        self.store.set_active_cart(customer.id, Some(cart)).await?;
        Ok(Some(cart))
    }
}

/// Generate a fresh anti-forgery nonce.
#[must_use]
pub fn issue_nonce() -> String {
    let mut bytes = [0u8; NONCE_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Compare a supplied nonce with the one held in the session, in constant
/// time for equal lengths. A missing side never matches.
#[must_use]
pub fn nonce_matches(expected: Option<&str>, supplied: Option<&str>) -> bool {
    let (Some(expected), Some(supplied)) = (expected, supplied) else {
        return false;
    };
    if expected.is_empty() || expected.len() != supplied.len() {
        return false;
    }
    expected
        .bytes()
        .zip(supplied.bytes())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

/// Validate password strength.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use storehouse_core::CustomerId;

    use super::*;
    use crate::db::MemoryStore;
    use crate::services::{CartService, Owner};

    fn registration(email: &str, password: &str) -> Registration {
        Registration {
            email: email.to_string(),
            password: password.to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
        }
    }

    #[test]
    fn test_nonce_matching() {
        let nonce = issue_nonce();
        assert!(nonce_matches(Some(&nonce), Some(&nonce)));
        assert!(!nonce_matches(Some(&nonce), Some("forged")));
        assert!(!nonce_matches(None, Some(&nonce)));
        assert!(!nonce_matches(Some(&nonce), None));
        assert!(!nonce_matches(Some(""), Some("")));
        assert_ne!(issue_nonce(), nonce);
    }

    #[tokio::test]
    async fn test_register_then_sign_on() {
        let store = MemoryStore::new();
        let customers = CustomerService::new(&store);

        let created = customers
            .register(&registration("ada@example.com", "analytical"))
            .await
            .unwrap();
        let signed_on = customers.sign_on("ada@example.com", "analytical").await.unwrap();
        assert_eq!(created.id, signed_on.id);

        assert!(matches!(
            customers.sign_on("ada@example.com", "wrong-password").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            customers.sign_on("nobody@example.com", "analytical").await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_register_validation() {
        let store = MemoryStore::new();
        let customers = CustomerService::new(&store);

        assert!(matches!(
            customers.register(&registration("not-an-email", "analytical")).await,
            Err(AuthError::InvalidEmail(_))
        ));
        assert!(matches!(
            customers.register(&registration("ada@example.com", "short")).await,
            Err(AuthError::WeakPassword(_))
        ));

        customers
            .register(&registration("ada@example.com", "analytical"))
            .await
            .unwrap();
        assert!(matches!(
            customers.register(&registration("ada@example.com", "analytical")).await,
            Err(AuthError::CustomerAlreadyExists)
        ));
    }

    #[tokio::test]
    async fn test_guest_cart_is_adopted_when_customer_has_none() {
        let store = MemoryStore::new();
        let customers = CustomerService::new(&store);
        let carts = CartService::new(&store, CustomerId::new(1));

        let mut guest = Owner::default();
        let guest_cart = carts.create_cart(&mut guest).await.unwrap();
        let customer = customers
            .register(&registration("ada@example.com", "analytical"))
            .await
            .unwrap();

        let active = customers
            .adopt_guest_cart(&customer, Some(guest_cart.id))
            .await
            .unwrap();
        assert_eq!(active, Some(guest_cart.id));

        let owner = Owner::customer(customer.id);
        let resolved = carts.get_active_cart(&owner).await.unwrap().unwrap();
        assert_eq!(resolved.id, guest_cart.id);
    }

    #[tokio::test]
    async fn test_existing_customer_cart_wins() {
        let store = MemoryStore::new();
        let customers = CustomerService::new(&store);
        let carts = CartService::new(&store, CustomerId::new(1));

        let customer = customers
            .register(&registration("ada@example.com", "analytical"))
            .await
            .unwrap();
        let mut owner = Owner::customer(customer.id);
        let own_cart = carts.create_cart(&mut owner).await.unwrap();
        let mut guest = Owner::default();
        let guest_cart = carts.create_cart(&mut guest).await.unwrap();

        let customer = store.get_customer(customer.id).await.unwrap().unwrap();
        let active = customers
            .adopt_guest_cart(&customer, Some(guest_cart.id))
            .await
            .unwrap();
        assert_eq!(active, Some(own_cart.id));
    }
}
