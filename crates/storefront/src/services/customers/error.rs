//! Customer/authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during registration and sign-on.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The anti-forgery nonce was missing or did not match.
    #[error("failed to validate nonce")]
    FailedNonce,

    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] storehouse_core::EmailError),

    /// Invalid credentials (wrong password or unknown customer).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// A customer with this email already exists.
    #[error("customer already exists")]
    CustomerAlreadyExists,

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}
