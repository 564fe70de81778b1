//! Customer route handlers: anti-forgery nonces, sign-on and registration.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use storehouse_core::{ResponseEnvelope, codes};

use crate::error::{AppError, Result, add_breadcrumb, set_sentry_user};
use crate::middleware::{Identity, Payload};
use crate::models::{CurrentCustomer, Customer, NoncePurpose};
use crate::services::{AuthError, Registration};
use crate::state::AppState;

// =============================================================================
// Request / response bodies
// =============================================================================

/// A freshly issued nonce.
#[derive(Debug, Serialize)]
pub struct NonceResponse {
    pub purpose: &'static str,
    pub nonce: String,
}

/// Sign-on request.
#[derive(Debug, Deserialize)]
pub struct SignOnRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    pub nonce: Option<String>,
}

/// Create-customer request.
#[derive(Debug, Deserialize)]
pub struct CreateCustomerRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub nonce: Option<String>,
}

// =============================================================================
// Handlers
// =============================================================================

/// Issue a nonce for `signup` or `login`, replacing the previous one.
#[instrument(skip(identity))]
pub async fn nonce(identity: Identity, Path(purpose): Path<String>) -> Result<Json<NonceResponse>> {
    let purpose: NoncePurpose = purpose.parse().map_err(AppError::invalid)?;
    let nonce = identity.issue_nonce(purpose).await?;
    Ok(Json(NonceResponse {
        purpose: purpose.as_str(),
        nonce,
    }))
}

/// Sign a customer on with email and password.
#[instrument(skip(state, identity, request), fields(email = %request.email, customer_id = tracing::field::Empty))]
pub async fn sign_on(
    State(state): State<AppState>,
    mut identity: Identity,
    Payload(request): Payload<SignOnRequest>,
) -> Result<Json<ResponseEnvelope>> {
    if !identity
        .verify_nonce(NoncePurpose::Login, request.nonce.as_deref())
        .await?
    {
        warn!("Sign-on nonce check failed");
        return Err(AppError::Rejected {
            code: codes::FAILED_NONCE,
            message: "Failed to validate nonce.".to_string(),
        });
    }

    let customer = state
        .customers()
        .sign_on(&request.email, &request.password)
        .await?;
    start_session(&state, &mut identity, &customer).await?;

    info!(customer_id = %customer.id, "Customer signed on");
    add_breadcrumb("auth", "sign_on", None);
    Ok(Json(ResponseEnvelope::ok("Login Successful")))
}

/// Register a customer and sign them on.
///
/// The signup nonce is checked before anything else; on failure no record is
/// created.
#[instrument(skip(state, identity, request), fields(email = %request.email, customer_id = tracing::field::Empty))]
pub async fn create(
    State(state): State<AppState>,
    mut identity: Identity,
    Payload(request): Payload<CreateCustomerRequest>,
) -> Result<Json<ResponseEnvelope>> {
    if !identity
        .verify_nonce(NoncePurpose::Signup, request.nonce.as_deref())
        .await?
    {
        warn!("Signup nonce check failed");
        return Err(AuthError::FailedNonce.into());
    }

    let customer = state
        .customers()
        .register(&Registration {
            email: request.email,
            password: request.password,
            first_name: request.first_name,
            last_name: request.last_name,
        })
        .await?;
    start_session(&state, &mut identity, &customer).await?;

    add_breadcrumb("auth", "register", None);
    Ok(Json(ResponseEnvelope::ok("Customer successfully created.")))
}

/// Carry the caller's anonymous cart over and store the customer in the
/// session.
async fn start_session(
    state: &AppState,
    identity: &mut Identity,
    customer: &Customer,
) -> Result<()> {
    state
        .customers()
        .adopt_guest_cart(customer, identity.owner().guest_cart)
        .await?;
    identity
        .sign_in(CurrentCustomer {
            id: customer.id,
            email: customer.email.clone(),
        })
        .await?;
    set_sentry_user(&customer.id, Some(customer.email.as_str()));
    Ok(())
}
