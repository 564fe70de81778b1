//! Stripe charges client.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::{info, instrument, warn};

use storehouse_core::{Cents, ChargeResult};

use crate::config::StripeConfig;

use super::{ChargeRequest, PaymentError, PaymentGateway};

/// Tag attached to raw Stripe payloads.
pub const VENDOR: &str = "stripe";

const CHARGES_PATH: &str = "/v1/charges";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(45);

/// Client for the Stripe charges API.
#[derive(Clone)]
pub struct StripeClient {
    inner: Arc<StripeClientInner>,
}

struct StripeClientInner {
    client: reqwest::Client,
    secret_key: SecretString,
    currency: String,
    endpoint: String,
}

impl StripeClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &StripeConfig) -> Result<Self, PaymentError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            inner: Arc::new(StripeClientInner {
                client,
                secret_key: config.secret_key.clone(),
                currency: config.currency.to_lowercase(),
                endpoint: format!("{}{CHARGES_PATH}", config.base_url.trim_end_matches('/')),
            }),
        })
    }
}

#[async_trait]
impl PaymentGateway for StripeClient {
    fn vendor(&self) -> &'static str {
        VENDOR
    }

    #[instrument(skip(self, request), fields(amount = request.amount.get()))]
    async fn charge(&self, request: &ChargeRequest) -> Result<ChargeResult, PaymentError> {
        let amount = request.amount.get().to_string();
        let form = [
            ("amount", amount.as_str()),
            ("currency", self.inner.currency.as_str()),
            ("source", request.token.as_str()),
            ("description", request.description.as_str()),
        ];

        let response = self
            .inner
            .client
            .post(&self.inner.endpoint)
            .basic_auth(self.inner.secret_key.expose_secret(), Some(""))
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        let body: Value = response.json().await?;

        let result = interpret_charge(body, request.amount)?;
        if result.success {
            info!(charge_id = ?result.charge_id, "Charge captured");
        } else {
            warn!(%status, code = %result.code, "Charge declined");
        }
        Ok(result)
    }
}

/// Normalize a Stripe charge response.
///
/// An `id` means the charge was captured. An `error` object means it was
/// refused, reported with its `code` (or `type` when there is no code).
///
/// # Errors
///
/// Returns `PaymentError::UnexpectedResponse` when the body is neither.
pub fn interpret_charge(body: Value, requested: Cents) -> Result<ChargeResult, PaymentError> {
    if let Some(error) = body.get("error") {
        let code = error
            .get("code")
            .or_else(|| error.get("type"))
            .and_then(Value::as_str)
            .unwrap_or("card_error")
            .to_string();
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or(storehouse_core::envelope::DEFAULT_ERROR_MESSAGE)
            .to_string();
        return Ok(ChargeResult::declined(VENDOR, &code, message, body));
    }

    let Some(id) = body.get("id").and_then(Value::as_str).map(str::to_string) else {
        return Err(PaymentError::UnexpectedResponse(
            "missing both `id` and `error`".to_string(),
        ));
    };

    let amount = body
        .get("amount")
        .and_then(Value::as_i64)
        .map_or(requested, Cents::new);
    let last4 = card_last4(&body).unwrap_or_default();
    let message = format!("Card xxxxxxxxxxxx{last4} successfully charged for {amount}");

    Ok(ChargeResult::captured(VENDOR, id, message, body))
}

/// Last four card digits, wherever this API version put them.
fn card_last4(body: &Value) -> Option<String> {
    ["/card/last4", "/source/last4", "/payment_method_details/card/last4"]
        .iter()
        .find_map(|pointer| body.pointer(pointer).and_then(Value::as_str))
        .map(str::to_string)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_captured_charge() {
        let body = json!({
            "id": "ch_123",
            "object": "charge",
            "amount": 2500,
            "source": {"object": "card", "last4": "4242"}
        });
        let result = interpret_charge(body, Cents::new(2500)).unwrap();
        assert!(result.success);
        assert_eq!(result.code, "OK");
        assert_eq!(result.charge_id.as_deref(), Some("ch_123"));
        assert_eq!(
            result.message,
            "Card xxxxxxxxxxxx4242 successfully charged for $25.00"
        );
    }

    #[test]
    fn test_last4_from_payment_method_details() {
        let body = json!({
            "id": "ch_9",
            "payment_method_details": {"card": {"last4": "0005"}}
        });
        let result = interpret_charge(body, Cents::new(199)).unwrap();
        assert_eq!(
            result.message,
            "Card xxxxxxxxxxxx0005 successfully charged for $1.99"
        );
    }

    #[test]
    fn test_declined_charge_uses_vendor_code() {
        let body = json!({
            "error": {
                "type": "card_error",
                "code": "card_declined",
                "message": "Your card was declined."
            }
        });
        let result = interpret_charge(body.clone(), Cents::new(2500)).unwrap();
        assert!(!result.success);
        assert_eq!(result.code, "CARD_DECLINED");
        assert_eq!(result.message, "Your card was declined.");
        assert_eq!(result.vendor_response, body);

        let envelope = result.into_envelope();
        assert_eq!(envelope.vendor_response.unwrap()["vendor"], "stripe");
    }

    #[test]
    fn test_error_without_code_falls_back_to_type() {
        let body = json!({"error": {"type": "invalid_request_error", "message": "No such token"}});
        let result = interpret_charge(body, Cents::new(100)).unwrap();
        assert_eq!(result.code, "INVALID_REQUEST_ERROR");
    }

    #[test]
    fn test_unrecognized_body() {
        assert!(matches!(
            interpret_charge(json!({"object": "list"}), Cents::new(100)),
            Err(PaymentError::UnexpectedResponse(_))
        ));
    }
}
