//! Normalized payment charge result.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::envelope::{ResponseEnvelope, codes};

/// Outcome of submitting a payment token to a gateway.
///
/// Exactly one branch fills `code`/`message`: the success branch (`OK` and a
/// confirmation) or the error branch (the vendor's code upper-cased and its
/// message verbatim). `vendor_response` always carries the raw payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChargeResult {
    pub success: bool,
    pub code: String,
    pub message: String,
    /// Gateway-assigned charge id on success.
    pub charge_id: Option<String>,
    pub vendor: String,
    pub vendor_response: Value,
}

impl ChargeResult {
    /// A captured charge.
    #[must_use]
    pub fn captured(
        vendor: &str,
        charge_id: impl Into<String>,
        message: impl Into<String>,
        raw: Value,
    ) -> Self {
        Self {
            success: true,
            code: codes::OK.to_owned(),
            message: message.into(),
            charge_id: Some(charge_id.into()),
            vendor: vendor.to_owned(),
            vendor_response: raw,
        }
    }

    /// A charge the vendor refused.
    #[must_use]
    pub fn declined(vendor: &str, code: &str, message: impl Into<String>, raw: Value) -> Self {
        Self {
            success: false,
            code: code.to_uppercase(),
            message: message.into(),
            charge_id: None,
            vendor: vendor.to_owned(),
            vendor_response: raw,
        }
    }

    /// Convert to the response envelope, tagging the raw payload.
    #[must_use]
    pub fn into_envelope(self) -> ResponseEnvelope {
        let envelope = if self.success {
            ResponseEnvelope::success(self.code, self.message)
        } else {
            ResponseEnvelope::failure(self.code, self.message)
        };
        envelope.with_vendor_response(&self.vendor, self.vendor_response)
    }
}
