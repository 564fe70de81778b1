//! The normalized response envelope returned by every storefront operation.
//!
//! ```json
//! {"success": false, "code": "ERROR", "message": "...", "vendor_response": false}
//! ```
//!
//! Defaults describe an unspecified error, so an operation that never sets
//! anything reports failure. `vendor_response` is either the raw vendor
//! payload tagged with the vendor's name, or the literal `false`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::shipping::ShippingOption;

/// Well-known envelope codes. Vendor error codes are passed through
/// upper-cased and are not listed here.
pub mod codes {
    pub const OK: &str = "OK";
    pub const ERROR: &str = "ERROR";
    pub const INVALID_REQUEST: &str = "INVALID_REQUEST";
    pub const NOT_AVAILABLE: &str = "NOT_AVAILABLE";
    pub const EMPTY_CART: &str = "EMPTY_CART";
    pub const ALREADY_ORDERED: &str = "ALREADY_ORDERED";
    pub const FAILED_NONCE: &str = "FAILED_NONCE";
    pub const NO_TEMPLATE: &str = "NO_TEMPLATE";
    pub const INVALID_EMAIL: &str = "INVALID_EMAIL";
    pub const WEAK_PASSWORD: &str = "WEAK_PASSWORD";
    pub const CUSTOMER_EXISTS: &str = "CUSTOMER_EXISTS";
    pub const SHIPPING_DISABLED: &str = "SHIPPING_DISABLED";
}

/// Message used when nothing more specific is known.
pub const DEFAULT_ERROR_MESSAGE: &str = "An error occurred, please try again.";

/// Normalized `{success, code, message, vendor_response, options}` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub success: bool,
    pub code: String,
    pub message: String,
    #[serde(default, with = "false_or_value")]
    pub vendor_response: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<ShippingOption>>,
}

impl Default for ResponseEnvelope {
    fn default() -> Self {
        Self {
            success: false,
            code: codes::ERROR.to_owned(),
            message: DEFAULT_ERROR_MESSAGE.to_owned(),
            vendor_response: None,
            options: None,
        }
    }
}

impl ResponseEnvelope {
    /// A successful `OK` response.
    #[must_use]
    pub fn ok(message: impl Into<String>) -> Self {
        Self::success(codes::OK, message)
    }

    /// A successful response with a specific code.
    #[must_use]
    pub fn success(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: true,
            code: code.into(),
            message: message.into(),
            ..Self::default()
        }
    }

    /// A failed response.
    #[must_use]
    pub fn failure(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            ..Self::default()
        }
    }

    /// Attach a raw vendor payload, tagged with the vendor's name.
    #[must_use]
    pub fn with_vendor_response(mut self, vendor: &str, raw: Value) -> Self {
        self.vendor_response = Some(tag_vendor(raw, vendor));
        self
    }

    /// Attach shipping options.
    #[must_use]
    pub fn with_options(mut self, options: Vec<ShippingOption>) -> Self {
        self.options = Some(options);
        self
    }
}

/// Add a `"vendor"` key to a raw vendor payload. Non-object payloads are
/// wrapped as `{"response": raw, "vendor": name}`.
#[must_use]
pub fn tag_vendor(raw: Value, vendor: &str) -> Value {
    match raw {
        Value::Object(mut map) => {
            map.insert("vendor".to_owned(), Value::String(vendor.to_owned()));
            Value::Object(map)
        }
        other => serde_json::json!({ "response": other, "vendor": vendor }),
    }
}

mod false_or_value {
    use serde::{Deserialize, Deserializer, Serializer};
    use serde_json::Value;

    #[allow(clippy::ref_option)]
    pub fn serialize<S: Serializer>(value: &Option<Value>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => serializer.serialize_some(v),
            None => serializer.serialize_bool(false),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(match value {
            Value::Bool(false) | Value::Null => None,
            other => Some(other),
        })
    }
}
