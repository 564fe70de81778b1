//! Postal address fields.

use serde::{Deserialize, Serialize};

/// The recognized fields of a postal address.
///
/// Missing fields deserialize as empty strings, matching how checkout forms
/// submit optional lines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AddressFields {
    pub line_1: String,
    pub line_2: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub country: String,
}

impl AddressFields {
    /// Whether the fields needed to ship somewhere are present.
    #[must_use]
    pub fn is_deliverable(&self) -> bool {
        [&self.line_1, &self.city, &self.zip]
            .iter()
            .all(|field| !field.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_fills_defaults() {
        let address: AddressFields =
            serde_json::from_str(r#"{"line_1":"1 Main St","city":"Springfield","zip":"01101"}"#)
                .unwrap_or_default();
        assert_eq!(address.line_2, "");
        assert!(address.is_deliverable());
    }

    #[test]
    fn test_not_deliverable_without_zip() {
        let address = AddressFields {
            line_1: "1 Main St".into(),
            city: "Springfield".into(),
            ..AddressFields::default()
        };
        assert!(!address.is_deliverable());
    }
}
