//! Shipwire XML request/response documents.
//!
//! Requests are serialized with `quick-xml`'s serde support, so every value is
//! escaped. Responses are parsed leniently: unknown elements are ignored and
//! missing ones default to empty.

use quick_xml::{de, se};
use serde::{Deserialize, Serialize};

use storehouse_core::{DeliveryEstimate, ShippingOption};

use super::{
    FulfillmentReceipt, FulfillmentRequest, InventoryFeed, InventoryLevel, RateQuote,
    ShippingError, Shipment, VendorWarning,
};

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

/// Warehouse code that lets the vendor choose.
const ANY_WAREHOUSE: &str = "00";

/// Vendor login sent with every request.
#[derive(Debug, Clone, Copy)]
pub struct Credentials<'a> {
    pub username: &'a str,
    pub password: &'a str,
    /// `Production` or `Test`
    pub server: &'a str,
}

// =============================================================================
// Requests
// =============================================================================

#[derive(Serialize)]
#[serde(rename = "RateRequest")]
struct RateRequestDoc<'a> {
    #[serde(rename = "Username")]
    username: &'a str,
    #[serde(rename = "Password")]
    password: &'a str,
    #[serde(rename = "Order")]
    order: OrderDoc<'a>,
}

#[derive(Serialize)]
#[serde(rename = "OrderList")]
struct OrderListDoc<'a> {
    #[serde(rename = "Username")]
    username: &'a str,
    #[serde(rename = "Password")]
    password: &'a str,
    #[serde(rename = "Server")]
    server: &'a str,
    #[serde(rename = "AffiliateId", skip_serializing_if = "Option::is_none")]
    affiliate_id: Option<&'a str>,
    #[serde(rename = "Order")]
    order: OrderDoc<'a>,
}

#[derive(Serialize)]
#[serde(rename = "InventoryUpdate")]
struct InventoryUpdateDoc<'a> {
    #[serde(rename = "Username")]
    username: &'a str,
    #[serde(rename = "Password")]
    password: &'a str,
    #[serde(rename = "Server")]
    server: &'a str,
}

#[derive(Serialize)]
struct OrderDoc<'a> {
    #[serde(rename = "@id")]
    id: &'a str,
    #[serde(rename = "Warehouse")]
    warehouse: &'static str,
    #[serde(rename = "AddressInfo")]
    address: AddressInfoDoc<'a>,
    #[serde(rename = "Shipping", skip_serializing_if = "Option::is_none")]
    shipping: Option<&'a str>,
    #[serde(rename = "Item")]
    items: Vec<ItemDoc<'a>>,
}

#[derive(Serialize)]
struct AddressInfoDoc<'a> {
    #[serde(rename = "@type")]
    kind: &'static str,
    #[serde(rename = "Address1")]
    address1: &'a str,
    #[serde(rename = "Address2")]
    address2: &'a str,
    #[serde(rename = "City")]
    city: &'a str,
    #[serde(rename = "State")]
    state: &'a str,
    #[serde(rename = "Country")]
    country: &'a str,
    #[serde(rename = "Zip")]
    zip: &'a str,
    #[serde(rename = "Phone", skip_serializing_if = "Option::is_none")]
    phone: Option<&'a str>,
    #[serde(rename = "Email", skip_serializing_if = "Option::is_none")]
    email: Option<&'a str>,
}

#[derive(Serialize)]
struct ItemDoc<'a> {
    #[serde(rename = "@num")]
    num: usize,
    #[serde(rename = "Code")]
    code: &'a str,
    #[serde(rename = "Quantity")]
    quantity: u32,
}

fn order_doc<'a>(
    shipment: &'a Shipment,
    shipping: Option<&'a str>,
    email: Option<&'a str>,
) -> OrderDoc<'a> {
    let address = &shipment.address;
    OrderDoc {
        id: &shipment.reference,
        warehouse: ANY_WAREHOUSE,
        address: AddressInfoDoc {
            kind: "ship",
            address1: &address.line_1,
            address2: &address.line_2,
            city: &address.city,
            state: &address.state,
            country: &address.country,
            zip: &address.zip,
            phone: email.map(|_| ""),
            email,
        },
        shipping,
        items: shipment
            .lines
            .iter()
            .enumerate()
            .map(|(num, line)| ItemDoc {
                num,
                code: &line.sku,
                quantity: line.quantity,
            })
            .collect(),
    }
}

fn document<T: Serialize>(doctype: &str, body: &T) -> Result<String, ShippingError> {
    let xml = se::to_string(body).map_err(|e| ShippingError::Xml(e.to_string()))?;
    Ok(format!(
        "{XML_DECLARATION}\n<!DOCTYPE {doctype} SYSTEM \"http://www.shipwire.com/exec/download/{doctype}.dtd\">\n{xml}"
    ))
}

/// Build a `RateRequest` document.
///
/// # Errors
///
/// Returns `ShippingError::Xml` if serialization fails.
pub fn rate_request(credentials: Credentials<'_>, shipment: &Shipment) -> Result<String, ShippingError> {
    document(
        "RateRequest",
        &RateRequestDoc {
            username: credentials.username,
            password: credentials.password,
            order: order_doc(shipment, None, None),
        },
    )
}

/// Build an `OrderList` fulfillment document.
///
/// # Errors
///
/// Returns `ShippingError::Xml` if serialization fails.
pub fn order_list(
    credentials: Credentials<'_>,
    affiliate_id: Option<&str>,
    request: &FulfillmentRequest,
) -> Result<String, ShippingError> {
    document(
        "OrderList",
        &OrderListDoc {
            username: credentials.username,
            password: credentials.password,
            server: credentials.server,
            affiliate_id,
            order: order_doc(&request.shipment, Some(&request.method), Some(&request.email)),
        },
    )
}

/// Build an `InventoryUpdate` document.
///
/// # Errors
///
/// Returns `ShippingError::Xml` if serialization fails.
pub fn inventory_update(credentials: Credentials<'_>) -> Result<String, ShippingError> {
    document(
        "InventoryUpdate",
        &InventoryUpdateDoc {
            username: credentials.username,
            password: credentials.password,
            server: credentials.server,
        },
    )
}

// =============================================================================
// Responses
// =============================================================================

/// Element text, ignoring attributes such as `currency` or `units`.
#[derive(Debug, Default, Deserialize)]
struct Text {
    #[serde(rename = "$text", default)]
    value: String,
}

#[derive(Debug, Deserialize)]
struct RateResponseDoc {
    #[serde(rename = "Status", default)]
    status: Option<String>,
    #[serde(rename = "ErrorMessage", default)]
    error_message: Option<String>,
    #[serde(rename = "Order", default)]
    order: Option<RateOrderDoc>,
    #[serde(rename = "Warnings", default)]
    warnings: Option<WarningsDoc>,
}

#[derive(Debug, Deserialize)]
struct RateOrderDoc {
    #[serde(rename = "Quotes", default)]
    quotes: Option<QuotesDoc>,
}

#[derive(Debug, Deserialize)]
struct QuotesDoc {
    #[serde(rename = "Quote", default)]
    quotes: Vec<QuoteDoc>,
}

#[derive(Debug, Deserialize)]
struct QuoteDoc {
    #[serde(rename = "@method", default)]
    method: String,
    #[serde(rename = "CarrierCode", default)]
    carrier_code: String,
    #[serde(rename = "Cost", default)]
    cost: Text,
    #[serde(rename = "DeliveryEstimate", default)]
    delivery: DeliveryDoc,
}

#[derive(Debug, Default, Deserialize)]
struct DeliveryDoc {
    #[serde(rename = "Minimum", default)]
    minimum: Text,
    #[serde(rename = "Maximum", default)]
    maximum: Text,
}

#[derive(Debug, Deserialize)]
struct WarningsDoc {
    #[serde(rename = "Warning", default)]
    warnings: Vec<WarningDoc>,
}

#[derive(Debug, Deserialize)]
struct WarningDoc {
    #[serde(rename = "@code", default)]
    code: String,
    #[serde(rename = "$text", default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct SubmitOrderResponseDoc {
    #[serde(rename = "Status", default)]
    status: Option<String>,
    #[serde(rename = "TransactionId", default)]
    transaction_id: Option<String>,
    #[serde(rename = "ErrorMessage", default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct InventoryResponseDoc {
    #[serde(rename = "Status", default)]
    status: Option<String>,
    #[serde(rename = "Product", default)]
    products: Vec<InventoryProductDoc>,
}

#[derive(Debug, Deserialize)]
struct InventoryProductDoc {
    #[serde(rename = "@code", default)]
    code: String,
    #[serde(rename = "@quantity", default)]
    quantity: i32,
}

fn parse<T: for<'de> Deserialize<'de>>(body: &str) -> Result<T, ShippingError> {
    de::from_str(body).map_err(|e| ShippingError::Xml(e.to_string()))
}

/// Parse a `RateResponse` document into a [`RateQuote`].
///
/// # Errors
///
/// Returns `ShippingError::Xml` if the body is not a parseable document.
pub fn parse_rate_response(body: &str) -> Result<RateQuote, ShippingError> {
    let doc: RateResponseDoc = parse(body)?;

    let options = doc
        .order
        .and_then(|o| o.quotes)
        .map(|q| q.quotes)
        .unwrap_or_default()
        .into_iter()
        .map(|quote| ShippingOption {
            service: quote.carrier_code.trim().to_string(),
            method: quote.method,
            cost: quote.cost.value.trim().to_string(),
            delivery: DeliveryEstimate {
                min: quote.delivery.minimum.value.trim().to_string(),
                max: quote.delivery.maximum.value.trim().to_string(),
            },
        })
        .collect();

    let warnings = doc
        .warnings
        .map(|w| w.warnings)
        .unwrap_or_default()
        .into_iter()
        .map(|w| VendorWarning {
            code: w.code,
            message: w.message.trim().to_string(),
        })
        .collect();

    Ok(RateQuote {
        status: doc.status,
        error_message: doc.error_message,
        options,
        warnings,
        body: body.to_string(),
    })
}

/// Parse a fulfillment response, keeping `body` as the receipt.
///
/// # Errors
///
/// Returns `ShippingError::Xml` if the body is not a parseable document.
pub fn parse_fulfillment_response(body: &str) -> Result<FulfillmentReceipt, ShippingError> {
    let doc: SubmitOrderResponseDoc = parse(body)?;
    Ok(FulfillmentReceipt {
        status: doc.status,
        transaction_id: doc.transaction_id,
        error_message: doc.error_message,
        body: body.to_string(),
    })
}

/// Parse an `InventoryUpdateResponse` document.
///
/// # Errors
///
/// Returns `ShippingError::Xml` if the body is not a parseable document.
pub fn parse_inventory_response(body: &str) -> Result<InventoryFeed, ShippingError> {
    let doc: InventoryResponseDoc = parse(body)?;
    Ok(InventoryFeed {
        status: doc.status,
        levels: doc
            .products
            .into_iter()
            .filter(|p| !p.code.is_empty())
            .map(|p| InventoryLevel {
                sku: p.code,
                quantity: p.quantity,
            })
            .collect(),
    })
}
