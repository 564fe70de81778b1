//! In-process vendor gateways for unit and integration tests.
//!
//! Built for `cfg(test)` and behind the `testing` feature.

#![allow(clippy::unwrap_used, clippy::missing_panics_doc, clippy::must_use_candidate)]

use std::sync::Mutex;

use async_trait::async_trait;

use storehouse_core::{ChargeResult, DeliveryEstimate, ShippingOption};

use crate::payments::{ChargeRequest, PaymentError, PaymentGateway};
use crate::shipping::{
    FulfillmentReceipt, FulfillmentRequest, InventoryFeed, InventoryLevel, RateQuote,
    ShippingError, ShippingGateway, Shipment,
};

pub const RECEIPT_BODY: &str =
    "<SubmitOrderResponse><Status>0</Status><TransactionId>tx-fake</TransactionId></SubmitOrderResponse>";

pub fn option(method: &str, service: &str, cost: &str) -> ShippingOption {
    ShippingOption {
        service: service.to_string(),
        method: method.to_string(),
        cost: cost.to_string(),
        delivery: DeliveryEstimate {
            min: "2".to_string(),
            max: "5".to_string(),
        },
    }
}

/// Records every request and answers with canned responses.
pub struct FakeShipping {
    enabled: bool,
    pub quote: Mutex<RateQuote>,
    pub levels: Mutex<Vec<InventoryLevel>>,
    shipments: Mutex<Vec<Shipment>>,
    fulfillments: Mutex<Vec<FulfillmentRequest>>,
}

impl FakeShipping {
    pub fn enabled() -> Self {
        Self::with_state(true)
    }

    pub fn disabled() -> Self {
        Self::with_state(false)
    }

    fn with_state(enabled: bool) -> Self {
        Self {
            enabled,
            quote: Mutex::new(RateQuote {
                status: Some("OK".to_string()),
                error_message: None,
                options: vec![option("GD", "USPS", "5.95"), option("2D", "UPS 2D", "18.50")],
                warnings: Vec::new(),
                body: "<RateResponse><Status>OK</Status></RateResponse>".to_string(),
            }),
            levels: Mutex::new(Vec::new()),
            shipments: Mutex::new(Vec::new()),
            fulfillments: Mutex::new(Vec::new()),
        }
    }

    pub fn set_level(&self, sku: &str, quantity: i32) {
        self.levels.lock().unwrap().push(InventoryLevel {
            sku: sku.to_string(),
            quantity,
        });
    }

    pub fn shipments(&self) -> Vec<Shipment> {
        self.shipments.lock().unwrap().clone()
    }

    pub fn fulfillments(&self) -> Vec<FulfillmentRequest> {
        self.fulfillments.lock().unwrap().clone()
    }
}

#[async_trait]
impl ShippingGateway for FakeShipping {
    fn vendor(&self) -> &'static str {
        "fake-shipping"
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    async fn quote(&self, shipment: &Shipment) -> Result<RateQuote, ShippingError> {
        if !self.enabled {
            return Err(ShippingError::Disabled);
        }
        self.shipments.lock().unwrap().push(shipment.clone());
        Ok(self.quote.lock().unwrap().clone())
    }

    async fn submit_order(
        &self,
        request: &FulfillmentRequest,
    ) -> Result<FulfillmentReceipt, ShippingError> {
        if !self.enabled {
            return Err(ShippingError::Disabled);
        }
        self.fulfillments.lock().unwrap().push(request.clone());
        Ok(FulfillmentReceipt {
            status: Some("0".to_string()),
            transaction_id: Some("tx-fake".to_string()),
            error_message: None,
            body: RECEIPT_BODY.to_string(),
        })
    }

    async fn inventory(&self, _session_key: &str) -> Result<InventoryFeed, ShippingError> {
        if !self.enabled {
            return Err(ShippingError::Disabled);
        }
        Ok(InventoryFeed {
            status: Some("OK".to_string()),
            levels: self.levels.lock().unwrap().clone(),
        })
    }
}

/// Captures every charge, or declines every charge.
pub struct FakePayments {
    decline: bool,
    charges: Mutex<Vec<ChargeRequest>>,
}

impl FakePayments {
    pub fn approving() -> Self {
        Self {
            decline: false,
            charges: Mutex::new(Vec::new()),
        }
    }

    pub fn declining() -> Self {
        Self {
            decline: true,
            charges: Mutex::new(Vec::new()),
        }
    }

    pub fn charges(&self) -> Vec<ChargeRequest> {
        self.charges.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentGateway for FakePayments {
    fn vendor(&self) -> &'static str {
        "fake"
    }

    async fn charge(&self, request: &ChargeRequest) -> Result<ChargeResult, PaymentError> {
        self.charges.lock().unwrap().push(request.clone());
        let raw = serde_json::json!({ "amount": request.amount.get() });
        Ok(if self.decline {
            ChargeResult::declined("fake", "card_declined", "Your card was declined.", raw)
        } else {
            ChargeResult::captured("fake", "ch_fake", "Charged.", raw)
        })
    }
}
