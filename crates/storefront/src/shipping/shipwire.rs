//! Shipwire XML services client.
//!
//! Rates, fulfillment and inventory are separate `POST` endpoints that each
//! take one XML document. Raw inventory responses are cached briefly per
//! session key so a sync pass over many products makes a single call.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, instrument, warn};

use crate::config::ShipwireConfig;

use super::xml::{self, Credentials};
use super::{
    FulfillmentReceipt, FulfillmentRequest, InventoryFeed, RateQuote, ShippingError,
    ShippingGateway, Shipment,
};

/// Vendor tag for raw Shipwire responses.
pub const VENDOR: &str = "shipwire";

const RATE_PATH: &str = "/exec/RateServices.php";
const FULFILLMENT_PATH: &str = "/exec/FulfillmentServices.php";
const INVENTORY_PATH: &str = "/exec/InventoryServices.php";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(45);
const MAX_REDIRECTS: usize = 5;
const INVENTORY_TTL: Duration = Duration::from_secs(10);

/// Client for the Shipwire XML API.
#[derive(Clone)]
pub struct ShipwireClient {
    inner: Arc<ShipwireClientInner>,
}

struct ShipwireClientInner {
    client: reqwest::Client,
    enabled: bool,
    username: String,
    password: SecretString,
    server: String,
    base_url: String,
    affiliate_id: Option<String>,
    inventory_cache: Cache<String, String>,
}

impl ShipwireClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &ShipwireConfig) -> Result<Self, ShippingError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .build()?;

        let inventory_cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(INVENTORY_TTL)
            .build();

        Ok(Self {
            inner: Arc::new(ShipwireClientInner {
                client,
                enabled: config.enabled,
                username: config.username.clone(),
                password: config.password.clone(),
                server: config.server.clone(),
                base_url: config.base_url.trim_end_matches('/').to_string(),
                affiliate_id: config.affiliate_id.clone(),
                inventory_cache,
            }),
        })
    }

    fn credentials(&self) -> Credentials<'_> {
        Credentials {
            username: &self.inner.username,
            password: self.inner.password.expose_secret(),
            server: &self.inner.server,
        }
    }

    fn ensure_enabled(&self) -> Result<(), ShippingError> {
        if self.inner.enabled {
            Ok(())
        } else {
            Err(ShippingError::Disabled)
        }
    }

    /// POST one XML document and return the response body.
    async fn post(&self, path: &str, body: String) -> Result<String, ShippingError> {
        let url = format!("{}{path}", self.inner.base_url);

        let response = self
            .inner
            .client
            .post(&url)
            .header("Content-Type", "application/xml")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            warn!(%status, path, "Shipwire returned a non-success status");
        }
        debug!(path, bytes = text.len(), "Shipwire response received");

        Ok(text)
    }
}

#[async_trait]
impl ShippingGateway for ShipwireClient {
    fn vendor(&self) -> &'static str {
        VENDOR
    }

    fn is_enabled(&self) -> bool {
        self.inner.enabled
    }

    #[instrument(skip(self, shipment), fields(reference = %shipment.reference))]
    async fn quote(&self, shipment: &Shipment) -> Result<RateQuote, ShippingError> {
        self.ensure_enabled()?;
        if shipment.lines.is_empty() {
            return Err(ShippingError::NothingToShip);
        }

        let document = xml::rate_request(self.credentials(), shipment)?;
        let body = self.post(RATE_PATH, document).await?;
        xml::parse_rate_response(&body)
    }

    #[instrument(skip(self, request), fields(reference = %request.shipment.reference))]
    async fn submit_order(
        &self,
        request: &FulfillmentRequest,
    ) -> Result<FulfillmentReceipt, ShippingError> {
        self.ensure_enabled()?;
        if request.shipment.lines.is_empty() {
            return Err(ShippingError::NothingToShip);
        }

        let document = xml::order_list(
            self.credentials(),
            self.inner.affiliate_id.as_deref(),
            request,
        )?;
        let body = self.post(FULFILLMENT_PATH, document).await?;
        xml::parse_fulfillment_response(&body)
    }

    #[instrument(skip(self))]
    async fn inventory(&self, session_key: &str) -> Result<InventoryFeed, ShippingError> {
        self.ensure_enabled()?;

        if let Some(body) = self.inner.inventory_cache.get(session_key).await {
            debug!("Inventory cache hit");
            return xml::parse_inventory_response(&body);
        }

        let document = xml::inventory_update(self.credentials())?;
        let body = self.post(INVENTORY_PATH, document).await?;
        let feed = xml::parse_inventory_response(&body)?;

        self.inner
            .inventory_cache
            .insert(session_key.to_string(), body)
            .await;

        Ok(feed)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use storehouse_core::{AddressFields, ShipmentLine};

    use super::*;

    fn disabled() -> ShipwireClient {
        ShipwireClient::new(&ShipwireConfig::default()).unwrap()
    }

    fn shipment() -> Shipment {
        Shipment {
            reference: "order-1".to_string(),
            address: AddressFields::default(),
            lines: vec![ShipmentLine {
                sku: "MUG-1".to_string(),
                quantity: 1,
            }],
        }
    }

    #[tokio::test]
    async fn test_disabled_client_short_circuits() {
        let client = disabled();
        assert!(!client.is_enabled());
        assert!(matches!(
            client.quote(&shipment()).await,
            Err(ShippingError::Disabled)
        ));
        assert!(matches!(
            client.inventory("sync").await,
            Err(ShippingError::Disabled)
        ));
    }

    #[tokio::test]
    async fn test_empty_shipment_is_rejected_before_any_request() {
        let config = ShipwireConfig {
            enabled: true,
            base_url: "http://127.0.0.1:9".to_string(),
            ..ShipwireConfig::default()
        };
        let client = ShipwireClient::new(&config).unwrap();
        let empty = Shipment {
            lines: Vec::new(),
            ..shipment()
        };
        assert!(matches!(
            client.quote(&empty).await,
            Err(ShippingError::NothingToShip)
        ));
    }
}
