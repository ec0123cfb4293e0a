//! Mercado Pago REST client.
//!
//! Covers the two calls checkout needs: creating a hosted-checkout
//! preference and reading a payment back by id.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::json;
use tracing::{debug, error, instrument};

use super::types::{Payment, Preference, PreferenceRequest};
use super::{PaymentError, PaymentGateway};
use crate::config::MercadoPagoConfig;

/// Per-request timeout for gateway calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Name recorded as the payment method on settled orders.
pub const GATEWAY_NAME: &str = "mercadopago";

#[derive(Debug, Serialize)]
struct PreferenceItem<'a> {
    id: &'a str,
    title: &'a str,
    quantity: u32,
    unit_price: Decimal,
    currency_id: &'a str,
    description: &'a str,
    picture_url: &'a str,
}

#[derive(Debug, Serialize)]
struct BackUrls {
    success: String,
    failure: String,
    pending: String,
}

#[derive(Debug, Serialize)]
struct PreferenceBody<'a> {
    items: Vec<PreferenceItem<'a>>,
    back_urls: BackUrls,
    auto_return: &'static str,
    metadata: serde_json::Value,
    notification_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    external_reference: Option<String>,
}

/// Mercado Pago API client.
#[derive(Clone)]
pub struct MercadoPagoClient {
    client: Client,
    access_token: SecretString,
    api_url: String,
    currency: String,
    /// Public storefront URL used for back URLs and notifications.
    base_url: String,
}

impl std::fmt::Debug for MercadoPagoClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MercadoPagoClient")
            .field("access_token", &"[REDACTED]")
            .field("api_url", &self.api_url)
            .field("currency", &self.currency)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl MercadoPagoClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &MercadoPagoConfig, base_url: &str) -> Result<Self, PaymentError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| PaymentError::Request(e.to_string()))?;

        Ok(Self {
            client,
            access_token: config.access_token.clone(),
            api_url: config.api_url.trim_end_matches('/').to_owned(),
            currency: config.currency.clone(),
            base_url: base_url.trim_end_matches('/').to_owned(),
        })
    }

    fn preference_body<'a>(&'a self, request: &'a PreferenceRequest) -> PreferenceBody<'a> {
        let items = request
            .items
            .iter()
            .map(|item| PreferenceItem {
                id: &item.id,
                title: &item.name,
                quantity: item.quantity,
                unit_price: item.price,
                currency_id: &self.currency,
                description: &item.name,
                picture_url: item.image.as_deref().unwrap_or_default(),
            })
            .collect();

        let mut metadata = json!({ "userId": request.user_id.to_string() });
        if let Some(order_id) = request.order_id {
            metadata["orderId"] = json!(order_id.to_string());
        }

        PreferenceBody {
            items,
            back_urls: BackUrls {
                success: format!("{}/checkout/success", self.base_url),
                failure: format!("{}/checkout/failure", self.base_url),
                pending: format!("{}/checkout/pending", self.base_url),
            },
            auto_return: "approved",
            metadata,
            notification_url: format!("{}/webhooks/mercadopago", self.base_url),
            external_reference: request.order_id.map(|id| id.to_string()),
        }
    }

    async fn error_from(response: reqwest::Response) -> PaymentError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        error!(status = %status, body = %body, "Mercado Pago API error");
        PaymentError::Api {
            status: status.as_u16(),
            body,
        }
    }
}

#[async_trait]
impl PaymentGateway for MercadoPagoClient {
    fn name(&self) -> &'static str {
        GATEWAY_NAME
    }

    #[instrument(skip(self, request), fields(user_id = %request.user_id, items = request.items.len()))]
    async fn create_preference(
        &self,
        request: &PreferenceRequest,
    ) -> Result<Preference, PaymentError> {
        let response = self
            .client
            .post(format!("{}/checkout/preferences", self.api_url))
            .bearer_auth(self.access_token.expose_secret())
            .json(&self.preference_body(request))
            .send()
            .await
            .map_err(|e| PaymentError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        let preference: Preference = response
            .json()
            .await
            .map_err(|e| PaymentError::Response(e.to_string()))?;

        debug!(preference_id = %preference.id, "Preference created");

        Ok(preference)
    }

    #[instrument(skip(self))]
    async fn get_payment(&self, payment_id: &str) -> Result<Payment, PaymentError> {
        let response = self
            .client
            .get(format!("{}/v1/payments/{payment_id}", self.api_url))
            .bearer_auth(self.access_token.expose_secret())
            .send()
            .await
            .map_err(|e| PaymentError::Request(e.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(PaymentError::NotFound(payment_id.to_owned()));
        }
        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        let payment: Payment = response
            .json()
            .await
            .map_err(|e| PaymentError::Response(e.to_string()))?;

        debug!(status = ?payment.status, "Payment fetched");

        Ok(payment)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use vitaforge_core::{CartItem, OrderId, UserId};

    fn client() -> MercadoPagoClient {
        let config = MercadoPagoConfig {
            access_token: SecretString::from("APP_USR-test-token".to_string()),
            webhook_secret: None,
            api_url: "https://api.mercadopago.test/".to_string(),
            currency: "ARS".to_string(),
        };
        MercadoPagoClient::new(&config, "https://shop.example.com/").unwrap()
    }

    fn request(order_id: Option<OrderId>) -> PreferenceRequest {
        PreferenceRequest {
            items: vec![CartItem {
                id: "p1".to_string(),
                name: "Whey Protein".to_string(),
                price: Decimal::from(10),
                quantity: 2,
                image: None,
            }],
            user_id: UserId::new(7),
            order_id,
        }
    }

    #[test]
    fn test_preference_body_carries_urls_and_metadata() {
        let client = client();
        let request = request(Some(OrderId::new(42)));
        let body = serde_json::to_value(client.preference_body(&request)).unwrap();

        assert_eq!(body["auto_return"], "approved");
        assert_eq!(
            body["back_urls"]["success"],
            "https://shop.example.com/checkout/success"
        );
        assert_eq!(
            body["notification_url"],
            "https://shop.example.com/webhooks/mercadopago"
        );
        assert_eq!(body["metadata"]["userId"], "7");
        assert_eq!(body["metadata"]["orderId"], "42");
        assert_eq!(body["external_reference"], "42");
        assert_eq!(body["items"][0]["currency_id"], "ARS");
        assert_eq!(body["items"][0]["title"], "Whey Protein");
        assert_eq!(body["items"][0]["quantity"], 2);
        assert_eq!(body["items"][0]["picture_url"], "");
    }

    #[test]
    fn test_preference_only_body_has_no_order() {
        let client = client();
        let request = request(None);
        let body = serde_json::to_value(client.preference_body(&request)).unwrap();

        assert_eq!(body["metadata"]["userId"], "7");
        assert!(body["metadata"].get("orderId").is_none());
        assert!(body.get("external_reference").is_none());
    }

    #[test]
    fn test_debug_redacts_token() {
        let debug = format!("{:?}", client());
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("APP_USR-test-token"));
    }
}
