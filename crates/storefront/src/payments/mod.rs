//! Payment gateway integration.
//!
//! This module provides:
//! - [`PaymentGateway`], the port checkout and reconciliation talk to
//! - [`MercadoPagoClient`], the production adapter
//! - [`PaymentMetadata`] parsing for the ids we tag preferences with
//! - Webhook signature verification
//!
//! # Flow
//!
//! 1. Checkout creates a preference carrying `{userId, orderId}` metadata
//! 2. The customer pays on the gateway's hosted page
//! 3. The gateway posts a notification with only the payment id
//! 4. The reconciler fetches the payment and settles the order

mod error;
mod mercadopago;
mod metadata;
pub mod signature;
mod types;

use async_trait::async_trait;

pub use error::PaymentError;
pub use mercadopago::MercadoPagoClient;
pub use metadata::{MetadataError, PaymentMetadata};
pub use types::{
    AdditionalInfo, GatewayPaymentStatus, Payment, PaymentItem, Preference, PreferenceRequest,
};

/// Port for a hosted-checkout payment gateway.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Short gateway name recorded as the payment method, e.g. `mercadopago`.
    fn name(&self) -> &'static str;

    /// Create a checkout preference and return its redirect URL.
    async fn create_preference(
        &self,
        request: &PreferenceRequest,
    ) -> Result<Preference, PaymentError>;

    /// Fetch the authoritative state of a payment.
    async fn get_payment(&self, payment_id: &str) -> Result<Payment, PaymentError>;
}
