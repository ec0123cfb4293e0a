//! Scripted payment gateway.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use vitaforge_storefront::payments::{
    Payment, PaymentError, PaymentGateway, Preference, PreferenceRequest,
};

/// Gateway double: payments are registered by the test, preferences are
/// recorded.
#[derive(Default)]
pub struct FakeGateway {
    payments: Mutex<HashMap<String, Payment>>,
    preferences: Mutex<Vec<PreferenceRequest>>,
    failing: AtomicBool,
}

impl FakeGateway {
    /// Make `payment` visible to `get_payment`, replacing any earlier version.
    pub fn put_payment(&self, payment: Payment) {
        self.payments
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(payment.id.clone(), payment);
    }

    /// Preference requests received so far.
    #[must_use]
    pub fn preferences(&self) -> Vec<PreferenceRequest> {
        self.preferences
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Make preference creation fail with an API error.
    pub fn fail_preferences(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    fn name(&self) -> &'static str {
        "mercadopago"
    }

    async fn create_preference(
        &self,
        request: &PreferenceRequest,
    ) -> Result<Preference, PaymentError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(PaymentError::Api {
                status: 503,
                body: "service unavailable".to_string(),
            });
        }

        let mut preferences = self
            .preferences
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        preferences.push(request.clone());
        let id = format!("pref-{}", preferences.len());

        Ok(Preference {
            init_point: format!(
                "https://www.mercadopago.com.ar/checkout/v1/redirect?pref_id={id}"
            ),
            id,
        })
    }

    async fn get_payment(&self, payment_id: &str) -> Result<Payment, PaymentError> {
        self.payments
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(payment_id)
            .cloned()
            .ok_or_else(|| PaymentError::NotFound(payment_id.to_string()))
    }
}
