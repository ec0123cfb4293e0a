//! Checkout orchestration.
//!
//! Persists a pending order and asks the gateway for a hosted-checkout
//! preference tagged with the order id. A gateway failure after the insert
//! leaves the order `pending/pending`; reconciliation never touches it and
//! there is no rollback.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

use vitaforge_core::{CartItem, OrderId, ShippingAddress};

use crate::db::{OrderRepository, RepositoryError};
use crate::models::{NewOrder, RequestContext};
use crate::payments::{PaymentError, PaymentGateway, PreferenceRequest};

#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Incomplete checkout data.
    #[error("{0}")]
    Invalid(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Payment(#[from] PaymentError),
}

/// Checkout form. Every field is optional on the wire so that missing data
/// is reported as a validation error rather than a parse failure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub items: Option<Vec<CartItem>>,
    pub shipping_address: Option<ShippingAddress>,
    pub total_amount: Option<Decimal>,
}

/// Preference-only checkout form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PreferenceOnlyRequest {
    pub items: Option<Vec<CartItem>>,
}

/// Where to send the customer to pay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSession {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<OrderId>,
    pub preference_id: String,
    pub init_point: String,
}

struct ValidCheckout {
    items: Vec<CartItem>,
    shipping_address: ShippingAddress,
    total_amount: Decimal,
}

impl CheckoutRequest {
    fn validate(self) -> Result<ValidCheckout, CheckoutError> {
        let items = non_empty_items(self.items)?;

        let shipping_address = self
            .shipping_address
            .ok_or_else(|| CheckoutError::Invalid("shippingAddress is required".to_string()))?;
        if let Some(field) = shipping_address.first_missing_field() {
            return Err(CheckoutError::Invalid(format!(
                "shippingAddress.{field} is required"
            )));
        }

        let total_amount = self
            .total_amount
            .ok_or_else(|| CheckoutError::Invalid("totalAmount is required".to_string()))?;
        if total_amount <= Decimal::ZERO {
            return Err(CheckoutError::Invalid(
                "totalAmount must be greater than zero".to_string(),
            ));
        }
        // Stored as NUMERIC(14, 2); anything finer or larger would be rounded
        // or refused by the database.
        if total_amount.normalize().scale() > TOTAL_SCALE {
            return Err(CheckoutError::Invalid(format!(
                "totalAmount must have at most {TOTAL_SCALE} decimal places"
            )));
        }
        if total_amount > max_total() {
            return Err(CheckoutError::Invalid("totalAmount is too large".to_string()));
        }

        Ok(ValidCheckout {
            items,
            shipping_address,
            total_amount,
        })
    }
}

/// Decimal places kept for order totals.
const TOTAL_SCALE: u32 = 2;

fn max_total() -> Decimal {
    Decimal::new(99_999_999_999_999, TOTAL_SCALE)
}

fn non_empty_items(items: Option<Vec<CartItem>>) -> Result<Vec<CartItem>, CheckoutError> {
    match items {
        Some(items) if !items.is_empty() => Ok(items),
        _ => Err(CheckoutError::Invalid("items are required".to_string())),
    }
}

/// Checkout service.
pub struct CheckoutService<'a> {
    orders: &'a dyn OrderRepository,
    payments: &'a dyn PaymentGateway,
}

impl<'a> CheckoutService<'a> {
    #[must_use]
    pub const fn new(orders: &'a dyn OrderRepository, payments: &'a dyn PaymentGateway) -> Self {
        Self { orders, payments }
    }

    /// Create a pending order and its payment preference.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::Invalid` for incomplete input, or the
    /// repository/gateway error that stopped the flow.
    #[instrument(skip(self, ctx, request), fields(user_id = %ctx.user_id))]
    pub async fn checkout(
        &self,
        ctx: &RequestContext,
        request: CheckoutRequest,
    ) -> Result<CheckoutSession, CheckoutError> {
        let valid = request.validate()?;

        let order = self
            .orders
            .create(&NewOrder {
                user_id: ctx.user_id,
                items: valid.items,
                shipping_address: valid.shipping_address,
                total_amount: valid.total_amount,
            })
            .await?;

        tracing::info!(order_id = %order.id, total = %order.total_amount, "Order created");

        let preference = self
            .payments
            .create_preference(&PreferenceRequest {
                items: order.items.clone(),
                user_id: ctx.user_id,
                order_id: Some(order.id),
            })
            .await
            .inspect_err(|e| {
                tracing::warn!(order_id = %order.id, error = %e, "Preference failed, order left pending");
            })?;

        Ok(CheckoutSession {
            order_id: Some(order.id),
            preference_id: preference.id,
            init_point: preference.init_point,
        })
    }

    /// Create a preference without an order. The reconciler builds the order
    /// from the payment once it is approved.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::Invalid` when there are no items, or the
    /// gateway error.
    #[instrument(skip(self, ctx, request), fields(user_id = %ctx.user_id))]
    pub async fn preference_only(
        &self,
        ctx: &RequestContext,
        request: PreferenceOnlyRequest,
    ) -> Result<CheckoutSession, CheckoutError> {
        let items = non_empty_items(request.items)?;

        let preference = self
            .payments
            .create_preference(&PreferenceRequest {
                items,
                user_id: ctx.user_id,
                order_id: None,
            })
            .await?;

        Ok(CheckoutSession {
            order_id: None,
            preference_id: preference.id,
            init_point: preference.init_point,
        })
    }
}
