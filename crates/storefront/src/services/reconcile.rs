//! Payment reconciliation.
//!
//! Turns a gateway notification into order state. The notification only
//! names a payment; status, amount and metadata are always read back from
//! the gateway.
//!
//! Both write paths are keyed on the `(gateway, payment id)` pair:
//! - metadata names an existing order: it is marked paid unless that same
//!   payment already did so
//! - otherwise: an order is rebuilt from the payment's line items and the
//!   customer's preferred address, inserted unless another order already
//!   carries the payment
//!
//! Replayed and concurrent deliveries therefore converge on a single order.

use std::collections::HashMap;

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::instrument;

use vitaforge_core::{AddressBook, OrderId, ShippingAddress, UserId};

use crate::db::{OrderRepository, RepositoryError, UserRepository};
use crate::models::{ApplyPayment, InsertPaidOrder, NewPaidOrder, PaymentDetails};
use crate::payments::{
    MetadataError, Payment, PaymentError, PaymentGateway, PaymentMetadata,
};

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error(transparent)]
    Payment(#[from] PaymentError),

    #[error(transparent)]
    Metadata(#[from] MetadataError),

    #[error("user {0} not found")]
    UserNotFound(UserId),

    #[error("user {0} has no shipping address")]
    NoShippingAddress(UserId),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// A payment event extracted from a webhook delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentNotification {
    pub payment_id: String,
}

impl PaymentNotification {
    /// Recognise a payment event in the query string or JSON body.
    ///
    /// Accepted shapes:
    /// - body `{"action": "payment.created" | "payment.updated", "data": {"id": …}}`
    /// - body `{"type": "payment", "data": {"id": …}}`
    /// - query `type=payment&data.id=…`
    /// - query `topic=payment&id=…`
    ///
    /// Returns `None` for anything else.
    #[must_use]
    pub fn extract(query: &HashMap<String, String>, body: &Value) -> Option<Self> {
        Self::from_body(body).or_else(|| Self::from_query(query))
    }

    fn from_body(body: &Value) -> Option<Self> {
        let is_payment = matches!(
            body.get("action").and_then(Value::as_str),
            Some("payment.created" | "payment.updated")
        ) || body.get("type").and_then(Value::as_str) == Some("payment");
        if !is_payment {
            return None;
        }

        let payment_id = match body.get("data")?.get("id")? {
            Value::String(s) => s.trim().to_owned(),
            Value::Number(n) => n.to_string(),
            _ => return None,
        };
        (!payment_id.is_empty()).then_some(Self { payment_id })
    }

    fn from_query(query: &HashMap<String, String>) -> Option<Self> {
        let get = |key: &str| query.get(key).map(|v| v.trim()).filter(|v| !v.is_empty());

        let payment_id = if get("type") == Some("payment") {
            get("data.id")
        } else if get("topic") == Some("payment") {
            get("id")
        } else {
            None
        }?;

        Some(Self {
            payment_id: payment_id.to_owned(),
        })
    }
}

/// What a delivery did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum ReconcileOutcome {
    /// An existing order moved to `(processing, paid)`.
    Updated {
        #[serde(rename = "orderId")]
        order_id: OrderId,
    },
    /// A new paid order was created from the payment.
    Created {
        #[serde(rename = "orderId")]
        order_id: OrderId,
    },
    /// The payment had already been applied to this order.
    AlreadyReconciled {
        #[serde(rename = "orderId")]
        order_id: OrderId,
    },
    /// The payment is not approved yet; nothing to do.
    NotApproved,
    /// Not a payment event, or it failed verification.
    Ignored,
}

/// Reconciliation service.
pub struct ReconcileService<'a> {
    orders: &'a dyn OrderRepository,
    users: &'a dyn UserRepository,
    payments: &'a dyn PaymentGateway,
}

impl<'a> ReconcileService<'a> {
    #[must_use]
    pub const fn new(
        orders: &'a dyn OrderRepository,
        users: &'a dyn UserRepository,
        payments: &'a dyn PaymentGateway,
    ) -> Self {
        Self {
            orders,
            users,
            payments,
        }
    }

    /// Apply a payment notification.
    ///
    /// # Errors
    ///
    /// Returns an error if the payment cannot be fetched, its metadata has no
    /// user, the fallback has no user or address to build an order from, or
    /// the database fails.
    #[instrument(skip(self), fields(payment_id = %notification.payment_id))]
    pub async fn reconcile(
        &self,
        notification: &PaymentNotification,
    ) -> Result<ReconcileOutcome, ReconcileError> {
        let payment = self.payments.get_payment(&notification.payment_id).await?;

        if !payment.status.is_approved() {
            tracing::info!(status = ?payment.status, "Payment not approved, ignoring");
            return Ok(ReconcileOutcome::NotApproved);
        }

        let metadata = PaymentMetadata::parse(&payment.metadata)?;
        let details = PaymentDetails {
            method: self.payments.name().to_owned(),
            transaction_id: payment.id.clone(),
            amount: payment.transaction_amount,
            currency: payment.currency_id.clone(),
            paid_at: Utc::now(),
        };

        if let Some(order_id) = metadata.order_id {
            match self.orders.apply_payment(order_id, &details).await? {
                ApplyPayment::Applied(order) => {
                    tracing::info!(order_id = %order.id, "Order paid");
                    return Ok(ReconcileOutcome::Updated { order_id: order.id });
                }
                ApplyPayment::AlreadyApplied(order) => {
                    tracing::info!(order_id = %order.id, "Payment already applied");
                    return Ok(ReconcileOutcome::AlreadyReconciled { order_id: order.id });
                }
                ApplyPayment::NotFound => {
                    tracing::warn!(order_id = %order_id, "Order from metadata not found, rebuilding");
                }
            }
        }

        self.create_from_payment(metadata.user_id, &payment, details)
            .await
    }

    async fn create_from_payment(
        &self,
        user_id: UserId,
        payment: &Payment,
        details: PaymentDetails,
    ) -> Result<ReconcileOutcome, ReconcileError> {
        let user = self
            .users
            .get_by_id(user_id)
            .await?
            .ok_or(ReconcileError::UserNotFound(user_id))?;

        let book = AddressBook::from_saved(self.users.addresses(user_id).await?);
        let address = book
            .preferred()
            .ok_or(ReconcileError::NoShippingAddress(user_id))?;

        let order = NewPaidOrder {
            user_id,
            items: payment.cart_items(),
            shipping_address: ShippingAddress::from_saved(&user.name, address),
            total_amount: payment.transaction_amount,
            payment: details,
        };

        Ok(match self.orders.insert_paid(&order).await? {
            InsertPaidOrder::Created(order) => {
                tracing::info!(order_id = %order.id, "Order created from payment");
                ReconcileOutcome::Created { order_id: order.id }
            }
            InsertPaidOrder::Existing(order) => {
                tracing::info!(order_id = %order.id, "Payment already has an order");
                ReconcileOutcome::AlreadyReconciled { order_id: order.id }
            }
        })
    }
}
