//! Order domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use vitaforge_core::{CartItem, Email, OrderId, OrderStatus, PaymentStatus, ShippingAddress, UserId};

/// A persisted order.
///
/// Line items and the shipping address are snapshots taken at creation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    /// Owner of the order.
    #[serde(rename = "user")]
    pub user_id: UserId,
    pub items: Vec<CartItem>,
    pub shipping_address: ShippingAddress,
    pub total_amount: Decimal,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_details: Option<PaymentDetails>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Whether this order already records the given gateway payment as paid.
    #[must_use]
    pub fn is_paid_by(&self, method: &str, transaction_id: &str) -> bool {
        self.payment_status == PaymentStatus::Paid
            && self
                .payment_details
                .as_ref()
                .is_some_and(|d| d.method == method && d.transaction_id == transaction_id)
    }
}

/// Settlement data recorded when the gateway confirms a payment.
///
/// `(method, transaction_id)` identifies the gateway payment and is unique
/// across all orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDetails {
    /// Gateway name, e.g. `mercadopago`.
    pub method: String,
    /// Gateway payment id.
    pub transaction_id: String,
    pub amount: Decimal,
    pub currency: String,
    pub paid_at: DateTime<Utc>,
}

/// Input for a checkout-created order. Always stored as `(pending, pending)`.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: UserId,
    pub items: Vec<CartItem>,
    pub shipping_address: ShippingAddress,
    pub total_amount: Decimal,
}

/// Input for an order rebuilt from an approved payment that matched no
/// existing order. Stored as `(processing, paid)`.
#[derive(Debug, Clone)]
pub struct NewPaidOrder {
    pub user_id: UserId,
    pub items: Vec<CartItem>,
    pub shipping_address: ShippingAddress,
    pub total_amount: Decimal,
    pub payment: PaymentDetails,
}

/// Manual status override from the admin console.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatusUpdate {
    pub status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
}

impl OrderStatusUpdate {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.status.is_none() && self.payment_status.is_none()
    }
}

/// Result of attaching an approved payment to an existing order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyPayment {
    /// The order moved to `(processing, paid)`.
    Applied(Order),
    /// The order was already paid by this same payment; nothing changed.
    AlreadyApplied(Order),
    /// No order with that id.
    NotFound,
}

/// Result of inserting a payment-backed order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertPaidOrder {
    Created(Order),
    /// Another order already carries this payment.
    Existing(Order),
}

/// Customer summary shown next to orders in the admin console.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderCustomer {
    pub id: UserId,
    pub name: String,
    pub email: Email,
}

/// An order with its customer, for admin listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminOrder {
    #[serde(flatten)]
    pub order: Order,
    pub customer: Option<OrderCustomer>,
}

/// Filter for admin order listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
}
