//! Order repository.
//!
//! Line items and the shipping snapshot are stored as JSONB. Gateway payment
//! data lives in plain columns so `(payment_gateway, payment_id)` can carry a
//! unique constraint; both webhook write paths are single conditional
//! statements keyed on that pair.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use sqlx::types::Json;

use vitaforge_core::{
    CartItem, Email, OrderId, OrderStatus, PaymentStatus, ShippingAddress, UserId,
};

use super::{Page, PageRequest, RepositoryError, to_i64, to_u64};
use crate::models::{
    AdminOrder, ApplyPayment, InsertPaidOrder, NewOrder, NewPaidOrder, Order, OrderCustomer,
    OrderFilter, OrderStatusUpdate, PaymentDetails,
};

/// Port for order persistence.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Connectivity check for the readiness endpoint.
    async fn ping(&self) -> Result<(), RepositoryError>;

    /// Persist a checkout order in `(pending, pending)`.
    async fn create(&self, order: &NewOrder) -> Result<Order, RepositoryError>;

    async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError>;

    /// An order joined with its customer.
    async fn get_with_customer(&self, id: OrderId) -> Result<Option<AdminOrder>, RepositoryError>;

    /// A user's orders, newest first.
    async fn list_for_user(
        &self,
        user_id: UserId,
        page: PageRequest,
    ) -> Result<Page<Order>, RepositoryError>;

    /// All orders matching `filter`, newest first.
    async fn list(
        &self,
        filter: OrderFilter,
        page: PageRequest,
    ) -> Result<Page<AdminOrder>, RepositoryError>;

    /// Overwrite status fields. Returns `None` for an unknown id.
    async fn update_status(
        &self,
        id: OrderId,
        update: OrderStatusUpdate,
    ) -> Result<Option<Order>, RepositoryError>;

    /// Mark an order `(processing, paid)` with the given payment, unless it is
    /// already paid by that same payment.
    async fn apply_payment(
        &self,
        id: OrderId,
        payment: &PaymentDetails,
    ) -> Result<ApplyPayment, RepositoryError>;

    /// Insert a `(processing, paid)` order unless one already carries the
    /// payment, in which case that order is returned.
    async fn insert_paid(&self, order: &NewPaidOrder) -> Result<InsertPaidOrder, RepositoryError>;
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    user_id: UserId,
    items: Json<Vec<CartItem>>,
    shipping_address: Json<ShippingAddress>,
    total_amount: Decimal,
    status: OrderStatus,
    payment_status: PaymentStatus,
    payment_gateway: Option<String>,
    payment_id: Option<String>,
    payment_amount: Option<Decimal>,
    payment_currency: Option<String>,
    paid_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let payment_details = match (
            row.payment_gateway,
            row.payment_id,
            row.payment_amount,
            row.payment_currency,
            row.paid_at,
        ) {
            (Some(method), Some(transaction_id), Some(amount), Some(currency), Some(paid_at)) => {
                Some(PaymentDetails {
                    method,
                    transaction_id,
                    amount,
                    currency,
                    paid_at,
                })
            }
            (None, None, None, None, None) => None,
            _ => {
                return Err(RepositoryError::DataCorruption(format!(
                    "order {} has partial payment details",
                    row.id
                )));
            }
        };

        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            items: row.items.0,
            shipping_address: row.shipping_address.0,
            total_amount: row.total_amount,
            status: row.status,
            payment_status: row.payment_status,
            payment_details,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct AdminOrderRow {
    #[sqlx(flatten)]
    order: OrderRow,
    customer_name: Option<String>,
    customer_email: Option<String>,
}

impl TryFrom<AdminOrderRow> for AdminOrder {
    type Error = RepositoryError;

    fn try_from(row: AdminOrderRow) -> Result<Self, Self::Error> {
        let order = Order::try_from(row.order)?;
        let customer = match (row.customer_name, row.customer_email) {
            (Some(name), Some(email)) => Some(OrderCustomer {
                id: order.user_id,
                name,
                email: Email::parse(&email).map_err(|e| {
                    RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
                })?,
            }),
            _ => None,
        };
        Ok(Self { order, customer })
    }
}

const ORDER_COLUMNS: &str = "o.id, o.user_id, o.items, o.shipping_address, o.total_amount, \
     o.status, o.payment_status, o.payment_gateway, o.payment_id, o.payment_amount, \
     o.payment_currency, o.paid_at, o.created_at, o.updated_at";

const CUSTOMER_COLUMNS: &str = "u.name AS customer_name, u.email AS customer_email";

/// `PostgreSQL` implementation of [`OrderRepository`].
#[derive(Clone)]
pub struct PgOrderRepository {
    pool: PgPool,
}

impl PgOrderRepository {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_by_payment(
        &self,
        gateway: &str,
        payment_id: &str,
    ) -> Result<Option<Order>, RepositoryError> {
        let row: Option<OrderRow> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders o
             WHERE o.payment_gateway = $1 AND o.payment_id = $2"
        ))
        .bind(gateway)
        .bind(payment_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }
}

#[async_trait]
impl OrderRepository for PgOrderRepository {
    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn create(&self, order: &NewOrder) -> Result<Order, RepositoryError> {
        let row: OrderRow = sqlx::query_as(&format!(
            "INSERT INTO orders AS o (user_id, items, shipping_address, total_amount)
             VALUES ($1, $2, $3, $4)
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(order.user_id)
        .bind(Json(&order.items))
        .bind(Json(&order.shipping_address))
        .bind(order.total_amount)
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row: Option<OrderRow> =
            sqlx::query_as(&format!("SELECT {ORDER_COLUMNS} FROM orders o WHERE o.id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn get_with_customer(&self, id: OrderId) -> Result<Option<AdminOrder>, RepositoryError> {
        let row: Option<AdminOrderRow> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS}, {CUSTOMER_COLUMNS}
             FROM orders o LEFT JOIN users u ON u.id = o.user_id
             WHERE o.id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn list_for_user(
        &self,
        user_id: UserId,
        page: PageRequest,
    ) -> Result<Page<Order>, RepositoryError> {
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders o
             WHERE o.user_id = $1
             ORDER BY o.created_at DESC, o.id DESC
             LIMIT $2 OFFSET $3"
        ))
        .bind(user_id)
        .bind(i64::from(page.limit))
        .bind(to_i64(page.offset()))
        .fetch_all(&self.pool)
        .await?;

        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(Page {
            items: rows
                .into_iter()
                .map(TryInto::try_into)
                .collect::<Result<_, _>>()?,
            total: to_u64(total),
            request: page,
        })
    }

    async fn list(
        &self,
        filter: OrderFilter,
        page: PageRequest,
    ) -> Result<Page<AdminOrder>, RepositoryError> {
        let rows: Vec<AdminOrderRow> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS}, {CUSTOMER_COLUMNS}
             FROM orders o LEFT JOIN users u ON u.id = o.user_id
             WHERE ($1::order_status IS NULL OR o.status = $1)
             ORDER BY o.created_at DESC, o.id DESC
             LIMIT $2 OFFSET $3"
        ))
        .bind(filter.status)
        .bind(i64::from(page.limit))
        .bind(to_i64(page.offset()))
        .fetch_all(&self.pool)
        .await?;

        let (total,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM orders WHERE ($1::order_status IS NULL OR status = $1)",
        )
        .bind(filter.status)
        .fetch_one(&self.pool)
        .await?;

        Ok(Page {
            items: rows
                .into_iter()
                .map(TryInto::try_into)
                .collect::<Result<_, _>>()?,
            total: to_u64(total),
            request: page,
        })
    }

    async fn update_status(
        &self,
        id: OrderId,
        update: OrderStatusUpdate,
    ) -> Result<Option<Order>, RepositoryError> {
        let row: Option<OrderRow> = sqlx::query_as(&format!(
            "UPDATE orders AS o
             SET status = COALESCE($2, o.status),
                 payment_status = COALESCE($3, o.payment_status),
                 updated_at = now()
             WHERE o.id = $1
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(id)
        .bind(update.status)
        .bind(update.payment_status)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn apply_payment(
        &self,
        id: OrderId,
        payment: &PaymentDetails,
    ) -> Result<ApplyPayment, RepositoryError> {
        // Concurrent deliveries block on the row lock; the loser re-evaluates
        // the WHERE clause against the committed row and matches nothing.
        let row: Option<OrderRow> = sqlx::query_as(&format!(
            "UPDATE orders AS o
             SET status = 'processing',
                 payment_status = 'paid',
                 payment_gateway = $2,
                 payment_id = $3,
                 payment_amount = $4,
                 payment_currency = $5,
                 paid_at = $6,
                 updated_at = now()
             WHERE o.id = $1
               AND NOT (o.payment_status = 'paid'
                        AND o.payment_gateway IS NOT DISTINCT FROM $2
                        AND o.payment_id IS NOT DISTINCT FROM $3)
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(id)
        .bind(&payment.method)
        .bind(&payment.transaction_id)
        .bind(payment.amount)
        .bind(&payment.currency)
        .bind(payment.paid_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::from_insert(e, "payment"))?;

        if let Some(row) = row {
            return Ok(ApplyPayment::Applied(row.try_into()?));
        }

        Ok(match self.get(id).await? {
            Some(order) => ApplyPayment::AlreadyApplied(order),
            None => ApplyPayment::NotFound,
        })
    }

    async fn insert_paid(&self, order: &NewPaidOrder) -> Result<InsertPaidOrder, RepositoryError> {
        let row: Option<OrderRow> = sqlx::query_as(&format!(
            "INSERT INTO orders AS o (
                 user_id, items, shipping_address, total_amount, status, payment_status,
                 payment_gateway, payment_id, payment_amount, payment_currency, paid_at
             )
             VALUES ($1, $2, $3, $4, 'processing', 'paid', $5, $6, $7, $8, $9)
             ON CONFLICT ON CONSTRAINT orders_gateway_payment_unique DO NOTHING
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(order.user_id)
        .bind(Json(&order.items))
        .bind(Json(&order.shipping_address))
        .bind(order.total_amount)
        .bind(&order.payment.method)
        .bind(&order.payment.transaction_id)
        .bind(order.payment.amount)
        .bind(&order.payment.currency)
        .bind(order.payment.paid_at)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = row {
            return Ok(InsertPaidOrder::Created(row.try_into()?));
        }

        self.find_by_payment(&order.payment.method, &order.payment.transaction_id)
            .await?
            .map(InsertPaidOrder::Existing)
            .ok_or_else(|| {
                RepositoryError::Conflict(format!(
                    "payment {} conflicted but no order carries it",
                    order.payment.transaction_id
                ))
            })
    }
}
