//! Order reads and the admin status console.

use thiserror::Error;
use tracing::instrument;

use vitaforge_core::OrderId;

use crate::db::{OrderRepository, Page, PageRequest, RepositoryError};
use crate::models::{AdminOrder, Order, OrderFilter, OrderStatusUpdate, RequestContext};

#[derive(Debug, Error)]
pub enum OrderError {
    #[error("order not found")]
    NotFound,

    /// The caller neither owns the order nor is an admin.
    #[error("not allowed to view this order")]
    Forbidden,

    #[error("status or paymentStatus is required")]
    EmptyUpdate,

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Order service.
pub struct OrderService<'a> {
    orders: &'a dyn OrderRepository,
}

impl<'a> OrderService<'a> {
    #[must_use]
    pub const fn new(orders: &'a dyn OrderRepository) -> Self {
        Self { orders }
    }

    /// Read an order as its owner or as an admin.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::NotFound` for an unknown id and
    /// `OrderError::Forbidden` when the caller may not see it.
    pub async fn get_for(&self, ctx: &RequestContext, id: OrderId) -> Result<Order, OrderError> {
        let order = self.orders.get(id).await?.ok_or(OrderError::NotFound)?;

        if order.user_id != ctx.user_id && !ctx.is_admin() {
            return Err(OrderError::Forbidden);
        }

        Ok(order)
    }

    /// The caller's order history.
    ///
    /// # Errors
    ///
    /// Returns an error if the database fails.
    pub async fn history(
        &self,
        ctx: &RequestContext,
        page: PageRequest,
    ) -> Result<Page<Order>, OrderError> {
        Ok(self
            .orders
            .list_for_user(ctx.user_id, page.normalized())
            .await?)
    }

    /// Admin listing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database fails.
    pub async fn list(
        &self,
        filter: OrderFilter,
        page: PageRequest,
    ) -> Result<Page<AdminOrder>, OrderError> {
        Ok(self.orders.list(filter, page.normalized()).await?)
    }

    /// Admin read with customer details.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::NotFound` for an unknown id.
    pub async fn get_admin(&self, id: OrderId) -> Result<AdminOrder, OrderError> {
        self.orders
            .get_with_customer(id)
            .await?
            .ok_or(OrderError::NotFound)
    }

    /// Overwrite status and/or payment status. Any transition is allowed.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::EmptyUpdate` when neither field is set and
    /// `OrderError::NotFound` for an unknown id.
    #[instrument(skip(self, ctx), fields(admin_id = %ctx.user_id))]
    pub async fn update_status(
        &self,
        ctx: &RequestContext,
        id: OrderId,
        update: OrderStatusUpdate,
    ) -> Result<Order, OrderError> {
        if update.is_empty() {
            return Err(OrderError::EmptyUpdate);
        }

        let order = self
            .orders
            .update_status(id, update)
            .await?
            .ok_or(OrderError::NotFound)?;

        tracing::info!(
            status = %order.status,
            payment_status = %order.payment_status,
            "Order status overridden"
        );

        Ok(order)
    }
}
