//! Customer order routes.

use axum::{
    Json,
    extract::{Path, Query, State, rejection::QueryRejection},
};
use serde::Serialize;

use vitaforge_core::OrderId;

use crate::db::{Page, PageRequest};
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::Order;
use crate::services::OrderService;
use crate::state::AppState;

/// Pagination block of list responses.
#[derive(Debug, Serialize)]
pub struct Pagination {
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub pages: u64,
}

/// A page of orders as returned to clients.
#[derive(Debug, Serialize)]
pub struct OrderList<T> {
    pub orders: Vec<T>,
    pub pagination: Pagination,
}

impl<T> From<Page<T>> for OrderList<T> {
    fn from(page: Page<T>) -> Self {
        Self {
            pagination: Pagination {
                total: page.total,
                page: page.request.page,
                limit: page.request.limit,
                pages: page.pages(),
            },
            orders: page.items,
        }
    }
}

/// Parse an order id path segment, answering 404 for garbage.
pub(crate) fn parse_order_id(raw: &str) -> Result<OrderId> {
    raw.parse()
        .map_err(|_| AppError::NotFound("Order not found".to_string()))
}

/// The caller's orders, newest first.
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(ctx): RequireAuth,
    page: std::result::Result<Query<PageRequest>, QueryRejection>,
) -> Result<Json<OrderList<Order>>> {
    let Query(page) = page?;

    let orders = OrderService::new(state.orders()).history(&ctx, page).await?;

    Ok(Json(orders.into()))
}

/// One order, for its owner or an admin.
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(ctx): RequireAuth,
    Path(id): Path<String>,
) -> Result<Json<Order>> {
    let id = parse_order_id(&id)?;

    let order = OrderService::new(state.orders()).get_for(&ctx, id).await?;

    Ok(Json(order))
}
