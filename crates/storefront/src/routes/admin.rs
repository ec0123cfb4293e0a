//! Admin order console.
//!
//! Every route requires an admin session; anyone else gets 401.

use axum::{
    Json,
    extract::{Path, Query, State, rejection::{JsonRejection, QueryRejection}},
};
use serde::Deserialize;

use vitaforge_core::OrderStatus;

use crate::db::PageRequest;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::RequireAdmin;
use crate::models::{AdminOrder, Order, OrderFilter, OrderStatusUpdate};
use crate::routes::orders::{OrderList, parse_order_id};
use crate::services::OrderService;
use crate::state::AppState;

/// Query parameters for the admin listing.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AdminOrderQuery {
    pub status: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl AdminOrderQuery {
    fn into_parts(self) -> Result<(OrderFilter, PageRequest)> {
        let status = self
            .status
            .filter(|s| !s.trim().is_empty())
            .map(|s| s.parse::<OrderStatus>())
            .transpose()
            .map_err(AppError::BadRequest)?;

        let defaults = PageRequest::default();
        Ok((
            OrderFilter { status },
            PageRequest {
                page: self.page.unwrap_or(defaults.page),
                limit: self.limit.unwrap_or(defaults.limit),
            },
        ))
    }
}

/// All orders, newest first, optionally filtered by status.
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    query: std::result::Result<Query<AdminOrderQuery>, QueryRejection>,
) -> Result<Json<OrderList<AdminOrder>>> {
    let Query(query) = query?;
    let (filter, page) = query.into_parts()?;

    let orders = OrderService::new(state.orders()).list(filter, page).await?;

    Ok(Json(orders.into()))
}

/// One order with its customer.
pub async fn show(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<String>,
) -> Result<Json<AdminOrder>> {
    let id = parse_order_id(&id)?;

    let order = OrderService::new(state.orders()).get_admin(id).await?;

    Ok(Json(order))
}

/// Overwrite status and/or payment status.
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<String>,
    payload: std::result::Result<Json<OrderStatusUpdate>, JsonRejection>,
) -> Result<Json<Order>> {
    let id = parse_order_id(&id)?;
    let Json(update) = payload?;

    let order = OrderService::new(state.orders())
        .update_status(&admin, id, update)
        .await?;

    let order_id = order.id.to_string();
    add_breadcrumb(
        "admin",
        "Order status updated",
        Some(&[("order_id", order_id.as_str())]),
    );

    Ok(Json(order))
}
