//! Checkout route handlers.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde::Serialize;
use tower_sessions::Session;

use crate::error::{Result, add_breadcrumb};
use crate::middleware::RequireAuth;
use crate::models::session_keys;
use crate::services::{CheckoutRequest, CheckoutService, CheckoutSession, PreferenceOnlyRequest};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub success: bool,
    #[serde(flatten)]
    pub session: CheckoutSession,
}

/// Create an order and its payment preference.
///
/// The session cart is emptied once the customer has somewhere to pay.
pub async fn checkout(
    State(state): State<AppState>,
    RequireAuth(ctx): RequireAuth,
    session: Session,
    payload: std::result::Result<Json<CheckoutRequest>, JsonRejection>,
) -> Result<Json<CheckoutResponse>> {
    let Json(request) = payload?;

    let checkout = CheckoutService::new(state.orders(), state.payments())
        .checkout(&ctx, request)
        .await?;

    if let Some(order_id) = checkout.order_id {
        let order_id = order_id.to_string();
        add_breadcrumb(
            "checkout",
            "Order created",
            Some(&[("order_id", order_id.as_str())]),
        );
    }
    session.remove::<serde_json::Value>(session_keys::CART).await?;

    Ok(Json(CheckoutResponse {
        success: true,
        session: checkout,
    }))
}

/// Create a payment preference without an order.
pub async fn preference(
    State(state): State<AppState>,
    RequireAuth(ctx): RequireAuth,
    payload: std::result::Result<Json<PreferenceOnlyRequest>, JsonRejection>,
) -> Result<Json<CheckoutResponse>> {
    let Json(request) = payload?;

    let checkout = CheckoutService::new(state.orders(), state.payments())
        .preference_only(&ctx, request)
        .await?;

    Ok(Json(CheckoutResponse {
        success: true,
        session: checkout,
    }))
}
