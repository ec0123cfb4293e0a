//! Payment gateway webhooks.
//!
//! Mercado Pago retries anything but a 2xx, and a retry cannot fix an
//! internal failure, so every delivery is answered 200. Failures are logged
//! and captured to Sentry instead.

use std::collections::HashMap;

use axum::{
    Json,
    body::Bytes,
    extract::{Query, State, rejection::QueryRejection},
    http::HeaderMap,
};
use serde::Serialize;
use serde_json::Value;

use crate::payments::signature;
use crate::services::{PaymentNotification, ReconcileOutcome, ReconcileService};
use crate::state::AppState;

/// Body returned to the gateway.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum WebhookResponse {
    Ok {
        success: bool,
        #[serde(flatten)]
        outcome: ReconcileOutcome,
    },
    Failed {
        success: bool,
        error: String,
    },
}

impl WebhookResponse {
    const fn ok(outcome: ReconcileOutcome) -> Json<Self> {
        Json(Self::Ok {
            success: true,
            outcome,
        })
    }
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Receive a Mercado Pago notification.
pub async fn mercadopago(
    State(state): State<AppState>,
    query: Result<Query<HashMap<String, String>>, QueryRejection>,
    headers: HeaderMap,
    body: Bytes,
) -> Json<WebhookResponse> {
    let query = query.map(|Query(q)| q).unwrap_or_default();
    // Some deliveries carry everything in the query string and an empty body
    let body: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);

    let Some(notification) = PaymentNotification::extract(&query, &body) else {
        tracing::debug!("Ignoring non-payment notification");
        return WebhookResponse::ok(ReconcileOutcome::Ignored);
    };

    if let Some(secret) = &state.config().mercado_pago.webhook_secret
        && let Err(e) = signature::verify(
            secret,
            header(&headers, "x-signature"),
            Some(&notification.payment_id),
            header(&headers, "x-request-id"),
        )
    {
        tracing::warn!(
            payment_id = %notification.payment_id,
            error = %e,
            "Webhook signature rejected"
        );
        return WebhookResponse::ok(ReconcileOutcome::Ignored);
    }

    let service = ReconcileService::new(state.orders(), state.users(), state.payments());
    match service.reconcile(&notification).await {
        Ok(outcome) => WebhookResponse::ok(outcome),
        Err(e) => {
            let event_id = sentry::capture_error(&e);
            tracing::error!(
                payment_id = %notification.payment_id,
                error = %e,
                sentry_event_id = %event_id,
                "Payment reconciliation failed"
            );
            Json(WebhookResponse::Failed {
                success: false,
                error: e.to_string(),
            })
        }
    }
}
