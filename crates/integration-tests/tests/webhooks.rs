//! Payment reconciliation tests through the Mercado Pago webhook.

#![allow(clippy::unwrap_used)]

use reqwest::StatusCode;
use secrecy::SecretString;
use serde_json::json;
use vitaforge_core::{AddressId, OrderStatus, PaymentStatus, SavedAddress};
use vitaforge_integration_tests::{
    TestContext, approved_payment, payment_event, sample_items,
};
use vitaforge_storefront::payments::{GatewayPaymentStatus, signature};

#[tokio::test]
async fn test_approved_payment_marks_order_paid() {
    let ctx = TestContext::new().await;
    let (client, user_id) = ctx.customer("Lucía", "lucia@example.com").await;
    let order_id = ctx.checkout(&client, &sample_items()).await;

    ctx.gateway
        .put_payment(approved_payment("1320001", user_id, Some(order_id)));

    let (status, body) = ctx.webhook(&payment_event("1320001")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"success": true, "outcome": "updated", "orderId": order_id.as_i32()})
    );

    let order = ctx.repo.order(order_id).unwrap();
    assert_eq!(order.status, OrderStatus::Processing);
    assert_eq!(order.payment_status, PaymentStatus::Paid);
    let details = order.payment_details.unwrap();
    assert_eq!(details.method, "mercadopago");
    assert_eq!(details.transaction_id, "1320001");
    assert_eq!(details.currency, "ARS");
}

#[tokio::test]
async fn test_replayed_notification_changes_nothing() {
    let ctx = TestContext::new().await;
    let (client, user_id) = ctx.customer("Lucía", "lucia@example.com").await;
    let order_id = ctx.checkout(&client, &sample_items()).await;
    ctx.gateway
        .put_payment(approved_payment("1320002", user_id, Some(order_id)));

    ctx.webhook(&payment_event("1320002")).await;
    let paid = ctx.repo.order(order_id).unwrap();

    let (status, body) = ctx.webhook(&payment_event("1320002")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "already_reconciled");
    assert_eq!(body["orderId"], order_id.as_i32());

    assert_eq!(ctx.repo.order(order_id).unwrap(), paid);
    assert_eq!(ctx.repo.orders().len(), 1);
}

#[tokio::test]
async fn test_pending_payment_is_not_applied() {
    let ctx = TestContext::new().await;
    let (client, user_id) = ctx.customer("Lucía", "lucia@example.com").await;
    let order_id = ctx.checkout(&client, &sample_items()).await;

    let mut payment = approved_payment("1320003", user_id, Some(order_id));
    payment.status = GatewayPaymentStatus::InProcess;
    ctx.gateway.put_payment(payment);

    let (_, body) = ctx.webhook(&payment_event("1320003")).await;
    assert_eq!(body, json!({"success": true, "outcome": "not_approved"}));

    let order = ctx.repo.order(order_id).unwrap();
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.payment_status, PaymentStatus::Pending);
}

#[tokio::test]
async fn test_non_payment_events_are_ignored() {
    let ctx = TestContext::new().await;

    let (status, body) = ctx
        .webhook(&json!({"action": "merchant_order.updated", "data": {"id": "77"}}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true, "outcome": "ignored"}));
}

#[tokio::test]
async fn test_query_string_notification_is_accepted() {
    let ctx = TestContext::new().await;
    let (client, user_id) = ctx.customer("Lucía", "lucia@example.com").await;
    let order_id = ctx.checkout(&client, &sample_items()).await;
    ctx.gateway
        .put_payment(approved_payment("1320004", user_id, Some(order_id)));

    let resp = ctx
        .client()
        .post(ctx.url("/webhooks/mercadopago?topic=payment&id=1320004"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["outcome"], "updated");
}

#[tokio::test]
async fn test_unknown_payment_still_answers_ok() {
    let ctx = TestContext::new().await;

    let (status, body) = ctx.webhook(&payment_event("does-not-exist")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("does-not-exist"));
}

#[tokio::test]
async fn test_missing_user_metadata_is_reported() {
    let ctx = TestContext::new().await;
    let (_, user_id) = ctx.customer("Lucía", "lucia@example.com").await;

    let mut payment = approved_payment("1320005", user_id, None);
    payment.metadata = json!({});
    ctx.gateway.put_payment(payment);

    let (status, body) = ctx.webhook(&payment_event("1320005")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert!(ctx.repo.orders().is_empty());
}

#[tokio::test]
async fn test_fallback_builds_order_from_default_address() {
    let ctx = TestContext::new().await;
    let (client, user_id) = ctx.customer("Lucía", "lucia@example.com").await;
    ctx.add_address(&client, "San Martín 100", false).await;
    ctx.add_address(&client, "Belgrano 200", true).await;

    ctx.gateway
        .put_payment(approved_payment("1320006", user_id, None));

    let (_, body) = ctx.webhook(&payment_event("1320006")).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["outcome"], "created");

    let orders = ctx.repo.orders();
    assert_eq!(orders.len(), 1);
    let order = &orders[0];
    assert_eq!(body["orderId"], order.id.as_i32());
    assert_eq!(order.user_id, user_id);
    assert_eq!(order.status, OrderStatus::Processing);
    assert_eq!(order.payment_status, PaymentStatus::Paid);
    assert_eq!(order.shipping_address.name, "Lucía");
    assert_eq!(order.shipping_address.address, "Belgrano 200");
    assert_eq!(order.items.len(), 2);
    assert_eq!(order.items[0].id, "whey-1kg");
    assert_eq!(order.items[0].quantity, 2);
}

#[tokio::test]
async fn test_fallback_when_metadata_order_is_gone() {
    let ctx = TestContext::new().await;
    let (client, user_id) = ctx.customer("Lucía", "lucia@example.com").await;
    ctx.add_address(&client, "San Martín 100", true).await;

    ctx.gateway.put_payment(approved_payment(
        "1320007",
        user_id,
        Some(vitaforge_core::OrderId::new(9999)),
    ));

    let (_, body) = ctx.webhook(&payment_event("1320007")).await;
    assert_eq!(body["outcome"], "created");
    assert_eq!(ctx.repo.orders_for_payment("1320007").len(), 1);
}

#[tokio::test]
async fn test_fallback_uses_first_address_without_flagged_default() {
    let ctx = TestContext::new().await;
    let (_, user_id) = ctx.customer("Lucía", "lucia@example.com").await;

    let address = |street: &str| SavedAddress {
        id: AddressId::generate(),
        street: street.to_string(),
        city: "Mendoza".to_string(),
        state: "Mendoza".to_string(),
        postal_code: "M5500".to_string(),
        country: "AR".to_string(),
        phone: String::new(),
        is_default: false,
    };
    ctx.repo
        .set_addresses(user_id, vec![address("Las Heras 1"), address("Colón 2")]);
    ctx.gateway
        .put_payment(approved_payment("1320008", user_id, None));

    let (_, body) = ctx.webhook(&payment_event("1320008")).await;
    assert_eq!(body["outcome"], "created");

    let order = &ctx.repo.orders()[0];
    assert_eq!(order.shipping_address.address, "Las Heras 1");
    assert_eq!(order.shipping_address.phone, None);
}

#[tokio::test]
async fn test_fallback_without_address_fails() {
    let ctx = TestContext::new().await;
    let (_, user_id) = ctx.customer("Lucía", "lucia@example.com").await;
    ctx.gateway
        .put_payment(approved_payment("1320009", user_id, None));

    let (status, body) = ctx.webhook(&payment_event("1320009")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert!(ctx.repo.orders().is_empty());
}

#[tokio::test]
async fn test_concurrent_fallback_deliveries_create_one_order() {
    let ctx = TestContext::new().await;
    let (client, user_id) = ctx.customer("Lucía", "lucia@example.com").await;
    ctx.add_address(&client, "San Martín 100", true).await;
    ctx.gateway
        .put_payment(approved_payment("1320010", user_id, None));

    let event = payment_event("1320010");
    let (first, second, third) = tokio::join!(
        ctx.webhook(&event),
        ctx.webhook(&event),
        ctx.webhook(&event)
    );

    let outcomes: Vec<_> = [first, second, third]
        .into_iter()
        .map(|(_, body)| body["outcome"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(outcomes.iter().filter(|o| *o == "created").count(), 1);
    assert_eq!(
        outcomes.iter().filter(|o| *o == "already_reconciled").count(),
        2
    );
    assert_eq!(ctx.repo.orders_for_payment("1320010").len(), 1);
}

#[tokio::test]
async fn test_signature_is_enforced_when_secret_is_configured() {
    let secret = "whsec-9c4e1f7a2b8d";
    let ctx = TestContext::with_webhook_secret(secret).await;
    let (client, user_id) = ctx.customer("Lucía", "lucia@example.com").await;
    let order_id = ctx.checkout(&client, &sample_items()).await;
    ctx.gateway
        .put_payment(approved_payment("1320011", user_id, Some(order_id)));

    // Unsigned delivery
    let (status, body) = ctx.webhook(&payment_event("1320011")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "ignored");
    assert_eq!(
        ctx.repo.order(order_id).unwrap().payment_status,
        PaymentStatus::Pending
    );

    // Signed delivery
    let ts = "1742505638683";
    let request_id = "bb56a2f1-6aae-46ac-982e-9dcd3581d08e";
    let v1 = signature::sign(
        &SecretString::from(secret),
        &signature::manifest(Some("1320011"), Some(request_id), ts),
    );
    let resp = ctx
        .client()
        .post(ctx.url("/webhooks/mercadopago"))
        .header("x-signature", format!("ts={ts},v1={v1}"))
        .header("x-request-id", request_id)
        .json(&payment_event("1320011"))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["outcome"], "updated");
    assert_eq!(
        ctx.repo.order(order_id).unwrap().payment_status,
        PaymentStatus::Paid
    );
}
