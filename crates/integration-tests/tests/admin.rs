//! Admin order console tests.

#![allow(clippy::unwrap_used)]

use reqwest::StatusCode;
use serde_json::{Value, json};
use vitaforge_core::{OrderStatus, PaymentStatus};
use vitaforge_integration_tests::{TestContext, sample_items};

#[tokio::test]
async fn test_admin_routes_reject_customers_and_anonymous() {
    let ctx = TestContext::new().await;
    let (customer, _) = ctx.customer("Lucía", "lucia@example.com").await;

    for client in [customer, ctx.client()] {
        let resp = client.get(ctx.url("/admin/orders")).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
}

#[tokio::test]
async fn test_admin_lists_orders_with_customer_and_filter() {
    let ctx = TestContext::new().await;
    let (client, user_id) = ctx.customer("Lucía", "lucia@example.com").await;
    let admin = ctx.admin("admin@vitaforge.com.ar").await;

    let first = ctx.checkout(&client, &sample_items()).await;
    let second = ctx.checkout(&client, &sample_items()).await;

    let resp = admin
        .patch(ctx.url(&format!("/admin/orders/{first}")))
        .json(&json!({"status": "shipped"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = admin
        .get(ctx.url("/admin/orders"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["pagination"]["total"], 2);
    let orders = body["orders"].as_array().unwrap();
    assert_eq!(orders[0]["id"], second.as_i32());
    assert_eq!(orders[0]["customer"]["id"], user_id.as_i32());
    assert_eq!(orders[0]["customer"]["email"], "lucia@example.com");

    let body: Value = admin
        .get(ctx.url("/admin/orders?status=shipped"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let orders = body["orders"].as_array().unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["id"], first.as_i32());
}

#[tokio::test]
async fn test_admin_rejects_unknown_status_filter() {
    let ctx = TestContext::new().await;
    let admin = ctx.admin("admin@vitaforge.com.ar").await;

    let resp = admin
        .get(ctx.url("/admin/orders?status=lost"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_admin_order_detail() {
    let ctx = TestContext::new().await;
    let (client, _) = ctx.customer("Lucía", "lucia@example.com").await;
    let admin = ctx.admin("admin@vitaforge.com.ar").await;
    let order_id = ctx.checkout(&client, &sample_items()).await;

    let resp = admin
        .get(ctx.url(&format!("/admin/orders/{order_id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["customer"]["name"], "Lucía");

    let resp = admin
        .get(ctx.url("/admin/orders/4242"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_status_override() {
    let ctx = TestContext::new().await;
    let (client, _) = ctx.customer("Lucía", "lucia@example.com").await;
    let admin = ctx.admin("admin@vitaforge.com.ar").await;
    let order_id = ctx.checkout(&client, &sample_items()).await;

    let resp = admin
        .patch(ctx.url(&format!("/admin/orders/{order_id}")))
        .json(&json!({"status": "cancelled", "paymentStatus": "refunded"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let order = ctx.repo.order(order_id).unwrap();
    assert_eq!(order.status, OrderStatus::Cancelled);
    assert_eq!(order.payment_status, PaymentStatus::Refunded);

    let resp = admin
        .patch(ctx.url(&format!("/admin/orders/{order_id}")))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let before = ctx.repo.orders();
    let resp = admin
        .patch(ctx.url("/admin/orders/4242"))
        .json(&json!({"status": "shipped"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(ctx.repo.orders(), before);
}
