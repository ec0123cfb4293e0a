//! Order history and access control tests.

#![allow(clippy::unwrap_used)]

use reqwest::StatusCode;
use serde_json::{Value, json};
use vitaforge_integration_tests::{TestContext, sample_items};

#[tokio::test]
async fn test_history_is_newest_first_and_paginated() {
    let ctx = TestContext::new().await;
    let (client, _) = ctx.customer("Lucía", "lucia@example.com").await;
    let (other, _) = ctx.customer("Mateo", "mateo@example.com").await;

    let mut ids = Vec::new();
    for _ in 0..3 {
        ids.push(ctx.checkout(&client, &sample_items()).await);
    }
    ctx.checkout(&other, &sample_items()).await;

    let body: Value = client
        .get(ctx.url("/orders?page=1&limit=2"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let orders = body["orders"].as_array().unwrap();
    assert_eq!(orders.len(), 2);
    assert_eq!(orders[0]["id"], ids[2].as_i32());
    assert_eq!(orders[1]["id"], ids[1].as_i32());
    assert_eq!(
        body["pagination"],
        json!({"total": 3, "page": 1, "limit": 2, "pages": 2})
    );

    let body: Value = client
        .get(ctx.url("/orders?page=2&limit=2"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let orders = body["orders"].as_array().unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["id"], ids[0].as_i32());
}

#[tokio::test]
async fn test_order_detail_for_owner() {
    let ctx = TestContext::new().await;
    let (client, user_id) = ctx.customer("Lucía", "lucia@example.com").await;
    let order_id = ctx.checkout(&client, &sample_items()).await;

    let resp = client
        .get(ctx.url(&format!("/orders/{order_id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["user"], user_id.as_i32());
    assert_eq!(body["status"], "pending");
    assert_eq!(body["paymentStatus"], "pending");
    assert_eq!(body["shippingAddress"]["postalCode"], "C1043");
    assert!(body.get("paymentDetails").is_none());
}

#[tokio::test]
async fn test_order_detail_of_another_customer_is_forbidden() {
    let ctx = TestContext::new().await;
    let (owner, _) = ctx.customer("Lucía", "lucia@example.com").await;
    let (stranger, _) = ctx.customer("Mateo", "mateo@example.com").await;
    let order_id = ctx.checkout(&owner, &sample_items()).await;

    let resp = stranger
        .get(ctx.url(&format!("/orders/{order_id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_can_read_any_order() {
    let ctx = TestContext::new().await;
    let (owner, _) = ctx.customer("Lucía", "lucia@example.com").await;
    let admin = ctx.admin("admin@vitaforge.com.ar").await;
    let order_id = ctx.checkout(&owner, &sample_items()).await;

    let resp = admin
        .get(ctx.url(&format!("/orders/{order_id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_or_malformed_order_is_not_found() {
    let ctx = TestContext::new().await;
    let (client, _) = ctx.customer("Lucía", "lucia@example.com").await;

    for path in ["/orders/4242", "/orders/not-a-number"] {
        let resp = client.get(ctx.url(path)).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{path}");
    }
}

#[tokio::test]
async fn test_orders_require_login() {
    let ctx = TestContext::new().await;

    let resp = ctx.client().get(ctx.url("/orders")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}
