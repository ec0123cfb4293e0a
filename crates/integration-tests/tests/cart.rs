//! Session cart tests.

#![allow(clippy::unwrap_used)]

use reqwest::StatusCode;
use serde_json::{Value, json};
use vitaforge_integration_tests::TestContext;

#[tokio::test]
async fn test_cart_add_merges_and_totals() {
    let ctx = TestContext::new().await;
    let client = ctx.client();

    for quantity in [1, 2] {
        let resp = client
            .post(ctx.url("/cart/add"))
            .json(&json!({"id": "whey-1kg", "name": "Whey Protein 1kg", "price": 25000, "quantity": quantity}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let cart: Value = client
        .get(ctx.url("/cart"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(cart["items"].as_array().unwrap().len(), 1);
    assert_eq!(cart["itemCount"], 3);
    assert_eq!(cart["total"].as_f64().unwrap(), 75000.0);
}

#[tokio::test]
async fn test_cart_update_remove_and_clear() {
    let ctx = TestContext::new().await;
    let client = ctx.client();

    for id in ["whey-1kg", "creatine-300"] {
        client
            .post(ctx.url("/cart/add"))
            .json(&json!({"id": id, "name": id, "price": 1000, "quantity": 1}))
            .send()
            .await
            .unwrap();
    }

    let cart: Value = client
        .post(ctx.url("/cart/update"))
        .json(&json!({"id": "whey-1kg", "quantity": 4}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(cart["itemCount"], 5);

    let cart: Value = client
        .post(ctx.url("/cart/remove"))
        .json(&json!({"id": "creatine-300"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(cart["items"].as_array().unwrap().len(), 1);

    let resp = client
        .post(ctx.url("/cart/remove"))
        .json(&json!({"id": "creatine-300"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let cart: Value = client
        .post(ctx.url("/cart/clear"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(cart["itemCount"], 0);
}

#[tokio::test]
async fn test_carts_are_per_session() {
    let ctx = TestContext::new().await;
    let first = ctx.client();
    let second = ctx.client();

    first
        .post(ctx.url("/cart/add"))
        .json(&json!({"id": "whey-1kg", "name": "Whey", "price": 1000, "quantity": 1}))
        .send()
        .await
        .unwrap();

    let cart: Value = second
        .get(ctx.url("/cart"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(cart["itemCount"], 0);
}

#[tokio::test]
async fn test_cart_rejects_overflowing_totals() {
    let ctx = TestContext::new().await;
    let client = ctx.client();

    let resp = client
        .post(ctx.url("/cart/add"))
        .json(&json!({"id": "p1", "name": "x", "price": 7.9e28, "quantity": 2}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let cart: Value = client
        .get(ctx.url("/cart"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(cart["itemCount"], 0);

    let resp = client
        .post(ctx.url("/cart/add"))
        .json(&json!({"id": "p1", "name": "x", "price": 5e28, "quantity": 1}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client
        .post(ctx.url("/cart/update"))
        .json(&json!({"id": "p1", "quantity": 2}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let cart: Value = client
        .get(ctx.url("/cart"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(cart["itemCount"], 1);
}
