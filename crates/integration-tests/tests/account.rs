//! Profile and address book tests.

#![allow(clippy::unwrap_used)]

use reqwest::StatusCode;
use serde_json::{Value, json};
use vitaforge_integration_tests::{TestContext, address_input};

fn defaults(body: &Value) -> Vec<(String, bool)> {
    body["shippingAddresses"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| {
            (
                a["street"].as_str().unwrap().to_string(),
                a["isDefault"].as_bool().unwrap(),
            )
        })
        .collect()
}

fn owned(pairs: &[(&str, bool)]) -> Vec<(String, bool)> {
    pairs.iter().map(|(s, d)| ((*s).to_string(), *d)).collect()
}

#[tokio::test]
async fn test_first_address_becomes_default() {
    let ctx = TestContext::new().await;
    let (client, _) = ctx.customer("Lucía", "lucia@example.com").await;

    let body = ctx.add_address(&client, "San Martín 100", false).await;
    assert_eq!(defaults(&body), owned(&[("San Martín 100", true)]));

    let body = ctx.add_address(&client, "Belgrano 200", false).await;
    assert_eq!(
        defaults(&body),
        owned(&[("San Martín 100", true), ("Belgrano 200", false)])
    );
}

#[tokio::test]
async fn test_new_default_clears_previous() {
    let ctx = TestContext::new().await;
    let (client, _) = ctx.customer("Lucía", "lucia@example.com").await;

    ctx.add_address(&client, "San Martín 100", false).await;
    let body = ctx.add_address(&client, "Belgrano 200", true).await;
    assert_eq!(
        defaults(&body),
        owned(&[("San Martín 100", false), ("Belgrano 200", true)])
    );
}

#[tokio::test]
async fn test_update_and_delete_address() {
    let ctx = TestContext::new().await;
    let (client, _) = ctx.customer("Lucía", "lucia@example.com").await;

    let body = ctx.add_address(&client, "San Martín 100", true).await;
    let first_id = body["shippingAddresses"][0]["id"].as_str().unwrap().to_string();
    let body = ctx.add_address(&client, "Belgrano 200", false).await;
    let second_id = body["shippingAddresses"][1]["id"].as_str().unwrap().to_string();

    let resp = client
        .put(ctx.url(&format!("/account/addresses/{second_id}")))
        .json(&address_input("Belgrano 250", true))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(
        defaults(&body),
        owned(&[("San Martín 100", false), ("Belgrano 250", true)])
    );

    // Removing the default promotes the first remaining address
    let resp = client
        .delete(ctx.url(&format!("/account/addresses/{second_id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(defaults(&body), owned(&[("San Martín 100", true)]));
    assert_eq!(body["shippingAddresses"][0]["id"], first_id);
}

#[tokio::test]
async fn test_unknown_address_is_not_found() {
    let ctx = TestContext::new().await;
    let (client, _) = ctx.customer("Lucía", "lucia@example.com").await;

    let missing = "6f1c1b9e-3c7a-4d47-9b1e-2f0d9b6f7a10";
    let resp = client
        .put(ctx.url(&format!("/account/addresses/{missing}")))
        .json(&address_input("Nowhere 1", false))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = client
        .delete(ctx.url("/account/addresses/not-a-uuid"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_address_requires_every_field() {
    let ctx = TestContext::new().await;
    let (client, _) = ctx.customer("Lucía", "lucia@example.com").await;

    let mut input = address_input("San Martín 100", true);
    input["postalCode"] = json!("");

    let resp = client
        .post(ctx.url("/account/addresses"))
        .json(&input)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "postalCode is required");
}

#[tokio::test]
async fn test_profile_rename_updates_session() {
    let ctx = TestContext::new().await;
    let (client, _) = ctx.customer("Lucía", "lucia@example.com").await;
    ctx.add_address(&client, "San Martín 100", true).await;

    let resp = client
        .patch(ctx.url("/account"))
        .json(&json!({"name": "Lucía Fernández"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let profile: Value = client
        .get(ctx.url("/account"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(profile["name"], "Lucía Fernández");
    assert_eq!(profile["shippingAddresses"].as_array().unwrap().len(), 1);

    let me: Value = client
        .get(ctx.url("/auth/me"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(me["name"], "Lucía Fernández");
}

#[tokio::test]
async fn test_profile_rename_rejects_short_name() {
    let ctx = TestContext::new().await;
    let (client, _) = ctx.customer("Lucía", "lucia@example.com").await;

    let resp = client
        .patch(ctx.url("/account"))
        .json(&json!({"name": "L"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
