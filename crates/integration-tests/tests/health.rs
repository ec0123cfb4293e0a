//! Health and request-id tests.

#![allow(clippy::unwrap_used)]

use reqwest::StatusCode;
use vitaforge_integration_tests::TestContext;

#[tokio::test]
async fn test_health_and_readiness() {
    let ctx = TestContext::new().await;
    let client = ctx.client();

    let resp = client.get(ctx.url("/health")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.unwrap(), "ok");

    let resp = client.get(ctx.url("/health/ready")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_request_id_is_echoed_or_generated() {
    let ctx = TestContext::new().await;
    let client = ctx.client();

    let resp = client
        .get(ctx.url("/health"))
        .header("x-request-id", "edge-7f3a")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.headers()["x-request-id"], "edge-7f3a");

    let resp = client.get(ctx.url("/health")).send().await.unwrap();
    let generated = resp.headers()["x-request-id"].to_str().unwrap();
    assert_eq!(generated.len(), 36);
}
