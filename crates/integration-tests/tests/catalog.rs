//! Public catalog tests.

#![allow(clippy::unwrap_used)]

use reqwest::StatusCode;
use serde_json::Value;
use vitaforge_integration_tests::{TestContext, sample_catalog};
use vitaforge_storefront::services::ImportReport;

async fn get_json(ctx: &TestContext, path: &str) -> Value {
    let resp = ctx.client().get(ctx.url(path)).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK, "{path}");
    resp.json().await.unwrap()
}

fn names(body: &Value) -> Vec<&str> {
    body["products"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect()
}

#[tokio::test]
async fn test_products_default_to_active_newest_first() {
    let ctx = TestContext::new().await;
    ctx.seed_catalog().await;

    let body = get_json(&ctx, "/products").await;
    assert_eq!(
        names(&body),
        [
            "Creatina Monohidratada 300g",
            "Proteína Vegana 900g",
            "Whey Protein 1kg"
        ]
    );
    assert_eq!(body["pagination"]["total"], 3);
    assert_eq!(body["pagination"]["page"], 1);
    assert_eq!(body["pagination"]["limit"], 10);
    assert_eq!(body["pagination"]["totalPages"], 1);

    let whey = &body["products"][2];
    assert_eq!(whey["slug"], "whey-protein-1kg");
    assert_eq!(whey["shortDescription"], "24 g de proteína por porción");
    assert_eq!(whey["compareAtPrice"].as_f64().unwrap(), 28000.0);
    assert_eq!(whey["nutritionalInfo"]["servingsPerContainer"], 33);
    assert_eq!(whey["isActive"], true);
}

#[tokio::test]
async fn test_products_filters() {
    let ctx = TestContext::new().await;
    ctx.seed_catalog().await;

    let body = get_json(&ctx, "/products?category=proteinas").await;
    assert_eq!(names(&body), ["Proteína Vegana 900g", "Whey Protein 1kg"]);

    let body = get_json(&ctx, "/products?category=all&featured=true").await;
    assert_eq!(names(&body), ["Whey Protein 1kg"]);

    let body = get_json(&ctx, "/products?featured=false").await;
    assert_eq!(body["pagination"]["total"], 2);

    let body = get_json(&ctx, "/products?search=PROTE").await;
    assert_eq!(names(&body), ["Proteína Vegana 900g", "Whey Protein 1kg"]);

    let body = get_json(&ctx, "/products?active=false").await;
    assert_eq!(names(&body), ["Quemador Termogénico"]);

    let body = get_json(&ctx, "/products?active=all").await;
    assert_eq!(body["pagination"]["total"], 4);
}

#[tokio::test]
async fn test_products_pagination() {
    let ctx = TestContext::new().await;
    ctx.seed_catalog().await;

    let body = get_json(&ctx, "/products?limit=2&page=2").await;
    assert_eq!(names(&body), ["Whey Protein 1kg"]);
    assert_eq!(body["pagination"]["total"], 3);
    assert_eq!(body["pagination"]["page"], 2);
    assert_eq!(body["pagination"]["limit"], 2);
    assert_eq!(body["pagination"]["totalPages"], 2);

    let body = get_json(&ctx, "/products?page=9").await;
    assert!(names(&body).is_empty());
    assert_eq!(body["pagination"]["total"], 3);

    let resp = ctx
        .client()
        .get(ctx.url("/products?page=abc"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_product_detail() {
    let ctx = TestContext::new().await;
    ctx.seed_catalog().await;

    let listing = get_json(&ctx, "/products?search=creatina").await;
    let id = listing["products"][0]["id"].as_i64().unwrap();

    let product = get_json(&ctx, &format!("/products/{id}")).await;
    assert_eq!(product["sku"], "CRE-300");
    assert_eq!(product["category"], "creatinas");
    assert_eq!(product["stock"], 25);

    for path in ["/products/9999", "/products/whey"] {
        let resp = ctx.client().get(ctx.url(path)).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{path}");
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["message"], "Product not found");
    }
}

#[tokio::test]
async fn test_categories_sorted_by_name() {
    let ctx = TestContext::new().await;
    ctx.seed_catalog().await;

    let body = get_json(&ctx, "/categories").await;
    let slugs: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["slug"].as_str().unwrap())
        .collect();
    assert_eq!(slugs, ["creatinas", "proteinas", "quemadores"]);
    assert_eq!(body[1]["description"], "Proteínas de suero y vegetales");

    let body = get_json(&ctx, "/categories?active=true").await;
    assert_eq!(body.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_seed_import_skips_existing_entries() {
    let ctx = TestContext::new().await;

    assert_eq!(
        ctx.seed_catalog().await,
        ImportReport {
            categories: 3,
            products: 4,
            skipped: 0
        }
    );
    assert_eq!(
        ctx.seed_catalog().await,
        ImportReport {
            categories: 0,
            products: 0,
            skipped: 7
        }
    );

    let body = get_json(&ctx, "/products?active=all").await;
    assert_eq!(body["pagination"]["total"], 4);
}

#[tokio::test]
async fn test_seed_import_rejects_invalid_file_before_writing() {
    let ctx = TestContext::new().await;
    let mut catalog = sample_catalog();
    catalog.products[3].short_description = String::new();

    let err = vitaforge_storefront::services::CatalogService::new(ctx.repo.as_ref())
        .import(&catalog)
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "product \"Quemador Termogénico\": shortDescription is required"
    );

    let body = get_json(&ctx, "/categories").await;
    assert!(body.as_array().unwrap().is_empty());
}
