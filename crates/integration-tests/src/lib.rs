//! Integration tests for VitaForge.
//!
//! Each test boots the real storefront router on an ephemeral port, backed
//! by in-memory repositories and a scripted payment gateway, and talks to it
//! over HTTP with `reqwest`.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p vitaforge-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `health` - Liveness, readiness and request ids
//! - `auth` - Registration, login and sessions
//! - `cart` - Session cart
//! - `checkout` - Orders and payment preferences
//! - `webhooks` - Payment reconciliation
//! - `orders` - Order history and access control
//! - `account` - Profile and address book
//! - `admin` - Admin order console
//! - `catalog` - Products and categories
//! - `postgres` - Repository queries against a real database (ignored by default)

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

pub mod gateway;
pub mod memory;
pub mod postgres;

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde_json::{Value, json};
use tower_sessions::MemoryStore;

use vitaforge_core::{OrderId, UserId, UserRole};
use vitaforge_storefront::config::{DEFAULT_MERCADO_PAGO_API_URL, MercadoPagoConfig, StorefrontConfig};
use vitaforge_storefront::middleware::create_session_layer;
use vitaforge_storefront::payments::{AdditionalInfo, GatewayPaymentStatus, Payment, PaymentItem};
use vitaforge_storefront::models::CatalogImport;
use vitaforge_storefront::services::{AuthService, CatalogService, ImportReport, RegisterInput};
use vitaforge_storefront::state::AppState;

pub use gateway::FakeGateway;
pub use memory::MemoryRepository;

/// Password used for every account created by the helpers.
pub const PASSWORD: &str = "s3cure-pass";

/// Each client gets its own forwarded IP so the auth rate limiter never
/// couples unrelated tests.
static NEXT_CLIENT_IP: AtomicU32 = AtomicU32::new(1);

/// A running storefront and handles to its adapters.
pub struct TestContext {
    pub addr: SocketAddr,
    pub repo: Arc<MemoryRepository>,
    pub gateway: Arc<FakeGateway>,
}

fn test_config(webhook_secret: Option<&str>) -> StorefrontConfig {
    StorefrontConfig {
        database_url: SecretString::from("postgres://localhost/vitaforge_test"),
        host: "127.0.0.1".parse().unwrap(),
        port: 0,
        base_url: "http://localhost:3000".to_string(),
        mercado_pago: MercadoPagoConfig {
            access_token: SecretString::from("TEST-access-token"),
            webhook_secret: webhook_secret.map(SecretString::from),
            api_url: DEFAULT_MERCADO_PAGO_API_URL.to_string(),
            currency: "ARS".to_string(),
        },
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 0.0,
        sentry_traces_sample_rate: 0.0,
    }
}

impl TestContext {
    /// Start a storefront without webhook signature checks.
    pub async fn new() -> Self {
        Self::start(None).await
    }

    /// Start a storefront that verifies webhook signatures with `secret`.
    pub async fn with_webhook_secret(secret: &str) -> Self {
        Self::start(Some(secret)).await
    }

    async fn start(webhook_secret: Option<&str>) -> Self {
        let repo = Arc::new(MemoryRepository::default());
        let gateway = Arc::new(FakeGateway::default());
        let state = AppState::new(
            test_config(webhook_secret),
            repo.clone(),
            repo.clone(),
            repo.clone(),
            gateway.clone(),
        );
        let app = vitaforge_storefront::app(
            state,
            create_session_layer(MemoryStore::default(), false),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            repo,
            gateway,
        }
    }

    /// Absolute URL for `path`.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    /// A fresh client with its own cookie jar and client IP.
    #[must_use]
    pub fn client(&self) -> Client {
        let n = NEXT_CLIENT_IP.fetch_add(1, Ordering::Relaxed);
        let [_, a, b, c] = n.to_be_bytes();
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_str(&format!("10.{a}.{b}.{c}")).unwrap(),
        );

        Client::builder()
            .cookie_store(true)
            .default_headers(headers)
            .build()
            .expect("Failed to create HTTP client")
    }

    /// Register a customer and return a logged-in client plus the user id.
    pub async fn customer(&self, name: &str, email: &str) -> (Client, UserId) {
        let client = self.client();
        let resp = client
            .post(self.url("/auth/register"))
            .json(&json!({"name": name, "email": email, "password": PASSWORD}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED, "register {email}");

        let user_id = self.login(&client, email).await;
        (client, user_id)
    }

    /// Create an admin directly (admins cannot register over HTTP) and
    /// return a logged-in client.
    pub async fn admin(&self, email: &str) -> Client {
        AuthService::new(self.repo.as_ref())
            .register(
                &RegisterInput {
                    name: "Store Admin".to_string(),
                    email: email.to_string(),
                    password: PASSWORD.to_string(),
                },
                UserRole::Admin,
            )
            .await
            .unwrap();

        let client = self.client();
        self.login(&client, email).await;
        client
    }

    /// Log `client` in and return the user id.
    pub async fn login(&self, client: &Client, email: &str) -> UserId {
        let resp = client
            .post(self.url("/auth/login"))
            .json(&json!({"email": email, "password": PASSWORD}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK, "login {email}");

        let body: Value = resp.json().await.unwrap();
        parse_user_id(&body["userId"])
    }

    /// Check out the given items and return the order id.
    pub async fn checkout(&self, client: &Client, items: &Value) -> OrderId {
        let total = items
            .as_array()
            .unwrap()
            .iter()
            .map(|item| item["price"].as_f64().unwrap() * item["quantity"].as_f64().unwrap())
            .sum::<f64>();

        let resp = client
            .post(self.url("/checkout"))
            .json(&json!({
                "items": items,
                "shippingAddress": shipping_address(),
                "totalAmount": total,
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = resp.json().await.unwrap();
        OrderId::new(i32::try_from(body["orderId"].as_i64().unwrap()).unwrap())
    }

    /// Add a saved address for the logged-in `client`.
    pub async fn add_address(&self, client: &Client, street: &str, is_default: bool) -> Value {
        let resp = client
            .post(self.url("/account/addresses"))
            .json(&address_input(street, is_default))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
        resp.json().await.unwrap()
    }

    /// Load [`sample_catalog`] through the seed import path.
    pub async fn seed_catalog(&self) -> ImportReport {
        CatalogService::new(self.repo.as_ref())
            .import(&sample_catalog())
            .await
            .unwrap()
    }

    /// Deliver a webhook body and return the parsed response.
    pub async fn webhook(&self, body: &Value) -> (StatusCode, Value) {
        let resp = self
            .client()
            .post(self.url("/webhooks/mercadopago"))
            .json(body)
            .send()
            .await
            .unwrap();
        (resp.status(), resp.json().await.unwrap())
    }
}

fn parse_user_id(value: &Value) -> UserId {
    UserId::new(i32::try_from(value.as_i64().unwrap()).unwrap())
}

/// A complete order shipping address.
#[must_use]
pub fn shipping_address() -> Value {
    json!({
        "name": "Lucía Fernández",
        "address": "Av. Corrientes 1234",
        "city": "Buenos Aires",
        "province": "CABA",
        "postalCode": "C1043",
        "phone": "+54 11 5555-0101",
    })
}

/// Body for adding or editing a saved address.
#[must_use]
pub fn address_input(street: &str, is_default: bool) -> Value {
    json!({
        "street": street,
        "city": "Córdoba",
        "state": "Córdoba",
        "postalCode": "X5000",
        "country": "AR",
        "phone": "+54 351 555-0199",
        "isDefault": is_default,
    })
}

/// Three categories (one inactive) and four products: two proteins (one
/// featured), a creatine and an inactive fat burner. Products are listed in
/// insertion order, so the fat burner is the newest.
#[must_use]
pub fn sample_catalog() -> CatalogImport {
    serde_json::from_value(json!({
        "categories": [
            {"name": "Proteínas", "description": "Proteínas de suero y vegetales"},
            {"name": "Creatinas"},
            {"name": "Quemadores", "isActive": false},
        ],
        "products": [
            {
                "name": "Whey Protein 1kg",
                "description": "Proteína de suero concentrada",
                "shortDescription": "24 g de proteína por porción",
                "price": 25000,
                "compareAtPrice": 28000,
                "stock": 40,
                "sku": "WHEY-1KG",
                "category": "proteinas",
                "tags": ["whey", "chocolate"],
                "nutritionalInfo": {"servingSize": "30 g", "servingsPerContainer": 33, "protein": 24},
                "featured": true,
            },
            {
                "name": "Proteína Vegana 900g",
                "description": "Proteína de arveja y arroz",
                "shortDescription": "21 g de proteína vegetal",
                "price": 27500.5,
                "stock": 12,
                "sku": "VEG-900",
                "category": "proteinas",
            },
            {
                "name": "Creatina Monohidratada 300g",
                "description": "Creatina micronizada",
                "shortDescription": "5 g por porción",
                "price": 12000,
                "stock": 25,
                "sku": "CRE-300",
                "category": "creatinas",
            },
            {
                "name": "Quemador Termogénico",
                "description": "Fórmula descontinuada",
                "shortDescription": "60 cápsulas",
                "price": 15000,
                "sku": "TERMO-60",
                "category": "quemadores",
                "isActive": false,
            },
        ],
    }))
    .unwrap()
}

/// Two supplement line items.
#[must_use]
pub fn sample_items() -> Value {
    json!([
        {"id": "whey-1kg", "name": "Whey Protein 1kg", "price": 25000, "quantity": 2},
        {"id": "creatine-300", "name": "Creatina 300g", "price": 12000, "quantity": 1},
    ])
}

/// An approved gateway payment tagged with `user_id` and, optionally, an order.
#[must_use]
pub fn approved_payment(payment_id: &str, user_id: UserId, order_id: Option<OrderId>) -> Payment {
    let mut metadata = json!({"user_id": user_id.to_string()});
    if let Some(order_id) = order_id {
        metadata["order_id"] = json!(order_id.to_string());
    }

    Payment {
        id: payment_id.to_string(),
        status: GatewayPaymentStatus::Approved,
        transaction_amount: Decimal::from(62_000),
        currency_id: "ARS".to_string(),
        metadata,
        additional_info: Some(AdditionalInfo {
            items: vec![
                PaymentItem {
                    id: Some("whey-1kg".to_string()),
                    title: "Whey Protein 1kg".to_string(),
                    quantity: 2,
                    unit_price: Decimal::from(25_000),
                    picture_url: None,
                },
                PaymentItem {
                    id: Some("creatine-300".to_string()),
                    title: "Creatina 300g".to_string(),
                    quantity: 1,
                    unit_price: Decimal::from(12_000),
                    picture_url: None,
                },
            ],
        }),
    }
}

/// The `payment.updated` notification body for `payment_id`.
#[must_use]
pub fn payment_event(payment_id: &str) -> Value {
    json!({
        "action": "payment.updated",
        "type": "payment",
        "data": {"id": payment_id},
    })
}
