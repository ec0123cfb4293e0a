//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                      - Liveness
//! GET  /health/ready                - Readiness (database)
//!
//! # Catalog
//! GET  /products                    - Products (?category=&search=&featured=&active=&page=&limit=)
//! GET  /products/{id}               - Product detail
//! GET  /categories                  - Categories by name (?active=true)
//!
//! # Auth (rate limited)
//! POST /auth/register               - Create account
//! POST /auth/login                  - Log in
//! POST /auth/logout                 - Log out
//! GET  /auth/me                     - Current identity
//!
//! # Cart (session)
//! GET  /cart                        - Cart contents
//! POST /cart/add                    - Add or merge a line
//! POST /cart/update                 - Set a line's quantity
//! POST /cart/remove                 - Remove a line
//! POST /cart/clear                  - Empty the cart
//!
//! # Checkout (requires auth)
//! POST /checkout                    - Pending order + Mercado Pago preference
//! POST /checkout/preference         - Preference only, no order
//!
//! # Webhooks
//! POST /webhooks/mercadopago        - Payment notifications (always 200)
//!
//! # Orders (requires auth)
//! GET  /orders                      - Order history
//! GET  /orders/{id}                 - Order detail (owner or admin)
//!
//! # Account (requires auth)
//! GET  /account                     - Profile with addresses
//! PATCH /account                    - Rename
//! GET  /account/addresses           - Address book
//! POST /account/addresses           - Add address
//! PUT  /account/addresses/{id}      - Replace address
//! DELETE /account/addresses/{id}    - Delete address
//!
//! # Admin (requires admin)
//! GET  /admin/orders                - All orders (?status=&page=&limit=)
//! GET  /admin/orders/{id}           - Order with customer
//! PATCH /admin/orders/{id}          - Override status / payment status
//! ```

pub mod account;
pub mod admin;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod health;
pub mod orders;
pub mod webhooks;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::middleware::auth_rate_limiter;
use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
        .layer(auth_rate_limiter())
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
}

/// Create the catalog routes router.
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(catalog::products))
        .route("/products/{id}", get(catalog::product))
        .route("/categories", get(catalog::categories))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(checkout::checkout))
        .route("/preference", post(checkout::preference))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index))
        .route("/{id}", get(orders::show))
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(account::show).patch(account::update))
        .route(
            "/addresses",
            get(account::addresses).post(account::create_address),
        )
        .route(
            "/addresses/{id}",
            put(account::update_address).delete(account::delete_address),
        )
}

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/orders", get(admin::index))
        .route("/orders/{id}", get(admin::show).patch(admin::update))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .merge(catalog_routes())
        .nest("/auth", auth_routes())
        .nest("/cart", cart_routes())
        .nest("/checkout", checkout_routes())
        .route("/webhooks/mercadopago", post(webhooks::mercadopago))
        .nest("/orders", order_routes())
        .nest("/account", account_routes())
        .nest("/admin", admin_routes())
}
