//! Scratch databases for the `PostgreSQL` repository tests.
//!
//! Each pool lives in its own schema on the server named by `DATABASE_URL`,
//! with every migration applied, so tests never see each other's rows.

use std::str::FromStr;

use sqlx::PgPool;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use uuid::Uuid;

/// Connect to a fresh, fully migrated schema.
///
/// # Panics
///
/// Panics if `DATABASE_URL` is unset or the server is unreachable.
pub async fn test_pool() -> PgPool {
    dotenvy::dotenv().ok();
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for database tests");
    let options = PgConnectOptions::from_str(&url).expect("DATABASE_URL is not a postgres URL");

    let schema = format!("test_{}", Uuid::new_v4().simple());
    let setup = PgPoolOptions::new()
        .max_connections(1)
        .connect_with(options.clone())
        .await
        .expect("connect to test database");
    sqlx::query(&format!("CREATE SCHEMA {schema}"))
        .execute(&setup)
        .await
        .expect("create test schema");
    setup.close().await;

    let pool = PgPoolOptions::new()
        .max_connections(8)
        .connect_with(options.options([("search_path", schema.as_str())]))
        .await
        .expect("connect to test schema");
    sqlx::migrate!("../storefront/migrations")
        .run(&pool)
        .await
        .expect("run migrations");
    pool
}
