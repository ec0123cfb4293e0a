//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::StorefrontConfig;
use crate::db::{
    CatalogRepository, OrderRepository, PgCatalogRepository, PgOrderRepository, PgUserRepository,
    UserRepository,
};
use crate::payments::{MercadoPagoClient, PaymentError, PaymentGateway};

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. Persistence and the payment gateway sit
/// behind trait objects so tests can swap in in-memory adapters.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    orders: Arc<dyn OrderRepository>,
    users: Arc<dyn UserRepository>,
    catalog: Arc<dyn CatalogRepository>,
    payments: Arc<dyn PaymentGateway>,
}

impl AppState {
    /// Create application state from explicit adapters.
    #[must_use]
    pub fn new(
        config: StorefrontConfig,
        orders: Arc<dyn OrderRepository>,
        users: Arc<dyn UserRepository>,
        catalog: Arc<dyn CatalogRepository>,
        payments: Arc<dyn PaymentGateway>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                orders,
                users,
                catalog,
                payments,
            }),
        }
    }

    /// Create production state over a `PostgreSQL` pool and Mercado Pago.
    ///
    /// # Errors
    ///
    /// Returns an error if the Mercado Pago HTTP client cannot be built.
    pub fn from_pool(config: StorefrontConfig, pool: PgPool) -> Result<Self, PaymentError> {
        let payments = MercadoPagoClient::new(&config.mercado_pago, &config.base_url)?;

        Ok(Self::new(
            config,
            Arc::new(PgOrderRepository::new(pool.clone())),
            Arc::new(PgUserRepository::new(pool.clone())),
            Arc::new(PgCatalogRepository::new(pool)),
            Arc::new(payments),
        ))
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Order persistence.
    #[must_use]
    pub fn orders(&self) -> &dyn OrderRepository {
        self.inner.orders.as_ref()
    }

    /// Account persistence.
    #[must_use]
    pub fn users(&self) -> &dyn UserRepository {
        self.inner.users.as_ref()
    }

    /// Catalog persistence.
    #[must_use]
    pub fn catalog(&self) -> &dyn CatalogRepository {
        self.inner.catalog.as_ref()
    }

    /// The payment gateway.
    #[must_use]
    pub fn payments(&self) -> &dyn PaymentGateway {
        self.inner.payments.as_ref()
    }
}
