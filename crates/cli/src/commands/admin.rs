//! Admin account management.
//!
//! Admins cannot be created over HTTP; registration always yields customers.
//!
//! # Usage
//!
//! ```bash
//! vf-cli admin create -e admin@example.com -n "Admin Name" -p 'long-password'
//! ```
//!
//! # Environment Variables
//!
//! - `VITAFORGE_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string
//! - `VITAFORGE_ADMIN_PASSWORD` - Password, if `-p` is not given

use thiserror::Error;

use vitaforge_core::{UserId, UserRole};
use vitaforge_storefront::db::{PgUserRepository, create_pool};
use vitaforge_storefront::services::{AuthError, AuthService, RegisterInput};

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    /// Registration rejected the input or failed.
    #[error("Could not create admin: {0}")]
    Auth(#[from] AuthError),
}

/// Create an admin account.
///
/// # Errors
///
/// Returns an error if the input is invalid, the email is taken or the
/// database fails.
pub async fn create_user(email: &str, name: &str, password: &str) -> Result<UserId, AdminError> {
    let database_url = super::database_url().map_err(AdminError::MissingEnvVar)?;

    tracing::info!("Connecting to database...");
    let pool = create_pool(&database_url).await?;
    let users = PgUserRepository::new(pool);

    let user = AuthService::new(&users)
        .register(
            &RegisterInput {
                name: name.to_owned(),
                email: email.to_owned(),
                password: password.to_owned(),
            },
            UserRole::Admin,
        )
        .await?;

    tracing::info!(
        "Admin user created. ID: {}, Email: {}",
        user.id,
        user.email.as_str()
    );

    Ok(user.id)
}
