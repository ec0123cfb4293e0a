//! User repository.
//!
//! Accounts and their address books. Queries are checked at runtime with
//! `sqlx::query_as` and mapped through row types into domain types.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use thiserror::Error;
use uuid::Uuid;

use vitaforge_core::{
    AddressBook, AddressEdit, AddressError, AddressId, Email, SavedAddress, UserId, UserRole,
};

use super::RepositoryError;
use crate::models::{NewUser, User};

/// Port for account persistence.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create an account.
    ///
    /// Returns [`RepositoryError::Conflict`] if the email is taken.
    async fn create(&self, user: &NewUser) -> Result<User, RepositoryError>;

    async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    /// Look up an account and its password hash by email.
    async fn get_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError>;

    /// Rename an account. Returns [`RepositoryError::NotFound`] for an unknown id.
    async fn update_name(&self, id: UserId, name: &str) -> Result<User, RepositoryError>;

    /// Saved addresses in book order.
    async fn addresses(&self, id: UserId) -> Result<Vec<SavedAddress>, RepositoryError>;

    /// Apply one edit to the address book and return the new book.
    ///
    /// The read, the edit and the write happen under one lock on the user,
    /// so concurrent edits of the same book apply one after another.
    async fn edit_addresses(
        &self,
        id: UserId,
        edit: AddressEdit,
    ) -> Result<Vec<SavedAddress>, AddressBookError>;
}

/// Failure of [`UserRepository::edit_addresses`].
#[derive(Debug, Error)]
pub enum AddressBookError {
    /// The edit broke an address book rule; nothing was written.
    #[error(transparent)]
    Rejected(#[from] AddressError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for AddressBookError {
    fn from(err: sqlx::Error) -> Self {
        Self::Repository(err.into())
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: UserId,
    name: String,
    email: String,
    role: UserRole,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: row.id,
            name: row.name,
            email,
            role: row.role,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct CredentialRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
}

#[derive(sqlx::FromRow)]
struct AddressRow {
    id: Uuid,
    street: String,
    city: String,
    state: String,
    postal_code: String,
    country: String,
    phone: String,
    is_default: bool,
}

impl From<AddressRow> for SavedAddress {
    fn from(row: AddressRow) -> Self {
        Self {
            id: AddressId::from_uuid(row.id),
            street: row.street,
            city: row.city,
            state: row.state,
            postal_code: row.postal_code,
            country: row.country,
            phone: row.phone,
            is_default: row.is_default,
        }
    }
}

const USER_COLUMNS: &str = "id, name, email, role, is_active, created_at, updated_at";

const ADDRESS_QUERY: &str = "SELECT id, street, city, state, postal_code, country, phone, is_default
     FROM user_addresses
     WHERE user_id = $1
     ORDER BY position ASC";

/// `PostgreSQL` implementation of [`UserRepository`].
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, user: &NewUser) -> Result<User, RepositoryError> {
        let row: UserRow = sqlx::query_as(&format!(
            "INSERT INTO users (name, email, password_hash, role)
             VALUES ($1, $2, $3, $4)
             RETURNING {USER_COLUMNS}"
        ))
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RepositoryError::from_insert(e, "email"))?;

        row.try_into()
    }

    async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn get_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row: Option<CredentialRow> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS}, password_hash FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        Ok(Some((row.user.try_into()?, row.password_hash)))
    }

    async fn update_name(&self, id: UserId, name: &str) -> Result<User, RepositoryError> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "UPDATE users SET name = $2, updated_at = now()
             WHERE id = $1
             RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or(RepositoryError::NotFound)?.try_into()
    }

    async fn addresses(&self, id: UserId) -> Result<Vec<SavedAddress>, RepositoryError> {
        let rows: Vec<AddressRow> = sqlx::query_as(ADDRESS_QUERY)
            .bind(id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn edit_addresses(
        &self,
        id: UserId,
        edit: AddressEdit,
    ) -> Result<Vec<SavedAddress>, AddressBookError> {
        let mut tx = self.pool.begin().await?;

        // Lock the owner before reading so the book cannot change under us
        let exists: Option<(UserId,)> =
            sqlx::query_as("SELECT id FROM users WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        if exists.is_none() {
            return Err(RepositoryError::NotFound.into());
        }

        let rows: Vec<AddressRow> = sqlx::query_as(ADDRESS_QUERY)
            .bind(id)
            .fetch_all(&mut *tx)
            .await?;
        let mut book = AddressBook::from_saved(rows.into_iter().map(Into::into).collect());
        edit.apply(&mut book)?;

        let addresses = book.into_inner();
        write_addresses(&mut *tx, id, &addresses).await?;

        sqlx::query("UPDATE users SET updated_at = now() WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(addresses)
    }
}

/// Rewrite a user's address rows in book order.
async fn write_addresses(
    conn: &mut PgConnection,
    id: UserId,
    addresses: &[SavedAddress],
) -> Result<(), RepositoryError> {
    sqlx::query("DELETE FROM user_addresses WHERE user_id = $1")
        .bind(id)
        .execute(&mut *conn)
        .await?;

    for (position, address) in addresses.iter().enumerate() {
        let position = i32::try_from(position)
            .map_err(|_| RepositoryError::DataCorruption("address book too large".to_owned()))?;

        sqlx::query(
            "INSERT INTO user_addresses
                (id, user_id, position, street, city, state, postal_code, country, phone, is_default)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(address.id.as_uuid())
        .bind(id)
        .bind(position)
        .bind(&address.street)
        .bind(&address.city)
        .bind(&address.state)
        .bind(&address.postal_code)
        .bind(&address.country)
        .bind(&address.phone)
        .bind(address.is_default)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}
