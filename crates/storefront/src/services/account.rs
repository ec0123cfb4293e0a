//! Account profile and address book.
//!
//! Address edits are handed to the repository as an [`AddressEdit`], which
//! loads the book, applies the change under the default-address rules and
//! writes it back while holding the book locked.

use serde::Deserialize;
use thiserror::Error;
use tracing::instrument;

use vitaforge_core::{AddressEdit, AddressError, AddressId, AddressInput, SavedAddress};

use crate::db::{AddressBookError, RepositoryError, UserRepository};
use crate::models::{RequestContext, User, UserProfile};
use crate::services::auth::MAX_NAME_LENGTH;

/// Minimum length of a renamed account, in characters.
pub const MIN_NAME_LENGTH: usize = 2;

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("{0}")]
    InvalidName(String),

    #[error(transparent)]
    Address(#[from] AddressError),

    #[error("user not found")]
    UserNotFound,

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Profile edit form.
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileUpdate {
    pub name: String,
}

/// Account service.
pub struct AccountService<'a> {
    users: &'a dyn UserRepository,
}

impl<'a> AccountService<'a> {
    #[must_use]
    pub const fn new(users: &'a dyn UserRepository) -> Self {
        Self { users }
    }

    /// Profile with the address book.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::UserNotFound` if the account is gone.
    pub async fn profile(&self, ctx: &RequestContext) -> Result<UserProfile, AccountError> {
        let user = self
            .users
            .get_by_id(ctx.user_id)
            .await?
            .ok_or(AccountError::UserNotFound)?;
        let shipping_addresses = self.users.addresses(ctx.user_id).await?;

        Ok(UserProfile {
            user,
            shipping_addresses,
        })
    }

    /// Rename the account.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::InvalidName` for names shorter than two or
    /// longer than fifty characters.
    #[instrument(skip(self, ctx, update), fields(user_id = %ctx.user_id))]
    pub async fn update_profile(
        &self,
        ctx: &RequestContext,
        update: &ProfileUpdate,
    ) -> Result<User, AccountError> {
        let name = update.name.trim();
        let len = name.chars().count();
        if len < MIN_NAME_LENGTH {
            return Err(AccountError::InvalidName(format!(
                "name must be at least {MIN_NAME_LENGTH} characters"
            )));
        }
        if len > MAX_NAME_LENGTH {
            return Err(AccountError::InvalidName(format!(
                "name must be at most {MAX_NAME_LENGTH} characters"
            )));
        }

        self.users
            .update_name(ctx.user_id, name)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => AccountError::UserNotFound,
                other => AccountError::Repository(other),
            })
    }

    /// Saved addresses in book order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database fails.
    pub async fn addresses(&self, ctx: &RequestContext) -> Result<Vec<SavedAddress>, AccountError> {
        Ok(self.users.addresses(ctx.user_id).await?)
    }

    /// Add an address and return the updated book.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::Address` when a field is blank.
    #[instrument(skip(self, ctx, input), fields(user_id = %ctx.user_id))]
    pub async fn add_address(
        &self,
        ctx: &RequestContext,
        input: AddressInput,
    ) -> Result<Vec<SavedAddress>, AccountError> {
        self.edit_book(ctx, AddressEdit::Add(input)).await
    }

    /// Replace an address and return the updated book.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::Address` for an unknown id or a blank field.
    #[instrument(skip(self, ctx, input), fields(user_id = %ctx.user_id))]
    pub async fn update_address(
        &self,
        ctx: &RequestContext,
        id: AddressId,
        input: AddressInput,
    ) -> Result<Vec<SavedAddress>, AccountError> {
        self.edit_book(ctx, AddressEdit::Update(id, input)).await
    }

    /// Delete an address and return the updated book.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::Address` for an unknown id.
    #[instrument(skip(self, ctx), fields(user_id = %ctx.user_id))]
    pub async fn remove_address(
        &self,
        ctx: &RequestContext,
        id: AddressId,
    ) -> Result<Vec<SavedAddress>, AccountError> {
        self.edit_book(ctx, AddressEdit::Remove(id)).await
    }

    async fn edit_book(
        &self,
        ctx: &RequestContext,
        edit: AddressEdit,
    ) -> Result<Vec<SavedAddress>, AccountError> {
        self.users
            .edit_addresses(ctx.user_id, edit)
            .await
            .map_err(|e| match e {
                AddressBookError::Rejected(e) => AccountError::Address(e),
                AddressBookError::Repository(RepositoryError::NotFound) => {
                    AccountError::UserNotFound
                }
                AddressBookError::Repository(other) => AccountError::Repository(other),
            })
    }
}
