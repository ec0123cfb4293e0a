//! Account and address book routes.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Serialize;
use tower_sessions::Session;

use vitaforge_core::{AddressId, AddressInput, SavedAddress};

use crate::error::{AppError, Result};
use crate::middleware::{RequireAuth, set_request_context};
use crate::models::{RequestContext, User, UserProfile};
use crate::services::{AccountService, ProfileUpdate};
use crate::state::AppState;

/// Address book response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressList {
    pub shipping_addresses: Vec<SavedAddress>,
}

impl From<Vec<SavedAddress>> for AddressList {
    fn from(shipping_addresses: Vec<SavedAddress>) -> Self {
        Self { shipping_addresses }
    }
}

fn parse_address_id(raw: &str) -> Result<AddressId> {
    raw.parse()
        .map_err(|_| AppError::NotFound("Address not found".to_string()))
}

/// Profile with saved addresses.
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(ctx): RequireAuth,
) -> Result<Json<UserProfile>> {
    let profile = AccountService::new(state.users()).profile(&ctx).await?;
    Ok(Json(profile))
}

/// Rename the account. The session identity is refreshed to match.
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(ctx): RequireAuth,
    session: Session,
    payload: std::result::Result<Json<ProfileUpdate>, JsonRejection>,
) -> Result<Json<User>> {
    let Json(update) = payload?;

    let user = AccountService::new(state.users())
        .update_profile(&ctx, &update)
        .await?;
    set_request_context(&session, &RequestContext::from(&user)).await?;

    Ok(Json(user))
}

/// Saved addresses.
pub async fn addresses(
    State(state): State<AppState>,
    RequireAuth(ctx): RequireAuth,
) -> Result<Json<AddressList>> {
    let addresses = AccountService::new(state.users()).addresses(&ctx).await?;
    Ok(Json(addresses.into()))
}

/// Add an address.
pub async fn create_address(
    State(state): State<AppState>,
    RequireAuth(ctx): RequireAuth,
    payload: std::result::Result<Json<AddressInput>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let Json(input) = payload?;

    let addresses = AccountService::new(state.users())
        .add_address(&ctx, input)
        .await?;

    Ok((StatusCode::CREATED, Json(AddressList::from(addresses))))
}

/// Replace an address.
pub async fn update_address(
    State(state): State<AppState>,
    RequireAuth(ctx): RequireAuth,
    Path(id): Path<String>,
    payload: std::result::Result<Json<AddressInput>, JsonRejection>,
) -> Result<Json<AddressList>> {
    let id = parse_address_id(&id)?;
    let Json(input) = payload?;

    let addresses = AccountService::new(state.users())
        .update_address(&ctx, id, input)
        .await?;

    Ok(Json(addresses.into()))
}

/// Delete an address.
pub async fn delete_address(
    State(state): State<AppState>,
    RequireAuth(ctx): RequireAuth,
    Path(id): Path<String>,
) -> Result<Json<AddressList>> {
    let id = parse_address_id(&id)?;

    let addresses = AccountService::new(state.users())
        .remove_address(&ctx, id)
        .await?;

    Ok(Json(addresses.into()))
}
