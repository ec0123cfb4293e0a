//! Cart route handlers.
//!
//! The cart lives in the session under [`session_keys::CART`]. Prices come
//! from the client and are not checked against a catalogue.

use axum::{
    Json,
    extract::rejection::JsonRejection,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use vitaforge_core::{Cart, CartItem, CartOverflow};

use crate::error::{AppError, Result};
use crate::models::session_keys;

/// Cart as returned to clients.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub items: Vec<CartItem>,
    pub item_count: u32,
    pub total: Decimal,
}

impl TryFrom<Cart> for CartView {
    type Error = CartOverflow;

    fn try_from(cart: Cart) -> std::result::Result<Self, Self::Error> {
        Ok(Self {
            total: cart.total()?,
            item_count: cart.item_count(),
            items: cart.items().to_vec(),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateQuantity {
    pub id: String,
    pub quantity: u32,
}

#[derive(Debug, Deserialize)]
pub struct RemoveItem {
    pub id: String,
}

/// Load the session cart, empty if none.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn load_cart(session: &Session) -> Result<Cart> {
    Ok(session
        .get::<Cart>(session_keys::CART)
        .await?
        .unwrap_or_default())
}

/// Store the cart unless its total overflows, in which case the session
/// keeps the previous cart.
async fn save_cart(session: &Session, cart: Cart) -> Result<Json<CartView>> {
    let view = CartView::try_from(cart.clone())?;
    session.insert(session_keys::CART, &cart).await?;
    Ok(Json(view))
}

/// Show the cart.
pub async fn show(session: Session) -> Result<Json<CartView>> {
    Ok(Json(load_cart(&session).await?.try_into()?))
}

/// Add an item, merging with an existing line.
#[instrument(skip(session, payload))]
pub async fn add(
    session: Session,
    payload: std::result::Result<Json<CartItem>, JsonRejection>,
) -> Result<Json<CartView>> {
    let Json(item) = payload?;
    if item.id.trim().is_empty() {
        return Err(AppError::BadRequest("id is required".to_string()));
    }

    let mut cart = load_cart(&session).await?;
    cart.add(item);
    save_cart(&session, cart).await
}

/// Set a line's quantity (minimum one).
#[instrument(skip(session, payload))]
pub async fn update(
    session: Session,
    payload: std::result::Result<Json<UpdateQuantity>, JsonRejection>,
) -> Result<Json<CartView>> {
    let Json(update) = payload?;

    let mut cart = load_cart(&session).await?;
    if !cart.update_quantity(&update.id, update.quantity) {
        return Err(AppError::NotFound("Item not in cart".to_string()));
    }
    save_cart(&session, cart).await
}

/// Remove a line.
#[instrument(skip(session, payload))]
pub async fn remove(
    session: Session,
    payload: std::result::Result<Json<RemoveItem>, JsonRejection>,
) -> Result<Json<CartView>> {
    let Json(remove) = payload?;

    let mut cart = load_cart(&session).await?;
    if !cart.remove(&remove.id) {
        return Err(AppError::NotFound("Item not in cart".to_string()));
    }
    save_cart(&session, cart).await
}

/// Empty the cart.
pub async fn clear(session: Session) -> Result<Json<CartView>> {
    save_cart(&session, Cart::new()).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn item(id: &str, price: Decimal, quantity: u32) -> CartItem {
        CartItem {
            id: id.to_owned(),
            name: "Creatine".to_owned(),
            price,
            quantity,
            image: None,
        }
    }

    #[test]
    fn test_view_totals() {
        let mut cart = Cart::new();
        cart.add(item("p1", Decimal::new(1250, 2), 2));

        let view = CartView::try_from(cart).unwrap();
        assert_eq!(view.total, Decimal::from(25));
        assert_eq!(view.item_count, 2);
    }

    #[test]
    fn test_view_rejects_overflowing_total() {
        let mut cart = Cart::new();
        cart.add(item("p1", Decimal::MAX, 2));

        let err: AppError = CartView::try_from(cart).unwrap_err().into();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
