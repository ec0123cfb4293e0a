//! Cart line items and the cart store rules.
//!
//! The cart is never authoritative: prices and availability are whatever the
//! client last saw, and checkout copies the items into the order unchanged.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A line or cart total that does not fit in a [`Decimal`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cart total is too large")]
pub struct CartOverflow;

/// A single line in a cart or an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    /// Product identifier as known by the catalog.
    #[serde(alias = "_id")]
    pub id: String,
    pub name: String,
    pub price: Decimal,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl CartItem {
    /// Price times quantity.
    ///
    /// # Errors
    ///
    /// Returns [`CartOverflow`] when the product does not fit in a `Decimal`.
    pub fn line_total(&self) -> Result<Decimal, CartOverflow> {
        self.price
            .checked_mul(Decimal::from(self.quantity))
            .ok_or(CartOverflow)
    }
}

/// Cart contents keyed by product id.
///
/// Items keep insertion order. Quantities never drop below one; removing an
/// item is an explicit operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Add an item, merging with an existing line of the same id.
    ///
    /// A merge sums the quantities and keeps the existing line's name, price
    /// and image.
    pub fn add(&mut self, mut item: CartItem) {
        item.quantity = item.quantity.max(1);
        if let Some(existing) = self.items.iter_mut().find(|i| i.id == item.id) {
            existing.quantity = existing.quantity.saturating_add(item.quantity);
        } else {
            self.items.push(item);
        }
    }

    /// Set the quantity of a line, clamped to at least one.
    ///
    /// Returns `false` when no line has the given id.
    pub fn update_quantity(&mut self, id: &str, quantity: u32) -> bool {
        match self.items.iter_mut().find(|i| i.id == id) {
            Some(item) => {
                item.quantity = quantity.max(1);
                true
            }
            None => false,
        }
    }

    /// Remove a line. Returns `false` when no line has the given id.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|i| i.id != id);
        self.items.len() != before
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items
            .iter()
            .fold(0_u32, |acc, i| acc.saturating_add(i.quantity))
    }

    /// Sum of all line totals.
    ///
    /// # Errors
    ///
    /// Returns [`CartOverflow`] when any line or the running sum overflows.
    pub fn total(&self) -> Result<Decimal, CartOverflow> {
        self.items.iter().try_fold(Decimal::ZERO, |acc, item| {
            acc.checked_add(item.line_total()?).ok_or(CartOverflow)
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn item(id: &str, price: i64, quantity: u32) -> CartItem {
        CartItem {
            id: id.to_owned(),
            name: format!("Product {id}"),
            price: Decimal::from(price),
            quantity,
            image: None,
        }
    }

    #[test]
    fn test_add_merges_by_id() {
        let mut cart = Cart::new();
        cart.add(item("p1", 10, 2));
        cart.add(item("p2", 5, 1));
        cart.add(item("p1", 99, 3));

        assert_eq!(cart.items().len(), 2);
        let first = cart.items().first().unwrap();
        assert_eq!(first.quantity, 5);
        assert_eq!(first.price, Decimal::from(10));
    }

    #[test]
    fn test_add_zero_quantity_counts_as_one() {
        let mut cart = Cart::new();
        cart.add(item("p1", 10, 0));
        assert_eq!(cart.item_count(), 1);
    }

    #[test]
    fn test_update_quantity_clamps_to_one() {
        let mut cart = Cart::new();
        cart.add(item("p1", 10, 4));

        assert!(cart.update_quantity("p1", 0));
        assert_eq!(cart.items().first().unwrap().quantity, 1);
        assert!(!cart.update_quantity("missing", 3));
    }

    #[test]
    fn test_remove_and_clear() {
        let mut cart = Cart::new();
        cart.add(item("p1", 10, 1));
        cart.add(item("p2", 5, 1));

        assert!(cart.remove("p1"));
        assert!(!cart.remove("p1"));
        assert_eq!(cart.items().len(), 1);

        cart.clear();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_total_and_count() {
        let mut cart = Cart::new();
        cart.add(item("p1", 10, 2));
        cart.add(item("p2", 5, 1));

        assert_eq!(cart.total().unwrap(), Decimal::from(25));
        assert_eq!(cart.item_count(), 3);
    }

    #[test]
    fn test_item_accepts_underscore_id() {
        let parsed: CartItem =
            serde_json::from_str(r#"{"_id":"p9","name":"Whey","price":12.5,"quantity":2}"#)
                .unwrap();
        assert_eq!(parsed.id, "p9");
        assert_eq!(parsed.line_total().unwrap(), Decimal::new(250, 1));
    }

    #[test]
    fn test_line_total_overflow_is_an_error() {
        let mut cart = Cart::new();
        cart.add(CartItem {
            price: Decimal::MAX,
            ..item("p1", 0, 2)
        });

        assert_eq!(cart.items().first().unwrap().line_total(), Err(CartOverflow));
        assert_eq!(cart.total(), Err(CartOverflow));
    }

    #[test]
    fn test_total_overflow_across_lines_is_an_error() {
        let mut cart = Cart::new();
        cart.add(CartItem {
            price: Decimal::MAX,
            ..item("p1", 0, 1)
        });
        cart.add(CartItem {
            price: Decimal::MAX,
            ..item("p2", 0, 1)
        });

        assert!(cart.items().iter().all(|i| i.line_total().is_ok()));
        assert_eq!(cart.total(), Err(CartOverflow));
    }
}
