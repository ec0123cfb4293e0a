//! Core types for VitaForge.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod address;
pub mod cart;
pub mod email;
pub mod id;
pub mod slug;
pub mod status;

pub use address::{
    AddressBook, AddressEdit, AddressError, AddressInput, SavedAddress, ShippingAddress,
};
pub use cart::{Cart, CartItem, CartOverflow};
pub use email::{Email, EmailError};
pub use id::*;
pub use slug::slugify;
pub use status::*;
