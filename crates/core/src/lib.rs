//! VitaForge Core - Shared domain types.
//!
//! This crate provides the types used across all VitaForge components:
//! - `storefront` - Storefront API, checkout, payment webhooks and admin console
//! - `cli` - Command-line tools for migrations and management
//!
//! # Architecture
//!
//! The core crate contains only types and pure domain rules - no I/O, no
//! database access, no HTTP clients. Cart merging and the shipping address
//! default invariant live here so every adapter applies them identically.
//!
//! # Modules
//!
//! - [`types`] - Type-safe IDs, emails, statuses, cart items, addresses and slugs

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
