//! Business logic services for storefront.
//!
//! Services borrow the repositories and gateway from [`AppState`] for the
//! duration of a request and take the caller's [`RequestContext`]
//! explicitly.
//!
//! # Services
//!
//! - `auth` - Registration and password login
//! - `account` - Profile and address book
//! - `catalog` - Product and category browsing, seed imports
//! - `checkout` - Pending order plus payment preference
//! - `orders` - Order history and the admin status console
//! - `reconcile` - Webhook-driven payment reconciliation
//!
//! [`AppState`]: crate::state::AppState
//! [`RequestContext`]: crate::models::RequestContext

pub mod account;
pub mod auth;
pub mod catalog;
pub mod checkout;
pub mod orders;
pub mod reconcile;

pub use account::{AccountError, AccountService, ProfileUpdate};
pub use auth::{AuthError, AuthService, LoginInput, RegisterInput};
pub use catalog::{CatalogError, CatalogService, ImportReport};
pub use checkout::{
    CheckoutError, CheckoutRequest, CheckoutService, CheckoutSession, PreferenceOnlyRequest,
};
pub use orders::{OrderError, OrderService};
pub use reconcile::{PaymentNotification, ReconcileError, ReconcileOutcome, ReconcileService};
