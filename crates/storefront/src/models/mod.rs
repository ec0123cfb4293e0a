//! Domain models for storefront.

pub mod catalog;
pub mod order;
pub mod session;
pub mod user;

pub use catalog::{
    CatalogImport, Category, Image, NewCategory, NewProduct, NutritionalInfo, Product,
    ProductFilter,
};
pub use order::{
    AdminOrder, ApplyPayment, InsertPaidOrder, NewOrder, NewPaidOrder, Order, OrderCustomer,
    OrderFilter, OrderStatusUpdate, PaymentDetails,
};
pub use session::{RequestContext, keys as session_keys};
pub use user::{NewUser, User, UserProfile};
