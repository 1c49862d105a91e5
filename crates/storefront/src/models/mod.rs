//! Domain models for the storefront.
//!
//! These types represent validated domain objects separate from database row
//! types. Products have no separate domain type; the catalog is read-only and
//! [`pencraft_core::api::Product`] is used throughout.

pub mod cart;
pub mod order;
pub mod user;

pub use cart::{CartLine, LiveProduct};
pub use order::{Order, OrderItem};
pub use user::User;
