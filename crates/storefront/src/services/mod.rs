//! Business logic services for storefront.
//!
//! # Services
//!
//! - `auth` - Registration, login and bearer-token authorization
//! - `cart` - Server-side cart reconciliation against the catalog
//! - `orders` - Checkout from the cart and order history
//!
//! Services borrow the storage traits from [`crate::db`] and are built per
//! request, so tests can run them against the in-memory store.

pub mod auth;
pub mod cart;
pub mod orders;

pub use auth::{AuthError, AuthService, Authenticated};
pub use cart::{CartError, CartService};
pub use orders::{OrderError, OrderService};
