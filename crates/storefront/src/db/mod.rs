//! Database operations for the storefront `PostgreSQL`.
//!
//! # Schema: `pencraft`
//!
//! - `user` - Registered accounts with Argon2id password hashes
//! - `product` - Catalog, written only by seeding
//! - `cart_line` - One row per (user, product), `quantity > 0`
//! - `order` / `order_item` - Checkout snapshots
//!
//! # Storage seams
//!
//! Services talk to storage through the traits in this module. The
//! repositories are the `PostgreSQL` implementations; [`memory`] provides
//! in-process ones for tests.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p pencraft-cli -- migrate
//! ```

pub mod cart;
#[cfg(any(test, feature = "test-support"))]
pub mod memory;
pub mod orders;
pub mod products;
pub mod users;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use pencraft_core::api::{Product, ShippingAddress};
use pencraft_core::{Email, Money, ProductId, ShippingPolicy, UserId};

use crate::models::{CartLine, Order, User};

pub use cart::CartRepository;
pub use orders::OrderRepository;
pub use products::{ProductPage, ProductQuery, ProductRepository};
pub use users::UserRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// A computed value does not fit its column.
    #[error("value out of range: {0}")]
    OutOfRange(String),
}

impl RepositoryError {
    /// Map unique violations to `Conflict`, everything else to `Database`.
    pub(crate) fn from_insert(err: sqlx::Error, what: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err
            && db_err.is_unique_violation()
        {
            return Self::Conflict(format!("{what} already exists"));
        }
        Self::Database(err)
    }

    /// Map numeric overflow (`22003`) to `OutOfRange`, everything else to
    /// `Database`.
    pub(crate) fn from_arithmetic(err: sqlx::Error, what: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err
            && db_err.code().as_deref() == Some(NUMERIC_VALUE_OUT_OF_RANGE)
        {
            return Self::OutOfRange(what.to_owned());
        }
        Self::Database(err)
    }
}

const NUMERIC_VALUE_OUT_OF_RANGE: &str = "22003";

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

// =============================================================================
// Storage traits
// =============================================================================

/// Read access to the product catalog.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;
}

/// Persistent per-user cart lines.
///
/// Every mutation is a single statement; implementations must not read and
/// then write.
#[async_trait]
pub trait CartStorage: Send + Sync {
    /// All lines for a user, joined with live product fields where available.
    async fn get_lines(&self, user_id: UserId) -> Result<Vec<CartLine>, RepositoryError>;

    /// Insert a line or add `quantity_delta` to the existing one, refreshing
    /// the stored price. The name is only written on insert. A sum past
    /// `i32::MAX` fails with `OutOfRange` and leaves the line unchanged.
    async fn upsert_line(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity_delta: i32,
        price: Money,
        name: &str,
    ) -> Result<(), RepositoryError>;

    /// Overwrite quantity, price and name of an existing line.
    ///
    /// Returns `false` when the user has no line for the product.
    async fn set_line(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i32,
        price: Money,
        name: &str,
    ) -> Result<bool, RepositoryError>;

    /// Returns `false` when there was nothing to delete.
    async fn delete_line(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<bool, RepositoryError>;

    /// Returns the number of deleted lines.
    async fn delete_all_lines(&self, user_id: UserId) -> Result<u64, RepositoryError>;
}

/// Account storage.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    /// Look up a user together with their password hash.
    async fn get_with_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError>;

    /// Returns `RepositoryError::Conflict` if the email is taken.
    async fn create(
        &self,
        name: &str,
        email: &Email,
        password_hash: &str,
    ) -> Result<User, RepositoryError>;
}

/// Order placement and history.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Atomically turn the user's cart into a pending order and empty the
    /// cart. Returns `None` if the cart is empty.
    async fn place_from_cart(
        &self,
        user_id: UserId,
        shipping_address: &ShippingAddress,
        policy: &ShippingPolicy,
    ) -> Result<Option<Order>, RepositoryError>;

    /// The user's orders, newest first.
    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError>;
}
