//! Cart service.
//!
//! Reconciles cart requests against the catalog and the stored lines. The
//! service is the only writer of cart lines and keeps three rules:
//!
//! - at most one line per `(user, product)`; adds merge into it
//! - stored quantities are always at least 1
//! - the stored price is the catalog price at the last add or update
//!
//! Stock is checked against the requested quantity only, at the moment of
//! the request. Nothing is reserved.

use thiserror::Error;
use tracing::instrument;

use pencraft_core::api::{CartItemView, CartView, Product};
use pencraft_core::{Money, ProductId, UserId};

use crate::db::{CartStorage, CatalogStore, RepositoryError};

/// Errors from cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// Quantity outside the accepted range for the operation.
    #[error("invalid quantity: {0}")]
    InvalidQuantity(i32),

    /// The product does not exist in the catalog.
    #[error("product {0} not found")]
    ProductNotFound(ProductId),

    /// The user's cart has no line for the product.
    #[error("product {0} is not in the cart")]
    LineNotFound(ProductId),

    /// The catalog does not have enough units.
    #[error("insufficient stock for product {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: ProductId,
        requested: i32,
        available: i32,
    },

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Cart operations for one authenticated user at a time.
pub struct CartService<'a> {
    catalog: &'a dyn CatalogStore,
    storage: &'a dyn CartStorage,
}

impl<'a> CartService<'a> {
    #[must_use]
    pub const fn new(catalog: &'a dyn CatalogStore, storage: &'a dyn CartStorage) -> Self {
        Self { catalog, storage }
    }

    /// The user's cart with totals. An empty cart is not an error.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if storage fails.
    #[instrument(skip(self))]
    pub async fn get_cart(&self, user_id: UserId) -> Result<CartView, CartError> {
        let lines = self.storage.get_lines(user_id).await?;

        let total_items = lines.iter().map(|l| i64::from(l.quantity)).sum();
        let total_price: Money = lines.iter().map(crate::models::CartLine::line_total).sum();

        Ok(CartView {
            items: lines.into_iter().map(CartItemView::from).collect(),
            total_items,
            total_price,
        })
    }

    /// Add `quantity` units, merging into an existing line.
    ///
    /// # Errors
    ///
    /// - `InvalidQuantity` if `quantity < 1`
    /// - `ProductNotFound` if the product does not exist
    /// - `InsufficientStock` if stock is below `quantity`
    /// - `InvalidQuantity` if the merged quantity would pass `i32::MAX`
    #[instrument(skip(self))]
    pub async fn add_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<(), CartError> {
        if quantity < 1 {
            return Err(CartError::InvalidQuantity(quantity));
        }

        let product = self.product_with_stock(product_id, quantity).await?;

        self.storage
            .upsert_line(user_id, product_id, quantity, product.price, &product.name)
            .await
            .map_err(|e| match e {
                RepositoryError::OutOfRange(_) => CartError::InvalidQuantity(quantity),
                other => CartError::Repository(other),
            })?;

        tracing::debug!(%user_id, %product_id, quantity, "Cart line added");
        Ok(())
    }

    /// Set the quantity of an existing line, refreshing price and name.
    ///
    /// # Errors
    ///
    /// - `InvalidQuantity` if `quantity < 1`; callers route those to removal
    /// - `ProductNotFound` if the product does not exist
    /// - `InsufficientStock` if stock is below `quantity`
    /// - `LineNotFound` if the cart has no line for the product
    #[instrument(skip(self))]
    pub async fn update_quantity(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<(), CartError> {
        if quantity < 1 {
            return Err(CartError::InvalidQuantity(quantity));
        }

        let product = self.product_with_stock(product_id, quantity).await?;

        let updated = self
            .storage
            .set_line(user_id, product_id, quantity, product.price, &product.name)
            .await?;
        if !updated {
            return Err(CartError::LineNotFound(product_id));
        }

        Ok(())
    }

    /// Delete the line for a product.
    ///
    /// # Errors
    ///
    /// Returns `LineNotFound` if the cart has no line for the product.
    #[instrument(skip(self))]
    pub async fn remove_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<(), CartError> {
        if !self.storage.delete_line(user_id, product_id).await? {
            return Err(CartError::LineNotFound(product_id));
        }
        Ok(())
    }

    /// Delete every line. Succeeds on an empty cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if storage fails.
    #[instrument(skip(self))]
    pub async fn clear_cart(&self, user_id: UserId) -> Result<u64, CartError> {
        let removed = self.storage.delete_all_lines(user_id).await?;
        tracing::debug!(%user_id, removed, "Cart cleared");
        Ok(removed)
    }

    async fn product_with_stock(
        &self,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<Product, CartError> {
        let product = self
            .catalog
            .get_product(product_id)
            .await?
            .ok_or(CartError::ProductNotFound(product_id))?;

        if product.stock < quantity {
            return Err(CartError::InsufficientStock {
                product_id,
                requested: quantity,
                available: product.stock,
            });
        }

        Ok(product)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;

    use super::*;
    use crate::db::memory::MemoryStore;

    const USER: UserId = UserId::new(7);

    fn product(id: i32, price: i64, stock: i32) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("Товар {id}"),
            price: Money::from_rubles(price),
            stock,
            category: "pens".to_string(),
            brand: "pencraft".to_string(),
            rating: Decimal::new(48, 1),
            description: String::new(),
            image: String::new(),
            created_at: Utc::now(),
        }
    }

    fn store() -> MemoryStore {
        MemoryStore::with_products([product(1, 250, 50), product(2, 480, 5)])
    }

    #[tokio::test]
    async fn test_add_merges_quantities() {
        let store = store();
        let cart = CartService::new(&store, &store);

        cart.add_item(USER, ProductId::new(1), 2).await.unwrap();
        cart.add_item(USER, ProductId::new(1), 3).await.unwrap();

        let view = cart.get_cart(USER).await.unwrap();
        assert_eq!(view.items.len(), 1);
        assert_eq!(view.items[0].quantity, 5);
        assert_eq!(view.total_items, 5);
        assert_eq!(view.total_price, Money::from_rubles(1250));
        assert_eq!(store.line_count(USER, ProductId::new(1)), 1);
    }

    #[tokio::test]
    async fn test_add_refreshes_price() {
        let store = store();
        let cart = CartService::new(&store, &store);

        cart.add_item(USER, ProductId::new(1), 1).await.unwrap();
        store.set_price(ProductId::new(1), Money::from_rubles(300));
        cart.add_item(USER, ProductId::new(1), 1).await.unwrap();

        let view = cart.get_cart(USER).await.unwrap();
        assert_eq!(view.items[0].price, Money::from_rubles(300));
        assert_eq!(view.total_price, Money::from_rubles(600));
    }

    #[tokio::test]
    async fn test_add_rejects_insufficient_stock() {
        let store = store();
        let cart = CartService::new(&store, &store);

        let err = cart.add_item(USER, ProductId::new(2), 6).await.unwrap_err();
        assert!(matches!(
            err,
            CartError::InsufficientStock {
                requested: 6,
                available: 5,
                ..
            }
        ));
        assert!(cart.get_cart(USER).await.unwrap().items.is_empty());
    }

    #[tokio::test]
    async fn test_add_checks_requested_quantity_only() {
        let store = store();
        let cart = CartService::new(&store, &store);

        cart.add_item(USER, ProductId::new(2), 4).await.unwrap();
        cart.add_item(USER, ProductId::new(2), 4).await.unwrap();

        let view = cart.get_cart(USER).await.unwrap();
        assert_eq!(view.items[0].quantity, 8);
    }

    #[tokio::test]
    async fn test_add_past_i32_max_keeps_line() {
        let store = MemoryStore::with_products([product(3, 10, i32::MAX)]);
        let cart = CartService::new(&store, &store);

        cart.add_item(USER, ProductId::new(3), i32::MAX).await.unwrap();
        assert!(matches!(
            cart.add_item(USER, ProductId::new(3), 1).await,
            Err(CartError::InvalidQuantity(1))
        ));

        let view = cart.get_cart(USER).await.unwrap();
        assert_eq!(view.items.len(), 1);
        assert_eq!(view.items[0].quantity, i32::MAX);
    }

    #[tokio::test]
    async fn test_concurrent_adds_merge_into_one_line() {
        let store = store();
        let cart = CartService::new(&store, &store);

        let adds = (1..=10).map(|q| cart.add_item(USER, ProductId::new(1), q));
        for result in futures::future::join_all(adds).await {
            result.unwrap();
        }

        assert_eq!(store.line_count(USER, ProductId::new(1)), 1);
        let view = cart.get_cart(USER).await.unwrap();
        assert_eq!(view.items[0].quantity, 55);
    }

    #[tokio::test]
    async fn test_add_rejects_bad_input() {
        let store = store();
        let cart = CartService::new(&store, &store);

        assert!(matches!(
            cart.add_item(USER, ProductId::new(1), 0).await,
            Err(CartError::InvalidQuantity(0))
        ));
        assert!(matches!(
            cart.add_item(USER, ProductId::new(99), 1).await,
            Err(CartError::ProductNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_update_quantity() {
        let store = store();
        let cart = CartService::new(&store, &store);

        cart.add_item(USER, ProductId::new(1), 2).await.unwrap();
        cart.update_quantity(USER, ProductId::new(1), 7).await.unwrap();
        assert_eq!(cart.get_cart(USER).await.unwrap().items[0].quantity, 7);

        assert!(matches!(
            cart.update_quantity(USER, ProductId::new(1), 0).await,
            Err(CartError::InvalidQuantity(0))
        ));
        assert_eq!(cart.get_cart(USER).await.unwrap().items[0].quantity, 7);
    }

    #[tokio::test]
    async fn test_update_missing_line() {
        let store = store();
        let cart = CartService::new(&store, &store);

        assert!(matches!(
            cart.update_quantity(USER, ProductId::new(1), 1).await,
            Err(CartError::LineNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_update_rejects_insufficient_stock() {
        let store = store();
        let cart = CartService::new(&store, &store);

        cart.add_item(USER, ProductId::new(2), 1).await.unwrap();
        assert!(matches!(
            cart.update_quantity(USER, ProductId::new(2), 6).await,
            Err(CartError::InsufficientStock { .. })
        ));
    }

    #[tokio::test]
    async fn test_remove_is_strict() {
        let store = store();
        let cart = CartService::new(&store, &store);

        cart.add_item(USER, ProductId::new(1), 1).await.unwrap();
        cart.remove_item(USER, ProductId::new(1)).await.unwrap();
        assert!(cart.get_cart(USER).await.unwrap().items.is_empty());

        assert!(matches!(
            cart.remove_item(USER, ProductId::new(1)).await,
            Err(CartError::LineNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_clear_is_idempotent() {
        let store = store();
        let cart = CartService::new(&store, &store);

        cart.add_item(USER, ProductId::new(1), 1).await.unwrap();
        cart.add_item(USER, ProductId::new(2), 1).await.unwrap();

        assert_eq!(cart.clear_cart(USER).await.unwrap(), 2);
        assert_eq!(cart.clear_cart(USER).await.unwrap(), 0);

        let view = cart.get_cart(USER).await.unwrap();
        assert!(view.items.is_empty());
        assert_eq!(view.total_items, 0);
    }

    #[tokio::test]
    async fn test_carts_are_per_user() {
        let store = store();
        let cart = CartService::new(&store, &store);
        let other = UserId::new(8);

        cart.add_item(USER, ProductId::new(1), 1).await.unwrap();
        cart.clear_cart(other).await.unwrap();

        assert_eq!(cart.get_cart(USER).await.unwrap().total_items, 1);
        assert!(cart.get_cart(other).await.unwrap().items.is_empty());
    }
}
