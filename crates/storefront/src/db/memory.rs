//! In-process implementations of the storage traits.
//!
//! Backs the service tests here and in the integration-tests crate. Each
//! trait method takes the lock once, which gives the same per-statement
//! atomicity the `PostgreSQL` repositories rely on.

use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;

use pencraft_core::api::{Product, ShippingAddress};
use pencraft_core::{
    CartTotals, Email, Money, OrderId, OrderStatus, ProductId, ShippingPolicy, UserId,
};

use super::{CartStorage, CatalogStore, OrderStore, RepositoryError, UserStore};
use crate::models::{CartLine, LiveProduct, Order, OrderItem, User};

#[derive(Debug, Clone)]
struct StoredLine {
    user_id: UserId,
    product_id: ProductId,
    quantity: i32,
    price: Money,
    name: String,
}

#[derive(Default)]
struct Inner {
    products: Vec<Product>,
    users: Vec<(User, String)>,
    lines: Vec<StoredLine>,
    orders: Vec<Order>,
    next_user_id: i32,
    next_order_id: i32,
}

/// Catalog, carts, users and orders held in memory.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with the given products.
    #[must_use]
    pub fn with_products(products: impl IntoIterator<Item = Product>) -> Self {
        let store = Self::new();
        store.lock().products.extend(products);
        store
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A panicking test thread must not wedge the others
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Catalog products in insertion order.
    #[must_use]
    pub fn products(&self) -> Vec<Product> {
        self.lock().products.clone()
    }

    /// Add or replace a catalog product.
    pub fn put_product(&self, product: Product) {
        let mut inner = self.lock();
        inner.products.retain(|p| p.id != product.id);
        inner.products.push(product);
    }

    /// Remove a product from the catalog, leaving cart lines in place.
    pub fn remove_product(&self, id: ProductId) {
        self.lock().products.retain(|p| p.id != id);
    }

    /// Overwrite a product's stock level.
    pub fn set_stock(&self, id: ProductId, stock: i32) {
        if let Some(product) = self.lock().products.iter_mut().find(|p| p.id == id) {
            product.stock = stock;
        }
    }

    /// Overwrite a product's price.
    pub fn set_price(&self, id: ProductId, price: Money) {
        if let Some(product) = self.lock().products.iter_mut().find(|p| p.id == id) {
            product.price = price;
        }
    }

    /// Number of stored lines for `(user, product)`.
    #[must_use]
    pub fn line_count(&self, user_id: UserId, product_id: ProductId) -> usize {
        self.lock()
            .lines
            .iter()
            .filter(|l| l.user_id == user_id && l.product_id == product_id)
            .count()
    }
}

fn view_line(products: &[Product], line: &StoredLine) -> CartLine {
    let product = products
        .iter()
        .find(|p| p.id == line.product_id)
        .map(|p| LiveProduct {
            name: p.name.clone(),
            image: p.image.clone(),
            stock: p.stock,
        });
    CartLine {
        product_id: line.product_id,
        quantity: line.quantity,
        price: line.price,
        name: line.name.clone(),
        product,
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        Ok(self.lock().products.iter().find(|p| p.id == id).cloned())
    }
}

#[async_trait]
impl CartStorage for MemoryStore {
    async fn get_lines(&self, user_id: UserId) -> Result<Vec<CartLine>, RepositoryError> {
        let inner = self.lock();
        Ok(inner
            .lines
            .iter()
            .filter(|l| l.user_id == user_id)
            .map(|l| view_line(&inner.products, l))
            .collect())
    }

    async fn upsert_line(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity_delta: i32,
        price: Money,
        name: &str,
    ) -> Result<(), RepositoryError> {
        let mut guard = self.lock();
        let inner = &mut *guard;
        match inner
            .lines
            .iter_mut()
            .find(|l| l.user_id == user_id && l.product_id == product_id)
        {
            Some(line) => {
                line.quantity = line
                    .quantity
                    .checked_add(quantity_delta)
                    .ok_or_else(|| RepositoryError::OutOfRange("cart line quantity".to_owned()))?;
                line.price = price;
            }
            None => inner.lines.push(StoredLine {
                user_id,
                product_id,
                quantity: quantity_delta,
                price,
                name: name.to_owned(),
            }),
        }
        Ok(())
    }

    async fn set_line(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i32,
        price: Money,
        name: &str,
    ) -> Result<bool, RepositoryError> {
        let mut guard = self.lock();
        let Some(line) = guard
            .lines
            .iter_mut()
            .find(|l| l.user_id == user_id && l.product_id == product_id)
        else {
            return Ok(false);
        };
        line.quantity = quantity;
        line.price = price;
        name.clone_into(&mut line.name);
        Ok(true)
    }

    async fn delete_line(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<bool, RepositoryError> {
        let mut inner = self.lock();
        let before = inner.lines.len();
        inner
            .lines
            .retain(|l| !(l.user_id == user_id && l.product_id == product_id));
        Ok(inner.lines.len() < before)
    }

    async fn delete_all_lines(&self, user_id: UserId) -> Result<u64, RepositoryError> {
        let mut inner = self.lock();
        let before = inner.lines.len();
        inner.lines.retain(|l| l.user_id != user_id);
        Ok(u64::try_from(before - inner.lines.len()).unwrap_or(u64::MAX))
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self
            .lock()
            .users
            .iter()
            .find(|(u, _)| u.id == id)
            .map(|(u, _)| u.clone()))
    }

    async fn get_with_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        Ok(self
            .lock()
            .users
            .iter()
            .find(|(u, _)| u.email == *email)
            .cloned())
    }

    async fn create(
        &self,
        name: &str,
        email: &Email,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        let mut inner = self.lock();
        if inner.users.iter().any(|(u, _)| u.email == *email) {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }
        inner.next_user_id += 1;
        let user = User {
            id: UserId::new(inner.next_user_id),
            name: name.to_owned(),
            email: email.clone(),
            created_at: Utc::now(),
        };
        inner.users.push((user.clone(), password_hash.to_owned()));
        Ok(user)
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn place_from_cart(
        &self,
        user_id: UserId,
        shipping_address: &ShippingAddress,
        policy: &ShippingPolicy,
    ) -> Result<Option<Order>, RepositoryError> {
        let mut inner = self.lock();
        let items: Vec<OrderItem> = inner
            .lines
            .iter()
            .filter(|l| l.user_id == user_id)
            .map(|l| OrderItem {
                product_id: l.product_id,
                name: l.name.clone(),
                quantity: l.quantity,
                price: l.price,
            })
            .collect();
        if items.is_empty() {
            return Ok(None);
        }

        let totals = CartTotals::compute(items.iter().map(|i| (i.price, i.quantity)), policy);
        inner.next_order_id += 1;
        let order = Order {
            id: OrderId::new(inner.next_order_id),
            user_id,
            status: OrderStatus::Pending,
            subtotal: totals.subtotal,
            shipping_cost: totals.shipping,
            total: totals.total,
            shipping_address: shipping_address.clone(),
            items,
            created_at: Utc::now(),
        };
        inner.lines.retain(|l| l.user_id != user_id);
        inner.orders.push(order.clone());
        Ok(Some(order))
    }

    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        // Ids grow with insertion, so reverse insertion order is newest first
        Ok(self
            .lock()
            .orders
            .iter()
            .rev()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect())
    }
}
