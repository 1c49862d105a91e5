//! Order placement.

use thiserror::Error;
use tracing::instrument;

use pencraft_core::api::ShippingAddress;
use pencraft_core::{ShippingPolicy, UserId};

use crate::db::{OrderStore, RepositoryError};
use crate::models::Order;

/// Errors from order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    /// Checkout with no cart lines.
    #[error("cart is empty")]
    EmptyCart,

    /// A required shipping field is blank.
    #[error("shipping address field `{0}` is required")]
    MissingAddressField(&'static str),

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Turns carts into orders.
pub struct OrderService<'a> {
    orders: &'a dyn OrderStore,
    shipping: ShippingPolicy,
}

impl<'a> OrderService<'a> {
    #[must_use]
    pub const fn new(orders: &'a dyn OrderStore, shipping: ShippingPolicy) -> Self {
        Self { orders, shipping }
    }

    /// Snapshot the user's cart into a pending order and empty the cart.
    ///
    /// # Errors
    ///
    /// Returns `MissingAddressField` for a blank address field and
    /// `EmptyCart` when there is nothing to order.
    #[instrument(skip(self, shipping_address))]
    pub async fn place_order(
        &self,
        user_id: UserId,
        shipping_address: &ShippingAddress,
    ) -> Result<Order, OrderError> {
        validate_address(shipping_address)?;

        let order = self
            .orders
            .place_from_cart(user_id, shipping_address, &self.shipping)
            .await?
            .ok_or(OrderError::EmptyCart)?;

        tracing::info!(
            order_id = %order.id,
            %user_id,
            total = %order.total,
            items = order.items.len(),
            "Order placed"
        );
        Ok(order)
    }

    /// The user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Repository` if storage fails.
    pub async fn list_orders(&self, user_id: UserId) -> Result<Vec<Order>, OrderError> {
        Ok(self.orders.list_for_user(user_id).await?)
    }
}

fn validate_address(address: &ShippingAddress) -> Result<(), OrderError> {
    let fields = [
        ("name", &address.name),
        ("address", &address.address),
        ("city", &address.city),
        ("postal_code", &address.postal_code),
        ("phone", &address.phone),
    ];
    for (field, value) in fields {
        if value.trim().is_empty() {
            return Err(OrderError::MissingAddressField(field));
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;

    use pencraft_core::api::Product;
    use pencraft_core::{Money, OrderStatus, ProductId};

    use super::*;
    use crate::db::memory::MemoryStore;
    use crate::services::CartService;

    const USER: UserId = UserId::new(3);

    fn address() -> ShippingAddress {
        ShippingAddress {
            name: "Анна".to_string(),
            address: "ул. Примерная, д. 123".to_string(),
            city: "Москва".to_string(),
            postal_code: "123456".to_string(),
            phone: "+7 (999) 123-45-67".to_string(),
        }
    }

    fn product(id: i32, price: i64) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("Товар {id}"),
            price: Money::from_rubles(price),
            stock: 100,
            category: "paper".to_string(),
            brand: "moleskine".to_string(),
            rating: Decimal::new(46, 1),
            description: String::new(),
            image: String::new(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_place_order_snapshots_and_clears_cart() {
        let store = MemoryStore::with_products([product(1, 1200), product(2, 480)]);
        let cart = CartService::new(&store, &store);
        cart.add_item(USER, ProductId::new(1), 1).await.unwrap();
        cart.add_item(USER, ProductId::new(2), 2).await.unwrap();

        let orders = OrderService::new(&store, ShippingPolicy::default());
        let order = orders.place_order(USER, &address()).await.unwrap();

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.items.len(), 2);
        assert_eq!(order.subtotal, Money::from_rubles(2160));
        assert_eq!(order.shipping_cost, Money::from_rubles(350));
        assert_eq!(order.total, Money::from_rubles(2510));
        assert!(cart.get_cart(USER).await.unwrap().items.is_empty());
    }

    #[tokio::test]
    async fn test_free_shipping_over_threshold() {
        let store = MemoryStore::with_products([product(1, 1600)]);
        let cart = CartService::new(&store, &store);
        cart.add_item(USER, ProductId::new(1), 2).await.unwrap();

        let order = OrderService::new(&store, ShippingPolicy::default())
            .place_order(USER, &address())
            .await
            .unwrap();
        assert_eq!(order.shipping_cost, Money::ZERO);
        assert_eq!(order.total, Money::from_rubles(3200));
    }

    #[tokio::test]
    async fn test_empty_cart_is_rejected() {
        let store = MemoryStore::new();
        let orders = OrderService::new(&store, ShippingPolicy::default());
        assert!(matches!(
            orders.place_order(USER, &address()).await,
            Err(OrderError::EmptyCart)
        ));
    }

    #[tokio::test]
    async fn test_blank_address_field_is_rejected() {
        let store = MemoryStore::with_products([product(1, 100)]);
        CartService::new(&store, &store)
            .add_item(USER, ProductId::new(1), 1)
            .await
            .unwrap();

        let mut addr = address();
        addr.city = "  ".to_string();
        let orders = OrderService::new(&store, ShippingPolicy::default());
        assert!(matches!(
            orders.place_order(USER, &addr).await,
            Err(OrderError::MissingAddressField("city"))
        ));
    }

    #[tokio::test]
    async fn test_list_orders_newest_first() {
        let store = MemoryStore::with_products([product(1, 100)]);
        let cart = CartService::new(&store, &store);
        let orders = OrderService::new(&store, ShippingPolicy::default());

        cart.add_item(USER, ProductId::new(1), 1).await.unwrap();
        let first = orders.place_order(USER, &address()).await.unwrap();
        cart.add_item(USER, ProductId::new(1), 2).await.unwrap();
        let second = orders.place_order(USER, &address()).await.unwrap();

        let listed = orders.list_orders(USER).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, second.id);
        assert_eq!(listed[1].id, first.id);
        assert!(orders.list_orders(UserId::new(99)).await.unwrap().is_empty());
    }
}
