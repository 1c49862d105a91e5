//! Order domain types.

use chrono::{DateTime, Utc};

use pencraft_core::api::{OrderItemView, OrderView, ShippingAddress};
use pencraft_core::{Money, OrderId, OrderStatus, ProductId, UserId};

/// A placed order with its item snapshots.
#[derive(Debug, Clone)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub status: OrderStatus,
    pub subtotal: Money,
    pub shipping_cost: Money,
    /// `subtotal + shipping_cost`.
    pub total: Money,
    pub shipping_address: ShippingAddress,
    pub items: Vec<OrderItem>,
    pub created_at: DateTime<Utc>,
}

/// One product line of an order, copied from the cart at checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderItem {
    pub product_id: ProductId,
    pub name: String,
    pub quantity: i32,
    pub price: Money,
}

impl From<OrderItem> for OrderItemView {
    fn from(item: OrderItem) -> Self {
        Self {
            product_id: item.product_id,
            name: item.name,
            quantity: item.quantity,
            price: item.price,
        }
    }
}

impl From<Order> for OrderView {
    fn from(order: Order) -> Self {
        Self {
            id: order.id,
            status: order.status,
            subtotal: order.subtotal,
            shipping_cost: order.shipping_cost,
            total: order.total,
            shipping_address: order.shipping_address,
            items: order.items.into_iter().map(OrderItemView::from).collect(),
            created_at: order.created_at,
        }
    }
}
