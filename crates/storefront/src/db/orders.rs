//! Order repository.
//!
//! Placement runs in one transaction: the user's cart lines are locked with
//! `FOR UPDATE`, copied into the order, then deleted. A concurrent cart
//! mutation for the same user waits for the commit.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;

use pencraft_core::api::ShippingAddress;
use pencraft_core::{CartTotals, Money, OrderId, OrderStatus, ProductId, ShippingPolicy, UserId};

use super::{OrderStore, RepositoryError};
use crate::models::{Order, OrderItem};

#[derive(sqlx::FromRow)]
struct LockedLineRow {
    product_id: ProductId,
    name: String,
    quantity: i32,
    price: Money,
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    user_id: UserId,
    status: String,
    subtotal: Money,
    shipping_cost: Money,
    total: Money,
    shipping_address: Json<ShippingAddress>,
    created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct OrderItemRow {
    order_id: OrderId,
    product_id: ProductId,
    name: String,
    quantity: i32,
    price: Money,
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItem>) -> Result<Order, RepositoryError> {
        let status = self.status.parse::<OrderStatus>().map_err(|e| {
            RepositoryError::DataCorruption(format!("order {}: {e}", self.id))
        })?;

        Ok(Order {
            id: self.id,
            user_id: self.user_id,
            status,
            subtotal: self.subtotal,
            shipping_cost: self.shipping_cost,
            total: self.total,
            shipping_address: self.shipping_address.0,
            items,
            created_at: self.created_at,
        })
    }
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        Self {
            product_id: row.product_id,
            name: row.name,
            quantity: row.quantity,
            price: row.price,
        }
    }
}

const ORDER_COLUMNS: &str = "id, user_id, status::text AS status, subtotal, shipping_cost, \
     total, shipping_address, created_at";

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderStore for OrderRepository<'_> {
    async fn place_from_cart(
        &self,
        user_id: UserId,
        shipping_address: &ShippingAddress,
        policy: &ShippingPolicy,
    ) -> Result<Option<Order>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let lines = sqlx::query_as::<_, LockedLineRow>(
            r"
            SELECT product_id, name, quantity, price
            FROM pencraft.cart_line
            WHERE user_id = $1
            ORDER BY created_at, id
            FOR UPDATE
            ",
        )
        .bind(user_id)
        .fetch_all(&mut *tx)
        .await?;

        if lines.is_empty() {
            tx.rollback().await?;
            return Ok(None);
        }

        let totals = CartTotals::compute(lines.iter().map(|l| (l.price, l.quantity)), policy);

        let order = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            INSERT INTO pencraft.order
                (user_id, subtotal, shipping_cost, total, status, shipping_address)
            VALUES ($1, $2, $3, $4, $5::text::pencraft.order_status, $6)
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(user_id)
        .bind(totals.subtotal)
        .bind(totals.shipping)
        .bind(totals.total)
        .bind(OrderStatus::Pending.to_string())
        .bind(Json(shipping_address))
        .fetch_one(&mut *tx)
        .await?;

        let mut items = Vec::with_capacity(lines.len());
        for line in lines {
            sqlx::query(
                r"
                INSERT INTO pencraft.order_item (order_id, product_id, name, quantity, price)
                VALUES ($1, $2, $3, $4, $5)
                ",
            )
            .bind(order.id)
            .bind(line.product_id)
            .bind(&line.name)
            .bind(line.quantity)
            .bind(line.price)
            .execute(&mut *tx)
            .await?;

            items.push(OrderItem {
                product_id: line.product_id,
                name: line.name,
                quantity: line.quantity,
                price: line.price,
            });
        }

        sqlx::query("DELETE FROM pencraft.cart_line WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        order.into_order(items).map(Some)
    }

    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let orders = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            SELECT {ORDER_COLUMNS}
            FROM pencraft.order
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            "
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        if orders.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i32> = orders.iter().map(|o| o.id.as_i32()).collect();
        let item_rows = sqlx::query_as::<_, OrderItemRow>(
            r"
            SELECT order_id, product_id, name, quantity, price
            FROM pencraft.order_item
            WHERE order_id = ANY($1)
            ORDER BY id
            ",
        )
        .bind(&ids)
        .fetch_all(self.pool)
        .await?;

        let mut items_by_order: HashMap<OrderId, Vec<OrderItem>> = HashMap::new();
        for row in item_rows {
            items_by_order
                .entry(row.order_id)
                .or_default()
                .push(OrderItem::from(row));
        }

        orders
            .into_iter()
            .map(|order| {
                let items = items_by_order.remove(&order.id).unwrap_or_default();
                order.into_order(items)
            })
            .collect()
    }
}
