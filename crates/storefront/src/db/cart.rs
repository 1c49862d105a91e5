//! Cart line repository.
//!
//! All writes are single statements. The add path relies on the
//! `(user_id, product_id)` unique constraint and `ON CONFLICT` to merge
//! quantities, so concurrent adds of the same product never produce two
//! lines or lose an increment.

use async_trait::async_trait;
use sqlx::PgPool;

use pencraft_core::{Money, ProductId, UserId};

use super::{CartStorage, RepositoryError};
use crate::models::{CartLine, LiveProduct};

#[derive(sqlx::FromRow)]
struct CartLineRow {
    product_id: ProductId,
    quantity: i32,
    price: Money,
    name: String,
    product_name: Option<String>,
    product_image: Option<String>,
    product_stock: Option<i32>,
}

impl From<CartLineRow> for CartLine {
    fn from(row: CartLineRow) -> Self {
        let product = match (row.product_name, row.product_image, row.product_stock) {
            (Some(name), Some(image), Some(stock)) => Some(LiveProduct { name, image, stock }),
            _ => None,
        };
        Self {
            product_id: row.product_id,
            quantity: row.quantity,
            price: row.price,
            name: row.name,
            product,
        }
    }
}

/// Repository for cart line database operations.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CartStorage for CartRepository<'_> {
    async fn get_lines(&self, user_id: UserId) -> Result<Vec<CartLine>, RepositoryError> {
        let rows = sqlx::query_as::<_, CartLineRow>(
            r"
            SELECT c.product_id, c.quantity, c.price, c.name,
                   p.name AS product_name,
                   p.image AS product_image,
                   p.stock AS product_stock
            FROM pencraft.cart_line c
            LEFT JOIN pencraft.product p ON p.id = c.product_id
            WHERE c.user_id = $1
            ORDER BY c.created_at, c.id
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(CartLine::from).collect())
    }

    async fn upsert_line(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity_delta: i32,
        price: Money,
        name: &str,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO pencraft.cart_line (user_id, product_id, quantity, price, name)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id, product_id) DO UPDATE
            SET quantity = pencraft.cart_line.quantity + EXCLUDED.quantity,
                price = EXCLUDED.price,
                updated_at = now()
            ",
        )
        .bind(user_id)
        .bind(product_id)
        .bind(quantity_delta)
        .bind(price)
        .bind(name)
        .execute(self.pool)
        .await
        .map_err(|e| RepositoryError::from_arithmetic(e, "cart line quantity"))?;

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
        let result = sqlx::query(
            r"
            UPDATE pencraft.cart_line
            SET quantity = $3, price = $4, name = $5, updated_at = now()
            WHERE user_id = $1 AND product_id = $2
            ",
        )
        .bind(user_id)
        .bind(product_id)
        .bind(quantity)
        .bind(price)
        .bind(name)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_line(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<bool, RepositoryError> {
        let result =
            sqlx::query("DELETE FROM pencraft.cart_line WHERE user_id = $1 AND product_id = $2")
                .bind(user_id)
                .bind(product_id)
                .execute(self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_all_lines(&self, user_id: UserId) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM pencraft.cart_line WHERE user_id = $1")
            .bind(user_id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
