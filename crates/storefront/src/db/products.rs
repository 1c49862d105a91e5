//! Product repository for catalog reads and seeding.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use pencraft_core::api::{Pagination, Product};
use pencraft_core::{Money, ProductId};

use super::{CatalogStore, RepositoryError};

/// Largest page size `/products` will serve.
pub const MAX_PAGE_SIZE: i64 = 1000;

/// Filters and paging for a catalog listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductQuery {
    pub category: Option<String>,
    /// Case-insensitive substring of name or description.
    pub search: Option<String>,
    /// 1-based page number.
    pub page: i64,
    pub limit: i64,
}

impl Default for ProductQuery {
    fn default() -> Self {
        Self {
            category: None,
            search: None,
            page: 1,
            limit: MAX_PAGE_SIZE,
        }
    }
}

impl ProductQuery {
    /// Clamp paging values into range and drop blank filters.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.page = self.page.max(1);
        self.limit = self.limit.clamp(1, MAX_PAGE_SIZE);
        self.category = self.category.filter(|c| !c.trim().is_empty());
        self.search = self
            .search
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty());
        self
    }

    #[must_use]
    pub const fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }

    /// Pagination block for a result set of `total_items`.
    #[must_use]
    pub const fn pagination(&self, total_items: i64) -> Pagination {
        let total_pages = if total_items == 0 {
            0
        } else {
            (total_items + self.limit - 1) / self.limit
        };
        Pagination {
            current_page: self.page,
            total_pages,
            total_items,
            items_per_page: self.limit,
        }
    }

    fn search_pattern(&self) -> Option<String> {
        self.search.as_deref().map(|s| format!("%{}%", escape_like(s)))
    }
}

/// One page of products plus the unpaged match count.
#[derive(Debug, Clone)]
pub struct ProductPage {
    pub products: Vec<Product>,
    pub total_items: i64,
}

/// Fields for inserting a catalog product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub price: Money,
    pub stock: i32,
    pub category: String,
    pub brand: String,
    pub rating: Decimal,
    pub description: String,
    pub image: String,
}

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: ProductId,
    name: String,
    price: Money,
    stock: i32,
    category: String,
    brand: String,
    rating: Decimal,
    description: String,
    image: String,
    created_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            price: row.price,
            stock: row.stock,
            category: row.category,
            brand: row.brand,
            rating: row.rating,
            description: row.description,
            image: row.image,
            created_at: row.created_at,
        }
    }
}

const PRODUCT_COLUMNS: &str =
    "id, name, price, stock, category, brand, rating, description, image, created_at";

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM pencraft.product WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Product::from))
    }

    /// List products matching the query, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, query: &ProductQuery) -> Result<ProductPage, RepositoryError> {
        let pattern = query.search_pattern();

        let total_items: i64 = sqlx::query_scalar(
            r"
            SELECT COUNT(*)
            FROM pencraft.product
            WHERE ($1::text IS NULL OR category = $1)
              AND ($2::text IS NULL OR name ILIKE $2 OR description ILIKE $2)
            ",
        )
        .bind(query.category.as_deref())
        .bind(pattern.as_deref())
        .fetch_one(self.pool)
        .await?;

        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            SELECT {PRODUCT_COLUMNS}
            FROM pencraft.product
            WHERE ($1::text IS NULL OR category = $1)
              AND ($2::text IS NULL OR name ILIKE $2 OR description ILIKE $2)
            ORDER BY created_at DESC, id DESC
            LIMIT $3 OFFSET $4
            "
        ))
        .bind(query.category.as_deref())
        .bind(pattern.as_deref())
        .bind(query.limit)
        .bind(query.offset())
        .fetch_all(self.pool)
        .await?;

        Ok(ProductPage {
            products: rows.into_iter().map(Product::from).collect(),
            total_items,
        })
    }

    /// Distinct non-empty categories, alphabetically.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn categories(&self) -> Result<Vec<String>, RepositoryError> {
        let categories = sqlx::query_scalar(
            r"
            SELECT DISTINCT category
            FROM pencraft.product
            WHERE category <> ''
            ORDER BY category
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(categories)
    }

    /// Number of products in the catalog.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM pencraft.product")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }

    /// Insert a catalog product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn insert(&self, product: &NewProduct) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            INSERT INTO pencraft.product
                (name, price, stock, category, brand, rating, description, image)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(&product.name)
        .bind(product.price)
        .bind(product.stock)
        .bind(&product.category)
        .bind(&product.brand)
        .bind(product.rating)
        .bind(&product.description)
        .bind(&product.image)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }
}

#[async_trait]
impl CatalogStore for ProductRepository<'_> {
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        self.get(id).await
    }
}

/// Escape `LIKE` metacharacters so user input matches literally.
fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
