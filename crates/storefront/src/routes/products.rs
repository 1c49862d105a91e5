//! Catalog route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use tracing::instrument;

use pencraft_core::ProductId;
use pencraft_core::api::{Product, ProductListResponse};

use crate::db::{ProductQuery, ProductRepository};
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Raw `/products` query string.
///
/// Paging values are parsed leniently: anything that is not a number falls
/// back to the default instead of failing the request.
#[derive(Debug, Default, Deserialize)]
pub struct ProductListParams {
    pub category: Option<String>,
    pub search: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl From<ProductListParams> for ProductQuery {
    fn from(params: ProductListParams) -> Self {
        let defaults = Self::default();
        Self {
            category: params.category,
            search: params.search,
            page: parse_or(params.page.as_deref(), defaults.page),
            limit: parse_or(params.limit.as_deref(), defaults.limit),
        }
        .normalized()
    }
}

fn parse_or(value: Option<&str>, default: i64) -> i64 {
    value
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Product listing with filters and pagination.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(params): Query<ProductListParams>,
) -> Result<Json<ProductListResponse>> {
    let query = ProductQuery::from(params);
    let repo = ProductRepository::new(state.pool());

    let page = repo.list(&query).await?;
    let categories = repo.categories().await?;

    Ok(Json(ProductListResponse {
        pagination: query.pagination(page.total_items),
        products: page.products,
        categories,
    }))
}

/// A single product.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Product>> {
    let not_found = || AppError::NotFound("Товар не найден".to_string());

    let id = id.parse::<i32>().map(ProductId::new).map_err(|_| not_found())?;
    ProductRepository::new(state.pool())
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(not_found)
}
