//! Cart route handlers.
//!
//! All cart endpoints act on the cart of the user behind the bearer token.
//! Mutations answer with a short message; clients re-fetch `GET /cart`
//! afterwards.

use axum::{Json, extract::State};
use tracing::instrument;

use pencraft_core::api::{
    AddToCartRequest, CartView, ClearCartRequest, MessageResponse, RemoveFromCartRequest,
    UpdateCartRequest,
};

use crate::db::{CartRepository, ProductRepository};
use crate::error::{ApiJson, AppError, Result, add_breadcrumb};
use crate::middleware::RequireAuth;
use crate::services::CartService;
use crate::state::AppState;

/// Current cart with totals.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<CartView>> {
    let catalog = ProductRepository::new(state.pool());
    let storage = CartRepository::new(state.pool());

    let cart = CartService::new(&catalog, &storage).get_cart(user.id).await?;
    Ok(Json(cart))
}

/// Add a product, merging into an existing line.
#[instrument(skip_all, fields(user_id = %user.id, product_id = %body.product_id))]
pub async fn add(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(body): ApiJson<AddToCartRequest>,
) -> Result<Json<MessageResponse>> {
    let catalog = ProductRepository::new(state.pool());
    let storage = CartRepository::new(state.pool());

    CartService::new(&catalog, &storage)
        .add_item(user.id, body.product_id, body.quantity)
        .await?;

    let product_id = body.product_id.to_string();
    add_breadcrumb("cart", "Added to cart", Some(&[("product_id", product_id.as_str())]));
    Ok(Json(MessageResponse::new("Товар добавлен в корзину")))
}

/// Set a line's quantity. Zero or less removes the line.
#[instrument(skip_all, fields(user_id = %user.id, product_id = %body.product_id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(body): ApiJson<UpdateCartRequest>,
) -> Result<Json<MessageResponse>> {
    let catalog = ProductRepository::new(state.pool());
    let storage = CartRepository::new(state.pool());
    let cart = CartService::new(&catalog, &storage);

    if body.quantity <= 0 {
        cart.remove_item(user.id, body.product_id).await?;
        return Ok(Json(MessageResponse::new("Товар удален из корзины")));
    }

    cart.update_quantity(user.id, body.product_id, body.quantity)
        .await?;
    Ok(Json(MessageResponse::new("Количество обновлено")))
}

/// Remove a line.
#[instrument(skip_all, fields(user_id = %user.id, product_id = %body.product_id))]
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(body): ApiJson<RemoveFromCartRequest>,
) -> Result<Json<MessageResponse>> {
    let catalog = ProductRepository::new(state.pool());
    let storage = CartRepository::new(state.pool());

    CartService::new(&catalog, &storage)
        .remove_item(user.id, body.product_id)
        .await?;
    Ok(Json(MessageResponse::new("Товар удален из корзины")))
}

/// Empty the cart. The body must name the token's own user.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn clear(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(body): ApiJson<ClearCartRequest>,
) -> Result<Json<MessageResponse>> {
    if body.user_id != user.id {
        tracing::warn!(requested = %body.user_id, "Attempt to clear another user's cart");
        return Err(AppError::Unauthorized("Нет доступа".to_string()));
    }

    let catalog = ProductRepository::new(state.pool());
    let storage = CartRepository::new(state.pool());

    CartService::new(&catalog, &storage)
        .clear_cart(user.id)
        .await?;
    Ok(Json(MessageResponse::new("Корзина очищена")))
}
