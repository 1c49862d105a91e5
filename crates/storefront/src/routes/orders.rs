//! Order route handlers.

use axum::{Json, extract::State, http::StatusCode};
use tracing::instrument;

use pencraft_core::api::{OrderView, OrdersResponse, PlaceOrderRequest};

use crate::db::OrderRepository;
use crate::error::{ApiJson, Result, add_breadcrumb};
use crate::middleware::RequireAuth;
use crate::services::OrderService;
use crate::state::AppState;

/// Check out the current cart.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn place(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(body): ApiJson<PlaceOrderRequest>,
) -> Result<(StatusCode, Json<OrderView>)> {
    let orders = OrderRepository::new(state.pool());

    let order = OrderService::new(&orders, state.shipping())
        .place_order(user.id, &body.shipping_address)
        .await?;

    let order_id = order.id.to_string();
    add_breadcrumb("orders", "Order placed", Some(&[("order_id", order_id.as_str())]));
    Ok((StatusCode::CREATED, Json(OrderView::from(order))))
}

/// The user's orders, newest first.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<OrdersResponse>> {
    let orders = OrderRepository::new(state.pool());

    let orders = OrderService::new(&orders, state.shipping())
        .list_orders(user.id)
        .await?;

    Ok(Json(OrdersResponse {
        orders: orders.into_iter().map(OrderView::from).collect(),
    }))
}
