//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health               - Liveness check
//! GET    /health/ready         - Readiness check (database)
//!
//! # Auth (rate limited)
//! POST   /auth/register        - Create account, returns token
//! POST   /auth/login           - Log in, returns token
//! GET    /auth/me              - Current user (requires token)
//!
//! # Catalog
//! GET    /products             - Product listing (category, search, page, limit)
//! GET    /products/{id}        - Product detail
//!
//! # Cart (requires token)
//! GET    /cart                 - Cart with totals
//! POST   /cart                 - Add item
//! PUT    /cart                 - Update quantity (<= 0 removes)
//! DELETE /cart                 - Remove item
//! POST   /cart/clear           - Remove all items
//!
//! # Orders (requires token)
//! GET    /orders               - Order history
//! POST   /orders               - Place order from cart
//! ```

pub mod auth;
pub mod cart;
pub mod orders;
pub mod products;

use axum::{
    Router,
    extract::{Request, State},
    http::{HeaderValue, Method, StatusCode, header},
    middleware::from_fn,
    routing::{get, post},
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::AppError;
use crate::middleware::{auth_rate_limiter, request_id_middleware};
use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/me", get(auth::me))
        .method_not_allowed_fallback(method_not_allowed)
        .layer(auth_rate_limiter())
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(cart::show)
                .post(cart::add)
                .put(cart::update)
                .delete(cart::remove),
        )
        .route("/clear", post(cart::clear))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new().route("/", get(orders::index).post(orders::place))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest("/auth", auth_routes())
        .nest("/products", product_routes())
        .nest("/cart", cart_routes())
        .nest("/orders", order_routes())
        .fallback(not_found)
        .method_not_allowed_fallback(method_not_allowed)
}

/// The full application: routes, state and the middleware stack.
///
/// Sentry layers are added by the binary, outside this router.
pub fn router(state: AppState) -> Router {
    let cors = cors_layer(state.config().cors_origin.as_deref());

    routes()
        .layer(from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = tracing::field::Empty,
                user_id = tracing::field::Empty,
            )
        }))
        .layer(cors)
        .with_state(state)
}

fn cors_layer(origin: Option<&str>) -> CorsLayer {
    let allow_origin = match origin {
        None => AllowOrigin::any(),
        Some(origin) => match origin.parse::<HeaderValue>() {
            Ok(value) => AllowOrigin::exact(value),
            Err(_) => {
                tracing::warn!(origin, "Invalid PENCRAFT_CORS_ORIGIN, rejecting cross-origin requests");
                AllowOrigin::list([])
            }
        },
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Verifies database connectivity before returning OK.
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

async fn not_found() -> AppError {
    AppError::NotFound("Маршрут не найден".to_string())
}

async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}
