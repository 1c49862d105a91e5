//! Integration tests for PenCraft.
//!
//! The tests under `tests/` drive the storefront services and the client
//! cart controller together without a database or a network. [`InProcessApi`]
//! implements the client's [`CartApi`] by calling the same services the HTTP
//! handlers call, over a shared [`MemoryStore`], and reports failures with
//! the status codes and messages the HTTP layer would send.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p pencraft-integration-tests
//!
//! # Include the tests that need a running storefront
//! PENCRAFT_BASE_URL=http://127.0.0.1:3000 cargo test -p pencraft-integration-tests -- --ignored
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use rust_decimal::Decimal;

use pencraft_client::{CartApi, ClientError};
use pencraft_core::api::{
    AuthResponse, CartView, LoginRequest, OrderView, Product, RegisterRequest, ShippingAddress,
    UserView,
};
use pencraft_core::{Money, ProductId, ShippingPolicy, UserId};
use pencraft_storefront::db::memory::MemoryStore;
use pencraft_storefront::error::AppError;
use pencraft_storefront::models::User;
use pencraft_storefront::services::{AuthService, Authenticated, CartService, OrderService};

/// `CartApi` served by the storefront services over a [`MemoryStore`].
#[derive(Clone)]
pub struct InProcessApi {
    store: Arc<MemoryStore>,
    token_ttl: Duration,
    shipping: ShippingPolicy,
}

impl InProcessApi {
    #[must_use]
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self {
            store,
            token_ttl: Duration::hours(24),
            shipping: ShippingPolicy::default(),
        }
    }

    #[must_use]
    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    fn auth(&self) -> AuthService<'_> {
        AuthService::new(&*self.store, self.token_ttl)
    }

    fn cart(&self) -> CartService<'_> {
        CartService::new(&*self.store, &*self.store)
    }

    fn orders(&self) -> OrderService<'_> {
        OrderService::new(&*self.store, self.shipping)
    }

    async fn authorize(&self, token: &str) -> Result<User, ClientError> {
        self.auth().authorize(token).await.map_err(api_error)
    }
}

/// The error the HTTP layer would have answered with.
pub fn api_error(err: impl Into<AppError>) -> ClientError {
    let err = err.into();
    ClientError::Api {
        status: err.status().as_u16(),
        message: err.message(),
    }
}

fn auth_response(message: &str, authenticated: &Authenticated) -> AuthResponse {
    AuthResponse {
        message: message.to_owned(),
        token: authenticated.token.clone(),
        user: UserView::from(&authenticated.user),
    }
}

#[async_trait]
impl CartApi for InProcessApi {
    async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse, ClientError> {
        let authenticated = self
            .auth()
            .register(&request.name, &request.email, &request.password)
            .await
            .map_err(api_error)?;
        Ok(auth_response(
            "Пользователь успешно зарегистрирован",
            &authenticated,
        ))
    }

    async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, ClientError> {
        let authenticated = self
            .auth()
            .login(&request.email, &request.password)
            .await
            .map_err(api_error)?;
        Ok(auth_response("Вход выполнен успешно", &authenticated))
    }

    async fn list_products(&self) -> Result<Vec<Product>, ClientError> {
        Ok(self.store.products())
    }

    async fn get_cart(&self, token: &str) -> Result<CartView, ClientError> {
        let user = self.authorize(token).await?;
        self.cart().get_cart(user.id).await.map_err(api_error)
    }

    async fn add_item(
        &self,
        token: &str,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<(), ClientError> {
        let user = self.authorize(token).await?;
        self.cart()
            .add_item(user.id, product_id, quantity)
            .await
            .map_err(api_error)
    }

    async fn update_quantity(
        &self,
        token: &str,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<(), ClientError> {
        let user = self.authorize(token).await?;
        let cart = self.cart();
        if quantity <= 0 {
            return cart
                .remove_item(user.id, product_id)
                .await
                .map_err(api_error);
        }
        cart.update_quantity(user.id, product_id, quantity)
            .await
            .map_err(api_error)
    }

    async fn remove_item(&self, token: &str, product_id: ProductId) -> Result<(), ClientError> {
        let user = self.authorize(token).await?;
        self.cart()
            .remove_item(user.id, product_id)
            .await
            .map_err(api_error)
    }

    async fn clear_cart(&self, token: &str, user_id: UserId) -> Result<(), ClientError> {
        let user = self.authorize(token).await?;
        if user.id != user_id {
            return Err(api_error(AppError::Unauthorized("Нет доступа".to_string())));
        }
        self.cart()
            .clear_cart(user.id)
            .await
            .map(|_| ())
            .map_err(api_error)
    }

    async fn place_order(
        &self,
        token: &str,
        shipping_address: &ShippingAddress,
    ) -> Result<OrderView, ClientError> {
        let user = self.authorize(token).await?;
        self.orders()
            .place_order(user.id, shipping_address)
            .await
            .map(OrderView::from)
            .map_err(api_error)
    }

    async fn list_orders(&self, token: &str) -> Result<Vec<OrderView>, ClientError> {
        let user = self.authorize(token).await?;
        let orders = self
            .orders()
            .list_orders(user.id)
            .await
            .map_err(api_error)?;
        Ok(orders.into_iter().map(OrderView::from).collect())
    }
}

// =============================================================================
// Fixtures
// =============================================================================

/// The launch catalog: pen 250, notebook 480, markers 1200, organizer 890,
/// pencils 750. Higher ids are newer.
#[must_use]
pub fn launch_catalog() -> Vec<Product> {
    let now = Utc::now();
    let product = |id: i32,
                   name: &str,
                   price: i64,
                   category: &str,
                   brand: &str,
                   rating: i64,
                   stock: i32| Product {
        id: ProductId::new(id),
        name: name.to_owned(),
        price: Money::from_rubles(price),
        stock,
        category: category.to_owned(),
        brand: brand.to_owned(),
        rating: Decimal::new(rating, 1),
        description: String::new(),
        image: "linear-gradient(135deg, #8B5FBF, #6D3B9E)".to_owned(),
        created_at: now - Duration::days(i64::from(10 - id)),
    };

    vec![
        product(1, "Гелевая ручка Premium", 250, "pens", "pencraft", 48, 50),
        product(2, "Блокнот с твердой обложкой", 480, "paper", "moleskine", 46, 30),
        product(3, "Набор маркеров для скетчинга", 1200, "creative", "faber-castell", 49, 20),
        product(4, "Органайзер для стола", 890, "organizers", "pencraft", 45, 15),
        product(5, "Набор цветных карандашей", 750, "creative", "faber-castell", 47, 25),
    ]
}

pub const PEN: ProductId = ProductId::new(1);
pub const NOTEBOOK: ProductId = ProductId::new(2);
pub const MARKERS: ProductId = ProductId::new(3);
pub const ORGANIZER: ProductId = ProductId::new(4);
pub const PENCILS: ProductId = ProductId::new(5);

/// A store holding the launch catalog.
#[must_use]
pub fn seeded_store() -> Arc<MemoryStore> {
    Arc::new(MemoryStore::with_products(launch_catalog()))
}

/// A complete shipping address.
#[must_use]
pub fn moscow_address() -> ShippingAddress {
    ShippingAddress {
        name: "Анна Смирнова".to_string(),
        address: "ул. Примерная, д. 123".to_string(),
        city: "Москва".to_string(),
        postal_code: "123456".to_string(),
        phone: "+7 (999) 123-45-67".to_string(),
    }
}

/// Register a user directly through the service and return their id.
///
/// # Panics
///
/// Panics if registration fails.
pub async fn register_user(store: &MemoryStore, email: &str) -> UserId {
    match AuthService::new(store, Duration::hours(24))
        .register("Анна", email, "secret1")
        .await
    {
        Ok(authenticated) => authenticated.user.id,
        Err(e) => panic!("registration of {email} failed: {e}"),
    }
}
