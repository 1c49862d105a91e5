//! Cart controller.
//!
//! Owns the storage, the API client, the current mode and the current lines.
//! In guest mode mutations edit the locally stored list. In server mode
//! every mutation goes to the storefront and is followed by a full re-fetch;
//! a failed mutation leaves the lines as they were.

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument, warn};

use pencraft_core::api::{
    AuthResponse, CartItemView, LoginRequest, OrderView, Product, RegisterRequest,
    ShippingAddress, UserView,
};
use pencraft_core::{Credential, ProductId, ShippingPolicy};

use crate::api::CartApi;
use crate::error::ClientError;
use crate::storage::{CART_KEY, LocalStorage, TOKEN_KEY, USER_KEY};
use crate::summary::CartSummary;

/// A signed-in user and their bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub user: UserView,
}

/// Where the cart lives.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CartMode {
    /// Lines kept in local storage.
    #[default]
    Guest,
    /// Lines kept by the storefront for this session.
    Server(Session),
}

/// Outcome of moving a guest cart into a fresh session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Guest lines the server accepted.
    pub merged: usize,
    /// Guest lines the server refused, with its message.
    pub failed: Vec<(ProductId, String)>,
}

impl MergeReport {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// One cart for guests and signed-in users.
pub struct CartController<A, S> {
    api: A,
    storage: S,
    policy: ShippingPolicy,
    mode: CartMode,
    catalog: Vec<Product>,
    lines: Vec<CartItemView>,
}

impl<A: CartApi, S: LocalStorage> CartController<A, S> {
    /// Guest-mode controller with an empty cart. Call [`Self::restore`] to
    /// pick up stored state.
    #[must_use]
    pub fn new(api: A, storage: S) -> Self {
        Self {
            api,
            storage,
            policy: ShippingPolicy::default(),
            mode: CartMode::Guest,
            catalog: Vec::new(),
            lines: Vec::new(),
        }
    }

    #[must_use]
    pub const fn with_policy(mut self, policy: ShippingPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub const fn mode(&self) -> &CartMode {
        &self.mode
    }

    #[must_use]
    pub fn lines(&self) -> &[CartItemView] {
        &self.lines
    }

    #[must_use]
    pub fn catalog(&self) -> &[Product] {
        &self.catalog
    }

    #[must_use]
    pub const fn user(&self) -> Option<&UserView> {
        match &self.mode {
            CartMode::Server(session) => Some(&session.user),
            CartMode::Guest => None,
        }
    }

    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self.mode, CartMode::Server(_))
    }

    #[must_use]
    pub const fn api(&self) -> &A {
        &self.api
    }

    // =========================================================================
    // Startup
    // =========================================================================

    /// Pick the mode from stored credentials, then load the cart.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if storage or the cart fetch fails.
    pub async fn restore(&mut self) -> Result<(), ClientError> {
        self.restore_mode_at(Utc::now())?;
        self.load().await
    }

    /// Pick the mode from stored credentials as of `now`.
    ///
    /// A token that decodes and has not expired, stored with a readable
    /// user, selects server mode. Anything else is dropped from storage and
    /// selects guest mode.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Storage` if storage fails.
    pub fn restore_mode_at(&mut self, now: DateTime<Utc>) -> Result<&CartMode, ClientError> {
        let token = self.storage.get(TOKEN_KEY)?;
        let user = self
            .storage
            .get(USER_KEY)?
            .and_then(|raw| serde_json::from_str::<UserView>(&raw).ok());

        self.mode = match (token, user) {
            (Some(token), Some(user)) if Credential::decode_live(&token, now).is_ok() => {
                CartMode::Server(Session { token, user })
            }
            (token, _) => {
                if token.is_some() {
                    debug!("Dropping stale credentials");
                }
                self.storage.remove(TOKEN_KEY)?;
                self.storage.remove(USER_KEY)?;
                CartMode::Guest
            }
        };
        Ok(&self.mode)
    }

    /// Fetch the catalog used for guest adds and display names.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if the request fails.
    pub async fn load_catalog(&mut self) -> Result<(), ClientError> {
        self.catalog = self.api.list_products().await?;
        Ok(())
    }

    /// Replace the catalog without a fetch.
    pub fn set_catalog(&mut self, products: Vec<Product>) {
        self.catalog = products;
    }

    /// Reload the lines from wherever the current mode keeps them.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if storage or the request fails.
    pub async fn load(&mut self) -> Result<(), ClientError> {
        self.lines = match &self.mode {
            CartMode::Guest => self.read_guest_lines()?,
            CartMode::Server(session) => self.api.get_cart(&session.token).await?.items,
        };
        Ok(())
    }

    // =========================================================================
    // Cart Mutations
    // =========================================================================

    /// Add `quantity` of a product, merging into an existing line.
    ///
    /// Guest adds do not check stock; the server checks it once the cart is
    /// merged or on the next server-side add.
    ///
    /// # Errors
    ///
    /// Returns `InvalidQuantity` for `quantity < 1` or a merged quantity past
    /// `i32::MAX`, `UnknownProduct` for a guest add of a product missing from
    /// the catalog, or the server's error.
    #[instrument(skip(self))]
    pub async fn add(&mut self, product_id: ProductId, quantity: i32) -> Result<(), ClientError> {
        if quantity < 1 {
            return Err(ClientError::InvalidQuantity(quantity));
        }

        let token = match &self.mode {
            CartMode::Server(session) => session.token.clone(),
            CartMode::Guest => {
                let product = self
                    .catalog
                    .iter()
                    .find(|p| p.id == product_id)
                    .ok_or(ClientError::UnknownProduct(product_id))?;

                let mut lines = self.lines.clone();
                match lines.iter_mut().find(|l| l.product_id == product_id) {
                    Some(line) => {
                        line.quantity = line
                            .quantity
                            .checked_add(quantity)
                            .ok_or(ClientError::InvalidQuantity(quantity))?;
                    }
                    None => lines.push(CartItemView {
                        product_id,
                        name: product.name.clone(),
                        price: product.price,
                        quantity,
                        image: Some(product.image.clone()),
                        stock: None,
                    }),
                }
                return self.commit_guest_lines(lines);
            }
        };

        self.api.add_item(&token, product_id, quantity).await?;
        self.load().await
    }

    /// Set a line's quantity. Below 1 removes the line.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if storage or the request fails.
    #[instrument(skip(self))]
    pub async fn update_quantity(
        &mut self,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<(), ClientError> {
        if quantity < 1 {
            return self.remove(product_id).await;
        }

        let token = match &self.mode {
            CartMode::Server(session) => session.token.clone(),
            CartMode::Guest => {
                let mut lines = self.lines.clone();
                if let Some(line) = lines.iter_mut().find(|l| l.product_id == product_id) {
                    line.quantity = quantity;
                }
                return self.commit_guest_lines(lines);
            }
        };

        self.api
            .update_quantity(&token, product_id, quantity)
            .await?;
        self.load().await
    }

    /// Remove a line.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if storage or the request fails.
    #[instrument(skip(self))]
    pub async fn remove(&mut self, product_id: ProductId) -> Result<(), ClientError> {
        let token = match &self.mode {
            CartMode::Server(session) => session.token.clone(),
            CartMode::Guest => {
                let lines = self
                    .lines
                    .iter()
                    .filter(|l| l.product_id != product_id)
                    .cloned()
                    .collect();
                return self.commit_guest_lines(lines);
            }
        };

        self.api.remove_item(&token, product_id).await?;
        self.load().await
    }

    /// Remove every line.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if storage or the request fails.
    #[instrument(skip(self))]
    pub async fn clear(&mut self) -> Result<(), ClientError> {
        let session = match &self.mode {
            CartMode::Server(session) => session.clone(),
            CartMode::Guest => {
                self.storage.remove(CART_KEY)?;
                self.lines.clear();
                return Ok(());
            }
        };

        self.api.clear_cart(&session.token, session.user.id).await?;
        self.load().await
    }

    /// Totals and display rows for the current lines.
    #[must_use]
    pub fn summary(&self) -> CartSummary {
        CartSummary::build(&self.lines, &self.catalog, &self.policy)
    }

    // =========================================================================
    // Session
    // =========================================================================

    /// Log in, then move the guest cart into the server cart.
    ///
    /// # Errors
    ///
    /// Returns the server's error if login fails; the guest cart is kept.
    pub async fn login(&mut self, email: &str, password: &str) -> Result<MergeReport, ClientError> {
        let response = self
            .api
            .login(&LoginRequest {
                email: email.to_owned(),
                password: password.to_owned(),
            })
            .await?;
        self.start_session(response).await
    }

    /// Register, then move the guest cart into the new account's cart.
    ///
    /// # Errors
    ///
    /// Returns the server's error if registration fails; the guest cart is kept.
    pub async fn register(
        &mut self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<MergeReport, ClientError> {
        let response = self
            .api
            .register(&RegisterRequest {
                name: name.to_owned(),
                email: email.to_owned(),
                password: password.to_owned(),
            })
            .await?;
        self.start_session(response).await
    }

    /// Forget the session and the guest cart.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Storage` if storage fails.
    pub fn logout(&mut self) -> Result<(), ClientError> {
        self.storage.remove(TOKEN_KEY)?;
        self.storage.remove(USER_KEY)?;
        self.storage.remove(CART_KEY)?;
        self.mode = CartMode::Guest;
        self.lines.clear();
        info!("Logged out");
        Ok(())
    }

    /// Place an order from the server cart, then re-fetch the emptied cart.
    ///
    /// # Errors
    ///
    /// Returns `NotAuthenticated` in guest mode, `EmptyCart` with no lines,
    /// or the server's error.
    #[instrument(skip_all)]
    pub async fn checkout(
        &mut self,
        shipping_address: &ShippingAddress,
    ) -> Result<OrderView, ClientError> {
        let CartMode::Server(session) = &self.mode else {
            return Err(ClientError::NotAuthenticated);
        };
        if self.lines.is_empty() {
            return Err(ClientError::EmptyCart);
        }

        let token = session.token.clone();
        let order = self.api.place_order(&token, shipping_address).await?;
        info!(order_id = %order.id, total = %order.total, "Order placed");

        self.load().await?;
        Ok(order)
    }

    async fn start_session(&mut self, response: AuthResponse) -> Result<MergeReport, ClientError> {
        // Storage is the source of truth: the controller may not have loaded yet
        let guest_lines = match self.mode {
            CartMode::Guest => self.read_guest_lines()?,
            CartMode::Server(_) => Vec::new(),
        };
        self.lines.clear();

        self.storage.set(TOKEN_KEY, &response.token)?;
        self.storage
            .set(USER_KEY, &serde_json::to_string(&response.user)?)?;
        self.mode = CartMode::Server(Session {
            token: response.token,
            user: response.user,
        });

        let mut report = MergeReport::default();
        if let CartMode::Server(session) = &self.mode {
            for line in &guest_lines {
                match self
                    .api
                    .add_item(&session.token, line.product_id, line.quantity)
                    .await
                {
                    Ok(()) => report.merged += 1,
                    Err(e) => {
                        warn!(product_id = %line.product_id, error = %e, "Guest line not merged");
                        report.failed.push((line.product_id, e.user_message()));
                    }
                }
            }
        }
        self.storage.remove(CART_KEY)?;

        self.load().await?;
        Ok(report)
    }

    // =========================================================================
    // Guest Storage
    // =========================================================================

    fn read_guest_lines(&self) -> Result<Vec<CartItemView>, ClientError> {
        let Some(raw) = self.storage.get(CART_KEY)? else {
            return Ok(Vec::new());
        };
        Ok(serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!(error = %e, "Discarding unreadable guest cart");
            Vec::new()
        }))
    }

    fn commit_guest_lines(&mut self, lines: Vec<CartItemView>) -> Result<(), ClientError> {
        self.storage.set(CART_KEY, &serde_json::to_string(&lines)?)?;
        self.lines = lines;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::Duration;
    use rust_decimal::Decimal;

    use pencraft_core::api::{CartView, OrderView};
    use pencraft_core::{Money, UserId};

    use super::*;
    use crate::storage::MemoryStorage;

    /// API that refuses everything; guest mode must never call it.
    struct OfflineApi;

    fn offline() -> ClientError {
        ClientError::Api {
            status: 503,
            message: "offline".to_string(),
        }
    }

    #[async_trait]
    impl CartApi for OfflineApi {
        async fn register(&self, _: &RegisterRequest) -> Result<AuthResponse, ClientError> {
            Err(offline())
        }
        async fn login(&self, _: &LoginRequest) -> Result<AuthResponse, ClientError> {
            Err(offline())
        }
        async fn list_products(&self) -> Result<Vec<Product>, ClientError> {
            Err(offline())
        }
        async fn get_cart(&self, _: &str) -> Result<CartView, ClientError> {
            Err(offline())
        }
        async fn add_item(&self, _: &str, _: ProductId, _: i32) -> Result<(), ClientError> {
            Err(offline())
        }
        async fn update_quantity(&self, _: &str, _: ProductId, _: i32) -> Result<(), ClientError> {
            Err(offline())
        }
        async fn remove_item(&self, _: &str, _: ProductId) -> Result<(), ClientError> {
            Err(offline())
        }
        async fn clear_cart(&self, _: &str, _: UserId) -> Result<(), ClientError> {
            Err(offline())
        }
        async fn place_order(&self, _: &str, _: &ShippingAddress) -> Result<OrderView, ClientError> {
            Err(offline())
        }
        async fn list_orders(&self, _: &str) -> Result<Vec<OrderView>, ClientError> {
            Err(offline())
        }
    }

    /// API whose server cart is a plain list; only cart reads and adds work.
    #[derive(Default)]
    struct RecordingApi {
        added: Mutex<Vec<(ProductId, i32)>>,
    }

    #[async_trait]
    impl CartApi for RecordingApi {
        async fn register(&self, _: &RegisterRequest) -> Result<AuthResponse, ClientError> {
            Err(offline())
        }
        async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, ClientError> {
            let user = UserView {
                id: UserId::new(7),
                name: "Анна".to_string(),
                email: request.email.clone(),
            };
            let token = Credential::issue(
                user.id,
                "Анна",
                request.email.clone(),
                Utc::now(),
                Duration::hours(24),
            )
            .encode()
            .unwrap();
            Ok(AuthResponse {
                message: "Вход выполнен успешно".to_string(),
                token,
                user,
            })
        }
        async fn list_products(&self) -> Result<Vec<Product>, ClientError> {
            Ok(vec![pen()])
        }
        async fn get_cart(&self, _: &str) -> Result<CartView, ClientError> {
            let added = self.added.lock().unwrap();
            let items: Vec<CartItemView> = added
                .iter()
                .map(|(id, qty)| CartItemView {
                    product_id: *id,
                    name: "server".to_string(),
                    price: Money::from_rubles(250),
                    quantity: *qty,
                    image: None,
                    stock: Some(50),
                })
                .collect();
            Ok(CartView {
                total_items: items.iter().map(|i| i64::from(i.quantity)).sum(),
                total_price: items.iter().map(|i| i.price.times(i.quantity)).sum(),
                items,
            })
        }
        async fn add_item(&self, _: &str, id: ProductId, qty: i32) -> Result<(), ClientError> {
            if id != ProductId::new(1) {
                return Err(ClientError::Api {
                    status: 404,
                    message: "Товар не найден".to_string(),
                });
            }
            self.added.lock().unwrap().push((id, qty));
            Ok(())
        }
        async fn update_quantity(&self, _: &str, _: ProductId, _: i32) -> Result<(), ClientError> {
            Err(offline())
        }
        async fn remove_item(&self, _: &str, _: ProductId) -> Result<(), ClientError> {
            Err(offline())
        }
        async fn clear_cart(&self, _: &str, _: UserId) -> Result<(), ClientError> {
            Err(offline())
        }
        async fn place_order(&self, _: &str, _: &ShippingAddress) -> Result<OrderView, ClientError> {
            Err(offline())
        }
        async fn list_orders(&self, _: &str) -> Result<Vec<OrderView>, ClientError> {
            Ok(Vec::new())
        }
    }

    fn pen() -> Product {
        Product {
            id: ProductId::new(1),
            name: "Гелевая ручка Premium".to_string(),
            price: Money::from_rubles(250),
            stock: 50,
            category: "pens".to_string(),
            brand: "pencraft".to_string(),
            rating: Decimal::new(48, 1),
            description: "Плавное письмо, эргономичный дизайн".to_string(),
            image: "linear-gradient(135deg, #8B5FBF, #6D3B9E)".to_string(),
            created_at: Utc::now(),
        }
    }

    fn guest() -> CartController<OfflineApi, MemoryStorage> {
        let mut controller = CartController::new(OfflineApi, MemoryStorage::new());
        controller.set_catalog(vec![pen()]);
        controller
    }

    fn stored_token(expires_in: Duration) -> String {
        Credential::issue(
            UserId::new(7),
            "Анна",
            "anna@pencraft.ru",
            Utc::now(),
            expires_in,
        )
        .encode()
        .unwrap()
    }

    const STORED_USER: &str = r#"{"id": 7, "name": "Анна", "email": "anna@pencraft.ru"}"#;

    #[tokio::test]
    async fn test_guest_add_merges_and_persists() {
        let mut cart = guest();
        cart.add(ProductId::new(1), 2).await.unwrap();
        cart.add(ProductId::new(1), 3).await.unwrap();

        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].quantity, 5);

        let summary = cart.summary();
        assert_eq!(summary.subtotal, Money::from_rubles(1250));
        assert_eq!(summary.items_label, "5 товаров");

        // A fresh load sees the stored list
        cart.load().await.unwrap();
        assert_eq!(cart.lines()[0].quantity, 5);
    }

    #[tokio::test]
    async fn test_guest_add_unknown_product() {
        let mut cart = guest();
        assert!(matches!(
            cart.add(ProductId::new(42), 1).await,
            Err(ClientError::UnknownProduct(_))
        ));
        assert!(matches!(
            cart.add(ProductId::new(1), 0).await,
            Err(ClientError::InvalidQuantity(0))
        ));
        assert!(cart.lines().is_empty());
    }

    #[tokio::test]
    async fn test_guest_add_past_i32_max_is_rejected() {
        let mut cart = guest();
        cart.add(ProductId::new(1), i32::MAX).await.unwrap();

        let err = cart.add(ProductId::new(1), 1).await.unwrap_err();
        assert!(matches!(err, ClientError::InvalidQuantity(1)));
        assert_eq!(err.user_message(), "Недопустимое количество");
        assert_eq!(cart.lines()[0].quantity, i32::MAX);

        cart.load().await.unwrap();
        assert_eq!(cart.lines()[0].quantity, i32::MAX);
    }

    #[tokio::test]
    async fn test_guest_update_below_one_removes() {
        let mut cart = guest();
        cart.add(ProductId::new(1), 2).await.unwrap();

        cart.update_quantity(ProductId::new(1), 4).await.unwrap();
        assert_eq!(cart.lines()[0].quantity, 4);

        cart.update_quantity(ProductId::new(1), 0).await.unwrap();
        assert!(cart.lines().is_empty());
    }

    #[tokio::test]
    async fn test_guest_clear() {
        let mut cart = guest();
        cart.add(ProductId::new(1), 1).await.unwrap();
        cart.clear().await.unwrap();
        cart.clear().await.unwrap();
        cart.load().await.unwrap();
        assert!(cart.lines().is_empty());
    }

    #[tokio::test]
    async fn test_guest_checkout_requires_login() {
        let mut cart = guest();
        cart.add(ProductId::new(1), 1).await.unwrap();
        let address = ShippingAddress {
            name: "Анна".to_string(),
            address: "ул. Примерная, д. 123".to_string(),
            city: "Москва".to_string(),
            postal_code: "123456".to_string(),
            phone: "+7 (999) 123-45-67".to_string(),
        };
        assert!(matches!(
            cart.checkout(&address).await,
            Err(ClientError::NotAuthenticated)
        ));
    }

    #[test]
    fn test_restore_live_token_selects_server_mode() {
        let storage = MemoryStorage::new();
        storage.set(TOKEN_KEY, &stored_token(Duration::hours(1))).unwrap();
        storage.set(USER_KEY, STORED_USER).unwrap();

        let mut cart = CartController::new(OfflineApi, storage);
        let mode = cart.restore_mode_at(Utc::now()).unwrap();
        assert!(matches!(mode, CartMode::Server(s) if s.user.id == UserId::new(7)));
    }

    #[test]
    fn test_restore_expired_token_drops_credentials() {
        let storage = MemoryStorage::new();
        storage.set(TOKEN_KEY, &stored_token(Duration::hours(1))).unwrap();
        storage.set(USER_KEY, STORED_USER).unwrap();

        let mut cart = CartController::new(OfflineApi, storage);
        let later = Utc::now() + Duration::hours(2);
        assert_eq!(cart.restore_mode_at(later).unwrap(), &CartMode::Guest);
        assert_eq!(cart.storage.get(TOKEN_KEY).unwrap(), None);
        assert_eq!(cart.storage.get(USER_KEY).unwrap(), None);
    }

    #[test]
    fn test_restore_garbage_token_is_guest() {
        let storage = MemoryStorage::new();
        storage.set(TOKEN_KEY, "garbage").unwrap();
        storage.set(USER_KEY, STORED_USER).unwrap();

        let mut cart = CartController::new(OfflineApi, storage);
        assert_eq!(cart.restore_mode_at(Utc::now()).unwrap(), &CartMode::Guest);
    }

    #[tokio::test]
    async fn test_corrupt_guest_cart_loads_empty() {
        let storage = MemoryStorage::new();
        storage.set(CART_KEY, "{not a list").unwrap();
        let mut cart = CartController::new(OfflineApi, storage);
        cart.restore().await.unwrap();
        assert!(cart.lines().is_empty());
    }

    #[tokio::test]
    async fn test_login_merges_guest_cart() {
        let mut cart = CartController::new(RecordingApi::default(), MemoryStorage::new());
        cart.load_catalog().await.unwrap();
        cart.add(ProductId::new(1), 2).await.unwrap();
        // Guest lines are not stock-checked, so a product the server
        // rejects can still be in the guest cart
        let mut lines = cart.lines().to_vec();
        lines.push(CartItemView {
            product_id: ProductId::new(9),
            name: "Снятый с продажи".to_string(),
            price: Money::from_rubles(100),
            quantity: 1,
            image: None,
            stock: None,
        });
        cart.commit_guest_lines(lines).unwrap();

        let report = cart.login("anna@pencraft.ru", "secret1").await.unwrap();

        assert_eq!(report.merged, 1);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, ProductId::new(9));
        assert!(!report.is_complete());

        assert!(cart.is_authenticated());
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].quantity, 2);
        assert_eq!(cart.storage.get(CART_KEY).unwrap(), None);
        assert!(cart.storage.get(TOKEN_KEY).unwrap().is_some());
    }

    #[tokio::test]
    async fn test_login_before_load_merges_stored_guest_cart() {
        let storage = MemoryStorage::new();
        let stored = vec![CartItemView {
            product_id: ProductId::new(1),
            name: "Гелевая ручка Premium".to_string(),
            price: Money::from_rubles(250),
            quantity: 2,
            image: None,
            stock: None,
        }];
        storage
            .set(CART_KEY, &serde_json::to_string(&stored).unwrap())
            .unwrap();

        let mut cart = CartController::new(RecordingApi::default(), storage);
        let report = cart.login("anna@pencraft.ru", "secret1").await.unwrap();

        assert_eq!(report.merged, 1);
        assert!(report.is_complete());
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].quantity, 2);
        assert_eq!(cart.storage.get(CART_KEY).unwrap(), None);
    }

    #[tokio::test]
    async fn test_failed_server_mutation_keeps_lines() {
        let mut cart = CartController::new(RecordingApi::default(), MemoryStorage::new());
        cart.login("anna@pencraft.ru", "secret1").await.unwrap();
        cart.add(ProductId::new(1), 1).await.unwrap();

        let err = cart.remove(ProductId::new(1)).await.unwrap_err();
        assert_eq!(err.user_message(), "offline");
        assert_eq!(cart.lines().len(), 1);
    }

    #[tokio::test]
    async fn test_logout_clears_everything() {
        let mut cart = CartController::new(RecordingApi::default(), MemoryStorage::new());
        cart.login("anna@pencraft.ru", "secret1").await.unwrap();
        cart.add(ProductId::new(1), 1).await.unwrap();

        cart.logout().unwrap();

        assert_eq!(cart.mode(), &CartMode::Guest);
        assert!(cart.lines().is_empty());
        assert_eq!(cart.storage.get(TOKEN_KEY).unwrap(), None);
        assert_eq!(cart.storage.get(USER_KEY).unwrap(), None);
    }
}
