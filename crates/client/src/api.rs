//! Storefront API access.
//!
//! [`CartApi`] is the seam the controller talks through. [`HttpCartApi`] is
//! the `reqwest` implementation; tests substitute in-process ones.

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use pencraft_core::api::{
    AddToCartRequest, AuthResponse, CartView, ClearCartRequest, ErrorBody, LoginRequest,
    MessageResponse, OrderView, OrdersResponse, PlaceOrderRequest, Product, ProductListResponse,
    RegisterRequest, RemoveFromCartRequest, ShippingAddress, UpdateCartRequest,
};
use pencraft_core::{ProductId, UserId};

use crate::error::ClientError;

/// Operations the client needs from the storefront.
#[async_trait]
pub trait CartApi: Send + Sync {
    async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse, ClientError>;

    async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, ClientError>;

    /// The full catalog.
    async fn list_products(&self) -> Result<Vec<Product>, ClientError>;

    async fn get_cart(&self, token: &str) -> Result<CartView, ClientError>;

    async fn add_item(
        &self,
        token: &str,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<(), ClientError>;

    async fn update_quantity(
        &self,
        token: &str,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<(), ClientError>;

    async fn remove_item(&self, token: &str, product_id: ProductId) -> Result<(), ClientError>;

    async fn clear_cart(&self, token: &str, user_id: UserId) -> Result<(), ClientError>;

    async fn place_order(
        &self,
        token: &str,
        shipping_address: &ShippingAddress,
    ) -> Result<OrderView, ClientError>;

    async fn list_orders(&self, token: &str) -> Result<Vec<OrderView>, ClientError>;
}

/// `CartApi` over HTTP.
#[derive(Debug, Clone)]
pub struct HttpCartApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpCartApi {
    /// Client for the storefront at `base_url`, e.g. `http://127.0.0.1:3000`.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    #[must_use]
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Self { client, base_url }
    }

    fn request(&self, method: Method, path: &str, token: Option<&str>) -> RequestBuilder {
        let builder = self
            .client
            .request(method, format!("{}{path}", self.base_url));
        match token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send and decode, turning error statuses into `ClientError::Api`.
    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ClientError> {
        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            // Error bodies are JSON from the API, but a proxy may answer first
            let message = serde_json::from_str::<ErrorBody>(&body).map_or_else(
                |_| body.chars().take(200).collect::<String>(),
                |e| e.error,
            );
            debug!(status = %status, message = %message, "Storefront API error");
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl CartApi for HttpCartApi {
    #[instrument(skip_all)]
    async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse, ClientError> {
        self.send(self.request(Method::POST, "/auth/register", None).json(request))
            .await
    }

    #[instrument(skip_all)]
    async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, ClientError> {
        self.send(self.request(Method::POST, "/auth/login", None).json(request))
            .await
    }

    #[instrument(skip(self))]
    async fn list_products(&self) -> Result<Vec<Product>, ClientError> {
        let response: ProductListResponse = self
            .send(self.request(Method::GET, "/products", None))
            .await?;
        Ok(response.products)
    }

    #[instrument(skip_all)]
    async fn get_cart(&self, token: &str) -> Result<CartView, ClientError> {
        self.send(self.request(Method::GET, "/cart", Some(token)))
            .await
    }

    #[instrument(skip(self, token))]
    async fn add_item(
        &self,
        token: &str,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<(), ClientError> {
        let body = AddToCartRequest {
            product_id,
            quantity,
        };
        let _: MessageResponse = self
            .send(self.request(Method::POST, "/cart", Some(token)).json(&body))
            .await?;
        Ok(())
    }

    #[instrument(skip(self, token))]
    async fn update_quantity(
        &self,
        token: &str,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<(), ClientError> {
        let body = UpdateCartRequest {
            product_id,
            quantity,
        };
        let _: MessageResponse = self
            .send(self.request(Method::PUT, "/cart", Some(token)).json(&body))
            .await?;
        Ok(())
    }

    #[instrument(skip(self, token))]
    async fn remove_item(&self, token: &str, product_id: ProductId) -> Result<(), ClientError> {
        let body = RemoveFromCartRequest { product_id };
        let _: MessageResponse = self
            .send(self.request(Method::DELETE, "/cart", Some(token)).json(&body))
            .await?;
        Ok(())
    }

    #[instrument(skip(self, token))]
    async fn clear_cart(&self, token: &str, user_id: UserId) -> Result<(), ClientError> {
        let body = ClearCartRequest { user_id };
        let _: MessageResponse = self
            .send(
                self.request(Method::POST, "/cart/clear", Some(token))
                    .json(&body),
            )
            .await?;
        Ok(())
    }

    #[instrument(skip_all)]
    async fn place_order(
        &self,
        token: &str,
        shipping_address: &ShippingAddress,
    ) -> Result<OrderView, ClientError> {
        let body = PlaceOrderRequest {
            shipping_address: shipping_address.clone(),
        };
        self.send(self.request(Method::POST, "/orders", Some(token)).json(&body))
            .await
    }

    #[instrument(skip_all)]
    async fn list_orders(&self, token: &str) -> Result<Vec<OrderView>, ClientError> {
        let response: OrdersResponse = self
            .send(self.request(Method::GET, "/orders", Some(token)))
            .await?;
        Ok(response.orders)
    }
}
