//! Client error types.

use thiserror::Error;

use pencraft_core::ProductId;

use crate::storage::StorageError;

/// Errors surfaced to the page as transient notifications.
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed before a response arrived.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with an error body.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Local storage failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// JSON encoding or decoding failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The operation needs a signed-in user.
    #[error("not authenticated")]
    NotAuthenticated,

    /// Checkout of an empty cart.
    #[error("cart is empty")]
    EmptyCart,

    /// Quantity below 1 on add, or a merged line past `i32::MAX`.
    #[error("invalid quantity: {0}")]
    InvalidQuantity(i32),

    /// The product is not in the loaded catalog.
    #[error("product {0} not found")]
    UnknownProduct(ProductId),
}

impl ClientError {
    /// Text for a notification: the server's own message when there is one.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Api { message, .. } => message.clone(),
            Self::NotAuthenticated => "Войдите в аккаунт".to_string(),
            Self::EmptyCart => "Корзина пуста".to_string(),
            Self::InvalidQuantity(q) if *q < 1 => "Количество должно быть не менее 1".to_string(),
            Self::InvalidQuantity(_) => "Недопустимое количество".to_string(),
            Self::UnknownProduct(_) => "Товар не найден".to_string(),
            Self::Http(_) | Self::Storage(_) | Self::Json(_) => {
                "Ошибка соединения с сервером".to_string()
            }
        }
    }

    /// Whether the server rejected the request's credentials.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Api { status: 401, .. })
    }
}
