//! Cart line domain type.

use pencraft_core::api::CartItemView;
use pencraft_core::{Money, ProductId};

/// A persisted cart line, optionally joined with the live product row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    pub product_id: ProductId,
    /// Always at least 1.
    pub quantity: i32,
    /// Unit price captured at the last add or update.
    pub price: Money,
    /// Product name captured at the last add or update.
    pub name: String,
    /// Live product data; `None` when the product row is gone.
    pub product: Option<LiveProduct>,
}

/// Product fields read at cart-fetch time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveProduct {
    pub name: String,
    pub image: String,
    pub stock: i32,
}

impl CartLine {
    /// Quantity times the stored unit price.
    #[must_use]
    pub fn line_total(&self) -> Money {
        self.price.times(self.quantity)
    }
}

impl From<CartLine> for CartItemView {
    fn from(line: CartLine) -> Self {
        let (name, image, stock) = match line.product {
            Some(live) => (live.name, Some(live.image), Some(live.stock)),
            None => (line.name, None, None),
        };
        Self {
            product_id: line.product_id,
            name,
            price: line.price,
            quantity: line.quantity,
            image,
            stock,
        }
    }
}
