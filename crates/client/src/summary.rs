//! What the cart page renders.

use pencraft_core::api::{CartItemView, Product};
use pencraft_core::plural::items_label;
use pencraft_core::{CartTotals, Money, ProductId, ShippingPolicy};

/// One rendered cart row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryLine {
    pub product_id: ProductId,
    pub name: String,
    pub image: Option<String>,
    pub price: Money,
    pub quantity: i32,
    /// `price * quantity`.
    pub line_total: Money,
}

/// Cart rows with totals and the item label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartSummary {
    pub lines: Vec<SummaryLine>,
    /// Sum of quantities.
    pub item_count: i64,
    pub subtotal: Money,
    pub shipping: Money,
    pub total: Money,
    /// e.g. `"3 товара"`.
    pub items_label: String,
}

impl CartSummary {
    /// Summarize `lines`. Names and images come from `catalog` when the
    /// product is listed there, else from the line itself.
    #[must_use]
    pub fn build(lines: &[CartItemView], catalog: &[Product], policy: &ShippingPolicy) -> Self {
        let totals = CartTotals::compute(lines.iter().map(|l| (l.price, l.quantity)), policy);

        let lines = lines
            .iter()
            .map(|line| {
                let listed = catalog.iter().find(|p| p.id == line.product_id);
                SummaryLine {
                    product_id: line.product_id,
                    name: listed.map_or_else(|| line.name.clone(), |p| p.name.clone()),
                    image: listed.map(|p| p.image.clone()).or_else(|| line.image.clone()),
                    price: line.price,
                    quantity: line.quantity,
                    line_total: line.price.times(line.quantity),
                }
            })
            .collect();

        Self {
            lines,
            item_count: totals.item_count,
            subtotal: totals.subtotal,
            shipping: totals.shipping,
            total: totals.total,
            items_label: items_label(totals.item_count),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
