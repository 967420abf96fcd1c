//! Derived cart aggregate.

use serde::Serialize;
use shared_types::{CartLine, Money, Product, ProductId, Timestamp};

/// One displayable cart line, priced at the current catalog price.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SummaryLine {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Money,
    pub quantity: u32,
    pub line_total: Money,
    pub image_path: Option<String>,
    pub added_at: Timestamp,
}

impl SummaryLine {
    pub fn priced(line: &CartLine, product: Product) -> Self {
        Self {
            product_id: line.product_id,
            unit_price: product.price,
            line_total: product.price.times(line.quantity),
            name: product.name,
            quantity: line.quantity,
            image_path: product.image_path,
            added_at: line.created_at,
        }
    }
}

/// `{lines, item_count, total}` computed from one read of the cart.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CartSummary {
    pub lines: Vec<SummaryLine>,
    pub item_count: u64,
    pub total: Money,
}

impl CartSummary {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.item_count == 0
    }
}
