//! Cart lines

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::products::{Product, ProductId};

/// One product and its quantity within a cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    /// Copy of the product at the time it was added
    pub product: Product,

    /// Number of units, always at least one
    pub quantity: u32,

    /// When the product was first added to the cart
    pub added_at: Timestamp,
}

impl CartLine {
    /// Create a new line.
    pub fn new(product: Product, quantity: u32, added_at: Timestamp) -> Self {
        Self {
            product,
            quantity,
            added_at,
        }
    }

    /// Identifier of the product on this line.
    pub fn product_id(&self) -> ProductId {
        self.product.id
    }
}

/// Position of the line for `product` in `lines`, if any.
pub(crate) fn position_of(lines: &[CartLine], product: ProductId) -> Option<usize> {
    lines.iter().position(|line| line.product_id() == product)
}
