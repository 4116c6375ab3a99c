//! Cart line items.

use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::price::UnitPrice;

/// A product being added to the cart, before it has a quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLineItem {
    /// Product identifier; unique within a cart.
    pub id: ProductId,
    /// Display name.
    pub title: String,
    /// Image reference shown next to the line.
    #[serde(alias = "imageUrl")]
    pub image_url: String,
    /// Unit price.
    pub price: UnitPrice,
}

impl NewLineItem {
    /// Create a new line item input.
    #[must_use]
    pub fn new(
        id: impl Into<ProductId>,
        title: impl Into<String>,
        image_url: impl Into<String>,
        price: UnitPrice,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            image_url: image_url.into(),
            price,
        }
    }
}

/// One distinct product in the cart.
///
/// The serialized field names (`id`, `title`, `image_url`, `price`,
/// `quantity`) are the persisted format and must not change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: ProductId,
    pub title: String,
    #[serde(alias = "imageUrl")]
    pub image_url: String,
    pub price: UnitPrice,
    /// Number of units. Starts at 1; may reach zero or below under
    /// [`DecrementPolicy::Keep`](super::DecrementPolicy::Keep).
    pub quantity: i64,
}

impl LineItem {
    /// Price of the whole line (`price * quantity`).
    #[must_use]
    pub fn line_total(&self) -> rust_decimal::Decimal {
        self.price.times(self.quantity)
    }
}

impl From<NewLineItem> for LineItem {
    fn from(item: NewLineItem) -> Self {
        Self {
            id: item.id,
            title: item.title,
            image_url: item.image_url,
            price: item.price,
            quantity: 1,
        }
    }
}
