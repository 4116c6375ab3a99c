//! Cart state and its mutation rules.
//!
//! [`CartState`] is an ordered list of [`LineItem`]s with at most one entry
//! per [`ProductId`]. Insertion order is preserved: re-adding a product bumps
//! its quantity in place instead of moving it to the end.
//!
//! All methods here are pure; persistence and sharing live in the `cart`
//! crate.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::line_item::{LineItem, NewLineItem};
use super::policy::DecrementPolicy;

/// The ordered collection of line items in a cart.
///
/// Serializes as a bare JSON array of line items. Deserializing merges any
/// duplicate IDs into the first occurrence so the one-entry-per-product
/// invariant holds for data written by older clients.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Vec<LineItem>", into = "Vec<LineItem>")]
pub struct CartState {
    items: Vec<LineItem>,
}

impl CartState {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Build a cart from raw items, merging duplicate IDs.
    ///
    /// The first occurrence of an ID keeps its title, image and price; the
    /// quantities of later duplicates are added to it.
    #[must_use]
    pub fn from_items(raw: Vec<LineItem>) -> Self {
        let mut items: Vec<LineItem> = Vec::with_capacity(raw.len());
        for item in raw {
            match items.iter_mut().find(|existing| existing.id == item.id) {
                Some(existing) => {
                    existing.quantity = existing.quantity.saturating_add(item.quantity);
                }
                None => items.push(item),
            }
        }
        Self { items }
    }

    /// The line items in insertion order.
    #[must_use]
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// Number of distinct products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the cart has no line items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Look up a line item by product ID.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&LineItem> {
        self.items.iter().find(|item| item.id.as_str() == id)
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut LineItem> {
        self.items.iter_mut().find(|item| item.id.as_str() == id)
    }

    /// Add one unit of a product.
    ///
    /// An existing line only has its quantity bumped; its title, image and
    /// price are left as they were. Otherwise a new line with quantity 1 is
    /// appended. Returns the line's quantity after the change.
    pub fn add(&mut self, item: NewLineItem) -> i64 {
        if let Some(existing) = self.get_mut(item.id.as_str()) {
            existing.quantity = existing.quantity.saturating_add(1);
            return existing.quantity;
        }
        self.items.push(LineItem::from(item));
        1
    }

    /// Add one unit to an existing line. Returns `false` if the ID is absent.
    pub fn increment(&mut self, id: &str) -> bool {
        self.get_mut(id).is_some_and(|item| {
            item.quantity = item.quantity.saturating_add(1);
            true
        })
    }

    /// Remove one unit from an existing line according to `policy`.
    ///
    /// Returns `false` if the ID is absent.
    pub fn decrement(&mut self, id: &str, policy: DecrementPolicy) -> bool {
        let Some(index) = self.items.iter().position(|item| item.id.as_str() == id) else {
            return false;
        };
        let Some(item) = self.items.get_mut(index) else {
            return false;
        };

        match policy {
            DecrementPolicy::Keep => item.quantity = item.quantity.saturating_sub(1),
            DecrementPolicy::Clamp => item.quantity = item.quantity.saturating_sub(1).max(0),
            DecrementPolicy::Remove => {
                item.quantity = item.quantity.saturating_sub(1);
                if item.quantity <= 0 {
                    self.items.remove(index);
                }
            }
        }
        true
    }

    /// Remove every line item.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Sum of all quantities (the cart badge count).
    #[must_use]
    pub fn total_quantity(&self) -> i64 {
        self.items
            .iter()
            .fold(0_i64, |acc, item| acc.saturating_add(item.quantity))
    }

    /// Sum of `price * quantity` over all lines.
    ///
    /// Saturates at [`Decimal::MAX`] / [`Decimal::MIN`] rather than
    /// overflowing, since stored carts may hold arbitrarily large values.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.items
            .iter()
            .fold(Decimal::ZERO, |acc, item| acc.saturating_add(item.line_total()))
    }

    /// Whether the cart contains a product.
    #[must_use]
    pub fn contains(&self, id: &ProductId) -> bool {
        self.get(id.as_str()).is_some()
    }
}

impl From<Vec<LineItem>> for CartState {
    fn from(items: Vec<LineItem>) -> Self {
        Self::from_items(items)
    }
}

impl From<CartState> for Vec<LineItem> {
    fn from(cart: CartState) -> Self {
        cart.items
    }
}

impl<'a> IntoIterator for &'a CartState {
    type Item = &'a LineItem;
    type IntoIter = std::slice::Iter<'a, LineItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
