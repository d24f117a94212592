//! The cart model.
//!
//! A [`Cart`] is an insertion-ordered list of [`CartItem`]s keyed by item
//! name. The total price is never stored: it is derived from the items every
//! time it is read or serialized, so it cannot drift from the lines.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

use super::price::{Price, Quantity};

/// A line in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    /// Product name. Unique within a cart.
    pub name: String,
    /// Unit price.
    pub price: Price,
    /// Product image URL.
    pub image: String,
    /// Units of this product.
    pub quantity: Quantity,
    /// Selected size, if the product has sizes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    /// Selected color, if the product has colors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl CartItem {
    /// Create a line with no size or color.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        price: Price,
        image: impl Into<String>,
        quantity: Quantity,
    ) -> Self {
        Self {
            name: name.into(),
            price,
            image: image.into(),
            quantity,
            size: None,
            color: None,
        }
    }

    /// Price times quantity, or `None` if it does not fit in a `Decimal`.
    #[must_use]
    pub fn subtotal(&self) -> Option<Decimal> {
        self.price.times(self.quantity)
    }
}

/// Errors that make a serialized cart unusable.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CartDecodeError {
    /// Two lines share a name.
    #[error("duplicate cart item: {0}")]
    DuplicateItem(String),
    /// The line subtotals add up to more than a `Decimal` can hold.
    #[error("cart total is out of range")]
    TotalOverflow,
}

/// A shopping cart.
///
/// Serializes as `{"items": [...], "totalPrice": <number>}`. When decoding,
/// any `totalPrice` in the input is ignored and recomputed from the items.
///
/// The total of a `Cart` always fits in a `Decimal`: decoding rejects carts
/// whose total would overflow, and mutations that would overflow it are
/// refused.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "CartRecord")]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Lines in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Look up a line by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&CartItem> {
        self.items.iter().find(|item| item.name == name)
    }

    fn get_mut(&mut self, name: &str) -> Option<&mut CartItem> {
        self.items.iter_mut().find(|item| item.name == name)
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of distinct lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Merge an item into the cart.
    ///
    /// If a line with the same name exists its quantity is increased by the
    /// item's quantity and its price, image and options are kept. Otherwise
    /// the item is appended.
    ///
    /// Returns `false`, leaving the cart unchanged, if the new total would
    /// not fit in a `Decimal`.
    pub fn add(&mut self, item: CartItem) -> bool {
        self.apply_checked(|cart| match cart.get_mut(&item.name) {
            Some(existing) => existing.quantity = existing.quantity.saturating_add(item.quantity),
            None => cart.items.push(item),
        })
    }

    /// Remove a line by name. Returns whether a line was removed.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.name != name);
        self.items.len() != before
    }

    /// Set a line's quantity.
    ///
    /// Returns `false`, leaving the cart unchanged, if the line is absent or
    /// the new total would not fit in a `Decimal`.
    pub fn set_quantity(&mut self, name: &str, quantity: Quantity) -> bool {
        if self.get(name).is_none() {
            return false;
        }
        self.apply_checked(|cart| {
            if let Some(item) = cart.get_mut(name) {
                item.quantity = quantity;
            }
        })
    }

    /// Apply `change` to a copy and keep it only if its total is in range.
    fn apply_checked(&mut self, change: impl FnOnce(&mut Self)) -> bool {
        let mut next = self.clone();
        change(&mut next);
        if next.checked_total().is_none() {
            return false;
        }
        *self = next;
        true
    }

    /// Quantity the line would have after one more unit.
    #[must_use]
    pub fn incremented_quantity(&self, name: &str) -> Option<Quantity> {
        self.get(name).map(|item| item.quantity.incremented())
    }

    /// Quantity the line would have after one fewer unit.
    ///
    /// `None` when the line is absent or already at one unit; decrementing
    /// never removes a line.
    #[must_use]
    pub fn decremented_quantity(&self, name: &str) -> Option<Quantity> {
        self.get(name).and_then(|item| item.quantity.decremented())
    }

    /// Remove every line.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Sum of line subtotals.
    #[must_use]
    pub fn total_price(&self) -> Decimal {
        // In range for every cart built through this API
        self.checked_total().unwrap_or(Decimal::MAX)
    }

    fn checked_total(&self) -> Option<Decimal> {
        self.items
            .iter()
            .try_fold(Decimal::ZERO, |total, item| total.checked_add(item.subtotal()?))
    }

    /// Total units across all lines (the cart badge count).
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.items
            .iter()
            .map(|item| u64::from(item.quantity.get()))
            .sum()
    }
}

#[derive(Deserialize)]
struct CartRecord {
    #[serde(default)]
    items: Vec<CartItem>,
}

impl TryFrom<CartRecord> for Cart {
    type Error = CartDecodeError;

    fn try_from(record: CartRecord) -> Result<Self, Self::Error> {
        let mut cart = Self::new();
        for item in record.items {
            if cart.get(&item.name).is_some() {
                return Err(CartDecodeError::DuplicateItem(item.name));
            }
            cart.items.push(item);
        }
        if cart.checked_total().is_none() {
            return Err(CartDecodeError::TotalOverflow);
        }
        Ok(cart)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CartRecordRef<'a> {
    items: &'a [CartItem],
    #[serde(with = "rust_decimal::serde::float")]
    total_price: Decimal,
}

impl Serialize for Cart {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        CartRecordRef {
            items: &self.items,
            total_price: self.total_price(),
        }
        .serialize(serializer)
    }
}
