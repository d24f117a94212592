//! Display-ready views derived from a [`Cart`].
//!
//! These are what the rendering layer consumes: the cart preview, the
//! detailed cart modal, the checkout modal and the cart count badge all read
//! the same [`CartSummary`].

use rust_decimal::Decimal;
use serde::Serialize;

use super::cart::{Cart, CartItem};
use super::price::format_money;

/// Line display data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineView {
    pub name: String,
    pub image: String,
    pub quantity: u32,
    /// Unit price, formatted.
    pub price: String,
    /// Price times quantity, formatted.
    pub line_price: String,
    pub size: Option<String>,
    pub color: Option<String>,
}

impl From<&CartItem> for LineView {
    fn from(item: &CartItem) -> Self {
        Self {
            name: item.name.clone(),
            image: item.image.clone(),
            quantity: item.quantity.get(),
            price: item.price.to_string(),
            line_price: item.subtotal().map(format_money).unwrap_or_default(),
            size: item.size.clone(),
            color: item.color.clone(),
        }
    }
}

/// Cart totals and lines for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartSummary {
    pub lines: Vec<LineView>,
    pub subtotal: Decimal,
    pub shipping: Decimal,
    pub total: Decimal,
    pub item_count: u64,
}

impl CartSummary {
    /// Flat shipping charge. Delivery is arranged over WhatsApp, so checkout
    /// never adds a fee.
    pub const SHIPPING: Decimal = Decimal::ZERO;

    /// Formatted subtotal.
    #[must_use]
    pub fn subtotal_display(&self) -> String {
        format_money(self.subtotal)
    }

    /// Formatted shipping charge.
    #[must_use]
    pub fn shipping_display(&self) -> String {
        format_money(self.shipping)
    }

    /// Formatted grand total.
    #[must_use]
    pub fn total_display(&self) -> String {
        format_money(self.total)
    }

    /// Whether there is anything to check out.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl From<&Cart> for CartSummary {
    fn from(cart: &Cart) -> Self {
        let subtotal = cart.total_price();
        Self {
            lines: cart.items().iter().map(LineView::from).collect(),
            subtotal,
            shipping: Self::SHIPPING,
            total: subtotal + Self::SHIPPING,
            item_count: cart.item_count(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::price::{Price, Quantity};

    #[test]
    fn test_empty_summary() {
        let summary = CartSummary::from(&Cart::new());
        assert!(summary.is_empty());
        assert_eq!(summary.item_count, 0);
        assert_eq!(summary.total_display(), "Ksh0.00");
    }

    #[test]
    fn test_summary_totals() {
        let mut cart = Cart::new();
        cart.add(CartItem::new(
            "Shoes",
            Price::from_shillings(7199),
            "shoes.jpg",
            Quantity::new(2).unwrap(),
        ));
        cart.add(CartItem::new(
            "Denim Jacket",
            Price::from_shillings(4799),
            "jacket.jpg",
            Quantity::ONE,
        ));

        let summary = CartSummary::from(&cart);
        assert_eq!(summary.item_count, 3);
        assert_eq!(summary.subtotal_display(), "Ksh19197.00");
        assert_eq!(summary.shipping_display(), "Ksh0.00");
        assert_eq!(summary.total, summary.subtotal);

        let first = &summary.lines[0];
        assert_eq!(first.price, "Ksh7199.00");
        assert_eq!(first.line_price, "Ksh14398.00");
    }
}
