//! Checkout commands.
//!
//! # Usage
//!
//! ```bash
//! # Subtotal, shipping and total
//! maisha summary
//!
//! # Order message and wa.me link (detailed or --quick)
//! maisha whatsapp
//!
//! # Confirm payment; empties the cart
//! maisha checkout
//! ```

use std::io::{self, Write};

use maisha_cart::checkout::{confirm_payment, whatsapp_order};
use maisha_cart::{Notice, OrderFormat, WhatsAppOrder};
use maisha_core::CartSummary;

use super::{CommandError, Session};

/// Print the checkout summary.
pub fn summary(session: &Session) -> Result<(), CommandError> {
    let summary = CartSummary::from(&session.sync.snapshot());
    let mut out = io::stdout().lock();
    render_summary(&mut out, &summary)?;
    Ok(())
}

/// Print the WhatsApp order message and deep link, or the empty-cart
/// notice when there is nothing to order.
pub fn whatsapp(session: &Session, quick: bool) -> Result<(), CommandError> {
    let format = if quick {
        OrderFormat::Quick
    } else {
        OrderFormat::Detailed
    };
    let mut out = io::stdout().lock();
    let Ok(order) = whatsapp_order(&session.sync, &session.config.whatsapp_number, format) else {
        writeln!(out, "{}", format.empty_notice().message())?;
        return Ok(());
    };
    render_order(&mut out, &order)?;
    Ok(())
}

/// Confirm payment, clear the cart and print the notice.
pub async fn checkout(session: &Session) -> Result<(), CommandError> {
    let notice = confirm_payment(&session.sync);
    session.sync.flush().await;
    let mut out = io::stdout().lock();
    writeln!(out, "{}", notice.message())?;
    Ok(())
}

fn render_summary(out: &mut impl Write, summary: &CartSummary) -> io::Result<()> {
    if summary.is_empty() {
        return writeln!(out, "{}", Notice::EmptyCart.message());
    }
    writeln!(out, "Items:    {}", summary.item_count)?;
    writeln!(out, "Subtotal: {}", summary.subtotal_display())?;
    writeln!(out, "Shipping: {}", summary.shipping_display())?;
    writeln!(out, "Total:    {}", summary.total_display())
}

fn render_order(out: &mut impl Write, order: &WhatsAppOrder) -> io::Result<()> {
    writeln!(out, "{}", order.message())?;
    writeln!(out)?;
    writeln!(out, "{}", order.link())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use maisha_core::{Cart, CartItem, Price, Quantity};

    use super::*;

    fn cart() -> Cart {
        let mut cart = Cart::new();
        cart.add(CartItem::new(
            "Denim Jacket",
            Price::from_shillings(4799),
            "jacket.jpg",
            Quantity::new(2).unwrap(),
        ));
        cart
    }

    #[test]
    fn test_render_summary() {
        let mut out = Vec::new();
        render_summary(&mut out, &CartSummary::from(&cart())).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Items:    2\nSubtotal: Ksh9598.00\nShipping: Ksh0.00\nTotal:    Ksh9598.00\n"
        );
    }

    #[test]
    fn test_render_summary_empty() {
        let mut out = Vec::new();
        render_summary(&mut out, &CartSummary::from(&Cart::new())).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "Your cart is empty!\n");
    }

    #[test]
    fn test_render_order_ends_with_link() {
        let order = WhatsAppOrder::new("254799921036", &cart(), OrderFormat::Quick).unwrap();
        let mut out = Vec::new();
        render_order(&mut out, &order).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("Hello, I would like to order:\n"));
        assert!(text.trim_end().ends_with(&order.link()));
    }
}
