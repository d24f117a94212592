//! Checkout hand-off.
//!
//! Orders are placed over WhatsApp: the shopper is sent to a `wa.me` deep
//! link with the order pre-typed. Payment itself is out of scope; confirming
//! payment only clears the cart and shows a notice.

use std::fmt::Write;

use maisha_core::{Cart, CartSummary, format_money};

use crate::error::CheckoutError;
use crate::sync::CartSynchronizer;

/// Messages for the notification layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    /// A checkout action was attempted on an empty cart.
    EmptyCart,
    /// The cart preview's quick order was attempted on an empty cart.
    EmptyPreview,
    /// The shopper cleared the cart.
    CartCleared,
    /// Payment was "confirmed"; the order must go through WhatsApp.
    PaymentPending,
}

impl Notice {
    /// Text shown to the shopper.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::EmptyCart => "Your cart is empty!",
            Self::EmptyPreview => "Cart is empty!",
            Self::CartCleared => "Cart cleared!",
            Self::PaymentPending => {
                "Payment to be confirmed! kindly use the WhatsApp button to make your order. \
                 we are experiencing payment gateway issues at the moment. Sorry for the \
                 inconvenience our customer. Thank you!"
            }
        }
    }
}

/// Which order message to generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderFormat {
    /// Numbered lines with quantities and line totals (checkout modal).
    #[default]
    Detailed,
    /// One bullet per line with unit price (cart preview button).
    Quick,
}

impl OrderFormat {
    /// Notice shown when this order is attempted on an empty cart.
    #[must_use]
    pub const fn empty_notice(self) -> Notice {
        match self {
            Self::Detailed => Notice::EmptyCart,
            Self::Quick => Notice::EmptyPreview,
        }
    }
}

/// A WhatsApp order for the current cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhatsAppOrder {
    number: String,
    message: String,
}

impl WhatsAppOrder {
    /// Compose an order for `cart` addressed to `number` (digits only).
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::EmptyCart` if the cart has no lines.
    pub fn new(number: &str, cart: &Cart, format: OrderFormat) -> Result<Self, CheckoutError> {
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        let message = match format {
            OrderFormat::Detailed => detailed_message(cart),
            OrderFormat::Quick => quick_message(cart),
        };
        Ok(Self {
            number: number.to_string(),
            message,
        })
    }

    /// Plain-text order message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// `https://wa.me/<number>?text=<message>` deep link.
    #[must_use]
    pub fn link(&self) -> String {
        format!(
            "https://wa.me/{}?text={}",
            self.number,
            urlencoding::encode(&self.message)
        )
    }
}

fn detailed_message(cart: &Cart) -> String {
    let summary = CartSummary::from(cart);
    let mut message = String::from("Hello! I would like to place an order:\n\n");
    for (index, line) in summary.lines.iter().enumerate() {
        // Writing to a String cannot fail
        let _ = write!(
            message,
            "{}. {}\n   Quantity: {}\n   Price: {}\n\n",
            index + 1,
            line.name,
            line.quantity,
            line.line_price
        );
    }
    let _ = write!(message, "Total: {}\n\n", summary.total_display());
    message.push_str("Please confirm my order. Thank you!");
    message
}

fn quick_message(cart: &Cart) -> String {
    let mut message = String::from("Hello, I would like to order:\n");
    for item in cart.items() {
        let _ = write!(
            message,
            "\n- {}: Ksh{} × {}",
            item.name,
            item.price.amount().normalize(),
            item.quantity
        );
    }
    let _ = write!(message, "\n\nTotal: {}", format_money(cart.total_price()));
    message
}

/// Compose the order from the synchronizer's local cart.
///
/// # Errors
///
/// Returns `CheckoutError::EmptyCart` if the cart has no lines.
pub fn whatsapp_order(
    sync: &CartSynchronizer,
    number: &str,
    format: OrderFormat,
) -> Result<WhatsAppOrder, CheckoutError> {
    WhatsAppOrder::new(number, &sync.snapshot(), format)
}

/// Confirm payment: empty the cart and tell the shopper to order over
/// WhatsApp.
pub fn confirm_payment(sync: &CartSynchronizer) -> Notice {
    sync.clear();
    Notice::PaymentPending
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use maisha_core::{CartItem, Price, Quantity};

    use super::*;

    fn two_item_cart() -> Cart {
        let mut cart = Cart::new();
        cart.add(CartItem::new(
            "Running Shoes",
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
        cart
    }

    #[test]
    fn test_empty_cart_rejected() {
        assert_eq!(
            WhatsAppOrder::new("254799921036", &Cart::new(), OrderFormat::Detailed),
            Err(CheckoutError::EmptyCart)
        );
    }

    #[test]
    fn test_detailed_message() {
        let order =
            WhatsAppOrder::new("254799921036", &two_item_cart(), OrderFormat::Detailed).unwrap();
        assert_eq!(
            order.message(),
            "Hello! I would like to place an order:\n\n\
             1. Running Shoes\n   Quantity: 2\n   Price: Ksh14398.00\n\n\
             2. Denim Jacket\n   Quantity: 1\n   Price: Ksh4799.00\n\n\
             Total: Ksh19197.00\n\n\
             Please confirm my order. Thank you!"
        );
    }

    #[test]
    fn test_quick_message() {
        let order =
            WhatsAppOrder::new("254799921036", &two_item_cart(), OrderFormat::Quick).unwrap();
        assert_eq!(
            order.message(),
            "Hello, I would like to order:\n\
             \n- Running Shoes: Ksh7199 × 2\
             \n- Denim Jacket: Ksh4799 × 1\
             \n\nTotal: Ksh19197.00"
        );
    }

    #[test]
    fn test_link_is_percent_encoded() {
        let order =
            WhatsAppOrder::new("254799921036", &two_item_cart(), OrderFormat::Detailed).unwrap();
        let link = order.link();
        assert!(link.starts_with("https://wa.me/254799921036?text=Hello%21%20I%20would"));
        assert!(!link.contains('\n'));
        assert!(link.contains("%0A"));
    }

    #[test]
    fn test_notice_text() {
        assert_eq!(Notice::EmptyCart.message(), "Your cart is empty!");
        assert_eq!(Notice::CartCleared.message(), "Cart cleared!");
        assert_eq!(
            Notice::PaymentPending.message(),
            "Payment to be confirmed! kindly use the WhatsApp button to make your order. \
             we are experiencing payment gateway issues at the moment. Sorry for the \
             inconvenience our customer. Thank you!"
        );
    }

    #[test]
    fn test_empty_notice_per_format() {
        assert_eq!(
            OrderFormat::Detailed.empty_notice().message(),
            "Your cart is empty!"
        );
        assert_eq!(OrderFormat::Quick.empty_notice().message(), "Cart is empty!");
    }
}
