//! Cart viewing and editing commands.
//!
//! # Usage
//!
//! ```bash
//! maisha show
//! maisha add "Running Shoes" 7199 shoes.jpg --size 42
//! maisha set "Running Shoes" 3
//! maisha inc "Running Shoes"
//! maisha dec "Running Shoes"
//! maisha remove "Running Shoes"
//! maisha clear
//! ```

use std::io::{self, Write};

use maisha_cart::Notice;
use maisha_core::{Cart, CartItem, CartSummary, Quantity};

use super::{CommandError, Session};

/// Print the current cart.
pub fn show(session: &Session) -> Result<(), CommandError> {
    print_cart(&session.sync.snapshot())
}

/// Add a line, wait for the remote copy and print the result.
pub async fn add(session: &Session, item: CartItem) -> Result<(), CommandError> {
    session.sync.add(item);
    finish(session).await
}

/// Remove a line.
pub async fn remove(session: &Session, name: &str) -> Result<(), CommandError> {
    session.sync.remove_item(name);
    finish(session).await
}

/// Set a line's quantity.
pub async fn set_quantity(
    session: &Session,
    name: &str,
    quantity: Quantity,
) -> Result<(), CommandError> {
    session.sync.set_quantity(name, quantity);
    finish(session).await
}

/// Add one unit.
pub async fn increment(session: &Session, name: &str) -> Result<(), CommandError> {
    session.sync.increment(name);
    finish(session).await
}

/// Remove one unit, stopping at one.
pub async fn decrement(session: &Session, name: &str) -> Result<(), CommandError> {
    session.sync.decrement(name);
    finish(session).await
}

/// Empty the cart.
pub async fn clear(session: &Session) -> Result<(), CommandError> {
    session.sync.clear();
    session.sync.flush().await;
    let mut out = io::stdout().lock();
    writeln!(out, "{}", Notice::CartCleared.message())?;
    Ok(())
}

async fn finish(session: &Session) -> Result<(), CommandError> {
    session.sync.flush().await;
    print_cart(&session.sync.snapshot())
}

fn print_cart(cart: &Cart) -> Result<(), CommandError> {
    let mut out = io::stdout().lock();
    render_cart(&mut out, cart)?;
    Ok(())
}

/// Render the cart preview: one line per item, then the total.
pub fn render_cart(out: &mut impl Write, cart: &Cart) -> io::Result<()> {
    let summary = CartSummary::from(cart);
    if summary.is_empty() {
        return writeln!(out, "Your cart is empty.");
    }

    for line in &summary.lines {
        write!(out, "{} x{}  {}", line.name, line.quantity, line.line_price)?;
        let variant: Vec<&str> = [line.size.as_deref(), line.color.as_deref()]
            .into_iter()
            .flatten()
            .collect();
        if !variant.is_empty() {
            write!(out, "  ({})", variant.join(", "))?;
        }
        writeln!(out)?;
    }
    writeln!(out, "Total: {}", summary.total_display())
}
