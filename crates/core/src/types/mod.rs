//! Core types for Maisha.
//!
//! This module provides type-safe wrappers for the cart domain.

pub mod cart;
pub mod id;
pub mod price;
pub mod summary;

pub use cart::{Cart, CartDecodeError, CartItem};
pub use id::*;
pub use price::{CURRENCY_PREFIX, Price, PriceError, Quantity, QuantityError, format_money};
pub use summary::{CartSummary, LineView};
