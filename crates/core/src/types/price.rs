//! Type-safe price and quantity representations.
//!
//! Prices use decimal arithmetic so that cart totals are exact. The store
//! trades in Kenyan shillings only, so a price carries no currency code; the
//! [`Display`](core::fmt::Display) impl renders the shilling prefix.

use core::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Currency prefix used when rendering money.
pub const CURRENCY_PREFIX: &str = "Ksh";

/// Errors that can occur when parsing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The input contains no digits.
    #[error("price cannot be empty")]
    Empty,
    /// The digits do not form a decimal number.
    #[error("invalid price: {0}")]
    Invalid(String),
    /// The amount is below zero.
    #[error("price cannot be negative")]
    Negative,
}

/// A non-negative amount of money in Kenyan shillings.
///
/// Serialized as a JSON number, which is what the remote cart API and the
/// local cart record both carry.
///
/// ## Examples
///
/// ```
/// use maisha_core::Price;
///
/// let price = Price::parse_display("Ksh5,599").unwrap();
/// assert_eq!(price.to_string(), "Ksh5599.00");
/// assert!(Price::parse_display("Sold out").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Price(Decimal);

impl Price {
    /// Zero shillings.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a price from a decimal amount.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Negative`] if the amount is below zero.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative);
        }
        Ok(Self(amount))
    }

    /// Create a price from a whole number of shillings.
    #[must_use]
    pub fn from_shillings(shillings: u64) -> Self {
        Self(Decimal::from(shillings))
    }

    /// Parse a price from product display text such as `"Ksh5,599"`.
    ///
    /// Everything except ASCII digits and `.` is stripped before parsing, so
    /// currency prefixes and thousands separators are tolerated.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Empty`] if no digits remain, or
    /// [`PriceError::Invalid`] if the remaining text is not a decimal number.
    pub fn parse_display(text: &str) -> Result<Self, PriceError> {
        let cleaned: String = text
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '.')
            .collect();
        if !cleaned.chars().any(|c| c.is_ascii_digit()) {
            return Err(PriceError::Empty);
        }
        Decimal::from_str(&cleaned)
            .map(Self)
            .map_err(|e| PriceError::Invalid(format!("{text}: {e}")))
    }

    /// The decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Price of `quantity` units, or `None` if it does not fit in a
    /// `Decimal`.
    #[must_use]
    pub fn times(self, quantity: Quantity) -> Option<Decimal> {
        self.0.checked_mul(Decimal::from(quantity.get()))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", format_money(self.0))
    }
}

impl FromStr for Price {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_display(s)
    }
}

impl TryFrom<Decimal> for Price {
    type Error = PriceError;

    fn try_from(amount: Decimal) -> Result<Self, Self::Error> {
        Self::new(amount)
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        rust_decimal::serde::float::serialize(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let amount = rust_decimal::serde::float::deserialize(deserializer)?;
        Self::new(amount).map_err(serde::de::Error::custom)
    }
}

/// Render an amount the way the storefront shows money (`Ksh1234.00`).
#[must_use]
pub fn format_money(amount: Decimal) -> String {
    format!("{CURRENCY_PREFIX}{amount:.2}")
}

/// Errors that can occur when constructing a [`Quantity`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum QuantityError {
    /// Cart lines always hold at least one unit.
    #[error("quantity must be at least 1")]
    Zero,
}

/// Number of units on a cart line. Always at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Quantity(u32);

impl Quantity {
    /// A single unit.
    pub const ONE: Self = Self(1);

    /// Create a quantity.
    ///
    /// # Errors
    ///
    /// Returns [`QuantityError::Zero`] for 0.
    pub const fn new(value: u32) -> Result<Self, QuantityError> {
        if value == 0 {
            return Err(QuantityError::Zero);
        }
        Ok(Self(value))
    }

    /// The unit count.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// One more unit, saturating at `u32::MAX`.
    #[must_use]
    pub const fn incremented(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// One fewer unit, or `None` when already at 1.
    #[must_use]
    pub const fn decremented(self) -> Option<Self> {
        if self.0 > 1 { Some(Self(self.0 - 1)) } else { None }
    }

    /// Sum of two quantities, saturating at `u32::MAX`.
    #[must_use]
    pub const fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }
}

impl Default for Quantity {
    fn default() -> Self {
        Self::ONE
    }
}

impl TryFrom<u32> for Quantity {
    type Error = QuantityError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Quantity> for u32 {
    fn from(quantity: Quantity) -> Self {
        quantity.0
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_display_with_prefix_and_separator() {
        let price = Price::parse_display("Ksh5,599").unwrap();
        assert_eq!(price, Price::from_shillings(5599));
    }

    #[test]
    fn test_parse_display_with_cents() {
        let price = Price::parse_display("Ksh 1,234.50").unwrap();
        assert_eq!(price.amount(), Decimal::new(123_450, 2));
    }

    #[test]
    fn test_parse_display_empty() {
        assert_eq!(Price::parse_display(""), Err(PriceError::Empty));
        assert_eq!(Price::parse_display("Ksh"), Err(PriceError::Empty));
    }

    #[test]
    fn test_parse_display_invalid() {
        assert!(matches!(
            Price::parse_display("1.2.3"),
            Err(PriceError::Invalid(_))
        ));
    }

    #[test]
    fn test_negative_rejected() {
        assert_eq!(Price::new(Decimal::new(-1, 0)), Err(PriceError::Negative));
        assert!(Price::new(Decimal::ZERO).is_ok());
    }

    #[test]
    fn test_display() {
        assert_eq!(Price::from_shillings(4799).to_string(), "Ksh4799.00");
        assert_eq!(Price::ZERO.to_string(), "Ksh0.00");
    }

    #[test]
    fn test_times() {
        let total = Price::from_shillings(7199).times(Quantity::new(3).unwrap());
        assert_eq!(total, Some(Decimal::from(21_597)));
    }

    #[test]
    fn test_times_overflow_is_none() {
        let price = Price::new(Decimal::MAX).unwrap();
        assert_eq!(price.times(Quantity::new(2).unwrap()), None);
        assert_eq!(price.times(Quantity::ONE), Some(Decimal::MAX));
    }

    #[test]
    fn test_price_serializes_as_number() {
        let json = serde_json::to_value(Price::from_shillings(4799)).unwrap();
        assert!(json.is_number());
        let parsed: Price = serde_json::from_str("4799").unwrap();
        assert_eq!(parsed, Price::from_shillings(4799));
    }

    #[test]
    fn test_price_deserialize_negative_fails() {
        assert!(serde_json::from_str::<Price>("-5").is_err());
    }

    #[test]
    fn test_quantity_zero_rejected() {
        assert_eq!(Quantity::new(0), Err(QuantityError::Zero));
        assert!(serde_json::from_str::<Quantity>("0").is_err());
    }

    #[test]
    fn test_quantity_decrement_stops_at_one() {
        assert_eq!(Quantity::ONE.decremented(), None);
        assert_eq!(Quantity::new(2).unwrap().decremented(), Some(Quantity::ONE));
    }
}
