//! Type-safe price representation using decimal arithmetic.
//!
//! The catalog service serializes its fixed-point prices as text (`"12.30"`)
//! to avoid floating-point loss, but older deployments emit plain JSON
//! numbers. Both forms are accepted and normalized to a [`Decimal`] with
//! trailing zeros removed, so `"12.30"` and `12.3` compare and hash equal.
//!
//! ```rust
//! use mercado_core::Price;
//!
//! let price = Price::parse("12.30").unwrap();
//! assert_eq!(price.to_input_string(), "12.3");
//! assert_eq!(price.to_string(), "12.30");
//! ```

use core::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Currency prefix used when rendering prices for the operator.
pub const CURRENCY_PREFIX: &str = "R$";

/// Errors that can occur when parsing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The input string is empty.
    #[error("price cannot be empty")]
    Empty,
    /// The input is not a finite decimal number.
    #[error("'{0}' is not a valid number")]
    NotANumber(String),
    /// The input is a number but cannot be held as a price.
    #[error("'{0}' is out of range for a price")]
    OutOfRange(String),
}

/// A non-currency-tagged fixed-point price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Price(Decimal);

impl Price {
    /// Create a price from a decimal amount, normalizing its scale.
    #[must_use]
    pub fn new(amount: Decimal) -> Self {
        Self(amount.normalize())
    }

    /// Parse a price from operator or wire text.
    ///
    /// Accepts plain (`"5.50"`) and scientific (`"5.5e0"`) notation. Only
    /// digits, sign, decimal point and exponent marker are allowed, so digit
    /// separators such as `"1_000"` are rejected.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError`] if the text is empty, not a finite number, or a
    /// number outside the representable decimal range.
    pub fn parse(s: &str) -> Result<Self, PriceError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(PriceError::Empty);
        }
        if !trimmed
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'))
        {
            return Err(PriceError::NotANumber(trimmed.to_owned()));
        }

        Decimal::from_str(trimmed)
            .or_else(|_| Decimal::from_scientific(trimmed))
            .map(Self::new)
            .map_err(|_| match trimmed.parse::<f64>() {
                Ok(v) if v.is_finite() => PriceError::OutOfRange(trimmed.to_owned()),
                _ => PriceError::NotANumber(trimmed.to_owned()),
            })
    }

    /// Returns the normalized decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Returns true if the amount is below zero.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// Text used to pre-fill an edit form (no forced decimals).
    #[must_use]
    pub fn to_input_string(&self) -> String {
        self.0.to_string()
    }

    /// Format for display with the currency prefix (e.g., "R$ 12.30").
    #[must_use]
    pub fn display(&self) -> String {
        format!("{CURRENCY_PREFIX} {self}")
    }

    /// Serialize as a JSON number, the shape the catalog service accepts on writes.
    ///
    /// # Errors
    ///
    /// Propagates serializer errors.
    pub fn serialize_as_number<S: Serializer>(price: &Self, serializer: S) -> Result<S::Ok, S::Error> {
        rust_decimal::serde::float::serialize(&price.0, serializer)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl FromStr for Price {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self::new(amount)
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_input_string())
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(PriceVisitor)
    }
}

struct PriceVisitor;

impl Visitor<'_> for PriceVisitor {
    type Value = Price;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a decimal price as text or number")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        Price::parse(v).map_err(E::custom)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(Price::new(Decimal::from(v)))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(Price::new(Decimal::from(v)))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        if !v.is_finite() {
            return Err(E::custom(PriceError::NotANumber(v.to_string())));
        }
        // Shortest round-trip text avoids binary noise (12.3 stays 12.3).
        Price::parse(&v.to_string()).map_err(E::custom)
    }
}
