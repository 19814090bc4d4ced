//! In-progress create/edit form state and its validation.
//!
//! A [`Draft`] holds exactly what the operator typed. Nothing is parsed until
//! [`Draft::validate`] runs, which either yields a [`ProductInput`] ready to
//! submit or the first [`ValidationError`] found.

use core::fmt;
use std::str::FromStr;

use super::{Price, PriceError, Product, ProductId, ProductInput};

/// Client-side validation failures. These never reach the network.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Name is empty after trimming.
    #[error("Name is required")]
    EmptyName,
    /// Price is not a finite number.
    #[error("Price must be a number: {0}")]
    InvalidPrice(#[source] PriceError),
    /// Price is below zero.
    #[error("Price cannot be negative")]
    NegativePrice,
    /// Stock is not a whole number.
    #[error("Stock must be a whole number (got '{0}')")]
    InvalidStock(String),
    /// Stock is below zero.
    #[error("Stock cannot be negative")]
    NegativeStock,
}

/// Editable fields of a [`Draft`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DraftField {
    Name,
    Price,
    Stock,
}

impl fmt::Display for DraftField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Self::Name => "name",
            Self::Price => "price",
            Self::Stock => "stock",
        })
    }
}

impl FromStr for DraftField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(Self::Name),
            "price" => Ok(Self::Price),
            "stock" => Ok(Self::Stock),
            _ => Err(format!("unknown field: {s} (expected name, price or stock)")),
        }
    }
}

/// Raw, unvalidated form values for a create or an edit.
///
/// `editing_target` is `None` in create mode and holds the product being
/// edited otherwise.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    pub name: String,
    pub price: String,
    pub stock_quantity: String,
    pub editing_target: Option<ProductId>,
}

impl Draft {
    /// Pre-fill a draft from a product's current values.
    #[must_use]
    pub fn from_product(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            price: product.price.to_input_string(),
            stock_quantity: product.stock_quantity.to_string(),
            editing_target: Some(product.id),
        }
    }

    /// Returns the raw text of a field.
    #[must_use]
    pub fn get(&self, field: DraftField) -> &str {
        match field {
            DraftField::Name => &self.name,
            DraftField::Price => &self.price,
            DraftField::Stock => &self.stock_quantity,
        }
    }

    /// Replace the raw text of a field.
    pub fn set(&mut self, field: DraftField, value: impl Into<String>) {
        let value = value.into();
        match field {
            DraftField::Name => self.name = value,
            DraftField::Price => self.price = value,
            DraftField::Stock => self.stock_quantity = value,
        }
    }

    /// True when no field holds text and no product is targeted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
            && self.price.is_empty()
            && self.stock_quantity.is_empty()
            && self.editing_target.is_none()
    }

    /// Parse and check every field.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] in field order (name, price, stock).
    pub fn validate(&self) -> Result<ProductInput, ValidationError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyName);
        }

        let price = Price::parse(&self.price).map_err(ValidationError::InvalidPrice)?;
        if price.is_negative() {
            return Err(ValidationError::NegativePrice);
        }

        let stock_text = self.stock_quantity.trim();
        let stock = stock_text
            .parse::<i64>()
            .map_err(|_| ValidationError::InvalidStock(stock_text.to_owned()))?;
        if stock < 0 {
            return Err(ValidationError::NegativeStock);
        }
        let stock_quantity =
            u32::try_from(stock).map_err(|_| ValidationError::InvalidStock(stock_text.to_owned()))?;

        Ok(ProductInput {
            name: name.to_owned(),
            price,
            stock_quantity,
        })
    }
}
