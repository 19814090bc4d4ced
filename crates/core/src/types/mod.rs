//! Core types for Mercado.
//!
//! This module provides type-safe wrappers for the catalog domain.

pub mod draft;
pub mod id;
pub mod price;
pub mod product;

pub use draft::{Draft, DraftField, ValidationError};
pub use id::*;
pub use price::{Price, PriceError};
pub use product::{Product, ProductInput};
