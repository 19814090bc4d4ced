//! Command implementations.

pub mod products;
pub mod shell;
