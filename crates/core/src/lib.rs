//! Mercado Core - Shared types library.
//!
//! This crate provides the types used across all Mercado components:
//! - `client` - Product store sync, edit session and failure boundary
//! - `proxy` - Development proxy forwarding `/api` to the catalog service
//! - `cli` - Operator console
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Product records, prices, drafts and their validation
//! - [`endpoint`] - Base address resolution for the catalog service

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod endpoint;
pub mod types;

pub use endpoint::{PROXY_PREFIX, join_url, resolve_base};
pub use types::*;
