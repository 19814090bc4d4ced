//! Mercado client library.
//!
//! Everything the operator console needs short of a terminal: configuration,
//! the catalog HTTP client, the product store with its resync discipline, the
//! single edit session, the failure boundary and plain-text views.
//!
//! # Modules
//!
//! - [`config`] - Environment-driven client configuration
//! - [`api`] - The [`api::ProductApi`] seam and its `reqwest` implementation
//! - [`store`] - Snapshot ownership and sequenced resyncs
//! - [`session`] - Draft ownership and validate-then-submit
//! - [`state`] - [`state::AppState`], the one place actions are applied
//! - [`boundary`] - Panic containment around rendering and actions
//! - [`view`] - Text rendering of the listing and the form

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod boundary;
pub mod config;
pub mod error;
pub mod session;
pub mod state;
pub mod store;
pub mod view;

#[cfg(test)]
mod testing;

pub use api::{ApiError, HttpProductApi, ProductApi};
pub use boundary::{Boundary, BoundaryState, Fault};
pub use config::{ClientConfig, ConfigError};
pub use error::ClientError;
pub use session::{DraftRetention, EditSession, SessionMode, SubmitOutcome};
pub use state::{Action, ActionOutcome, AppState};
pub use store::{
    Confirm, DeleteOutcome, MutationOutcome, PreAnswered, ProductStore, Snapshot, StoreError,
    SyncOutcome,
};
