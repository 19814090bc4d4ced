//! The single create/edit session.
//!
//! An [`EditSession`] owns the one [`Draft`] the operator is working on. It is
//! either in create mode (no target) or editing exactly one product. Submitting
//! validates locally first; only a valid draft reaches the store.

use mercado_core::{Draft, DraftField, Product, ProductId, ValidationError};
use tracing::{debug, instrument, warn};

use crate::api::ProductApi;
use crate::store::{MutationOutcome, ProductStore, StoreError, SyncOutcome};

/// What happens to the draft when a save fails at the transport level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DraftRetention {
    /// Reset to an empty create draft after every attempt.
    #[default]
    ClearAlways,
    /// Keep the draft (and edit target) when the mutation request failed, so
    /// the operator can resubmit.
    KeepOnFailure,
}

/// Current session mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    Create,
    Editing(ProductId),
}

/// Result of [`EditSession::submit`].
#[derive(Debug)]
pub enum SubmitOutcome {
    /// The service accepted the save.
    Saved {
        /// The created or updated product.
        id: ProductId,
        /// Outcome of the follow-up resync.
        resync: SyncOutcome,
    },
    /// The draft failed validation; nothing was sent and the session is unchanged.
    Invalid(ValidationError),
    /// The save was attempted and failed.
    Failed {
        error: StoreError,
        /// Whether the draft was kept for a retry.
        draft_retained: bool,
    },
}

/// Owner of the in-progress draft.
#[derive(Debug, Clone, Default)]
pub struct EditSession {
    draft: Draft,
    retention: DraftRetention,
}

impl EditSession {
    /// Start in create mode with an empty draft.
    #[must_use]
    pub fn new(retention: DraftRetention) -> Self {
        Self {
            draft: Draft::default(),
            retention,
        }
    }

    #[must_use]
    pub const fn mode(&self) -> SessionMode {
        match self.draft.editing_target {
            Some(id) => SessionMode::Editing(id),
            None => SessionMode::Create,
        }
    }

    #[must_use]
    pub const fn draft(&self) -> &Draft {
        &self.draft
    }

    /// Replace one field's raw text.
    pub fn set_field(&mut self, field: DraftField, value: impl Into<String>) {
        self.draft.set(field, value);
    }

    /// Switch to editing `product`, replacing any unsaved draft.
    pub fn start_edit(&mut self, product: &Product) {
        debug!(product_id = %product.id, "Editing product");
        self.draft = Draft::from_product(product);
    }

    /// Discard the draft and return to create mode.
    pub fn cancel(&mut self) {
        self.draft = Draft::default();
    }

    /// Validate, then create or update through the store.
    ///
    /// Validation failures leave the session untouched. Otherwise the draft is
    /// cleared when the attempt completes, unless the mutation itself failed
    /// and the session keeps drafts on failure.
    #[instrument(skip(self, store), fields(mode = ?self.mode()))]
    pub async fn submit<A: ProductApi>(&mut self, store: &ProductStore<A>) -> SubmitOutcome {
        let input = match self.draft.validate() {
            Ok(input) => input,
            Err(e) => {
                debug!(error = %e, "Draft rejected");
                return SubmitOutcome::Invalid(e);
            }
        };

        let outcome = match self.mode() {
            SessionMode::Editing(id) => store.update(id, &input).await,
            SessionMode::Create => store.create(&input).await,
        };

        match outcome {
            MutationOutcome::Applied { id, resync } => {
                self.cancel();
                SubmitOutcome::Saved { id, resync }
            }
            MutationOutcome::Failed(error) => {
                let draft_retained = self.retention == DraftRetention::KeepOnFailure;
                if draft_retained {
                    warn!(error = %error, "Save failed, keeping draft for retry");
                } else {
                    self.cancel();
                }
                SubmitOutcome::Failed {
                    error,
                    draft_retained,
                }
            }
        }
    }
}
