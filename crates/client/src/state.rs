//! Application state container.
//!
//! [`AppState`] owns the [`ProductStore`] (and through it the snapshot) and the
//! [`EditSession`] (and through it the draft). Every change goes through
//! [`AppState::dispatch`].

use mercado_core::{DraftField, ProductId};
use tracing::{debug, instrument};

use crate::api::ProductApi;
use crate::session::{DraftRetention, EditSession, SubmitOutcome};
use crate::store::{Confirm, DeleteOutcome, ProductStore, Snapshot, StoreError, SyncOutcome};
use crate::view;

/// Operator actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Re-read the catalog.
    Refresh,
    /// Load a product from the snapshot into the draft.
    StartEdit(ProductId),
    /// Replace one draft field's text.
    EditField(DraftField, String),
    /// Validate and save the draft.
    Submit,
    /// Drop the draft and return to create mode.
    Cancel,
    /// Delete a product after confirmation.
    Delete(ProductId),
}

/// What a dispatched action did.
#[derive(Debug)]
pub enum ActionOutcome {
    Refreshed(SyncOutcome),
    EditStarted(ProductId),
    FieldUpdated(DraftField),
    Submitted(SubmitOutcome),
    Cancelled,
    Deleted(DeleteOutcome),
    /// The action referred to something that does not exist locally.
    Rejected(StoreError),
}

/// Owned state of one mounted console.
#[derive(Debug)]
pub struct AppState<A> {
    store: ProductStore<A>,
    session: EditSession,
}

impl<A: ProductApi> AppState<A> {
    /// Build state with an empty snapshot and an empty create draft.
    #[must_use]
    pub fn new(api: A, retention: DraftRetention) -> Self {
        Self {
            store: ProductStore::new(api),
            session: EditSession::new(retention),
        }
    }

    /// Build state and run the initial resync.
    pub async fn mount(api: A, retention: DraftRetention) -> (Self, SyncOutcome) {
        let state = Self::new(api, retention);
        let outcome = state.store.list().await;
        (state, outcome)
    }

    #[must_use]
    pub const fn store(&self) -> &ProductStore<A> {
        &self.store
    }

    #[must_use]
    pub const fn session(&self) -> &EditSession {
        &self.session
    }

    pub async fn snapshot(&self) -> Snapshot {
        self.store.snapshot().await
    }

    /// Apply one action.
    ///
    /// `confirm` is only consulted for [`Action::Delete`].
    #[instrument(skip(self, confirm))]
    pub async fn dispatch(&mut self, action: Action, confirm: &mut impl Confirm) -> ActionOutcome {
        match action {
            Action::Refresh => ActionOutcome::Refreshed(self.store.list().await),
            Action::StartEdit(id) => match self.store.find(id).await {
                Some(product) => {
                    self.session.start_edit(&product);
                    ActionOutcome::EditStarted(id)
                }
                None => {
                    debug!(product_id = %id, "Cannot edit a product missing from the snapshot");
                    ActionOutcome::Rejected(StoreError::UnknownProduct(id))
                }
            },
            Action::EditField(field, value) => {
                self.session.set_field(field, value);
                ActionOutcome::FieldUpdated(field)
            }
            Action::Submit => ActionOutcome::Submitted(self.session.submit(&self.store).await),
            Action::Cancel => {
                self.session.cancel();
                ActionOutcome::Cancelled
            }
            Action::Delete(id) => ActionOutcome::Deleted(self.store.delete(id, confirm).await),
        }
    }

    /// Render the full page from the current snapshot and session.
    pub async fn render(&self) -> String {
        view::render_page(&self.store.snapshot().await, &self.session)
    }
}
