//! Product store sync.
//!
//! [`ProductStore`] owns the local [`Snapshot`] of the catalog. The snapshot is
//! only ever replaced wholesale by a successful [`ProductStore::list`]; every
//! mutation is followed by such a resync, never by a local patch.
//!
//! # Ordering
//!
//! Each resync takes a ticket from a monotonically increasing sequence when it
//! is issued. A response is applied only if its ticket is still the most
//! recently issued one, so a slow, older response can never overwrite the
//! result of a newer request.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use mercado_core::{Product, ProductId, ProductInput};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, error, info, instrument, warn};

use crate::api::{ApiError, ProductApi};

/// Errors surfaced by store mutations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The catalog service could not be reached or rejected the request.
    #[error("Transport failure: {0}")]
    Transport(#[from] ApiError),

    /// The id is not present in the current snapshot.
    #[error("Unknown product: {0}")]
    UnknownProduct(ProductId),
}

/// Result of a resync.
#[derive(Debug)]
pub enum SyncOutcome {
    /// The snapshot was replaced.
    Synced {
        /// Ticket of the applied request.
        sequence: u64,
        /// Number of products now in the snapshot.
        count: usize,
    },
    /// The response arrived after a newer request was issued and was dropped.
    Superseded {
        /// Ticket of the dropped request.
        sequence: u64,
    },
    /// The request failed; the previous snapshot is kept.
    Failed(ApiError),
}

impl SyncOutcome {
    /// True if this resync replaced the snapshot.
    #[must_use]
    pub const fn is_synced(&self) -> bool {
        matches!(self, Self::Synced { .. })
    }
}

/// Result of a create, update or delete.
#[derive(Debug)]
pub enum MutationOutcome {
    /// The service accepted the mutation; `resync` reports the follow-up read.
    Applied {
        /// Product the mutation targeted (the new id for creates).
        id: ProductId,
        /// Outcome of the mandatory follow-up resync.
        resync: SyncOutcome,
    },
    /// The mutation was not applied.
    Failed(StoreError),
}

impl MutationOutcome {
    /// True if the service accepted the mutation.
    #[must_use]
    pub const fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

/// Result of a delete, which may be declined before anything is sent.
#[derive(Debug)]
pub enum DeleteOutcome {
    /// The operator declined the confirmation; nothing was sent.
    Declined,
    /// The delete request was sent.
    Attempted(MutationOutcome),
}

/// Interactive confirmation required before destructive operations.
pub trait Confirm: Send {
    /// Ask the operator; `true` means proceed.
    fn confirm(&mut self, prompt: &str) -> impl Future<Output = bool> + Send;
}

/// A confirmation answered ahead of time (e.g., a `--yes` flag).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreAnswered(pub bool);

impl Confirm for PreAnswered {
    async fn confirm(&mut self, _prompt: &str) -> bool {
        self.0
    }
}

/// An immutable view of the catalog at the time of one resync.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    sequence: u64,
    products: Arc<[Product]>,
}

impl Snapshot {
    fn new(sequence: u64, products: Vec<Product>) -> Self {
        Self {
            sequence,
            products: products.into(),
        }
    }

    /// Ticket of the resync that produced this snapshot (0 before the first).
    #[must_use]
    pub const fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Products in service order.
    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Look up a product by id.
    #[must_use]
    pub fn get(&self, id: ProductId) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

/// Owner of the local product snapshot.
pub struct ProductStore<A> {
    api: A,
    snapshot: RwLock<Snapshot>,
    issued: AtomicU64,
}

impl<A> std::fmt::Debug for ProductStore<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProductStore")
            .field("issued", &self.issued.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

impl<A: ProductApi> ProductStore<A> {
    /// Create a store with an empty snapshot.
    #[must_use]
    pub fn new(api: A) -> Self {
        Self {
            api,
            snapshot: RwLock::new(Snapshot::default()),
            issued: AtomicU64::new(0),
        }
    }

    /// A cheap clone of the current snapshot.
    pub async fn snapshot(&self) -> Snapshot {
        self.snapshot.read().await.clone()
    }

    /// Look up a product in the current snapshot.
    pub async fn find(&self, id: ProductId) -> Option<Product> {
        self.snapshot.read().await.get(id).cloned()
    }

    /// Re-read the whole collection and replace the snapshot.
    ///
    /// Never fails: transport errors are logged and reported in the outcome,
    /// leaving the previous snapshot in place.
    pub async fn list(&self) -> SyncOutcome {
        let sequence = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        self.resync(sequence).await
    }

    #[instrument(skip(self))]
    async fn resync(&self, sequence: u64) -> SyncOutcome {
        let products = match self.api.list().await {
            Ok(products) => products,
            Err(e) => {
                warn!(error = %e, "Product resync failed, keeping previous snapshot");
                return SyncOutcome::Failed(e);
            }
        };

        let mut snapshot = self.snapshot.write().await;
        let latest = self.issued.load(Ordering::SeqCst);
        if sequence != latest {
            debug!(latest, "Dropping superseded resync response");
            return SyncOutcome::Superseded { sequence };
        }

        let count = products.len();
        *snapshot = Snapshot::new(sequence, products);
        debug!(count, "Snapshot replaced");
        SyncOutcome::Synced { sequence, count }
    }

    /// Create a product, then resync.
    #[instrument(skip(self, input), fields(name = %input.name()))]
    pub async fn create(&self, input: &ProductInput) -> MutationOutcome {
        match self.api.create(input).await {
            Ok(created) => {
                info!(product_id = %created.id, "Product created");
                let resync = self.list().await;
                MutationOutcome::Applied {
                    id: created.id,
                    resync,
                }
            }
            Err(e) => {
                error!(error = %e, "Failed to create product");
                MutationOutcome::Failed(e.into())
            }
        }
    }

    /// Replace a product known to the snapshot, then resync.
    #[instrument(skip(self, input), fields(product_id = %id))]
    pub async fn update(&self, id: ProductId, input: &ProductInput) -> MutationOutcome {
        if self.find(id).await.is_none() {
            warn!("Refusing to update a product missing from the snapshot");
            return MutationOutcome::Failed(StoreError::UnknownProduct(id));
        }

        match self.api.update(id, input).await {
            Ok(_) => {
                info!("Product updated");
                let resync = self.list().await;
                MutationOutcome::Applied { id, resync }
            }
            Err(e) => {
                error!(error = %e, "Failed to update product");
                MutationOutcome::Failed(e.into())
            }
        }
    }

    /// Ask for confirmation, delete a product, then resync.
    ///
    /// Nothing is sent unless `confirm` answers yes.
    #[instrument(skip(self, confirm), fields(product_id = %id))]
    pub async fn delete(&self, id: ProductId, confirm: &mut impl Confirm) -> DeleteOutcome {
        let prompt = match self.find(id).await {
            Some(product) => format!("Delete product #{id} ({})?", product.name),
            None => format!("Delete product #{id}?"),
        };

        if !confirm.confirm(&prompt).await {
            info!("Delete declined");
            return DeleteOutcome::Declined;
        }

        let outcome = match self.api.delete(id).await {
            Ok(()) => {
                info!("Product deleted");
                let resync = self.list().await;
                MutationOutcome::Applied { id, resync }
            }
            Err(e) => {
                error!(error = %e, "Failed to delete product");
                MutationOutcome::Failed(e.into())
            }
        };
        DeleteOutcome::Attempted(outcome)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::testing::{ScriptedApi, input, product};

    #[tokio::test]
    async fn test_list_replaces_snapshot() {
        let api = ScriptedApi::with_products(vec![
            product(2, "Beans", "8.00", 5),
            product(1, "Rice", "5.50", 10),
        ]);
        let store = ProductStore::new(api);

        assert!(store.snapshot().await.is_empty());
        let outcome = store.list().await;
        assert!(matches!(outcome, SyncOutcome::Synced { sequence: 1, count: 2 }));

        let snapshot = store.snapshot().await;
        assert_eq!(snapshot.sequence(), 1);
        assert_eq!(snapshot.products()[0].name, "Beans");
        assert_eq!(snapshot.get(ProductId::new(1)).unwrap().price.to_string(), "5.50");
    }

    #[tokio::test]
    async fn test_consecutive_lists_are_idempotent() {
        let api = ScriptedApi::with_products(vec![product(1, "Rice", "5.50", 10)]);
        let store = ProductStore::new(api);

        store.list().await;
        let first = store.snapshot().await;
        store.list().await;
        let second = store.snapshot().await;

        assert_eq!(first.products(), second.products());
        assert!(second.sequence() > first.sequence());
    }

    #[tokio::test]
    async fn test_failed_list_keeps_stale_snapshot() {
        let api = ScriptedApi::with_products(vec![product(1, "Rice", "5.50", 10)]);
        let store = ProductStore::new(api.clone());
        store.list().await;

        api.fail_next_list();
        let outcome = store.list().await;
        assert!(matches!(outcome, SyncOutcome::Failed(ApiError::Status { status: 503, .. })));
        assert_eq!(store.snapshot().await.len(), 1);
    }

    #[tokio::test]
    async fn test_create_resyncs_without_speculative_insert() {
        let api = ScriptedApi::default();
        let store = ProductStore::new(api.clone());

        let outcome = store.create(&input("Rice", "5.50", "10")).await;
        let MutationOutcome::Applied { id, resync } = outcome else {
            panic!("expected applied, got {outcome:?}");
        };
        assert!(resync.is_synced());
        assert_eq!(api.calls().creates, 1);
        assert_eq!(api.calls().lists, 1);
        assert_eq!(store.find(id).await.unwrap().name, "Rice");
    }

    #[tokio::test]
    async fn test_create_with_failed_resync_leaves_snapshot_untouched() {
        let api = ScriptedApi::default();
        let store = ProductStore::new(api.clone());

        api.fail_next_list();
        let outcome = store.create(&input("Rice", "5.50", "10")).await;
        let MutationOutcome::Applied { resync, .. } = outcome else {
            panic!("expected applied");
        };
        assert!(matches!(resync, SyncOutcome::Failed(_)));
        assert!(store.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn test_create_transport_failure() {
        let api = ScriptedApi::default();
        api.fail_next_mutation();
        let store = ProductStore::new(api.clone());

        let outcome = store.create(&input("Rice", "5.50", "10")).await;
        assert!(matches!(outcome, MutationOutcome::Failed(StoreError::Transport(_))));
        assert_eq!(api.calls().lists, 0);
    }

    #[tokio::test]
    async fn test_update_requires_known_product() {
        let api = ScriptedApi::with_products(vec![product(1, "Rice", "5.50", 10)]);
        let store = ProductStore::new(api.clone());

        let outcome = store.update(ProductId::new(1), &input("Rice", "6", "10")).await;
        assert!(matches!(
            outcome,
            MutationOutcome::Failed(StoreError::UnknownProduct(_))
        ));
        assert_eq!(api.calls().updates, 0);

        store.list().await;
        let outcome = store.update(ProductId::new(1), &input("Rice", "6", "9")).await;
        assert!(outcome.is_applied());
        let updated = store.find(ProductId::new(1)).await.unwrap();
        assert_eq!(updated.price.to_string(), "6.00");
        assert_eq!(updated.stock_quantity, 9);
    }

    #[tokio::test]
    async fn test_delete_without_confirmation_sends_nothing() {
        let api = ScriptedApi::with_products(vec![product(1, "Rice", "5.50", 10)]);
        let store = ProductStore::new(api.clone());
        store.list().await;
        let before = store.snapshot().await;
        let calls_before = api.calls();

        let outcome = store.delete(ProductId::new(1), &mut PreAnswered(false)).await;
        assert!(matches!(outcome, DeleteOutcome::Declined));
        assert_eq!(api.calls(), calls_before);
        assert_eq!(store.snapshot().await, before);
    }

    #[tokio::test]
    async fn test_delete_with_confirmation_resyncs() {
        let api = ScriptedApi::with_products(vec![product(1, "Rice", "5.50", 10)]);
        let store = ProductStore::new(api.clone());
        store.list().await;

        let outcome = store.delete(ProductId::new(1), &mut PreAnswered(true)).await;
        assert!(matches!(outcome, DeleteOutcome::Attempted(ref o) if o.is_applied()));
        assert_eq!(api.calls().deletes, 1);
        assert!(store.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn test_older_response_arriving_last_is_dropped() {
        let api = ScriptedApi::default();
        let first_reply = api.hold_next_list();
        let second_reply = api.hold_next_list();
        let store = Arc::new(ProductStore::new(api.clone()));

        let first = tokio::spawn({
            let store = Arc::clone(&store);
            async move { store.list().await }
        });
        while api.calls().lists < 1 {
            tokio::task::yield_now().await;
        }
        let second = tokio::spawn({
            let store = Arc::clone(&store);
            async move { store.list().await }
        });
        while api.calls().lists < 2 {
            tokio::task::yield_now().await;
        }

        // The newer request answers first, the older one last.
        second_reply.send(Ok(vec![product(2, "Beans", "8.00", 5)])).unwrap();
        let second = second.await.unwrap();
        first_reply.send(Ok(vec![product(1, "Stale", "1.00", 1)])).unwrap();
        let first = first.await.unwrap();

        assert!(matches!(second, SyncOutcome::Synced { sequence: 2, count: 1 }));
        assert!(matches!(first, SyncOutcome::Superseded { sequence: 1 }));
        let snapshot = store.snapshot().await;
        assert_eq!(snapshot.sequence(), 2);
        assert_eq!(snapshot.products()[0].name, "Beans");
    }
}
