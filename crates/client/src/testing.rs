//! Scripted in-memory catalog used by the crate's unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use mercado_core::{Draft, Price, Product, ProductId, ProductInput};
use tokio::sync::oneshot;

use crate::api::{ApiError, ProductApi};

type ListReply = Result<Vec<Product>, ApiError>;

/// Number of calls received per operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub lists: usize,
    pub creates: usize,
    pub updates: usize,
    pub deletes: usize,
}

#[derive(Default)]
struct ScriptedState {
    products: Vec<Product>,
    calls: CallCounts,
    fail_next_list: bool,
    fail_next_mutation: bool,
    held_lists: VecDeque<oneshot::Receiver<ListReply>>,
}

/// Fake catalog that behaves like the service (newest first, server ids)
/// and can be told to fail or to hold list responses.
#[derive(Clone, Default)]
pub struct ScriptedApi {
    state: Arc<Mutex<ScriptedState>>,
}

impl ScriptedApi {
    pub fn with_products(products: Vec<Product>) -> Self {
        let api = Self::default();
        api.state().products = products;
        api
    }

    pub fn calls(&self) -> CallCounts {
        self.state().calls
    }

    pub fn fail_next_list(&self) {
        self.state().fail_next_list = true;
    }

    pub fn fail_next_mutation(&self) {
        self.state().fail_next_mutation = true;
    }

    /// The next `list` call waits for a reply sent through the returned channel.
    pub fn hold_next_list(&self) -> oneshot::Sender<ListReply> {
        let (tx, rx) = oneshot::channel();
        self.state().held_lists.push_back(rx);
        tx
    }

    #[allow(clippy::unwrap_used)]
    fn state(&self) -> MutexGuard<'_, ScriptedState> {
        self.state.lock().unwrap()
    }

    fn take_mutation_failure(&self) -> Result<(), ApiError> {
        let mut state = self.state();
        if state.fail_next_mutation {
            state.fail_next_mutation = false;
            return Err(unavailable());
        }
        Ok(())
    }
}

fn unavailable() -> ApiError {
    ApiError::Status {
        status: 503,
        body: "unavailable".to_string(),
    }
}

fn not_found() -> ApiError {
    ApiError::Status {
        status: 404,
        body: "{\"detail\":\"Not found.\"}".to_string(),
    }
}

fn stored(id: ProductId, input: &ProductInput) -> Product {
    Product {
        id,
        name: input.name().to_string(),
        price: input.price(),
        stock_quantity: input.stock_quantity(),
        created_at: "2025-01-01T00:00:00Z".to_string(),
        updated_at: "2025-01-01T00:00:00Z".to_string(),
    }
}

impl ProductApi for ScriptedApi {
    async fn list(&self) -> Result<Vec<Product>, ApiError> {
        let held = {
            let mut state = self.state();
            state.calls.lists += 1;
            if state.fail_next_list {
                state.fail_next_list = false;
                return Err(unavailable());
            }
            match state.held_lists.pop_front() {
                Some(rx) => rx,
                None => return Ok(state.products.clone()),
            }
        };
        held.await.unwrap_or_else(|_| Err(unavailable()))
    }

    async fn create(&self, input: &ProductInput) -> Result<Product, ApiError> {
        self.state().calls.creates += 1;
        self.take_mutation_failure()?;

        let mut state = self.state();
        let next = state.products.iter().map(|p| p.id.as_i64()).max().unwrap_or(0) + 1;
        let product = stored(ProductId::new(next), input);
        state.products.insert(0, product.clone());
        Ok(product)
    }

    async fn update(&self, id: ProductId, input: &ProductInput) -> Result<Product, ApiError> {
        self.state().calls.updates += 1;
        self.take_mutation_failure()?;

        let mut state = self.state();
        let slot = state
            .products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(not_found)?;
        *slot = stored(id, input);
        Ok(slot.clone())
    }

    async fn delete(&self, id: ProductId) -> Result<(), ApiError> {
        self.state().calls.deletes += 1;
        self.take_mutation_failure()?;

        let mut state = self.state();
        let before = state.products.len();
        state.products.retain(|p| p.id != id);
        if state.products.len() == before {
            return Err(not_found());
        }
        Ok(())
    }
}

/// Build a product as the service would return it.
#[allow(clippy::unwrap_used)]
pub fn product(id: i64, name: &str, price: &str, stock: u32) -> Product {
    Product {
        id: ProductId::new(id),
        name: name.to_string(),
        price: Price::parse(price).unwrap(),
        stock_quantity: stock,
        created_at: "2025-01-01T00:00:00Z".to_string(),
        updated_at: "2025-01-01T00:00:00Z".to_string(),
    }
}

/// Build a validated payload from raw form text.
#[allow(clippy::unwrap_used)]
pub fn input(name: &str, price: &str, stock: &str) -> ProductInput {
    Draft {
        name: name.to_string(),
        price: price.to_string(),
        stock_quantity: stock.to_string(),
        editing_target: None,
    }
    .validate()
    .unwrap()
}
