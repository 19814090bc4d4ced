//! Failure containment.
//!
//! A [`Boundary`] wraps rendering and action handling. The first panic raised
//! beneath it is captured as a [`Fault`], logged, and the boundary turns
//! [`BoundaryState::Faulted`] for good: later work is not run and callers get
//! the captured fault back instead. Recovery means building a new boundary
//! (and a new state) - a fresh mount.

use std::any::Any;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};

use chrono::{DateTime, Utc};
use futures::FutureExt;
use tracing::error;

/// A captured unhandled failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fault {
    message: String,
    occurred_at: DateTime<Utc>,
}

impl Fault {
    fn from_panic(payload: &(dyn Any + Send)) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());

        Self {
            message,
            occurred_at: Utc::now(),
        }
    }

    /// The panic message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub const fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }
}

impl std::fmt::Display for Fault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Boundary state. `Faulted` is terminal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum BoundaryState {
    #[default]
    Healthy,
    Faulted(Fault),
}

/// Panic containment for one mounted tree.
#[derive(Debug, Default)]
pub struct Boundary {
    state: BoundaryState,
}

impl Boundary {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn state(&self) -> &BoundaryState {
        &self.state
    }

    #[must_use]
    pub const fn fault(&self) -> Option<&Fault> {
        match &self.state {
            BoundaryState::Faulted(fault) => Some(fault),
            BoundaryState::Healthy => None,
        }
    }

    #[must_use]
    pub const fn is_faulted(&self) -> bool {
        matches!(self.state, BoundaryState::Faulted(_))
    }

    /// Run synchronous work under the boundary.
    ///
    /// # Errors
    ///
    /// Returns the captured fault if `f` panics or the boundary had already
    /// faulted, in which case `f` is not called.
    pub fn render<T>(&mut self, f: impl FnOnce() -> T) -> Result<T, Fault> {
        if let Some(fault) = self.fault() {
            return Err(fault.clone());
        }

        panic::catch_unwind(AssertUnwindSafe(f)).map_err(|payload| self.trip(payload.as_ref()))
    }

    /// Run asynchronous work under the boundary.
    ///
    /// # Errors
    ///
    /// Returns the captured fault if the future panics while being polled or
    /// the boundary had already faulted, in which case it is never polled.
    pub async fn run<F: Future>(&mut self, work: F) -> Result<F::Output, Fault> {
        if let Some(fault) = self.fault() {
            return Err(fault.clone());
        }

        AssertUnwindSafe(work)
            .catch_unwind()
            .await
            .map_err(|payload| self.trip(payload.as_ref()))
    }

    fn trip(&mut self, payload: &(dyn Any + Send)) -> Fault {
        let fault = Fault::from_panic(payload);
        error!(message = %fault.message, "Uncaught failure, interface halted");
        self.state = BoundaryState::Faulted(fault.clone());
        fault
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn explode(message: &str) -> u8 {
        panic!("{message}")
    }

    #[test]
    fn test_healthy_render_passes_through() {
        let mut boundary = Boundary::new();
        assert_eq!(boundary.render(|| 2 + 2), Ok(4));
        assert_eq!(boundary.state(), &BoundaryState::Healthy);
    }

    #[test]
    fn test_panic_faults_once_and_stays_faulted() {
        let mut boundary = Boundary::new();
        let fault = boundary
            .render(|| explode("listing exploded"))
            .unwrap_err();
        assert_eq!(fault.message(), "listing exploded");
        assert!(boundary.is_faulted());

        let mut called = false;
        let again = boundary.render(|| called = true);
        assert!(!called);
        assert_eq!(again.unwrap_err(), fault);
    }

    #[test]
    fn test_formatted_panic_message_is_captured() {
        let mut boundary = Boundary::new();
        let id = 7;
        let fault = boundary
            .render(|| -> u8 { panic!("bad product {id}") })
            .unwrap_err();
        assert_eq!(fault.to_string(), "bad product 7");
    }

    #[tokio::test]
    async fn test_async_panic_is_contained() {
        let mut boundary = Boundary::new();
        let result = boundary
            .run(async {
                tokio::task::yield_now().await;
                explode("dispatch exploded")
            })
            .await;
        let fault: Fault = result.unwrap_err();
        assert_eq!(fault.message(), "dispatch exploded");

        let skipped = boundary.run(async { 1 }).await;
        assert!(skipped.is_err());
    }

    #[tokio::test]
    async fn test_fresh_boundary_is_healthy() {
        let mut boundary = Boundary::new();
        let _ = boundary.render(|| explode("boom"));
        assert!(boundary.is_faulted());

        let mut remounted = Boundary::new();
        assert_eq!(remounted.run(async { "ok" }).await, Ok("ok"));
    }
}
