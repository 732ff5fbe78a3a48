//! Cooperative cancellation for gate evaluations.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::watch;

use crate::error::{GateError, GateResult};

/// Cancellation signal shared between the caller and a running evaluation.
///
/// Cloning yields a handle to the same signal. Once cancelled it stays
/// cancelled.
#[derive(Debug, Clone)]
pub struct CancelSignal {
    tx: Arc<watch::Sender<bool>>,
    rx: watch::Receiver<bool>,
}

impl Default for CancelSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelSignal {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            tx: Arc::new(tx),
            rx,
        }
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once the signal is cancelled.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        // The sender lives as long as `self`, so `changed` cannot fail here.
        while !*rx.borrow_and_update() {
            if rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }

    /// Drive `work` to completion unless the signal fires first, in which
    /// case `work` is dropped and its partial results discarded.
    pub async fn guard<T, F>(&self, work: F) -> GateResult<T>
    where
        F: Future<Output = GateResult<T>>,
    {
        if self.is_cancelled() {
            return Err(GateError::Cancelled);
        }
        tokio::select! {
            biased;
            _ = self.cancelled() => Err(GateError::Cancelled),
            result = work => result,
        }
    }
}
