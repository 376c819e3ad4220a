//! Shared helpers for lifecycle integration tests.

use std::time::Duration;

use servicekit::lifecycle::{CompletionGuard, ServiceBinding, Terminable};
use tokio_util::sync::CancellationToken;

/// Minimal terminable worker: waits for cancellation, simulates drain
/// work for `drain_time`, then reports completion.
pub struct TestWorker {
    binding: ServiceBinding,
}

impl TestWorker {
    pub fn new(name: &str) -> Self {
        Self {
            binding: ServiceBinding::new(name),
        }
    }

    /// Run the worker's shutdown watcher in the background.
    pub fn spawn(mut self, drain_time: Duration) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let token = self
                .binding
                .cancel_token()
                .expect("worker spawned without registration")
                .clone();
            token.cancelled().await;
            tokio::time::sleep(drain_time).await;
            self.binding.finished();
        })
    }
}

impl Terminable for TestWorker {
    fn set_cancel_token(&mut self, token: CancellationToken) {
        self.binding.set_cancel_token(token);
    }

    fn set_completion(&mut self, guard: CompletionGuard) {
        self.binding.set_completion(guard);
    }
}
