//! Process-wide shutdown coordination.
//!
//! # Responsibilities
//! - Hand every registered service the shared cancellation token
//! - Track outstanding services in a completion barrier
//! - Block the main task until every service has drained
//!
//! # Design Decisions
//! - One coordinator per process is a convention, not a global: the
//!   coordinator is constructed in `main` and passed where needed
//! - Cancellation is single-shot and never re-armed
//! - A service registered after cancellation observes it immediately
//!   rather than being rejected

use tokio_util::sync::CancellationToken;
use tokio_util::task::task_tracker::{TaskTracker, TaskTrackerToken};

/// Capability contract for services that participate in coordinated
/// shutdown.
///
/// The coordinator invokes both setters exactly once, at registration
/// time, before the service starts serving. A service that is never
/// registered receives neither and must manage its own lifetime.
pub trait Terminable {
    /// Receive the shared cancellation token.
    fn set_cancel_token(&mut self, token: CancellationToken);

    /// Receive the completion-barrier slot for this service.
    fn set_completion(&mut self, guard: CompletionGuard);
}

/// One slot in the completion barrier.
///
/// Created at registration, consumed exactly once when the service has
/// fully drained. Move semantics make a double report or a report
/// without registration unrepresentable. Dropping the guard without
/// calling [`complete`](Self::complete) also releases the slot, so a
/// service that dies abnormally cannot wedge the barrier.
pub struct CompletionGuard {
    _token: TaskTrackerToken,
}

impl std::fmt::Debug for CompletionGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("CompletionGuard")
    }
}

impl CompletionGuard {
    fn new(token: TaskTrackerToken) -> Self {
        Self { _token: token }
    }

    /// Report that the owning service has finished draining.
    pub fn complete(self) {
        drop(self);
    }
}

/// Coordinator for graceful process shutdown.
///
/// Holds the one-shot broadcast cancellation token and the completion
/// barrier shared by all registered services. The main task registers
/// services, starts them, then blocks in [`wait_for_termination`]
/// until a termination trigger fires and every service has drained.
///
/// [`wait_for_termination`]: Self::wait_for_termination
pub struct Coordinator {
    /// Shared cancellation token, cancelled at most once.
    cancel: CancellationToken,
    /// Counter of services that have registered but not yet drained.
    tracker: TaskTracker,
}

impl Coordinator {
    /// Create a new coordinator with no registered services.
    pub fn new() -> Self {
        Self {
            cancel: CancellationToken::new(),
            tracker: TaskTracker::new(),
        }
    }

    /// Register a service for coordinated shutdown.
    ///
    /// Installs the cancellation token and a completion-barrier slot
    /// into the service and increments the barrier by one. Must be
    /// called before the service starts serving, otherwise the service
    /// would never observe cancellation.
    ///
    /// Registration after cancellation is permitted: the token handed
    /// out is already cancelled, so the service drains immediately.
    pub fn register(&self, service: &mut dyn Terminable) {
        service.set_cancel_token(self.cancel.clone());
        service.set_completion(CompletionGuard::new(self.tracker.token()));
    }

    /// Trigger shutdown without waiting for services to drain.
    ///
    /// Idempotent: the first call fires the broadcast, later calls are
    /// no-ops. Any component may call this, not just signal delivery;
    /// a host that hits a fatal internal error uses it to initiate a
    /// clean exit.
    pub fn request_shutdown(&self) {
        self.cancel.cancel();
    }

    /// Whether shutdown has been triggered.
    pub fn is_shutting_down(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Block until shutdown is triggered and every registered service
    /// has reported completion.
    ///
    /// Returns only after the completion barrier reaches zero.
    /// Completion reports may arrive in any order. Drain time is
    /// unbounded; the coordinator trusts services to stop in
    /// reasonable time.
    ///
    /// Expected to be awaited exactly once, from the main task.
    pub async fn wait_for_termination(&self) {
        self.cancel.cancelled().await;
        tracing::info!("Shutdown triggered, waiting for services to drain");
        self.tracker.close();
        self.tracker.wait().await;
        tracing::info!("All services drained");
    }

    /// Number of services that have registered but not yet reported
    /// completion.
    pub fn outstanding(&self) -> usize {
        self.tracker.len()
    }

    /// A clone of the shared cancellation token, for hosts that want
    /// to run their own shutdown-adjacent work (withdrawing from a
    /// service registry, flushing caches) when the trigger fires.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

impl Default for Coordinator {
    fn default() -> Self {
        Self::new()
    }
}

/// Reusable shutdown binding for service implementations.
///
/// Holds the service identity plus whatever the coordinator installed
/// at registration time. Concrete services embed this and delegate
/// their [`Terminable`] impl to it.
#[derive(Debug, Default)]
pub struct ServiceBinding {
    name: String,
    cancel: Option<CancellationToken>,
    completion: Option<CompletionGuard>,
}

impl ServiceBinding {
    /// Create a binding for a service with the given diagnostic name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cancel: None,
            completion: None,
        }
    }

    /// The service's diagnostic name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The installed cancellation token, if this service was
    /// registered.
    pub fn cancel_token(&self) -> Option<&CancellationToken> {
        self.cancel.as_ref()
    }

    /// Whether a completion-barrier slot is currently held, i.e. the
    /// service was registered and has not yet reported completion.
    pub fn is_bound(&self) -> bool {
        self.completion.is_some()
    }

    /// Report that this service has finished draining.
    ///
    /// # Panics
    ///
    /// Panics if called twice for one registration. That would mean
    /// the completion barrier was about to be corrupted, which is a
    /// contract violation rather than a recoverable fault.
    pub fn finished(&mut self) {
        match self.completion.take() {
            Some(guard) => guard.complete(),
            None => panic!(
                "service {:?} reported completion twice or without registration",
                self.name
            ),
        }
    }
}

impl Terminable for ServiceBinding {
    fn set_cancel_token(&mut self, token: CancellationToken) {
        self.cancel = Some(token);
    }

    fn set_completion(&mut self, guard: CompletionGuard) {
        self.completion = Some(guard);
    }
}
