//! Managed HTTP service with coordinated graceful shutdown.
//!
//! # Responsibilities
//! - Bind a listening endpoint and run the accept/serve loop
//! - Watch the shared cancellation token while serving
//! - Drain in-flight requests on cancellation, then report completion
//!
//! # Design Decisions
//! - One task serves requests; one watcher task waits on the token and
//!   calls the server's graceful stop. They coordinate only through
//!   that stop primitive and the completion report
//! - Cooperative shutdown is not an error; an unexpected transport
//!   fault is, and the caller decides whether it ends the process
//! - Drain has no deadline (`graceful_shutdown(None)`)

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use axum::Router;
use axum_server::tls_rustls::RustlsConfig;
use axum_server::Handle;
use tokio_util::sync::CancellationToken;

use crate::lifecycle::{CompletionGuard, ServiceBinding, Terminable};

/// Error type for managed-service operations.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Failed to bind the listening endpoint. Startup-fatal for the
    /// host.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },
    /// The serve loop exited for a reason other than cooperative
    /// shutdown.
    #[error("serve loop failed: {0}")]
    Serve(std::io::Error),
}

/// Lifecycle states of a managed service, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ServiceState {
    /// Constructed, not yet bound.
    Idle = 0,
    /// Accepting and processing requests.
    Serving = 1,
    /// Cancellation observed, in-flight work finishing.
    Draining = 2,
    /// Serve loop returned, completion reported.
    Stopped = 3,
}

/// Lock-free holder for the current [`ServiceState`], shared between
/// the serve path and the drain watcher.
#[derive(Debug)]
struct StateCell(AtomicU8);

impl StateCell {
    fn new(state: ServiceState) -> Self {
        Self(AtomicU8::new(state as u8))
    }

    fn set(&self, state: ServiceState) {
        self.0.store(state as u8, Ordering::Release);
    }

    fn get(&self) -> ServiceState {
        match self.0.load(Ordering::Acquire) {
            0 => ServiceState::Idle,
            1 => ServiceState::Serving,
            2 => ServiceState::Draining,
            _ => ServiceState::Stopped,
        }
    }
}

/// A long-running HTTP listener that participates in coordinated
/// shutdown.
///
/// Register with a [`Coordinator`](crate::lifecycle::Coordinator)
/// before calling [`start`](Self::start); an unregistered service
/// serves until the process dies and manages its own lifetime.
///
/// Lifecycle: `idle → serving → draining → stopped`.
pub struct HttpService {
    binding: ServiceBinding,
    router: Router,
    tls: Option<RustlsConfig>,
    state: Arc<StateCell>,
}

impl HttpService {
    /// Create a service from a name and the router it will serve.
    pub fn new(name: impl Into<String>, router: Router) -> Self {
        Self {
            binding: ServiceBinding::new(name),
            router,
            tls: None,
            state: Arc::new(StateCell::new(ServiceState::Idle)),
        }
    }

    /// Serve TLS with the given server configuration (mutual TLS when
    /// built by [`mutual_tls_config`](crate::net::mutual_tls_config)).
    pub fn with_tls(mut self, tls: RustlsConfig) -> Self {
        self.tls = Some(tls);
        self
    }

    /// The service's diagnostic name.
    pub fn name(&self) -> &str {
        self.binding.name()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ServiceState {
        self.state.get()
    }

    /// Bind `addr` and serve until cooperative shutdown or a
    /// transport fault.
    ///
    /// Blocks for the service's whole serving lifetime. Returns
    /// `Ok(())` after a cancellation-triggered drain, `Err` on a bind
    /// failure or an unexpected serve-loop exit. Expected to be
    /// called at most once per registration.
    pub async fn start(&mut self, addr: &str) -> Result<(), ServiceError> {
        let listener = std::net::TcpListener::bind(addr).map_err(|source| ServiceError::Bind {
            addr: addr.to_string(),
            source,
        })?;
        self.serve(listener).await
    }

    /// Serve on an already-bound listener.
    ///
    /// Split out from [`start`](Self::start) so callers that need the
    /// actual bound port (bind to port 0, then inspect) can bind
    /// first.
    pub async fn serve(&mut self, listener: std::net::TcpListener) -> Result<(), ServiceError> {
        let handle = Handle::new();
        let watcher = self.binding.cancel_token().cloned().map(|token| {
            tokio::spawn(watch_for_drain(
                self.binding.name().to_string(),
                token,
                handle.clone(),
                Arc::clone(&self.state),
            ))
        });

        let result = self.run_server(listener, handle).await;

        // The serve loop has returned; a watcher still parked on the
        // token (fault path) has nothing left to stop.
        if let Some(watcher) = watcher {
            watcher.abort();
        }

        self.state.set(ServiceState::Stopped);
        match result {
            Ok(()) => {
                // The server only returns Ok once graceful stop has
                // let every in-flight request finish.
                if self.binding.is_bound() {
                    self.binding.finished();
                }
                tracing::info!(service = %self.binding.name(), "Service stopped");
                Ok(())
            }
            Err(e) => {
                tracing::error!(service = %self.binding.name(), error = %e, "Service unexpectedly down");
                if self.binding.is_bound() {
                    // Release the barrier slot so a dead service
                    // cannot block process termination forever.
                    self.binding.finished();
                }
                Err(ServiceError::Serve(e))
            }
        }
    }

    async fn run_server(
        &self,
        listener: std::net::TcpListener,
        handle: Handle,
    ) -> std::io::Result<()> {
        let addr = listener.local_addr()?;
        listener.set_nonblocking(true)?;
        tracing::info!(service = %self.binding.name(), address = %addr, "Listening");
        self.state.set(ServiceState::Serving);

        let app = self
            .router
            .clone()
            .into_make_service_with_connect_info::<SocketAddr>();
        match &self.tls {
            Some(tls) => {
                axum_server::from_tcp_rustls(listener, tls.clone())
                    .handle(handle)
                    .serve(app)
                    .await
            }
            None => {
                axum_server::from_tcp(listener)
                    .handle(handle)
                    .serve(app)
                    .await
            }
        }
    }
}

/// Watcher task: blocks on the shared cancellation token, then asks
/// the server to stop accepting and drain with no deadline.
async fn watch_for_drain(
    name: String,
    token: CancellationToken,
    handle: Handle,
    state: Arc<StateCell>,
) {
    token.cancelled().await;
    state.set(ServiceState::Draining);
    tracing::info!(service = %name, "Cancellation observed, draining");
    handle.graceful_shutdown(None);
}

impl Terminable for HttpService {
    fn set_cancel_token(&mut self, token: CancellationToken) {
        self.binding.set_cancel_token(token);
    }

    fn set_completion(&mut self, guard: CompletionGuard) {
        self.binding.set_completion(guard);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_cell_round_trips_every_state() {
        let cell = StateCell::new(ServiceState::Idle);
        assert_eq!(cell.get(), ServiceState::Idle);
        for state in [
            ServiceState::Serving,
            ServiceState::Draining,
            ServiceState::Stopped,
        ] {
            cell.set(state);
            assert_eq!(cell.get(), state);
        }
    }
}
