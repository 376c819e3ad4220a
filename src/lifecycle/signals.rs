//! OS signal handling.
//!
//! # Responsibilities
//! - Register signal handlers (SIGTERM, SIGINT)
//! - Translate signal receipt into a shutdown trigger
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - Signal delivery and an explicit shutdown request are equivalent:
//!   both funnel into the same cancellation broadcast

use crate::lifecycle::Coordinator;

/// Error installing OS signal handlers.
#[derive(Debug, thiserror::Error)]
#[error("failed to install signal handler: {0}")]
pub struct SignalError(#[from] std::io::Error);

/// Spawn a background task that triggers shutdown on SIGINT or
/// SIGTERM.
///
/// Registration happens before this function returns, so a signal
/// delivered immediately afterwards is not lost. Returns an error if
/// handler installation fails, which is startup-fatal for the host.
#[cfg(unix)]
pub fn listen_for_signals(coordinator: &Coordinator) -> Result<(), SignalError> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let token = coordinator.cancel_token();

    tokio::spawn(async move {
        tokio::select! {
            _ = sigint.recv() => {
                tracing::info!(signal = "SIGINT", "Termination signal received");
            }
            _ = sigterm.recv() => {
                tracing::info!(signal = "SIGTERM", "Termination signal received");
            }
        }
        token.cancel();
    });

    Ok(())
}

/// Spawn a background task that triggers shutdown on Ctrl+C.
#[cfg(not(unix))]
pub fn listen_for_signals(coordinator: &Coordinator) -> Result<(), SignalError> {
    let token = coordinator.cancel_token();

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Ctrl+C handler failed");
            return;
        }
        tracing::info!("Termination signal received");
        token.cancel();
    });

    Ok(())
}
