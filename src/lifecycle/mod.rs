//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     Build coordinator → Register services → Start serve loops
//!
//! Shutdown (coordinator.rs):
//!     Trigger (signal or request_shutdown) → Broadcast cancellation
//!     → Services drain → Completion barrier reaches zero → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → request_shutdown
//! ```
//!
//! # Design Decisions
//! - Cancellation is single-shot: no re-arming after shutdown begins
//! - Services are asked to stop, never killed; drain is unbounded
//! - Completion reports may arrive in any order

pub mod coordinator;
pub mod signals;

pub use coordinator::{CompletionGuard, Coordinator, ServiceBinding, Terminable};
pub use signals::listen_for_signals;
