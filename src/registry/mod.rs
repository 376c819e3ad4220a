//! Service-registry control-plane client.
//!
//! # Data Flow
//! ```text
//! ServiceRegistration
//!     → client.rs (JSON over HTTP to the registry agent)
//!     → registry directory entry
//!
//! On drain:
//!     deregister_service(id) withdraws the entry
//! ```
//!
//! The registry is independent of process lifecycle: a deployment
//! advertises itself after startup and withdraws itself before or
//! during drain.

pub mod client;

pub use client::{AgentService, RegistryClient, RegistryError, ServiceCheck, ServiceRegistration};
