//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! service.rs:
//!     bind → serve loop (accept, process)
//!     cancellation → stop accepting → drain in-flight → report done
//!
//! tls.rs:
//!     key + cert + client CA → mutual-TLS server configuration
//! ```
//!
//! # Design Decisions
//! - Each service owns its listener exclusively until it stops
//! - Drain has no deadline; services are trusted to finish

pub mod service;
pub mod tls;

pub use service::{HttpService, ServiceError, ServiceState};
pub use tls::mutual_tls_config;
