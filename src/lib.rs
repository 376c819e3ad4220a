//! Service lifecycle toolkit.
//!
//! Shared plumbing for long-running network services: one coordinated
//! shutdown protocol for any number of independently serving
//! listeners, plus the collaborators a deployed service needs around
//! it (registry advertisement, configuration, mutual TLS).
//!
//! # Architecture Overview
//!
//! ```text
//!          ┌──────────────────────────────────────────────────┐
//!          │                    PROCESS                       │
//!          │                                                  │
//!          │   ┌───────────┐  register   ┌────────────────┐   │
//!          │   │ lifecycle │◀────────────│ net::service   │   │
//!          │   │coordinator│  cancel ───▶│ (serve + drain)│   │
//!          │   └─────┬─────┘◀── done ────└────────────────┘   │
//!          │         │                      ... N services    │
//!  SIGTERM ┼────▶ signals                                     │
//!          │         │                                        │
//!          │   wait_for_termination blocks main until         │
//!          │   every registered service has drained           │
//!          │                                                  │
//!          │   ┌─────────┐ ┌──────────┐ ┌──────────────────┐  │
//!          │   │ config  │ │ registry │ │ net::tls (mTLS)  │  │
//!          │   └─────────┘ └──────────┘ └──────────────────┘  │
//!          └──────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod lifecycle;
pub mod net;
pub mod registry;

pub use config::{load_config, Settings};
pub use lifecycle::{Coordinator, Terminable};
pub use net::{HttpService, ServiceError};
pub use registry::RegistryClient;
