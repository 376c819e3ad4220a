//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse into key/value settings)
//!     → env-var overrides applied per lookup
//!     → required keys asserted at startup (fail fast)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; no reload
//! - A missing required key aborts startup, never limps along

pub mod loader;

pub use loader::{load_config, ConfigError, Settings};
