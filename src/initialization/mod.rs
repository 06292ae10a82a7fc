//! Application initialization and resource setup.
//!
//! This module provides functions to initialize the shared resources of a run:
//! - Logger (plain or JSON)
//! - DNS resolver configured from the platform
//! - TLS connector with the webpki root store
//!
//! All initialization functions return proper error types for error handling.

mod logger;
mod resolver;
mod tls;

// Re-export public API
pub use logger::init_logger_with;
pub use resolver::init_resolver;
pub use tls::init_tls_connector;
