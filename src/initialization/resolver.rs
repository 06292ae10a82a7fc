//! DNS resolver initialization.
//!
//! This module provides functions to initialize the DNS resolver with proper
//! timeout configuration.

use std::sync::Arc;
use std::time::Duration;

use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::TokioAsyncResolver;
use log::{debug, warn};

use crate::config::DNS_TIMEOUT_SECS;
use crate::error_handling::InitializationError;

/// Initializes the DNS resolver shared by every worker.
///
/// Reads the platform resolver configuration (`/etc/resolv.conf` on Unix, the
/// registry on Windows). When that is unavailable or lists no name servers,
/// the resolver falls back to the library default (Google public DNS).
///
/// Per-query timeouts are kept short so that a slow name server cannot hold a
/// worker for long; the caller bounds every lookup with its own deadline too.
///
/// # Returns
///
/// A configured `TokioAsyncResolver` wrapped in `Arc` for sharing across tasks.
pub fn init_resolver() -> Result<Arc<TokioAsyncResolver>, InitializationError> {
    let (config, mut opts) = match hickory_resolver::system_conf::read_system_conf() {
        Ok((config, opts)) if !config.name_servers().is_empty() => {
            debug!(
                "Using system DNS configuration ({} name servers)",
                config.name_servers().len()
            );
            (config, opts)
        }
        Ok(_) => {
            warn!("System DNS configuration lists no name servers, using defaults");
            (ResolverConfig::default(), ResolverOpts::default())
        }
        Err(e) => {
            warn!("Failed to read system DNS configuration, using defaults: {e}");
            (ResolverConfig::default(), ResolverOpts::default())
        }
    };

    // Every query is also bounded by the caller at DNS_TIMEOUT_SECS
    opts.timeout = Duration::from_secs(DNS_TIMEOUT_SECS);
    opts.attempts = 1;
    // Hostnames from pages are already absolute; never append search domains
    opts.ndots = 0;

    Ok(Arc::new(TokioAsyncResolver::tokio(config, opts)))
}
