//! Configuration constants.
//!
//! This module defines the operational constants used throughout the survey,
//! including deadlines, size limits and lookup bounds.

use std::time::Duration;

/// Interval between progress log lines, in seconds.
pub const LOGGING_INTERVAL: u64 = 5;

/// Default deadline for the whole per-target pipeline (fetch plus lookups).
///
/// Runs derive theirs from `NetworkConfig::target_timeout`; this value matches
/// the default fetch deadline.
pub const TARGET_PROCESSING_TIMEOUT: Duration = Duration::from_secs(36);

/// Slack added on top of the summed operation deadlines of one target.
pub const TARGET_TIMEOUT_MARGIN: Duration = Duration::from_secs(5);

// Network operation timeouts
/// Default deadline for one complete fetch, redirects included, in seconds.
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 20;
/// Default deadline for DNS + TCP + TLS of a single hop, in seconds.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
/// Deadline for a single DNS query (A/AAAA, TXT), in seconds.
pub const DNS_TIMEOUT_SECS: u64 = 3;
/// Deadline for resolving a complete CNAME chain.
pub const CNAME_TIMEOUT: Duration = Duration::from_secs(5);

/// Default User-Agent string for HTTP requests.
///
/// Users can override this via the `--user-agent` CLI flag.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Default port for `http://` targets.
pub const DEFAULT_HTTP_PORT: u16 = 80;
/// Default port for `https://` targets.
pub const DEFAULT_HTTPS_PORT: u16 = 443;

// Response and body size limits
/// Maximum response body size in bytes (2MB)
/// Bodies are truncated at this size; the total-download phase ends there.
pub const MAX_RESPONSE_BODY_SIZE: usize = 2 * 1024 * 1024;

// Redirect handling
/// Maximum number of redirect hops to follow
pub const MAX_REDIRECT_HOPS: usize = 1;

// DNS lookups
/// Maximum number of CNAME hops followed before the chain is cut off
pub const MAX_CNAME_CHAIN_DEPTH: usize = 8;

/// Maximum hostname length accepted from input files (RFC 1035 limit)
pub const MAX_HOSTNAME_LENGTH: usize = 253;
