//! CDN reference tables and classification.
//!
//! Two heuristics map evidence to a provider:
//! - suffix matching of hostnames against CDN-operated domains
//! - ASN ownership, falling back to suffix matching of the CNAME chain
//!
//! Tables are loaded once and shared read-only by every worker.

mod classify;
mod tables;

// Re-export public API
pub use tables::CdnTables;

/// Returns true if `host` equals `suffix` or ends with `.` + `suffix`.
///
/// Both arguments must already be normalized FQDNs (see `dns::fqdn`), so
/// `evilcloudfront.net.` does not match `cloudfront.net.`.
pub fn matches_suffix(host: &str, suffix: &str) -> bool {
    host == suffix
        || (host.len() > suffix.len()
            && host.ends_with(suffix)
            && host.as_bytes()[host.len() - suffix.len() - 1] == b'.')
}
