//! DNS lookups used by the survey pipelines.
//!
//! This module provides async DNS operations behind the `DnsBackend` trait:
//! - Canonical name resolution of embedded hostnames (tolerant, per hostname)
//! - CNAME chain walking under an overall deadline
//! - Origin ASN and owner lookups through the Team Cymru TXT service
//!
//! The production backend is `HickoryDns`; tests substitute static answers.

mod asn;
mod backend;
mod canonical;
mod cname;

// Re-export public API
pub use asn::{cymru_origin_query_name, lookup_asn, AsnInfo};
pub use backend::{DnsBackend, HickoryDns};
pub use canonical::resolve_all;
pub use cname::lookup_cname_chain;

/// Normalizes a DNS name to lowercase FQDN form with a trailing dot.
///
/// Returns an empty string for empty input (after trimming).
pub fn fqdn(name: &str) -> String {
    let trimmed = name.trim().trim_end_matches('.');
    if trimmed.is_empty() {
        return String::new();
    }
    format!("{}.", trimmed.to_ascii_lowercase())
}
