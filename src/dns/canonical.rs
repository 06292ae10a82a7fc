//! Canonical hostname resolution for embedded resource hosts.

use std::collections::BTreeSet;

use futures::future::join_all;
use log::debug;

use super::DnsBackend;
use crate::error_handling::{ErrorType, ProcessingStats};

/// Adds the canonical FQDN of every hostname to the set.
///
/// Lookups run concurrently. A hostname that fails to resolve is logged at
/// debug level, counted as `ResolutionFailure` and contributes nothing; the
/// error never reaches the caller.
///
/// # Returns
///
/// A superset of `hostnames`.
pub async fn resolve_all(
    dns: &dyn DnsBackend,
    hostnames: &BTreeSet<String>,
    stats: &ProcessingStats,
) -> BTreeSet<String> {
    let lookups = hostnames.iter().map(|host| async move {
        match dns.canonical_name(host).await {
            Ok(canonical) => Some(canonical),
            Err(e) => {
                debug!("Failed to resolve {host}: {e}");
                stats.increment_error(ErrorType::ResolutionFailure);
                None
            }
        }
    });

    let mut resolved = hostnames.clone();
    resolved.extend(join_all(lookups).await.into_iter().flatten());
    resolved
}
