//! CNAME chain resolution.

use std::collections::HashSet;
use std::time::Duration;

use tokio::time::timeout;

use super::{fqdn, DnsBackend};
use crate::config::MAX_CNAME_CHAIN_DEPTH;
use crate::error_handling::LookupError;

/// Follows the CNAME chain of `host`, one hop per query.
///
/// The returned chain holds each alias target in resolution order, as
/// lowercase FQDNs; a host without a CNAME yields an empty chain. Walking
/// stops at `MAX_CNAME_CHAIN_DEPTH` hops or when a name repeats.
///
/// # Errors
///
/// Returns `LookupError::Timeout` when the whole walk exceeds `deadline`, or
/// the first query error.
pub async fn lookup_cname_chain(
    dns: &dyn DnsBackend,
    host: &str,
    deadline: Duration,
) -> Result<Vec<String>, LookupError> {
    timeout(deadline, walk_chain(dns, host))
        .await
        .map_err(|_| LookupError::Timeout {
            name: host.to_string(),
            record: "CNAME",
            after: deadline,
        })?
}

async fn walk_chain(dns: &dyn DnsBackend, host: &str) -> Result<Vec<String>, LookupError> {
    let mut chain = Vec::new();
    let mut current = fqdn(host);
    let mut seen = HashSet::new();
    seen.insert(current.clone());

    for _ in 0..MAX_CNAME_CHAIN_DEPTH {
        let Some(next) = dns.cname(&current).await? else {
            break;
        };
        let next = fqdn(&next);
        if next.is_empty() || !seen.insert(next.clone()) {
            log::debug!("CNAME loop at {current} while resolving {host}");
            break;
        }
        chain.push(next.clone());
        current = next;
    }

    Ok(chain)
}
