//! DNS backend abstraction and its hickory implementation.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use hickory_resolver::error::{ResolveError, ResolveErrorKind};
use hickory_resolver::proto::rr::{Name, RData, RecordType};
use hickory_resolver::TokioAsyncResolver;
use tokio::time::timeout;

use super::fqdn;
use crate::error_handling::LookupError;

/// The DNS queries the pipelines need.
///
/// Every method is bounded by the implementation's own per-query deadline.
/// "No such record" is reported as `LookupError::NotFound`, except for
/// `cname`, where a name without a CNAME is a normal answer.
#[async_trait]
pub trait DnsBackend: Send + Sync {
    /// Resolves `host` to its addresses, in answer order.
    async fn lookup_ip(&self, host: &str) -> Result<Vec<IpAddr>, LookupError>;

    /// Resolves `host` to its canonical name: the owner of the final address
    /// record after following CNAMEs, as a lowercase FQDN.
    async fn canonical_name(&self, host: &str) -> Result<String, LookupError>;

    /// Returns the direct CNAME target of `name`, if it has one.
    async fn cname(&self, name: &str) -> Result<Option<String>, LookupError>;

    /// Returns the TXT records of `name`, each with its strings concatenated.
    async fn txt(&self, name: &str) -> Result<Vec<String>, LookupError>;
}

/// `DnsBackend` over a shared hickory resolver.
#[derive(Clone)]
pub struct HickoryDns {
    resolver: Arc<TokioAsyncResolver>,
    query_timeout: Duration,
}

impl HickoryDns {
    /// Wraps `resolver`; each query is abandoned after `query_timeout`.
    pub fn new(resolver: Arc<TokioAsyncResolver>, query_timeout: Duration) -> Self {
        Self {
            resolver,
            query_timeout,
        }
    }

    fn name(host: &str, record: &'static str) -> Result<Name, LookupError> {
        Name::from_ascii(fqdn(host)).map_err(|e| LookupError::Failed {
            name: host.to_string(),
            record,
            reason: format!("invalid DNS name: {e}"),
        })
    }

    fn timed_out(&self, host: &str, record: &'static str) -> LookupError {
        LookupError::Timeout {
            name: host.to_string(),
            record,
            after: self.query_timeout,
        }
    }
}

fn map_resolve_error(host: &str, record: &'static str, e: ResolveError) -> LookupError {
    match e.kind() {
        ResolveErrorKind::NoRecordsFound { .. } => LookupError::NotFound {
            name: host.to_string(),
            record,
        },
        _ => LookupError::Failed {
            name: host.to_string(),
            record,
            reason: e.to_string(),
        },
    }
}

#[async_trait]
impl DnsBackend for HickoryDns {
    async fn lookup_ip(&self, host: &str) -> Result<Vec<IpAddr>, LookupError> {
        if let Ok(ip) = host.parse::<IpAddr>() {
            return Ok(vec![ip]);
        }
        let name = Self::name(host, "A/AAAA")?;
        let lookup = timeout(self.query_timeout, self.resolver.lookup_ip(name))
            .await
            .map_err(|_| self.timed_out(host, "A/AAAA"))?
            .map_err(|e| map_resolve_error(host, "A/AAAA", e))?;

        let ips: Vec<IpAddr> = lookup.iter().collect();
        if ips.is_empty() {
            return Err(LookupError::NotFound {
                name: host.to_string(),
                record: "A/AAAA",
            });
        }
        Ok(ips)
    }

    async fn canonical_name(&self, host: &str) -> Result<String, LookupError> {
        let name = Self::name(host, "canonical name")?;
        let lookup = timeout(self.query_timeout, self.resolver.lookup_ip(name))
            .await
            .map_err(|_| self.timed_out(host, "canonical name"))?
            .map_err(|e| map_resolve_error(host, "canonical name", e))?;

        lookup
            .as_lookup()
            .records()
            .iter()
            .find(|record| matches!(record.record_type(), RecordType::A | RecordType::AAAA))
            .map(|record| fqdn(&record.name().to_utf8()))
            .ok_or_else(|| LookupError::NotFound {
                name: host.to_string(),
                record: "canonical name",
            })
    }

    async fn cname(&self, name: &str) -> Result<Option<String>, LookupError> {
        let query = Self::name(name, "CNAME")?;
        let result = timeout(
            self.query_timeout,
            self.resolver.lookup(query, RecordType::CNAME),
        )
        .await
        .map_err(|_| self.timed_out(name, "CNAME"))?;

        match result {
            Ok(lookup) => Ok(lookup.iter().find_map(|rdata| match rdata {
                RData::CNAME(target) => Some(fqdn(&target.to_utf8())),
                _ => None,
            })),
            Err(e) => match map_resolve_error(name, "CNAME", e) {
                LookupError::NotFound { .. } => Ok(None),
                other => Err(other),
            },
        }
    }

    async fn txt(&self, name: &str) -> Result<Vec<String>, LookupError> {
        let query = Self::name(name, "TXT")?;
        let lookup = timeout(self.query_timeout, self.resolver.txt_lookup(query))
            .await
            .map_err(|_| self.timed_out(name, "TXT"))?
            .map_err(|e| map_resolve_error(name, "TXT", e))?;

        Ok(lookup
            .iter()
            .map(|txt| {
                txt.txt_data()
                    .iter()
                    .map(|part| String::from_utf8_lossy(part).into_owned())
                    .collect::<String>()
            })
            .collect())
    }
}
