//! Survey runs: shared context, worker pool and the two pipelines.

mod measure;
mod pool;
mod sites;

use std::sync::Arc;
use std::time::Duration;

use tokio_rustls::TlsConnector;

use crate::config::{NetworkConfig, DNS_TIMEOUT_SECS};
use crate::dns::{DnsBackend, HickoryDns};
use crate::error_handling::{InitializationError, ProcessingStats};
use crate::fetch::{FetchOptions, Fetcher};
use crate::initialization::{init_resolver, init_tls_connector};

pub use measure::{classify_records, measure_domain, measure_domains, run_measurement, www_hostname};
pub use pool::WorkerPool;
pub use sites::{run_site_survey, survey_site, survey_sites};

/// Shared, read-only resources for one run.
///
/// Cloned into every worker through an `Arc`; nothing in here is mutated
/// after construction except the atomic counters in `stats`.
pub struct SurveyContext {
    /// Resolver used by fetches, canonical-name, ASN and CNAME lookups
    pub dns: Arc<dyn DnsBackend>,
    /// Page fetcher
    pub fetcher: Fetcher,
    /// Failure counters
    pub stats: Arc<ProcessingStats>,
    /// Worker pool size
    pub max_concurrency: usize,
    /// Deadline for one target's whole pipeline
    pub target_timeout: Duration,
}

impl SurveyContext {
    /// Builds a context backed by the system resolver configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the resolver or the TLS connector cannot be built.
    pub fn from_config(config: &NetworkConfig) -> Result<Self, InitializationError> {
        let resolver = init_resolver()?;
        let dns: Arc<dyn DnsBackend> = Arc::new(HickoryDns::new(
            resolver,
            Duration::from_secs(DNS_TIMEOUT_SECS),
        ));
        Self::with_dns(config, dns)
    }

    /// Builds a context over an arbitrary `DnsBackend`, trusting the Mozilla
    /// root store for `https://` fetches.
    pub fn with_dns(
        config: &NetworkConfig,
        dns: Arc<dyn DnsBackend>,
    ) -> Result<Self, InitializationError> {
        Ok(Self::with_dns_and_tls(config, dns, init_tls_connector()?))
    }

    /// Builds a context over an arbitrary `DnsBackend` and TLS connector.
    pub fn with_dns_and_tls(
        config: &NetworkConfig,
        dns: Arc<dyn DnsBackend>,
        tls: TlsConnector,
    ) -> Self {
        let fetcher = Fetcher::new(Arc::clone(&dns), tls, FetchOptions::from(config));
        Self {
            dns,
            fetcher,
            stats: Arc::new(ProcessingStats::new()),
            max_concurrency: config.max_concurrency.max(1),
            target_timeout: config.target_timeout(),
        }
    }
}

/// Counts for a finished run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// Targets submitted to the pool (or records reloaded)
    pub total: usize,
    /// Targets that produced a result
    pub succeeded: usize,
    /// Targets dropped after an error, timeout or panic
    pub failed: usize,
    /// Wall-clock duration of the run
    pub elapsed_seconds: f64,
}
