//! cdn_survey library: CDN detection and fetch timing for lists of websites
//!
//! This library fetches websites concurrently, measures the DNS, TCP, TLS,
//! first-byte and download phases of every fetch, and classifies each site's
//! content-delivery provider from two kinds of evidence:
//!
//! - hostnames of the page's embedded resources, matched against known CDN
//!   domain suffixes (`sites` survey)
//! - the origin ASN of the serving address and the CNAME chain of the fetched
//!   hostname (`measure` survey, ASN first)
//!
//! Measured records are aggregated into per-provider statistics and rankings.
//!
//! # Example
//!
//! ```no_run
//! use cdn_survey::{run_site_survey, NetworkConfig, SitesArgs};
//! use tokio_util::sync::CancellationToken;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let args = SitesArgs {
//!     sites: "sites.txt".into(),
//!     cdns: "cdns.txt".into(),
//!     output: None,
//! };
//! let summary = run_site_survey(&NetworkConfig::default(), &args, CancellationToken::new()).await?;
//! println!("{} of {} sites surveyed", summary.succeeded, summary.total);
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. Use `#[tokio::main]` in your application
//! or ensure you're calling library functions within an async context.

#![warn(missing_docs)]

pub mod aggregate;
pub mod app;
pub mod cdn;
pub mod config;
pub mod dns;
mod error_handling;
mod fetch;
pub mod initialization;
pub mod models;
mod parse;
pub mod run;
pub mod storage;

// Re-export public API
pub use aggregate::{aggregate, group_by_provider, AggregateReport, TimingMetric};
pub use cdn::CdnTables;
pub use config::{Cli, Command, LogFormat, LogLevel, MeasureArgs, NetworkConfig, SitesArgs};
pub use dns::{DnsBackend, HickoryDns};
pub use error_handling::{
    ConfigParseError, DeserializationError, ErrorType, FetchError, InitializationError,
    LookupError, ProcessingStats, TargetError,
};
pub use fetch::{FetchOptions, FetchResult, Fetcher};
pub use models::{DomainMeasurement, PhaseTimings, Site};
pub use parse::{decode_body, extract_resource_hostnames};
pub use run::{
    measure_domains, run_measurement, run_site_survey, survey_sites, RunSummary, SurveyContext,
    WorkerPool,
};
pub use storage::{load_dataset, save_dataset, DatasetWriter};
