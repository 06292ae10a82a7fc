//! Configuration types and CLI options.
//!
//! This module defines enums and structs used for command-line argument parsing
//! and the library-side configuration derived from them.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::config::constants::{
    CNAME_TIMEOUT, DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_FETCH_TIMEOUT_SECS, DEFAULT_HTTPS_PORT,
    DEFAULT_HTTP_PORT, DEFAULT_USER_AGENT, DNS_TIMEOUT_SECS, TARGET_PROCESSING_TIMEOUT,
    TARGET_TIMEOUT_MARGIN,
};

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// Controls how log messages are formatted:
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// Network configuration shared by both survey variants (no CLI dependencies).
///
/// # Examples
///
/// ```
/// use cdn_survey::NetworkConfig;
/// use std::time::Duration;
///
/// let config = NetworkConfig {
///     max_concurrency: 16,
///     total_timeout: Duration::from_secs(5),
///     ..Default::default()
/// };
/// assert_eq!(config.https_port, 443);
/// ```
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Maximum number of targets processed at the same time
    pub max_concurrency: usize,
    /// Deadline for DNS + TCP + TLS of a single hop
    pub connect_timeout: Duration,
    /// Deadline for a complete fetch, redirects included
    pub total_timeout: Duration,
    /// HTTP User-Agent header value
    pub user_agent: String,
    /// Port used for `http://` targets
    pub http_port: u16,
    /// Port used for `https://` targets
    pub https_port: u16,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            max_concurrency: num_cpus::get(),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            total_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            http_port: DEFAULT_HTTP_PORT,
            https_port: DEFAULT_HTTPS_PORT,
        }
    }
}

impl NetworkConfig {
    /// Deadline for one target's whole pipeline.
    ///
    /// Sum of the fetch deadline, two ASN queries, the CNAME chain deadline
    /// and `TARGET_TIMEOUT_MARGIN`, so every inner operation expires (and is
    /// counted) before the pool gives up on the target.
    pub fn target_timeout(&self) -> Duration {
        self.total_timeout
            + 2 * Duration::from_secs(DNS_TIMEOUT_SECS)
            + CNAME_TIMEOUT
            + TARGET_TIMEOUT_MARGIN
    }
}

/// Command-line options.
///
/// # Examples
///
/// ```bash
/// # Classify sites by embedded resource hostnames
/// cdn_survey sites --sites sites.txt --cdns cdns.txt --output results.txt
///
/// # Measure the top 1000 domains and rank providers by timing
/// cdn_survey measure --domains top-1m.csv --limit 1000 --cdns cdns.txt --dataset runs.jsonl
///
/// # Re-analyze a previous measurement without fetching
/// cdn_survey measure --cdns cdns.txt --dataset runs.jsonl --skip-fetch
/// ```
#[derive(Debug, Parser)]
#[command(
    name = "cdn_survey",
    version,
    about = "Search through website hostnames for signs of CDNs and time each fetch."
)]
pub struct Cli {
    /// Log level: error|warn|info|debug|trace
    #[arg(long, value_enum, default_value_t = LogLevel::Info, global = true)]
    pub log_level: LogLevel,

    /// Log format: plain|json
    #[arg(long, value_enum, default_value_t = LogFormat::Plain, global = true)]
    pub log_format: LogFormat,

    /// Maximum concurrent targets (defaults to the number of CPUs)
    #[arg(long, global = true)]
    pub max_concurrency: Option<usize>,

    /// Deadline for DNS, TCP and TLS of one hop, in seconds
    #[arg(long, default_value_t = DEFAULT_CONNECT_TIMEOUT_SECS, global = true)]
    pub connect_timeout_seconds: u64,

    /// Deadline for a complete fetch, in seconds
    #[arg(long, default_value_t = DEFAULT_FETCH_TIMEOUT_SECS, global = true)]
    pub timeout_seconds: u64,

    /// HTTP User-Agent header value
    #[arg(long, default_value = DEFAULT_USER_AGENT, global = true)]
    pub user_agent: String,

    /// Port used for http:// targets
    #[arg(long, default_value_t = DEFAULT_HTTP_PORT, global = true)]
    pub http_port: u16,

    /// Port used for https:// targets
    #[arg(long, default_value_t = DEFAULT_HTTPS_PORT, global = true)]
    pub https_port: u16,

    /// Survey variant to run
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Builds the library-side network configuration from the CLI flags.
    pub fn network_config(&self) -> NetworkConfig {
        NetworkConfig {
            max_concurrency: self
                .max_concurrency
                .filter(|&n| n > 0)
                .unwrap_or_else(num_cpus::get),
            connect_timeout: Duration::from_secs(self.connect_timeout_seconds),
            total_timeout: Duration::from_secs(self.timeout_seconds),
            user_agent: self.user_agent.clone(),
            http_port: self.http_port,
            https_port: self.https_port,
        }
    }
}

/// Survey variants.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch each site, collect embedded resource hostnames and match them against CDN domains
    Sites(SitesArgs),
    /// Measure fetch timings per domain, classify by ASN and CNAME, and rank providers
    Measure(MeasureArgs),
}

/// Options for the `sites` subcommand.
#[derive(Debug, Clone, Args)]
pub struct SitesArgs {
    /// One hostname per line (`-` reads stdin)
    #[arg(short = 's', long, default_value = "-")]
    pub sites: PathBuf,

    /// Database of known CDNs to domains, `<cdn> <domain>` per line
    #[arg(short = 'c', long)]
    pub cdns: PathBuf,

    /// Output file (stdout when omitted)
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,
}

/// Options for the `measure` subcommand.
#[derive(Debug, Clone, Args)]
pub struct MeasureArgs {
    /// Seed domain list: CSV `rank,domain` or one domain per line
    #[arg(short = 'd', long, required_unless_present = "skip_fetch")]
    pub domains: Option<PathBuf>,

    /// Number of seed domains to measure
    #[arg(short = 'n', long, default_value_t = 1000)]
    pub limit: usize,

    /// Database of known CDNs to domains or ASNs, `<cdn> <domain-or-asn>` per line
    #[arg(short = 'c', long)]
    pub cdns: PathBuf,

    /// JSON Lines dataset of measurements (written while fetching, read with --skip-fetch)
    #[arg(long, default_value = "./measurements.jsonl")]
    pub dataset: PathBuf,

    /// Skip fetching and reload a previously persisted dataset
    #[arg(long)]
    pub skip_fetch: bool,

    /// Report file (stdout when omitted)
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_conversion() {
        assert_eq!(
            log::LevelFilter::from(LogLevel::Error),
            log::LevelFilter::Error
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Warn),
            log::LevelFilter::Warn
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Info),
            log::LevelFilter::Info
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Debug),
            log::LevelFilter::Debug
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Trace),
            log::LevelFilter::Trace
        );
    }

    #[test]
    fn test_target_timeout_outlasts_fetch_deadline() {
        let mut config = NetworkConfig::default();
        assert_eq!(config.target_timeout(), TARGET_PROCESSING_TIMEOUT);

        config.total_timeout = Duration::from_secs(60);
        assert!(config.target_timeout() > Duration::from_secs(60) + CNAME_TIMEOUT);
    }

    #[test]
    fn test_network_config_default() {
        let config = NetworkConfig::default();
        assert!(config.max_concurrency >= 1);
        assert_eq!(config.total_timeout, Duration::from_secs(20));
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.http_port, 80);
        assert_eq!(config.https_port, 443);
        assert_eq!(config.user_agent, DEFAULT_USER_AGENT);
    }

    #[test]
    fn test_cli_sites_subcommand() {
        let cli = Cli::try_parse_from([
            "cdn_survey",
            "sites",
            "-s",
            "sites.txt",
            "-c",
            "cdns.txt",
            "-o",
            "out.txt",
        ])
        .expect("sites arguments should parse");

        match cli.command {
            Command::Sites(args) => {
                assert_eq!(args.sites, PathBuf::from("sites.txt"));
                assert_eq!(args.cdns, PathBuf::from("cdns.txt"));
                assert_eq!(args.output, Some(PathBuf::from("out.txt")));
            }
            Command::Measure(_) => panic!("expected sites subcommand"),
        }
    }

    #[test]
    fn test_cli_sites_defaults_to_stdin() {
        let cli = Cli::try_parse_from(["cdn_survey", "sites", "--cdns", "cdns.txt"])
            .expect("sites arguments should parse");
        match cli.command {
            Command::Sites(args) => {
                assert_eq!(args.sites, PathBuf::from("-"));
                assert!(args.output.is_none());
            }
            Command::Measure(_) => panic!("expected sites subcommand"),
        }
    }

    #[test]
    fn test_cli_measure_requires_domains_unless_skipping_fetch() {
        let missing = Cli::try_parse_from(["cdn_survey", "measure", "--cdns", "cdns.txt"]);
        assert!(missing.is_err());

        let cli = Cli::try_parse_from([
            "cdn_survey",
            "measure",
            "--cdns",
            "cdns.txt",
            "--skip-fetch",
            "--dataset",
            "old.jsonl",
        ])
        .expect("--skip-fetch should not need --domains");
        match cli.command {
            Command::Measure(args) => {
                assert!(args.skip_fetch);
                assert!(args.domains.is_none());
                assert_eq!(args.dataset, PathBuf::from("old.jsonl"));
            }
            Command::Sites(_) => panic!("expected measure subcommand"),
        }
    }

    #[test]
    fn test_cli_network_config_overrides() {
        let cli = Cli::try_parse_from([
            "cdn_survey",
            "--max-concurrency",
            "7",
            "--timeout-seconds",
            "3",
            "--http-port",
            "8080",
            "measure",
            "-d",
            "top.csv",
            "-n",
            "10",
            "-c",
            "cdns.txt",
        ])
        .expect("arguments should parse");
        let network = cli.network_config();
        assert_eq!(network.max_concurrency, 7);
        assert_eq!(network.total_timeout, Duration::from_secs(3));
        assert_eq!(network.http_port, 8080);
        assert_eq!(network.https_port, 443);
    }

    #[test]
    fn test_zero_concurrency_falls_back_to_cpu_count() {
        let cli = Cli::try_parse_from([
            "cdn_survey",
            "--max-concurrency",
            "0",
            "sites",
            "-c",
            "cdns.txt",
        ])
        .expect("arguments should parse");
        assert_eq!(cli.network_config().max_concurrency, num_cpus::get());
    }
}
