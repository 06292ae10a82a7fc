//! Measurement survey: fetch timings, origin ASN and CNAME chain per domain.

use std::io::Write;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use futures::StreamExt;
use log::info;
use tokio_util::sync::CancellationToken;

use super::{RunSummary, SurveyContext, WorkerPool};
use crate::aggregate::aggregate;
use crate::app::{
    load_seed_domains, open_output, print_error_statistics, shutdown_gracefully,
    spawn_progress_logger, write_report,
};
use crate::cdn::CdnTables;
use crate::config::{MeasureArgs, NetworkConfig, CNAME_TIMEOUT, LOGGING_INTERVAL};
use crate::dns::{lookup_asn, lookup_cname_chain};
use crate::error_handling::TargetError;
use crate::models::DomainMeasurement;
use crate::storage::{load_dataset, DatasetWriter};

/// The hostname fetched for a seed domain.
///
/// ```
/// use cdn_survey::run::www_hostname;
///
/// assert_eq!(www_hostname("example.com"), "www.example.com");
/// assert_eq!(www_hostname("www.example.com"), "www.example.com");
/// ```
pub fn www_hostname(domain: &str) -> String {
    if domain.starts_with("www.") {
        domain.to_string()
    } else {
        format!("www.{domain}")
    }
}

/// Measures one domain: `https://www.<domain>/`, then the origin ASN of the
/// address it connected to, then the CNAME chain of the fetched hostname.
///
/// All three pieces of evidence are required; any failure drops the domain.
/// The record is returned unclassified.
pub async fn measure_domain(
    ctx: &SurveyContext,
    domain: String,
) -> Result<DomainMeasurement, TargetError> {
    let hostname = www_hostname(&domain);
    let page = ctx.fetcher.fetch(&format!("https://{hostname}/")).await?;
    let asn = lookup_asn(&*ctx.dns, page.remote_ip).await?;
    let cname_chain = lookup_cname_chain(&*ctx.dns, &hostname, CNAME_TIMEOUT).await?;

    Ok(DomainMeasurement {
        domain,
        hostname,
        remote_ip: page.remote_ip,
        remote_asn: asn.asn,
        remote_asn_owner: asn.owner,
        cname_chain,
        timings: page.timings,
        cdn: None,
    })
}

/// Measures `targets` in parallel, persisting each record to `sink` as soon
/// as it completes.
///
/// Returns the records in completion order together with the run counts.
///
/// # Errors
///
/// Returns an error only when writing to `sink` fails.
pub async fn measure_domains<W: Write>(
    ctx: Arc<SurveyContext>,
    targets: Vec<String>,
    sink: &mut DatasetWriter<W>,
    cancel: CancellationToken,
) -> Result<(Vec<DomainMeasurement>, RunSummary)> {
    let start = Instant::now();
    let total = targets.len();
    info!("Measuring {total} domains with {} workers", ctx.max_concurrency);

    let pool_cancel = cancel.child_token();
    let pool = WorkerPool::new(ctx.max_concurrency, Arc::clone(&ctx.stats), pool_cancel.clone())
        .with_target_timeout(ctx.target_timeout);
    let logger_cancel = CancellationToken::new();
    let logging_task = spawn_progress_logger(
        start,
        pool.completed(),
        pool.failed(),
        Duration::from_secs(LOGGING_INTERVAL),
        logger_cancel.clone(),
    );

    let results = pool.run(targets, {
        let ctx = Arc::clone(&ctx);
        move |domain| {
            let ctx = Arc::clone(&ctx);
            async move { measure_domain(&ctx, domain).await }
        }
    });

    let records = async {
        futures::pin_mut!(results);
        let mut records = Vec::new();
        while let Some(record) = results.next().await {
            sink.write(&record)?;
            records.push(record);
        }
        Ok::<_, anyhow::Error>(records)
    }
    .await;

    if records.is_err() {
        pool_cancel.cancel();
    }
    shutdown_gracefully(logger_cancel, Some(logging_task)).await;
    let records = records?;

    let summary = RunSummary {
        total,
        succeeded: pool.completed().load(Ordering::SeqCst),
        failed: pool.failed().load(Ordering::SeqCst),
        elapsed_seconds: start.elapsed().as_secs_f64(),
    };
    Ok((records, summary))
}

/// Classifies every record in place with the ASN-priority rule.
pub fn classify_records(tables: &CdnTables, records: &mut [DomainMeasurement]) {
    for record in records.iter_mut() {
        record.cdn = tables.classify_measurement(&record.remote_asn, &record.cname_chain);
    }
}

/// Runs the measurement survey described by `args` and writes the report.
///
/// With `--skip-fetch` the dataset is reloaded instead of measured. Either
/// way the records are classified against the current CDN table before
/// aggregation.
///
/// # Errors
///
/// Fails on unreadable or malformed inputs (CDN table, seed list, dataset),
/// on resolver or TLS initialization failure, and on output errors.
pub async fn run_measurement(
    network: &NetworkConfig,
    args: &MeasureArgs,
    cancel: CancellationToken,
) -> Result<RunSummary> {
    let tables = CdnTables::load(&args.cdns)?;
    info!(
        "Loaded {} CDN providers from {}",
        tables.providers().len(),
        args.cdns.display()
    );

    let (mut records, summary) = match (&args.domains, args.skip_fetch) {
        (_, true) => {
            let start = Instant::now();
            let records = load_dataset(&args.dataset)?;
            info!(
                "Loaded {} measurements from {}",
                records.len(),
                args.dataset.display()
            );
            let summary = RunSummary {
                total: records.len(),
                succeeded: records.len(),
                failed: 0,
                elapsed_seconds: start.elapsed().as_secs_f64(),
            };
            (records, summary)
        }
        (Some(domains), false) => {
            let targets = load_seed_domains(domains, args.limit)?;
            let ctx = SurveyContext::from_config(network)
                .context("Failed to initialize network resources")?;
            let stats = Arc::clone(&ctx.stats);
            let mut sink = DatasetWriter::create(&args.dataset)?;

            let outcome = measure_domains(Arc::new(ctx), targets, &mut sink, cancel).await?;
            info!(
                "Saved {} measurements to {}",
                sink.written(),
                args.dataset.display()
            );
            print_error_statistics(&stats);
            outcome
        }
        (None, false) => anyhow::bail!("--domains is required unless --skip-fetch is given"),
    };

    classify_records(&tables, &mut records);
    let report = aggregate(&records);

    let mut out = open_output(args.output.as_deref())?;
    write_report(&mut *out, &report).context("Failed to write report")?;
    out.flush().context("Failed to flush report")?;
    Ok(summary)
}
