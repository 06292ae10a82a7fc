//! Site survey: which CDNs serve a site's embedded resources.

use std::io::Write;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use futures::StreamExt;
use log::{debug, info};
use tokio_util::sync::CancellationToken;

use super::{RunSummary, SurveyContext, WorkerPool};
use crate::app::{
    load_sites, open_output, print_error_statistics, shutdown_gracefully, spawn_progress_logger,
};
use crate::cdn::CdnTables;
use crate::config::{NetworkConfig, SitesArgs, LOGGING_INTERVAL};
use crate::dns::resolve_all;
use crate::error_handling::TargetError;
use crate::models::Site;
use crate::parse::extract_resource_hostnames;

/// Fetches `http://<host>/` and collects the site's hostnames.
///
/// The result holds the root, every hostname referenced by an embedded
/// resource, and the canonical names of all of them. Individual resolution
/// failures only shrink the set; a failed fetch fails the target.
pub async fn survey_site(ctx: &SurveyContext, host: String) -> Result<Site, TargetError> {
    let page = ctx.fetcher.fetch(&format!("http://{host}/")).await?;

    let mut site = Site::new(host);
    site.extend_hostnames(extract_resource_hostnames(
        &page.body,
        page.encoding.as_deref(),
    ));
    let resolved = resolve_all(&*ctx.dns, site.hostnames(), &ctx.stats).await;
    site.extend_hostnames(resolved);

    debug!(
        "{} | {}",
        site.root(),
        site.hostnames()
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ")
    );
    Ok(site)
}

/// Surveys `targets` in parallel and writes one `root;cdn,...` line per
/// successful site, in completion order.
///
/// Each line is flushed as soon as it is written, so an interrupted run keeps
/// every completed result. Failed sites are logged and omitted.
///
/// # Errors
///
/// Returns an error only when writing to `out` fails.
pub async fn survey_sites(
    ctx: Arc<SurveyContext>,
    tables: Arc<CdnTables>,
    targets: Vec<String>,
    out: &mut dyn Write,
    cancel: CancellationToken,
) -> Result<RunSummary> {
    let start = Instant::now();
    let total = targets.len();
    info!("Surveying {total} sites with {} workers", ctx.max_concurrency);

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
        move |host| {
            let ctx = Arc::clone(&ctx);
            async move { survey_site(&ctx, host).await }
        }
    });

    let written = async {
        futures::pin_mut!(results);
        let mut written = 0usize;
        while let Some(mut site) = results.next().await {
            let cdns = tables.classify_hostnames(site.hostnames());
            site.set_cdns(cdns);
            writeln!(out, "{}", site.output_line()).context("Failed to write survey line")?;
            out.flush().context("Failed to flush survey output")?;
            written += 1;
            info!("{written} complete");
        }
        Ok::<_, anyhow::Error>(written)
    }
    .await;

    if written.is_err() {
        pool_cancel.cancel();
    }
    shutdown_gracefully(logger_cancel, Some(logging_task)).await;
    written?;

    Ok(RunSummary {
        total,
        succeeded: pool.completed().load(Ordering::SeqCst),
        failed: pool.failed().load(Ordering::SeqCst),
        elapsed_seconds: start.elapsed().as_secs_f64(),
    })
}

/// Runs the site survey described by `args`.
///
/// # Errors
///
/// Fails on an unreadable or malformed site list or CDN table, on resolver or
/// TLS initialization failure, and on output errors.
pub async fn run_site_survey(
    network: &NetworkConfig,
    args: &SitesArgs,
    cancel: CancellationToken,
) -> Result<RunSummary> {
    let tables = CdnTables::load(&args.cdns)?;
    info!(
        "Loaded {} CDN providers from {}",
        tables.providers().len(),
        args.cdns.display()
    );

    let targets = load_sites(&args.sites).await?;
    let ctx = SurveyContext::from_config(network).context("Failed to initialize network resources")?;
    let stats = Arc::clone(&ctx.stats);
    let mut out = open_output(args.output.as_deref())?;

    let summary = survey_sites(Arc::new(ctx), Arc::new(tables), targets, &mut *out, cancel).await?;
    print_error_statistics(&stats);
    Ok(summary)
}
