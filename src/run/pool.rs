//! Bounded worker pool with per-target failure isolation.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{FuturesUnordered, Stream, StreamExt};
use futures::FutureExt;
use log::{debug, warn};
use tokio::sync::{mpsc, Semaphore};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use crate::config::TARGET_PROCESSING_TIMEOUT;
use crate::error_handling::{update_error_stats, ErrorType, ProcessingStats, TargetError};

/// Runs one pipeline per target on Tokio tasks, at most `max_concurrency` at a time.
///
/// Errors, deadline expiry and panics stay inside the owning task: they are
/// logged, counted in `ProcessingStats` and turn into "no result". Results
/// stream to a single consumer in completion order.
pub struct WorkerPool {
    max_concurrency: usize,
    target_timeout: Duration,
    stats: Arc<ProcessingStats>,
    cancel: CancellationToken,
    completed: Arc<AtomicUsize>,
    failed: Arc<AtomicUsize>,
}

impl WorkerPool {
    /// Creates a pool. A `max_concurrency` of zero is treated as one.
    pub fn new(max_concurrency: usize, stats: Arc<ProcessingStats>, cancel: CancellationToken) -> Self {
        Self {
            max_concurrency: max_concurrency.max(1),
            target_timeout: TARGET_PROCESSING_TIMEOUT,
            stats,
            cancel,
            completed: Arc::new(AtomicUsize::new(0)),
            failed: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Overrides the per-target deadline.
    pub fn with_target_timeout(mut self, target_timeout: Duration) -> Self {
        self.target_timeout = target_timeout;
        self
    }

    /// Counter of targets that produced a result.
    pub fn completed(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.completed)
    }

    /// Counter of targets dropped after an error, timeout or panic.
    pub fn failed(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.failed)
    }

    /// Starts processing `targets` and returns the stream of successful results.
    ///
    /// The stream ends once every target has finished (or the pool was
    /// cancelled) and all failures have been counted. Must be called from
    /// within a Tokio runtime.
    pub fn run<T, F, Fut>(&self, targets: Vec<String>, pipeline: F) -> impl Stream<Item = T>
    where
        T: Send + 'static,
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, TargetError>> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel::<T>(self.max_concurrency);
        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let pipeline = Arc::new(pipeline);
        let target_timeout = self.target_timeout;
        let stats = Arc::clone(&self.stats);
        let cancel = self.cancel.clone();
        let completed = Arc::clone(&self.completed);
        let failed = Arc::clone(&self.failed);

        tokio::spawn(async move {
            let mut tasks = FuturesUnordered::new();

            for target in targets {
                let permit = tokio::select! {
                    _ = cancel.cancelled() => {
                        debug!("Dispatch cancelled before {target}");
                        break;
                    }
                    permit = Arc::clone(&semaphore).acquire_owned() => match permit {
                        Ok(permit) => permit,
                        Err(_) => {
                            warn!("Semaphore closed, skipping {target}");
                            break;
                        }
                    },
                };

                let handle = tokio::spawn({
                    let target = target.clone();
                    let pipeline = Arc::clone(&pipeline);
                    let stats = Arc::clone(&stats);
                    let cancel = cancel.clone();
                    let completed = Arc::clone(&completed);
                    let failed = Arc::clone(&failed);
                    let tx = tx.clone();
                    async move {
                        let _permit = permit;
                        let outcome = tokio::select! {
                            _ = cancel.cancelled() => {
                                debug!("Cancelled {target}");
                                return;
                            }
                            outcome = timeout(target_timeout, pipeline(target.clone())) => outcome,
                        };

                        match outcome {
                            Ok(Ok(value)) => {
                                completed.fetch_add(1, Ordering::SeqCst);
                                // A closed channel means the consumer stopped listening
                                let _ = tx.send(value).await;
                            }
                            Ok(Err(e)) => {
                                failed.fetch_add(1, Ordering::SeqCst);
                                update_error_stats(&stats, &e);
                                warn!("Failed to process {target}: {e}");
                            }
                            Err(_) => {
                                failed.fetch_add(1, Ordering::SeqCst);
                                stats.increment_error(ErrorType::TargetTimeout);
                                warn!("Timeout processing {target} after {target_timeout:?}");
                            }
                        }
                    }
                });
                tasks.push(async move { (target, handle.await) });

                // Reap finished tasks so the set stays small on long lists
                while let Some(Some((target, result))) = tasks.next().now_or_never() {
                    record_join(&target, result, &stats, &failed);
                }
            }

            while let Some((target, result)) = tasks.next().await {
                record_join(&target, result, &stats, &failed);
            }
            // `tx` drops here, after every failure has been counted
            drop(tx);
        });

        futures::stream::unfold(rx, |mut rx| async move { rx.recv().await.map(|item| (item, rx)) })
    }
}

fn record_join(
    target: &str,
    result: Result<(), tokio::task::JoinError>,
    stats: &ProcessingStats,
    failed: &AtomicUsize,
) {
    if let Err(join_error) = result {
        if join_error.is_panic() {
            failed.fetch_add(1, Ordering::SeqCst);
            stats.increment_error(ErrorType::TaskPanic);
            warn!("Task for {target} panicked: {join_error}");
        } else {
            debug!("Task for {target} was cancelled");
        }
    }
}
