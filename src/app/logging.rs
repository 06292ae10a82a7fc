//! Progress logging utilities.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::info;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Logs progress information about target processing.
///
/// # Arguments
///
/// * `start_time` - The start time of processing
/// * `completed` - Targets that produced a result
/// * `failed` - Targets dropped after an error, timeout or panic
pub fn log_progress(start_time: Instant, completed: &AtomicUsize, failed: &AtomicUsize) {
    let elapsed_secs = start_time.elapsed().as_secs_f64();
    let completed = completed.load(Ordering::SeqCst);
    let failed = failed.load(Ordering::SeqCst);
    let rate = if elapsed_secs > 0.0 {
        (completed + failed) as f64 / elapsed_secs
    } else {
        0.0
    };
    info!(
        "{} complete, {} failed in {:.2} seconds (~{:.2} targets/sec)",
        completed, failed, elapsed_secs, rate
    );
}

/// Spawns a task that calls `log_progress` every `interval` until `cancel` fires.
pub fn spawn_progress_logger(
    start_time: Instant,
    completed: Arc<AtomicUsize>,
    failed: Arc<AtomicUsize>,
    interval: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick fires immediately
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = ticker.tick() => log_progress(start_time, &completed, &failed),
                _ = cancel.cancelled() => break,
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_progress_logger_stops_on_cancel() {
        let cancel = CancellationToken::new();
        let handle = spawn_progress_logger(
            Instant::now(),
            Arc::new(AtomicUsize::new(1)),
            Arc::new(AtomicUsize::new(0)),
            Duration::from_millis(10),
            cancel.clone(),
        );
        tokio::time::sleep(Duration::from_millis(30)).await;
        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("logger should stop")
            .unwrap();
    }
}
