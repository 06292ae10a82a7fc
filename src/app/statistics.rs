//! End-of-run statistics.

use log::info;
use strum::IntoEnumIterator;

use crate::error_handling::{ErrorType, ProcessingStats};
use crate::run::RunSummary;

/// Logs failure counts by category. Silent when nothing failed.
pub fn print_error_statistics(error_stats: &ProcessingStats) {
    let total_errors = error_stats.total_errors();
    if total_errors == 0 {
        return;
    }

    info!("Error Counts ({} total):", total_errors);
    for error_type in ErrorType::iter() {
        let count = error_stats.get_error_count(error_type);
        if count > 0 {
            info!("   {}: {}", error_type.as_str(), count);
        }
    }
}

/// Logs a one-line summary of the run.
pub fn print_run_summary(summary: &RunSummary) {
    info!(
        "Processed {} target{} ({} succeeded, {} failed) in {:.1}s",
        summary.total,
        if summary.total == 1 { "" } else { "s" },
        summary.succeeded,
        summary.failed,
        summary.elapsed_seconds
    );
}
