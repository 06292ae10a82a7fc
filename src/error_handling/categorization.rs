//! Error categorization.
//!
//! Maps typed pipeline errors onto the `ErrorType` counters.

use super::stats::ProcessingStats;
use super::types::{ErrorType, FetchError, TargetError};

/// Categorizes a `FetchError` into an `ErrorType`.
fn categorize_fetch_error(error: &FetchError) -> ErrorType {
    match error {
        FetchError::Timeout { .. } => ErrorType::FetchTimeout,
        FetchError::ConnectFailure { .. } => ErrorType::ConnectFailure,
        FetchError::ProtocolError { .. } => ErrorType::ProtocolError,
    }
}

/// Categorizes a per-target pipeline error into an `ErrorType`.
///
/// This is the single mapping used at the worker boundary so that the
/// end-of-run summary and the log lines agree.
fn categorize_target_error(error: &TargetError) -> ErrorType {
    match error {
        TargetError::Fetch(fetch) => categorize_fetch_error(fetch),
        TargetError::Lookup(_) => ErrorType::LookupFailure,
    }
}

/// Updates processing statistics based on a per-target error.
pub fn update_error_stats(stats: &ProcessingStats, error: &TargetError) {
    stats.increment_error(categorize_target_error(error));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error_handling::LookupError;
    use std::time::Duration;

    #[test]
    fn test_categorize_fetch_errors() {
        let timeout = FetchError::Timeout {
            url: "http://a.com/".into(),
            after: Duration::from_secs(1),
        };
        assert_eq!(categorize_fetch_error(&timeout), ErrorType::FetchTimeout);
        assert_eq!(
            categorize_fetch_error(&FetchError::connect("http://a.com/", "refused")),
            ErrorType::ConnectFailure
        );
        assert_eq!(
            categorize_fetch_error(&FetchError::protocol("http://a.com/", "bad header")),
            ErrorType::ProtocolError
        );
    }

    #[test]
    fn test_categorize_lookup_error() {
        let err = TargetError::Lookup(LookupError::Timeout {
            name: "www.a.com".into(),
            record: "CNAME",
            after: Duration::from_secs(5),
        });
        assert_eq!(categorize_target_error(&err), ErrorType::LookupFailure);
    }

    #[test]
    fn test_update_error_stats_increments_matching_counter() {
        let stats = ProcessingStats::new();
        let err = TargetError::Fetch(FetchError::protocol("https://a.com/", "tls"));
        update_error_stats(&stats, &err);
        update_error_stats(&stats, &err);
        assert_eq!(stats.get_error_count(ErrorType::ProtocolError), 2);
        assert_eq!(stats.total_errors(), 2);
    }
}
