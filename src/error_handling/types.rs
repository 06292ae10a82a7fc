//! Error type definitions.
//!
//! This module defines the typed errors raised by the survey pipeline and the
//! `ErrorType` categories used for failure statistics.

use std::time::Duration;

use log::SetLoggerError;
use strum_macros::EnumIter as EnumIterMacro;
use thiserror::Error;

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),

    /// Error building the TLS client configuration.
    #[error("TLS configuration error: {0}")]
    TlsConfigError(#[from] rustls::Error),
}

/// Failure of a single fetch.
#[derive(Error, Debug)]
pub enum FetchError {
    /// The fetch did not finish within its deadline.
    #[error("fetch of {url} timed out after {after:?}")]
    Timeout {
        /// URL being fetched
        url: String,
        /// Deadline that expired
        after: Duration,
    },

    /// The target could not be resolved or connected to.
    #[error("failed to connect to {url}: {reason}")]
    ConnectFailure {
        /// URL being fetched
        url: String,
        /// Underlying cause
        reason: String,
    },

    /// TLS, HTTP framing or redirect handling failed.
    #[error("protocol error fetching {url}: {reason}")]
    ProtocolError {
        /// URL being fetched
        url: String,
        /// Underlying cause
        reason: String,
    },
}

impl FetchError {
    pub(crate) fn connect(url: &str, reason: impl ToString) -> Self {
        FetchError::ConnectFailure {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn protocol(url: &str, reason: impl ToString) -> Self {
        FetchError::ProtocolError {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Failure of a DNS-backed lookup (address, canonical name, CNAME, TXT).
#[derive(Error, Debug)]
pub enum LookupError {
    /// The name exists but holds no record of the requested type.
    #[error("no {record} records for {name}")]
    NotFound {
        /// Queried name
        name: String,
        /// Record type or lookup kind
        record: &'static str,
    },

    /// The query did not finish within its deadline.
    #[error("{record} lookup for {name} timed out after {after:?}")]
    Timeout {
        /// Queried name
        name: String,
        /// Record type or lookup kind
        record: &'static str,
        /// Deadline that expired
        after: Duration,
    },

    /// The resolver reported an error.
    #[error("{record} lookup for {name} failed: {reason}")]
    Failed {
        /// Queried name
        name: String,
        /// Record type or lookup kind
        record: &'static str,
        /// Underlying cause
        reason: String,
    },

    /// The answer could not be interpreted.
    #[error("unparseable {record} answer for {name}: {answer:?}")]
    Malformed {
        /// Queried name
        name: String,
        /// Record type or lookup kind
        record: &'static str,
        /// Raw answer text
        answer: String,
    },
}

/// Failure of a whole per-target pipeline.
///
/// Every variant is recoverable by dropping the target.
#[derive(Error, Debug)]
pub enum TargetError {
    /// The page fetch failed.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// An ASN or CNAME lookup failed.
    #[error("lookup failure: {0}")]
    Lookup(#[from] LookupError),
}

/// Fatal input error: malformed CDN table, seed list or persisted dataset.
#[derive(Error, Debug)]
pub enum ConfigParseError {
    /// An input file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// Path being read
        path: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A CDN reference table line is not `<provider> <domain-or-asn>`.
    #[error("malformed CDN table line {line_number}: {line:?} (expected `<provider> <domain-or-asn>`)")]
    MalformedTableLine {
        /// 1-based line number
        line_number: usize,
        /// Offending line
        line: String,
    },

    /// A seed list row could not be parsed.
    #[error("malformed seed list: {0}")]
    SeedList(#[from] csv::Error),

    /// A persisted dataset record is invalid.
    #[error(transparent)]
    Dataset(#[from] DeserializationError),
}

/// A persisted measurement record that does not match the closed field set.
#[derive(Error, Debug)]
#[error("malformed dataset record on line {line_number}: {source}")]
pub struct DeserializationError {
    /// 1-based line number in the dataset file
    pub line_number: usize,
    /// Missing field, unknown field or type mismatch
    #[source]
    pub source: serde_json::Error,
}

/// Failure categories counted during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum ErrorType {
    /// Fetch deadline expired
    FetchTimeout,
    /// Target did not resolve or refused the connection
    ConnectFailure,
    /// TLS, HTTP or redirect failure
    ProtocolError,
    /// Canonical name lookup failed for one hostname (tolerated)
    ResolutionFailure,
    /// ASN or CNAME lookup failed
    LookupFailure,
    /// Whole-target deadline expired
    TargetTimeout,
    /// Worker task panicked
    TaskPanic,
}

impl std::fmt::Display for ErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ErrorType {
    /// Returns a human-readable label for the category.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorType::FetchTimeout => "Fetch timeout",
            ErrorType::ConnectFailure => "Connect failure",
            ErrorType::ProtocolError => "Protocol error",
            ErrorType::ResolutionFailure => "Hostname resolution failure",
            ErrorType::LookupFailure => "ASN/CNAME lookup failure",
            ErrorType::TargetTimeout => "Target processing timeout",
            ErrorType::TaskPanic => "Worker task panic",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_error_type_as_str() {
        assert_eq!(ErrorType::FetchTimeout.as_str(), "Fetch timeout");
        assert_eq!(
            ErrorType::LookupFailure.as_str(),
            "ASN/CNAME lookup failure"
        );
        assert_eq!(ErrorType::TaskPanic.to_string(), "Worker task panic");
    }

    #[test]
    fn test_all_error_types_have_string_representation() {
        for error_type in ErrorType::iter() {
            assert!(
                !error_type.as_str().is_empty(),
                "{:?} should have non-empty string",
                error_type
            );
        }
    }

    #[test]
    fn test_fetch_error_messages_name_the_target() {
        let err = FetchError::connect("http://a.com/", "connection refused");
        assert_eq!(
            err.to_string(),
            "failed to connect to http://a.com/: connection refused"
        );

        let err = FetchError::Timeout {
            url: "http://slow.com/".to_string(),
            after: Duration::from_secs(2),
        };
        assert!(err.to_string().contains("slow.com"));
        assert!(err.to_string().contains("2s"));
    }

    #[test]
    fn test_target_error_wraps_lookup_failure() {
        let err: TargetError = LookupError::NotFound {
            name: "1.0.0.127.origin.asn.cymru.com".to_string(),
            record: "TXT",
        }
        .into();
        assert_eq!(
            err.to_string(),
            "lookup failure: no TXT records for 1.0.0.127.origin.asn.cymru.com"
        );
    }

    #[test]
    fn test_malformed_table_line_message() {
        let err = ConfigParseError::MalformedTableLine {
            line_number: 3,
            line: "Akamai".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("line 3"));
        assert!(msg.contains("Akamai"));
    }
}
