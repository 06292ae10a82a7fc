//! Error handling and processing statistics.
//!
//! This module provides:
//! - Typed errors for fetches, lookups, pipelines and input files
//! - Failure categorization into `ErrorType`
//! - Thread-safe failure counters
//!
//! Per-target errors never escape a worker: they are categorized, counted,
//! logged and turned into an absent result. Input errors are fatal.

mod categorization;
mod stats;
mod types;

// Re-export public API
pub use categorization::update_error_stats;
pub use stats::ProcessingStats;
pub use types::{
    ConfigParseError, DeserializationError, ErrorType, FetchError, InitializationError,
    LookupError, TargetError,
};
