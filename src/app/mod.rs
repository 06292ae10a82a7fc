//! Application-level helpers around the pipelines.
//!
//! This module provides input loading, output sinks, report formatting,
//! progress logging, shutdown handling and statistics printing.

pub mod input;
pub mod logging;
pub mod output;
pub mod report;
pub mod shutdown;
pub mod statistics;

// Re-export public API
pub use input::{load_seed_domains, load_sites, normalize_hostname};
pub use logging::{log_progress, spawn_progress_logger};
pub use output::open_output;
pub use report::write_report;
pub use shutdown::shutdown_gracefully;
pub use statistics::{print_error_statistics, print_run_summary};
