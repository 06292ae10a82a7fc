//! Persistence of measurement datasets.
//!
//! Measurements are stored as JSON Lines: one `DomainMeasurement` object per
//! line, flushed as soon as it is written so an interrupted run keeps every
//! completed record.

mod dataset;

// Re-export public API
pub use dataset::{load_dataset, read_dataset, save_dataset, DatasetWriter};
