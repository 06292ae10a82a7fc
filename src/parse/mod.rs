//! HTML parsing and resource hostname extraction.
//!
//! This module extracts the hostnames a page pulls sub-resources from:
//! - `<img src>` and `<script src>`
//! - `<link href>` (stylesheets, icons, preconnects)
//!
//! All parsing is done using CSS selectors via the `scraper` crate, whose
//! html5ever tree builder recovers from malformed markup instead of failing.

mod resources;

// Re-export public API
pub use resources::{decode_body, extract_resource_hostnames};
