//! Target list loading and hostname normalization.

use std::collections::HashSet;
use std::path::Path;

use log::{debug, info, warn};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::config::MAX_HOSTNAME_LENGTH;
use crate::error_handling::ConfigParseError;

/// Upper bound on raw input lines, checked before any parsing.
const MAX_INPUT_LENGTH: usize = 2048;

/// Normalizes a site list or seed list entry to a bare lowercase hostname.
///
/// Accepts bare hostnames (`Example.com`) and http(s) URLs
/// (`https://example.com/path`). Logs a warning and returns `None` for input
/// that is too long, uses another scheme, or has no valid host.
///
/// # Arguments
///
/// * `raw` - One trimmed input entry
///
/// # Returns
///
/// `Some(hostname)` without a trailing dot, or `None` if the entry is skipped.
pub fn normalize_hostname(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if raw.len() > MAX_INPUT_LENGTH {
        warn!(
            "Skipping entry exceeding maximum length ({} > {}): {}...",
            raw.len(),
            MAX_INPUT_LENGTH,
            &raw[..raw.char_indices().nth(50).map_or(raw.len(), |(i, _)| i)]
        );
        return None;
    }

    let candidate = if raw.contains("://") {
        raw.to_string()
    } else {
        format!("http://{raw}")
    };

    let parsed = match url::Url::parse(&candidate) {
        Ok(parsed) => parsed,
        Err(_) => {
            warn!("Skipping invalid hostname: {raw}");
            return None;
        }
    };
    if !matches!(parsed.scheme(), "http" | "https") {
        warn!("Skipping unsupported scheme for entry: {raw}");
        return None;
    }

    let host = parsed
        .host_str()
        .map(|host| host.trim_end_matches('.').to_ascii_lowercase())
        .filter(|host| !host.is_empty());
    match host {
        Some(host) if host.len() <= MAX_HOSTNAME_LENGTH => Some(host),
        Some(host) => {
            warn!("Skipping hostname longer than {MAX_HOSTNAME_LENGTH} characters: {host}");
            None
        }
        None => {
            warn!("Skipping entry without a host: {raw}");
            None
        }
    }
}

/// Loads the site list: one hostname per line, `-` reads stdin.
///
/// Blank lines and `#` comments are skipped, entries are normalized with
/// `normalize_hostname`, and repeated hostnames are kept once.
///
/// # Errors
///
/// Returns `ConfigParseError::Io` if the input cannot be read.
pub async fn load_sites(path: &Path) -> Result<Vec<String>, ConfigParseError> {
    let io_error = |source| ConfigParseError::Io {
        path: path.display().to_string(),
        source,
    };

    let mut lines = if path.as_os_str() == "-" {
        info!("Reading sites from stdin");
        let reader: Box<dyn tokio::io::AsyncRead + Unpin + Send> = Box::new(tokio::io::stdin());
        BufReader::new(reader).lines()
    } else {
        let file = tokio::fs::File::open(path).await.map_err(io_error)?;
        let reader: Box<dyn tokio::io::AsyncRead + Unpin + Send> = Box::new(file);
        BufReader::new(reader).lines()
    };

    let mut seen = HashSet::new();
    let mut sites = Vec::new();
    while let Some(line) = lines.next_line().await.map_err(io_error)? {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let Some(host) = normalize_hostname(trimmed) else {
            continue;
        };
        if seen.insert(host.clone()) {
            sites.push(host);
        } else {
            debug!("Skipping repeated site {host}");
        }
    }

    info!("Loaded {} sites", sites.len());
    Ok(sites)
}

/// Loads up to `limit` domains from a seed list.
///
/// The list is CSV without a header; the last field of each row is the
/// domain, so both `rank,domain` rows and bare `domain` lines work. Rows whose
/// last field is not a dotted hostname (such as a header row) are skipped.
///
/// # Errors
///
/// Returns `ConfigParseError` if the file cannot be opened or is not valid CSV.
pub fn load_seed_domains(path: &Path, limit: usize) -> Result<Vec<String>, ConfigParseError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .comment(Some(b'#'))
        .trim(csv::Trim::All)
        .from_path(path)?;

    let mut seen = HashSet::new();
    let mut domains = Vec::new();
    for row in reader.records() {
        if domains.len() >= limit {
            break;
        }
        let row = row?;
        let Some(field) = row.iter().rev().find(|field| !field.is_empty()) else {
            continue;
        };
        // Header rows and single labels are not registrable domains
        let Some(domain) = normalize_hostname(field).filter(|domain| domain.contains('.')) else {
            debug!("Skipping seed list row {:?}", row);
            continue;
        };
        if seen.insert(domain.clone()) {
            domains.push(domain);
        }
    }

    info!("Loaded {} seed domains from {}", domains.len(), path.display());
    Ok(domains)
}
