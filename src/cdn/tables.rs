//! Loading of the CDN reference tables.

use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::info;

use crate::dns::fqdn;
use crate::error_handling::ConfigParseError;

/// The two reference tables, built from `<provider> <domain-or-asn>` lines.
///
/// Suffixes keep the order in which they first appear in the input; a suffix
/// listed again keeps its position and takes the later provider.
#[derive(Debug, Clone, Default)]
pub struct CdnTables {
    asns: HashMap<String, String>,
    suffixes: Vec<(String, String)>,
}

impl CdnTables {
    /// Parses tables from a reader.
    ///
    /// Blank lines and `#` comments are skipped. A key made only of digits,
    /// optionally prefixed with `AS`/`as`, is an ASN; any other key is a domain
    /// suffix.
    ///
    /// # Errors
    ///
    /// Returns `ConfigParseError::MalformedTableLine` for a line that is not
    /// exactly two whitespace-separated fields, and `ConfigParseError::Io` if
    /// reading fails.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, ConfigParseError> {
        let mut tables = CdnTables::default();
        let mut suffix_index: HashMap<String, usize> = HashMap::new();

        for (index, line) in reader.lines().enumerate() {
            let line = line.map_err(|source| ConfigParseError::Io {
                path: "CDN table".to_string(),
                source,
            })?;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let malformed = || ConfigParseError::MalformedTableLine {
                line_number: index + 1,
                line: line.clone(),
            };
            let mut fields = trimmed.split_whitespace();
            let (Some(provider), Some(key), None) = (fields.next(), fields.next(), fields.next())
            else {
                return Err(malformed());
            };

            if let Some(asn) = parse_asn(key) {
                tables.asns.insert(asn, provider.to_string());
                continue;
            }

            let suffix = fqdn(key.trim_start_matches('.'));
            if suffix.is_empty() {
                return Err(malformed());
            }
            match suffix_index.get(&suffix) {
                Some(&position) => tables.suffixes[position].1 = provider.to_string(),
                None => {
                    suffix_index.insert(suffix.clone(), tables.suffixes.len());
                    tables.suffixes.push((suffix, provider.to_string()));
                }
            }
        }

        Ok(tables)
    }

    /// Loads tables from a file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigParseError` if the file cannot be opened or a line is malformed.
    pub fn load(path: &Path) -> Result<Self, ConfigParseError> {
        let file = File::open(path).map_err(|source| ConfigParseError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let tables = Self::from_reader(BufReader::new(file))?;
        info!(
            "Loaded {} CDN domain suffixes and {} CDN ASNs from {}",
            tables.suffixes.len(),
            tables.asns.len(),
            path.display()
        );
        Ok(tables)
    }

    /// Provider owning `asn`, if listed.
    pub fn asn_provider(&self, asn: &str) -> Option<&str> {
        self.asns.get(asn).map(String::as_str)
    }

    /// `(suffix, provider)` pairs in table order.
    pub fn suffixes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.suffixes
            .iter()
            .map(|(suffix, provider)| (suffix.as_str(), provider.as_str()))
    }

    /// Every provider named in either table.
    pub fn providers(&self) -> BTreeSet<&str> {
        self.asns
            .values()
            .chain(self.suffixes.iter().map(|(_, provider)| provider))
            .map(String::as_str)
            .collect()
    }
}

fn parse_asn(key: &str) -> Option<String> {
    let digits = key
        .strip_prefix("AS")
        .or_else(|| key.strip_prefix("as"))
        .unwrap_or(key);
    (!digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())).then(|| digits.to_string())
}
