//! The two classification heuristics.

use std::collections::BTreeSet;

use super::{matches_suffix, CdnTables};
use crate::dns::fqdn;

impl CdnTables {
    /// Suffix-match classification of a site's hostnames.
    ///
    /// For each hostname the first suffix in table order that matches wins;
    /// providers found for all hostnames are accumulated.
    pub fn classify_hostnames<'a, I>(&self, hostnames: I) -> BTreeSet<String>
    where
        I: IntoIterator<Item = &'a String>,
    {
        hostnames
            .into_iter()
            .filter_map(|hostname| {
                let host = fqdn(hostname);
                self.suffixes()
                    .find(|(suffix, _)| matches_suffix(&host, suffix))
                    .map(|(_, provider)| provider.to_string())
            })
            .collect()
    }

    /// ASN-priority classification of a measured domain.
    ///
    /// A listed ASN decides outright. Otherwise every CNAME is compared with
    /// every suffix and the last match in iteration order wins, so a later
    /// chain entry overrides an earlier one. `None` means unmatched.
    pub fn classify_measurement(&self, asn: &str, cname_chain: &[String]) -> Option<String> {
        if let Some(provider) = self.asn_provider(asn) {
            return Some(provider.to_string());
        }

        let mut matched = None;
        for cname in cname_chain {
            let host = fqdn(cname);
            for (suffix, provider) in self.suffixes() {
                if matches_suffix(&host, suffix) {
                    matched = Some(provider);
                }
            }
        }
        matched.map(str::to_string)
    }
}
