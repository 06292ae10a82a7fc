//! Records produced by the survey pipelines.

use std::collections::BTreeSet;
use std::net::IpAddr;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};

/// Five cumulative fetch phase offsets, all measured from the same request start.
///
/// Stored as whole microseconds so that a persisted record reloads exactly.
/// For plain-HTTP fetches `tls_us` equals `tcp_us`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PhaseTimings {
    /// Name resolution finished
    pub dns_us: u64,
    /// TCP handshake finished
    pub tcp_us: u64,
    /// TLS handshake finished
    pub tls_us: u64,
    /// First response byte received
    pub ttfb_us: u64,
    /// Body fully downloaded
    pub total_us: u64,
}

impl PhaseTimings {
    /// Builds timings from elapsed offsets.
    pub fn from_offsets(
        dns: Duration,
        tcp: Duration,
        tls: Duration,
        ttfb: Duration,
        total: Duration,
    ) -> Self {
        Self {
            dns_us: duration_to_micros(dns),
            tcp_us: duration_to_micros(tcp),
            tls_us: duration_to_micros(tls),
            ttfb_us: duration_to_micros(ttfb),
            total_us: duration_to_micros(total),
        }
    }

    /// Time spent establishing the TCP connection (TCP − DNS).
    pub fn tcp_minus_dns_us(&self) -> u64 {
        self.tcp_us.saturating_sub(self.dns_us)
    }

    /// Time spent in the TLS handshake (TLS − TCP); zero for plain HTTP.
    pub fn tls_minus_tcp_us(&self) -> u64 {
        self.tls_us.saturating_sub(self.tcp_us)
    }

    /// `dns ≤ tcp ≤ tls ≤ ttfb ≤ total`
    pub fn is_monotonic(&self) -> bool {
        self.dns_us <= self.tcp_us
            && self.tcp_us <= self.tls_us
            && self.tls_us <= self.ttfb_us
            && self.ttfb_us <= self.total_us
    }
}

/// Converts a `Duration` to whole microseconds, saturating at `u64::MAX`.
pub fn duration_to_micros(duration: Duration) -> u64 {
    u64::try_from(duration.as_micros()).unwrap_or(u64::MAX)
}

/// A site in the resource-hostname survey.
///
/// The hostname set always contains the root and only ever grows. The CDN set
/// is recorded once, by classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Site {
    root: String,
    hostnames: BTreeSet<String>,
    cdns: Option<BTreeSet<String>>,
}

impl Site {
    /// Creates a site whose hostname set holds only the root.
    pub fn new(root: impl Into<String>) -> Self {
        let root = root.into();
        let mut hostnames = BTreeSet::new();
        hostnames.insert(root.clone());
        Self {
            root,
            hostnames,
            cdns: None,
        }
    }

    /// The hostname the site was fetched under.
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Every hostname associated with the site so far, root included.
    pub fn hostnames(&self) -> &BTreeSet<String> {
        &self.hostnames
    }

    /// Adds hostnames (extracted or resolved) to the site.
    pub fn extend_hostnames<I>(&mut self, hostnames: I)
    where
        I: IntoIterator<Item = String>,
    {
        self.hostnames.extend(hostnames);
    }

    /// Records the classification result. Later calls are ignored.
    pub fn set_cdns(&mut self, cdns: BTreeSet<String>) {
        if self.cdns.is_none() {
            self.cdns = Some(cdns);
        } else {
            log::debug!("CDN set of {} already recorded, ignoring", self.root);
        }
    }

    /// Providers matched for the site; `None` until classified.
    pub fn cdns(&self) -> Option<&BTreeSet<String>> {
        self.cdns.as_ref()
    }

    /// Formats the survey output line: `root;cdn1,cdn2` (providers sorted).
    pub fn output_line(&self) -> String {
        let cdns = self
            .cdns
            .iter()
            .flatten()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(",");
        format!("{};{}", self.root, cdns)
    }
}

/// One measured domain in the timing survey.
///
/// Persisted as one JSON object per line. Deserialization accepts exactly these
/// fields, all of them required; `cdn` must be present as `null` or a string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DomainMeasurement {
    /// Seed domain
    pub domain: String,
    /// Hostname actually fetched (`www.` + domain)
    pub hostname: String,
    /// Address the fetch connected to
    pub remote_ip: IpAddr,
    /// Origin ASN of `remote_ip`, digits only
    pub remote_asn: String,
    /// Registered owner of `remote_asn`
    pub remote_asn_owner: String,
    /// CNAME chain of `hostname`, in resolution order
    pub cname_chain: Vec<String>,
    /// Fetch phase offsets
    pub timings: PhaseTimings,
    /// Classified provider; `None` until classified or when unmatched
    #[serde(deserialize_with = "required_option")]
    pub cdn: Option<String>,
}

// A plain `Option` field would silently accept a missing key.
fn required_option<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DomainMeasurement {
        DomainMeasurement {
            domain: "a.com".into(),
            hostname: "www.a.com".into(),
            remote_ip: "104.16.1.1".parse().unwrap(),
            remote_asn: "13335".into(),
            remote_asn_owner: "CLOUDFLARENET, US".into(),
            cname_chain: vec!["www.a.com.cdn.cloudflare.net.".into()],
            timings: PhaseTimings {
                dns_us: 1_000,
                tcp_us: 5_000,
                tls_us: 20_000,
                ttfb_us: 40_000,
                total_us: 41_500,
            },
            cdn: None,
        }
    }

    #[test]
    fn test_sub_phase_intervals() {
        let t = sample().timings;
        assert_eq!(t.tcp_minus_dns_us(), 4_000);
        assert_eq!(t.tls_minus_tcp_us(), 15_000);
        assert!(t.is_monotonic());
    }

    #[test]
    fn test_non_monotonic_timings_detected() {
        let t = PhaseTimings {
            dns_us: 10,
            tcp_us: 5,
            tls_us: 5,
            ttfb_us: 6,
            total_us: 7,
        };
        assert!(!t.is_monotonic());
        assert_eq!(t.tcp_minus_dns_us(), 0);
    }

    #[test]
    fn test_from_offsets_uses_microseconds() {
        let t = PhaseTimings::from_offsets(
            Duration::from_micros(1),
            Duration::from_millis(2),
            Duration::from_millis(2),
            Duration::from_millis(3),
            Duration::from_secs(1),
        );
        assert_eq!(t.dns_us, 1);
        assert_eq!(t.tcp_us, 2_000);
        assert_eq!(t.tls_minus_tcp_us(), 0);
        assert_eq!(t.total_us, 1_000_000);
    }

    #[test]
    fn test_site_starts_with_root_and_grows() {
        let mut site = Site::new("a.com");
        assert_eq!(site.hostnames().len(), 1);
        assert!(site.hostnames().contains("a.com"));

        site.extend_hostnames(vec!["b.net".to_string(), "a.com".to_string()]);
        assert_eq!(site.hostnames().len(), 2);
        assert!(site.cdns().is_none());
    }

    #[test]
    fn test_site_cdns_written_once() {
        let mut site = Site::new("a.com");
        site.set_cdns(["Fastly".to_string(), "Amazon".to_string()].into());
        site.set_cdns(BTreeSet::new());
        assert_eq!(site.cdns().map(BTreeSet::len), Some(2));
        assert_eq!(site.output_line(), "a.com;Amazon,Fastly");
    }

    #[test]
    fn test_site_output_line_without_match() {
        let mut site = Site::new("plain.org");
        site.set_cdns(BTreeSet::new());
        assert_eq!(site.output_line(), "plain.org;");
    }

    #[test]
    fn test_measurement_json_shape() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["remote_ip"], "104.16.1.1");
        assert_eq!(json["timings"]["tls_us"], 20_000);
        assert!(json["cdn"].is_null());
    }

    #[test]
    fn test_measurement_rejects_missing_cdn_field() {
        let mut json = serde_json::to_value(sample()).unwrap();
        json.as_object_mut().unwrap().remove("cdn");
        let err = serde_json::from_value::<DomainMeasurement>(json).unwrap_err();
        assert!(err.to_string().contains("cdn"), "{err}");
    }

    #[test]
    fn test_measurement_rejects_unknown_field() {
        let mut json = serde_json::to_value(sample()).unwrap();
        json["extra"] = serde_json::Value::Bool(true);
        assert!(serde_json::from_value::<DomainMeasurement>(json).is_err());
    }

    #[test]
    fn test_measurement_rejects_wrong_type() {
        let mut json = serde_json::to_value(sample()).unwrap();
        json["timings"]["dns_us"] = serde_json::Value::String("fast".into());
        assert!(serde_json::from_value::<DomainMeasurement>(json).is_err());
    }
}
