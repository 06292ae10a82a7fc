//! Aggregator tests.

use super::*;
use crate::models::PhaseTimings;

fn record(domain: &str, asn: &str, owner: &str, cdn: Option<&str>, base_us: u64) -> DomainMeasurement {
    DomainMeasurement {
        domain: domain.to_string(),
        hostname: format!("www.{domain}"),
        remote_ip: "192.0.2.10".parse().unwrap(),
        remote_asn: asn.to_string(),
        remote_asn_owner: owner.to_string(),
        cname_chain: Vec::new(),
        timings: PhaseTimings {
            dns_us: base_us,
            tcp_us: base_us * 2,
            tls_us: base_us * 4,
            ttfb_us: base_us * 6,
            total_us: base_us * 8,
        },
        cdn: cdn.map(str::to_string),
    }
}

fn sample() -> Vec<DomainMeasurement> {
    vec![
        record("a.com", "13335", "CLOUDFLARENET, US", Some("Cloudflare"), 1_000),
        record("b.com", "16509", "AMAZON-02, US", Some("Amazon"), 4_000),
        record("c.com", "13335", "CLOUDFLARENET", Some("Cloudflare"), 3_000),
        record("d.com", "64496", "EXAMPLE", None, 500),
        record("e.com", "16509", "AMAZON-02, US", Some("Akamai"), 2_000),
    ]
}

#[test]
fn test_group_by_provider_skips_unmatched_and_keeps_order() {
    let records = sample();
    let groups = group_by_provider(&records);
    assert_eq!(
        groups.keys().cloned().collect::<Vec<_>>(),
        vec!["Akamai", "Amazon", "Cloudflare"]
    );
    let cloudflare: Vec<&str> = groups["Cloudflare"]
        .iter()
        .map(|r| r.domain.as_str())
        .collect();
    assert_eq!(cloudflare, vec!["a.com", "c.com"]);
    assert!(groups.values().all(|members| !members.is_empty()));
}

#[test]
fn test_provider_ranking_count_then_name() {
    let report = aggregate(&sample());
    let order: Vec<(&str, usize)> = report
        .providers
        .iter()
        .map(|p| (p.provider.as_str(), p.count))
        .collect();
    assert_eq!(order, vec![("Cloudflare", 2), ("Akamai", 1), ("Amazon", 1)]);
    assert_eq!(report.total_records, 5);
    assert_eq!(report.classified_records, 4);
}

#[test]
fn test_means_in_milliseconds() {
    let report = aggregate(&sample());
    let cloudflare = &report.providers[0];
    assert_eq!(cloudflare.mean(TimingMetric::Dns), 2.0);
    assert_eq!(cloudflare.mean(TimingMetric::Total), 16.0);
    assert_eq!(cloudflare.mean(TimingMetric::TcpMinusDns), 2.0);
    assert_eq!(cloudflare.mean(TimingMetric::TlsMinusTcp), 4.0);
}

#[test]
fn test_metric_rankings_ascending_with_name_tie_break() {
    let mut records = sample();
    // Give Amazon the same mean as Akamai
    records[1] = record("b.com", "16509", "AMAZON-02, US", Some("Amazon"), 2_000);
    let report = aggregate(&records);

    assert_eq!(report.metric_rankings.len(), 7);
    let dns = &report.metric_rankings[0];
    assert_eq!(dns.metric, TimingMetric::Dns);
    let names: Vec<&str> = dns.entries.iter().map(|(p, _)| p.as_str()).collect();
    assert_eq!(names, vec!["Akamai", "Amazon", "Cloudflare"]);
}

#[test]
fn test_asn_ranking_includes_unmatched_and_first_owner() {
    let report = aggregate(&sample());
    let asns: Vec<(&str, &str, usize)> = report
        .asns
        .iter()
        .map(|a| (a.asn.as_str(), a.owner.as_str(), a.count))
        .collect();
    assert_eq!(
        asns,
        vec![
            ("13335", "CLOUDFLARENET, US", 2),
            ("16509", "AMAZON-02, US", 2),
            ("64496", "EXAMPLE", 1),
        ]
    );
}

#[test]
fn test_empty_input() {
    let report = aggregate(&[]);
    assert!(report.providers.is_empty());
    assert!(report.asns.is_empty());
    assert!(report.metric_rankings.iter().all(|r| r.entries.is_empty()));
}

#[test]
fn test_metric_labels() {
    assert_eq!(TimingMetric::TcpMinusDns.to_string(), "TCP-DNS");
    assert_eq!(TimingMetric::iter().count(), 7);
}
