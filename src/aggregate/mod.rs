//! Aggregation of classified measurements into ranked statistics.
//!
//! Records are grouped by provider with an explicit `BTreeMap` build, so a
//! group exists only if it has members. Unmatched records take part in the ASN
//! ranking only.

mod metric;

use std::collections::{BTreeMap, HashMap};

use strum::IntoEnumIterator;

pub use metric::TimingMetric;

use crate::models::DomainMeasurement;

/// Count and mean timings of one provider.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderStats {
    /// Provider name
    pub provider: String,
    /// Number of classified domains
    pub count: usize,
    /// Arithmetic mean of each metric, in milliseconds
    pub mean_ms: BTreeMap<TimingMetric, f64>,
}

impl ProviderStats {
    /// Mean of `metric` in milliseconds.
    pub fn mean(&self, metric: TimingMetric) -> f64 {
        self.mean_ms.get(&metric).copied().unwrap_or(0.0)
    }
}

/// Providers ordered by one metric's mean, fastest first.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricRanking {
    /// Ranked metric
    pub metric: TimingMetric,
    /// `(provider, mean_ms)` pairs
    pub entries: Vec<(String, f64)>,
}

/// Number of measured domains whose address belongs to an ASN.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsnCount {
    /// ASN digit string
    pub asn: String,
    /// Owner as first seen
    pub owner: String,
    /// Domain count
    pub count: usize,
}

/// Everything the measurement report prints.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateReport {
    /// Records considered
    pub total_records: usize,
    /// Records with a provider
    pub classified_records: usize,
    /// Providers by count descending, then name
    pub providers: Vec<ProviderStats>,
    /// One ranking per `TimingMetric`, in enum order
    pub metric_rankings: Vec<MetricRanking>,
    /// ASNs by count descending, then ASN string
    pub asns: Vec<AsnCount>,
}

/// Groups classified records by provider, preserving input order within a group.
pub fn group_by_provider(records: &[DomainMeasurement]) -> BTreeMap<String, Vec<&DomainMeasurement>> {
    let mut groups: BTreeMap<String, Vec<&DomainMeasurement>> = BTreeMap::new();
    for record in records {
        if let Some(provider) = &record.cdn {
            groups.entry(provider.clone()).or_default().push(record);
        }
    }
    groups
}

/// Computes provider statistics, per-metric rankings and the ASN ranking.
pub fn aggregate(records: &[DomainMeasurement]) -> AggregateReport {
    let groups = group_by_provider(records);

    let mut providers: Vec<ProviderStats> = groups
        .iter()
        .map(|(provider, members)| provider_stats(provider, members))
        .collect();
    providers.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.provider.cmp(&b.provider)));

    let metric_rankings = TimingMetric::iter()
        .map(|metric| {
            let mut entries: Vec<(String, f64)> = providers
                .iter()
                .map(|stats| (stats.provider.clone(), stats.mean(metric)))
                .collect();
            entries.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
            MetricRanking { metric, entries }
        })
        .collect();

    AggregateReport {
        total_records: records.len(),
        classified_records: groups.values().map(Vec::len).sum(),
        providers,
        metric_rankings,
        asns: rank_asns(records),
    }
}

fn provider_stats(provider: &str, members: &[&DomainMeasurement]) -> ProviderStats {
    let count = members.len();
    let mean_ms = TimingMetric::iter()
        .map(|metric| {
            let sum: u128 = members
                .iter()
                .map(|record| u128::from(metric.micros(&record.timings)))
                .sum();
            (metric, sum as f64 / count as f64 / 1000.0)
        })
        .collect();
    ProviderStats {
        provider: provider.to_string(),
        count,
        mean_ms,
    }
}

fn rank_asns(records: &[DomainMeasurement]) -> Vec<AsnCount> {
    let mut counts: HashMap<&str, AsnCount> = HashMap::new();
    for record in records {
        counts
            .entry(record.remote_asn.as_str())
            .and_modify(|entry| entry.count += 1)
            .or_insert_with(|| AsnCount {
                asn: record.remote_asn.clone(),
                owner: record.remote_asn_owner.clone(),
                count: 1,
            });
    }
    let mut ranked: Vec<AsnCount> = counts.into_values().collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.asn.cmp(&b.asn)));
    ranked
}

#[cfg(test)]
mod tests;
