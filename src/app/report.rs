//! Textual measurement report.

use std::io::{self, Write};

use crate::aggregate::AggregateReport;

/// Writes the provider ranking, one ranking per timing metric, and the ASN ranking.
pub fn write_report<W: Write + ?Sized>(out: &mut W, report: &AggregateReport) -> io::Result<()> {
    writeln!(
        out,
        "Measured domains: {} ({} classified, {} unmatched)",
        report.total_records,
        report.classified_records,
        report.total_records - report.classified_records
    )?;

    writeln!(out)?;
    writeln!(out, "Providers by domain count")?;
    for (rank, stats) in report.providers.iter().enumerate() {
        writeln!(out, "{:>4}. {:<24} {:>6}", rank + 1, stats.provider, stats.count)?;
    }

    for ranking in &report.metric_rankings {
        writeln!(out)?;
        writeln!(out, "Mean {} (ms), fastest first", ranking.metric)?;
        for (rank, (provider, mean_ms)) in ranking.entries.iter().enumerate() {
            writeln!(out, "{:>4}. {:<24} {:>10.3}", rank + 1, provider, mean_ms)?;
        }
    }

    writeln!(out)?;
    writeln!(out, "Origin ASNs by domain count")?;
    for (rank, asn) in report.asns.iter().enumerate() {
        writeln!(
            out,
            "{:>4}. AS{:<10} {:>6}  {}",
            rank + 1,
            asn.asn,
            asn.count,
            asn.owner
        )?;
    }

    out.flush()
}
