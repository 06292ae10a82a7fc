//! Timing metrics reported per provider.

use strum_macros::EnumIter;

use crate::models::PhaseTimings;

/// The five fetch phases plus the two derived sub-phase intervals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter)]
pub enum TimingMetric {
    /// Name resolution
    Dns,
    /// TCP handshake finished
    Tcp,
    /// TLS handshake finished
    Tls,
    /// Time to first byte
    Ttfb,
    /// Full download
    Total,
    /// TCP − DNS (connect)
    TcpMinusDns,
    /// TLS − TCP (handshake)
    TlsMinusTcp,
}

impl TimingMetric {
    /// Report label.
    pub fn label(&self) -> &'static str {
        match self {
            TimingMetric::Dns => "DNS",
            TimingMetric::Tcp => "TCP",
            TimingMetric::Tls => "TLS",
            TimingMetric::Ttfb => "TTFB",
            TimingMetric::Total => "Total",
            TimingMetric::TcpMinusDns => "TCP-DNS",
            TimingMetric::TlsMinusTcp => "TLS-TCP",
        }
    }

    /// Value of this metric for one fetch, in microseconds.
    pub fn micros(&self, timings: &PhaseTimings) -> u64 {
        match self {
            TimingMetric::Dns => timings.dns_us,
            TimingMetric::Tcp => timings.tcp_us,
            TimingMetric::Tls => timings.tls_us,
            TimingMetric::Ttfb => timings.ttfb_us,
            TimingMetric::Total => timings.total_us,
            TimingMetric::TcpMinusDns => timings.tcp_minus_dns_us(),
            TimingMetric::TlsMinusTcp => timings.tls_minus_tcp_us(),
        }
    }
}

impl std::fmt::Display for TimingMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
