use std::collections::BTreeMap;
use std::time::Duration;

use super::LatencyHistogram;

/// Basis points in a whole (100.00%).
pub const BASIS_POINTS: u64 = 10_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observation {
    Check { name: String, passed: bool },
    Rate { name: String, value: bool },
    Request(RequestSample),
    Iteration { duration: Duration },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestSample {
    pub latency: Duration,
    /// `0` when the request never produced a response.
    pub status: u16,
    pub timed_out: bool,
}

impl RequestSample {
    /// Transport failures and 4xx/5xx responses count as failed requests.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        self.status == 0 || self.status >= 400
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CheckTally {
    pub passes: u64,
    pub fails: u64,
}

impl CheckTally {
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.passes.saturating_add(self.fails)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RateTally {
    pub trues: u64,
    pub total: u64,
}

impl RateTally {
    pub const fn add(&mut self, value: bool) {
        if value {
            self.trues = self.trues.saturating_add(1);
        }
        self.total = self.total.saturating_add(1);
    }

    /// Share of `true` observations in basis points; 0 when nothing was observed.
    #[must_use]
    pub fn basis_points(&self) -> u64 {
        ratio_basis_points(self.trues, self.total)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestStats {
    pub total: u64,
    pub failed: u64,
    pub timed_out: u64,
}

impl RequestStats {
    #[must_use]
    pub const fn failure_rate(&self) -> RateTally {
        RateTally {
            trues: self.failed,
            total: self.total,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LatencySummary {
    pub min: Duration,
    pub avg: Duration,
    pub med: Duration,
    pub p90: Duration,
    pub p95: Duration,
    pub p99: Duration,
    pub max: Duration,
}

#[derive(Debug, Clone, Default)]
pub struct MetricsReport {
    pub checks: BTreeMap<String, CheckTally>,
    pub rates: BTreeMap<String, RateTally>,
    pub requests: RequestStats,
    pub latency: LatencySummary,
    pub iterations: u64,
    pub iteration_avg: Duration,
    /// Full latency distribution, kept for arbitrary `p(N)` lookups.
    pub histogram: Option<LatencyHistogram>,
}

impl MetricsReport {
    /// Latency at percentile `pct`; zero when no request completed.
    #[must_use]
    pub fn latency_percentile(&self, pct: u32) -> Duration {
        self.histogram
            .as_ref()
            .map_or(Duration::ZERO, |histogram| histogram.percentile(pct))
    }

    /// All checks folded into one pass/fail rate (`trues` are passes).
    #[must_use]
    pub fn checks_rate(&self) -> RateTally {
        self.checks
            .values()
            .fold(RateTally::default(), |acc, tally| RateTally {
                trues: acc.trues.saturating_add(tally.passes),
                total: acc.total.saturating_add(tally.total()),
            })
    }
}

fn ratio_basis_points(part: u64, total: u64) -> u64 {
    if total == 0 {
        return 0;
    }
    let scaled = u128::from(part)
        .saturating_mul(u128::from(BASIS_POINTS))
        .checked_div(u128::from(total))
        .unwrap_or(0);
    u64::try_from(scaled).unwrap_or(BASIS_POINTS)
}
