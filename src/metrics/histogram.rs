use std::time::Duration;

use hdrhistogram::Histogram;

use crate::error::MetricsError;

use super::LatencySummary;

/// Request latencies in microseconds.
#[derive(Debug, Clone)]
pub struct LatencyHistogram {
    hist: Histogram<u64>,
}

impl LatencyHistogram {
    /// Create a new latency histogram.
    ///
    /// # Errors
    ///
    /// Returns an error if the histogram cannot be created.
    pub fn new() -> Result<Self, MetricsError> {
        let hist = Histogram::<u64>::new(3).map_err(|err| MetricsError::Histogram {
            context: "create",
            source: Box::new(err),
        })?;
        Ok(Self { hist })
    }

    /// Record one latency.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be recorded.
    pub fn record(&mut self, latency: Duration) -> Result<(), MetricsError> {
        let micros = u64::try_from(latency.as_micros())
            .unwrap_or(u64::MAX)
            .max(1);
        self.hist
            .record(micros)
            .map_err(|err| MetricsError::Histogram {
                context: "record",
                source: Box::new(err),
            })
    }

    #[must_use]
    pub fn count(&self) -> u64 {
        self.hist.len()
    }

    /// Value at percentile `pct` (0-100).
    #[must_use]
    pub fn percentile(&self, pct: u32) -> Duration {
        if self.count() == 0 {
            return Duration::ZERO;
        }
        Duration::from_micros(self.hist.value_at_percentile(f64::from(pct.min(100))))
    }

    #[must_use]
    pub fn summary(&self) -> LatencySummary {
        if self.count() == 0 {
            return LatencySummary::default();
        }
        LatencySummary {
            min: Duration::from_micros(self.hist.min()),
            avg: Duration::from_micros(self.hist.mean().round() as u64),
            med: self.percentile(50),
            p90: self.percentile(90),
            p95: self.percentile(95),
            p99: self.percentile(99),
            max: Duration::from_micros(self.hist.max()),
        }
    }
}
