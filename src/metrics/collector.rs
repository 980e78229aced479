use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::{AppError, AppResult, MetricsError};

use super::{LatencyHistogram, MetricsReport, Observation, RequestSample};

/// Owns every accumulator; observations arrive one at a time, so no locking.
pub struct MetricsCollector {
    report: MetricsReport,
    histogram: Option<LatencyHistogram>,
    iteration_time: Duration,
}

impl MetricsCollector {
    #[must_use]
    pub fn new() -> Self {
        let histogram = match LatencyHistogram::new() {
            Ok(histogram) => Some(histogram),
            Err(err) => {
                tracing::warn!("Failed to initialize latency histogram: {}", err);
                None
            }
        };
        Self {
            report: MetricsReport::default(),
            histogram,
            iteration_time: Duration::ZERO,
        }
    }

    pub fn observe(&mut self, observation: Observation) {
        match observation {
            Observation::Check { name, passed } => {
                let tally = self.report.checks.entry(name).or_default();
                if passed {
                    tally.passes = tally.passes.saturating_add(1);
                } else {
                    tally.fails = tally.fails.saturating_add(1);
                }
            }
            Observation::Rate { name, value } => {
                self.report.rates.entry(name).or_default().add(value);
            }
            Observation::Request(sample) => self.observe_request(sample),
            Observation::Iteration { duration } => {
                self.report.iterations = self.report.iterations.saturating_add(1);
                self.iteration_time = self.iteration_time.saturating_add(duration);
            }
        }
    }

    fn observe_request(&mut self, sample: RequestSample) {
        let requests = &mut self.report.requests;
        requests.total = requests.total.saturating_add(1);
        if sample.is_failure() {
            requests.failed = requests.failed.saturating_add(1);
        }
        if sample.timed_out {
            requests.timed_out = requests.timed_out.saturating_add(1);
        }
        if let Some(histogram) = self.histogram.as_mut()
            && let Err(err) = histogram.record(sample.latency)
        {
            tracing::warn!("Dropping latency sample: {}", err);
        }
    }

    #[must_use]
    pub fn finish(self) -> MetricsReport {
        let mut report = self.report;
        if let Some(histogram) = self.histogram.as_ref() {
            report.latency = histogram.summary();
        }
        report.histogram = self.histogram;
        report.iteration_avg = u32::try_from(report.iterations)
            .ok()
            .and_then(|iterations| self.iteration_time.checked_div(iterations))
            .unwrap_or(Duration::ZERO);
        report
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Spawns the collector. The returned handle resolves once every
/// [`super::ChannelRecorder`] clone has been dropped.
#[must_use]
pub fn setup_metrics_collector(
    mut rx: mpsc::UnboundedReceiver<Observation>,
) -> JoinHandle<MetricsReport> {
    tokio::spawn(async move {
        let mut collector = MetricsCollector::new();
        while let Some(observation) = rx.recv().await {
            collector.observe(observation);
        }
        collector.finish()
    })
}

/// Waits for the collector task to hand back its report.
///
/// # Errors
///
/// Returns an error if the collector task panicked or was cancelled.
pub(crate) async fn await_report(handle: JoinHandle<MetricsReport>) -> AppResult<MetricsReport> {
    handle
        .await
        .map_err(|err| AppError::metrics(MetricsError::CollectorStopped { source: err }))
}
