use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;
use tokio::io::{AsyncWriteExt, BufWriter};

use crate::error::{AppError, AppResult, MetricsError};
use crate::metrics::{CheckTally, LatencySummary, RateTally};

use super::RunSummary;

#[derive(Debug, Serialize)]
struct SummaryExport<'a> {
    script: &'a str,
    started_at: String,
    duration_ms: u64,
    interrupted: bool,
    vus_max: u64,
    iterations: u64,
    iteration_avg_us: u64,
    checks: BTreeMap<&'a str, CheckExport>,
    rates: BTreeMap<&'a str, RateExport>,
    http_reqs: u64,
    http_req_timeouts: u64,
    http_req_failed: RateExport,
    http_req_duration: LatencyExport,
    thresholds: Vec<ThresholdExport<'a>>,
}

#[derive(Debug, Serialize)]
struct CheckExport {
    passes: u64,
    fails: u64,
}

#[derive(Debug, Serialize)]
struct RateExport {
    trues: u64,
    total: u64,
    rate_bp: u64,
}

/// Latencies in microseconds.
#[derive(Debug, Serialize)]
struct LatencyExport {
    min_us: u64,
    avg_us: u64,
    med_us: u64,
    p90_us: u64,
    p95_us: u64,
    p99_us: u64,
    max_us: u64,
}

#[derive(Debug, Serialize)]
struct ThresholdExport<'a> {
    metric: &'a str,
    expression: &'a str,
    passed: bool,
    observed: &'a str,
}

impl From<&CheckTally> for CheckExport {
    fn from(tally: &CheckTally) -> Self {
        Self {
            passes: tally.passes,
            fails: tally.fails,
        }
    }
}

impl From<RateTally> for RateExport {
    fn from(tally: RateTally) -> Self {
        Self {
            trues: tally.trues,
            total: tally.total,
            rate_bp: tally.basis_points(),
        }
    }
}

impl From<&LatencySummary> for LatencyExport {
    fn from(latency: &LatencySummary) -> Self {
        Self {
            min_us: micros(latency.min),
            avg_us: micros(latency.avg),
            med_us: micros(latency.med),
            p90_us: micros(latency.p90),
            p95_us: micros(latency.p95),
            p99_us: micros(latency.p99),
            max_us: micros(latency.max),
        }
    }
}

fn micros(duration: Duration) -> u64 {
    u64::try_from(duration.as_micros()).unwrap_or(u64::MAX)
}

fn build_export(summary: &RunSummary) -> SummaryExport<'_> {
    let report = &summary.report;
    SummaryExport {
        script: summary.script.as_str(),
        started_at: summary.started_at.to_rfc3339(),
        duration_ms: u64::try_from(summary.duration.as_millis()).unwrap_or(u64::MAX),
        interrupted: summary.interrupted,
        vus_max: summary.vus_max,
        iterations: report.iterations,
        iteration_avg_us: micros(report.iteration_avg),
        checks: report
            .checks
            .iter()
            .map(|(name, tally)| (name.as_str(), CheckExport::from(tally)))
            .collect(),
        rates: report
            .rates
            .iter()
            .map(|(name, tally)| (name.as_str(), RateExport::from(*tally)))
            .collect(),
        http_reqs: report.requests.total,
        http_req_timeouts: report.requests.timed_out,
        http_req_failed: RateExport::from(report.requests.failure_rate()),
        http_req_duration: LatencyExport::from(&report.latency),
        thresholds: summary
            .thresholds
            .iter()
            .map(|outcome| ThresholdExport {
                metric: &outcome.metric,
                expression: &outcome.expression,
                passed: outcome.passed,
                observed: &outcome.observed,
            })
            .collect(),
    }
}

/// Writes the summary as pretty-printed JSON.
///
/// # Errors
///
/// Returns an error when the summary cannot be serialized or the file
/// cannot be written.
pub async fn export_summary(path: &str, summary: &RunSummary) -> AppResult<()> {
    let json = serde_json::to_vec_pretty(&build_export(summary))
        .map_err(|err| AppError::metrics(MetricsError::ExportSerialize { source: err }))?;
    let write_error = |err: std::io::Error| {
        AppError::metrics(MetricsError::ExportWrite {
            path: PathBuf::from(path),
            source: err,
        })
    };

    let file = tokio::fs::File::create(path).await.map_err(write_error)?;
    let mut writer = BufWriter::new(file);
    writer.write_all(&json).await.map_err(write_error)?;
    writer.write_all(b"\n").await.map_err(write_error)?;
    writer.flush().await.map_err(write_error)?;
    Ok(())
}
