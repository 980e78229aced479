//! End-of-run summary: threshold evaluation, the text report, and the JSON
//! export.
mod export;
mod format;
mod render;
mod thresholds;


use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::args::ScriptKind;
use crate::metrics::MetricsReport;

pub use export::export_summary;
pub use render::summary_lines;
pub use thresholds::{
    Aggregate, Bound, CHECKS_METRIC, Comparison, HTTP_REQ_DURATION_METRIC,
    HTTP_REQ_FAILED_METRIC, Threshold, ThresholdOutcome, ensure_thresholds_passed,
    evaluate_thresholds, parse_thresholds,
};

/// Everything reported once the last virtual user is gone.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub script: ScriptKind,
    pub started_at: DateTime<Utc>,
    pub duration: Duration,
    pub vus_max: u64,
    pub interrupted: bool,
    pub report: MetricsReport,
    pub thresholds: Vec<ThresholdOutcome>,
}
