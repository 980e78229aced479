use std::time::Duration;

use crate::error::{AppError, AppResult, ConfigError, ValidationError};
use crate::metrics::{BASIS_POINTS, MetricsReport, RateTally};

use super::format::{format_basis_points, format_latency};

pub const CHECKS_METRIC: &str = "checks";
pub const HTTP_REQ_FAILED_METRIC: &str = "http_req_failed";
pub const HTTP_REQ_DURATION_METRIC: &str = "http_req_duration";

/// Decimal digits kept for rate values (basis points).
const RATE_SCALE_DIGITS: u32 = 4;
/// Decimal digits kept for millisecond values (microseconds).
const LATENCY_SCALE_DIGITS: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Lt,
    Le,
    Gt,
    Ge,
}

impl Comparison {
    fn holds<T: Ord>(self, observed: T, bound: T) -> bool {
        match self {
            Comparison::Lt => observed < bound,
            Comparison::Le => observed <= bound,
            Comparison::Gt => observed > bound,
            Comparison::Ge => observed >= bound,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregate {
    Rate,
    Avg,
    Min,
    Med,
    Max,
    Percentile(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    BasisPoints(u64),
    Latency(Duration),
}

/// One parsed `METRIC=EXPRESSION` criterion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Threshold {
    pub metric: String,
    pub expression: String,
    pub aggregate: Aggregate,
    pub comparison: Comparison,
    pub bound: Bound,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThresholdOutcome {
    pub metric: String,
    pub expression: String,
    pub passed: bool,
    pub observed: String,
}

enum MetricKind {
    Rate,
    Latency,
}

/// Parses every threshold source against the metrics this run can produce.
///
/// # Errors
///
/// Returns a configuration error naming the metric of the first threshold
/// that is malformed or refers to an unknown metric.
pub fn parse_thresholds(
    sources: &[(String, String)],
    rate_metrics: &[String],
) -> AppResult<Vec<Threshold>> {
    sources
        .iter()
        .map(|(metric, expression)| {
            parse_threshold(metric, expression, rate_metrics).map_err(|err| {
                AppError::config(ConfigError::InvalidThreshold {
                    metric: metric.clone(),
                    source: err,
                })
            })
        })
        .collect()
}

pub(crate) fn parse_threshold(
    metric: &str,
    expression: &str,
    rate_metrics: &[String],
) -> Result<Threshold, ValidationError> {
    let kind = metric_kind(metric, rate_metrics).ok_or_else(|| {
        ValidationError::UnknownThresholdMetric {
            metric: metric.to_owned(),
        }
    })?;
    let compact: String = expression.chars().filter(|ch| !ch.is_whitespace()).collect();
    let invalid = || ValidationError::InvalidThresholdExpression {
        expression: expression.to_owned(),
    };

    let operator_at = compact.find(['<', '>']).ok_or_else(invalid)?;
    let (aggregate_part, rest) = compact.split_at(operator_at);
    let (comparison, value_part) = if let Some(value) = rest.strip_prefix("<=") {
        (Comparison::Le, value)
    } else if let Some(value) = rest.strip_prefix(">=") {
        (Comparison::Ge, value)
    } else if let Some(value) = rest.strip_prefix('<') {
        (Comparison::Lt, value)
    } else if let Some(value) = rest.strip_prefix('>') {
        (Comparison::Gt, value)
    } else {
        return Err(invalid());
    };

    let aggregate = parse_aggregate(aggregate_part).ok_or_else(invalid)?;
    let mismatch = || ValidationError::ThresholdAggregationMismatch {
        metric: metric.to_owned(),
        expression: expression.to_owned(),
    };
    let invalid_value = || ValidationError::InvalidThresholdValue {
        expression: expression.to_owned(),
    };

    let bound = match kind {
        MetricKind::Rate if aggregate == Aggregate::Rate => {
            let basis_points =
                parse_fixed_point(value_part, RATE_SCALE_DIGITS).ok_or_else(invalid_value)?;
            if basis_points > BASIS_POINTS {
                return Err(invalid_value());
            }
            Bound::BasisPoints(basis_points)
        }
        MetricKind::Latency if aggregate != Aggregate::Rate => {
            let micros =
                parse_fixed_point(value_part, LATENCY_SCALE_DIGITS).ok_or_else(invalid_value)?;
            Bound::Latency(Duration::from_micros(micros))
        }
        MetricKind::Rate | MetricKind::Latency => return Err(mismatch()),
    };

    Ok(Threshold {
        metric: metric.to_owned(),
        expression: expression.trim().to_owned(),
        aggregate,
        comparison,
        bound,
    })
}

fn metric_kind(metric: &str, rate_metrics: &[String]) -> Option<MetricKind> {
    match metric {
        CHECKS_METRIC | HTTP_REQ_FAILED_METRIC => Some(MetricKind::Rate),
        HTTP_REQ_DURATION_METRIC => Some(MetricKind::Latency),
        other if rate_metrics.iter().any(|name| name == other) => Some(MetricKind::Rate),
        _ => None,
    }
}

fn parse_aggregate(value: &str) -> Option<Aggregate> {
    match value {
        "rate" => Some(Aggregate::Rate),
        "avg" => Some(Aggregate::Avg),
        "min" => Some(Aggregate::Min),
        "med" => Some(Aggregate::Med),
        "max" => Some(Aggregate::Max),
        other => {
            let pct: u32 = other
                .strip_prefix("p(")?
                .strip_suffix(')')?
                .parse()
                .ok()?;
            (pct <= 100).then_some(Aggregate::Percentile(pct))
        }
    }
}

/// Parses `"12.5"` into an integer scaled by `10^scale_digits` without going
/// through floats. Extra fraction digits are rejected rather than rounded.
fn parse_fixed_point(value: &str, scale_digits: u32) -> Option<u64> {
    let (whole, fraction) = value.split_once('.').unwrap_or((value, ""));
    if whole.is_empty() && fraction.is_empty() {
        return None;
    }
    let all_digits = |part: &str| part.chars().all(|ch| ch.is_ascii_digit());
    if !all_digits(whole) || !all_digits(fraction) {
        return None;
    }
    let fraction_len = u32::try_from(fraction.len()).ok()?;
    if fraction_len > scale_digits {
        return None;
    }

    let scale = 10_u64.checked_pow(scale_digits)?;
    let whole_value: u64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let fraction_value: u64 = if fraction.is_empty() {
        0
    } else {
        fraction.parse().ok()?
    };
    let fraction_scale = 10_u64.checked_pow(scale_digits.checked_sub(fraction_len)?)?;

    whole_value
        .checked_mul(scale)?
        .checked_add(fraction_value.checked_mul(fraction_scale)?)
}

impl Threshold {
    #[must_use]
    pub fn evaluate(&self, report: &MetricsReport) -> ThresholdOutcome {
        let (passed, observed) = match self.bound {
            Bound::BasisPoints(bound) => {
                let tally = rate_for(&self.metric, report);
                (
                    rate_holds(self.comparison, tally, bound),
                    format_basis_points(tally.basis_points()),
                )
            }
            Bound::Latency(bound) => {
                let observed = latency_for(self.aggregate, report);
                (
                    self.comparison.holds(observed, bound),
                    format_latency(observed),
                )
            }
        };
        ThresholdOutcome {
            metric: self.metric.clone(),
            expression: self.expression.clone(),
            passed,
            observed,
        }
    }
}

/// Compares `trues / total` against `bound / 10_000` without rounding the
/// observed side. An empty tally reads as 0.
fn rate_holds(comparison: Comparison, tally: RateTally, bound: u64) -> bool {
    if tally.total == 0 {
        return comparison.holds(0, bound);
    }
    let observed = u128::from(tally.trues).saturating_mul(u128::from(BASIS_POINTS));
    let limit = u128::from(bound).saturating_mul(u128::from(tally.total));
    comparison.holds(observed, limit)
}

fn rate_for(metric: &str, report: &MetricsReport) -> RateTally {
    match metric {
        CHECKS_METRIC => report.checks_rate(),
        HTTP_REQ_FAILED_METRIC => report.requests.failure_rate(),
        other => report.rates.get(other).copied().unwrap_or_default(),
    }
}

fn latency_for(aggregate: Aggregate, report: &MetricsReport) -> Duration {
    match aggregate {
        Aggregate::Avg => report.latency.avg,
        Aggregate::Min => report.latency.min,
        Aggregate::Med => report.latency.med,
        Aggregate::Max => report.latency.max,
        Aggregate::Percentile(pct) => report.latency_percentile(pct),
        Aggregate::Rate => Duration::ZERO,
    }
}

#[must_use]
pub fn evaluate_thresholds(
    thresholds: &[Threshold],
    report: &MetricsReport,
) -> Vec<ThresholdOutcome> {
    thresholds
        .iter()
        .map(|threshold| threshold.evaluate(report))
        .collect()
}

/// Turns crossed thresholds into the run's final error.
///
/// # Errors
///
/// Returns [`AppError::ThresholdsCrossed`] when any outcome failed.
pub fn ensure_thresholds_passed(outcomes: &[ThresholdOutcome]) -> AppResult<()> {
    let crossed: Vec<String> = outcomes
        .iter()
        .filter(|outcome| !outcome.passed)
        .map(|outcome| format!("{}={}", outcome.metric, outcome.expression))
        .collect();
    if crossed.is_empty() {
        return Ok(());
    }
    Err(AppError::ThresholdsCrossed {
        count: crossed.len(),
        metrics: crossed.join(", "),
    })
}
