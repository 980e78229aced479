use crate::metrics::RateTally;

use super::RunSummary;
use super::format::{format_basis_points, format_latency};
use super::thresholds::{CHECKS_METRIC, HTTP_REQ_DURATION_METRIC, HTTP_REQ_FAILED_METRIC};

/// Width of the dotted metric name column.
const NAME_WIDTH: usize = 28;
const PASS_MARK: &str = "✓";
const FAIL_MARK: &str = "✗";

pub fn summary_lines(summary: &RunSummary) -> Vec<String> {
    let report = &summary.report;
    let mut lines = Vec::new();

    lines.push(format!(
        "Run: script={} started={} duration={}{}",
        summary.script.as_str(),
        summary.started_at.to_rfc3339(),
        format_latency(summary.duration),
        if summary.interrupted { " (interrupted)" } else { "" }
    ));
    lines.push(String::new());

    for (name, tally) in &report.checks {
        let mark = if tally.fails == 0 { PASS_MARK } else { FAIL_MARK };
        lines.push(format!(
            "  {} {}  {} passed / {} failed",
            mark, name, tally.passes, tally.fails
        ));
    }
    if !report.checks.is_empty() {
        lines.push(String::new());
    }

    lines.push(metric_line(CHECKS_METRIC, &rate_value(report.checks_rate())));
    for (name, tally) in &report.rates {
        lines.push(metric_line(name, &rate_value(*tally)));
    }
    lines.push(metric_line(
        HTTP_REQ_DURATION_METRIC,
        &format!(
            "avg={} min={} med={} max={} p(90)={} p(95)={} p(99)={}",
            format_latency(report.latency.avg),
            format_latency(report.latency.min),
            format_latency(report.latency.med),
            format_latency(report.latency.max),
            format_latency(report.latency.p90),
            format_latency(report.latency.p95),
            format_latency(report.latency.p99),
        ),
    ));
    lines.push(metric_line(
        HTTP_REQ_FAILED_METRIC,
        &rate_value(report.requests.failure_rate()),
    ));
    lines.push(metric_line("http_reqs", &report.requests.total.to_string()));
    if report.requests.timed_out > 0 {
        lines.push(metric_line(
            "http_req_timeouts",
            &report.requests.timed_out.to_string(),
        ));
    }
    lines.push(metric_line(
        "iteration_duration",
        &format!("avg={}", format_latency(report.iteration_avg)),
    ));
    lines.push(metric_line("iterations", &report.iterations.to_string()));
    lines.push(metric_line("vus_max", &summary.vus_max.to_string()));

    if !summary.thresholds.is_empty() {
        lines.push(String::new());
        lines.push("Thresholds:".to_owned());
        for outcome in &summary.thresholds {
            let mark = if outcome.passed { PASS_MARK } else { FAIL_MARK };
            lines.push(format!(
                "  {} {}: {} (observed {})",
                mark, outcome.metric, outcome.expression, outcome.observed
            ));
        }
    }

    lines
}

fn metric_line(name: &str, value: &str) -> String {
    format!("  {:.<width$}: {}", name, value, width = NAME_WIDTH)
}

fn rate_value(tally: RateTally) -> String {
    format!(
        "{} ({} out of {})",
        format_basis_points(tally.basis_points()),
        tally.trues,
        tally.total
    )
}
