use super::parsers::parse_stage;
use super::test_support::parse_test_args;
use super::*;
use crate::error::{AppError, AppResult};
use std::time::Duration;

#[test]
fn parse_args_defaults() -> AppResult<()> {
    let args = parse_test_args(["stagerun"])?;

    let checks = [
        (
            matches!(args.script, ScriptKind::Predict),
            "Expected ScriptKind::Predict",
        ),
        (args.stages.is_empty(), "Expected no CLI stages"),
        (args.start_vus == 0, "Unexpected start_vus"),
        (args.vus.is_none(), "Expected vus to be None"),
        (args.duration.is_none(), "Expected duration to be None"),
        (args.urls.is_empty(), "Expected no URL overrides"),
        (
            args.request_timeout == Duration::from_secs(60),
            "Unexpected request_timeout",
        ),
        (
            args.connect_timeout == Duration::from_secs(10),
            "Unexpected connect_timeout",
        ),
        (
            args.graceful_stop == Duration::from_secs(30),
            "Unexpected graceful_stop",
        ),
        (
            args.tick_interval == Duration::from_millis(100),
            "Unexpected tick_interval",
        ),
        (args.think_time.is_none(), "Expected think_time to be None"),
        (args.thresholds.is_empty(), "Expected no thresholds"),
        (
            args.summary_export.is_none(),
            "Expected summary_export to be None",
        ),
        (!args.no_summary, "Expected no_summary to be false"),
        (!args.insecure, "Expected insecure to be false"),
        (!args.no_ua, "Expected no_ua to be false"),
        (!args.verbose, "Expected verbose to be false"),
        (args.config.is_none(), "Expected config to be None"),
    ];

    for (ok, message) in checks {
        if !ok {
            return Err(AppError::validation(message));
        }
    }
    Ok(())
}

#[test]
fn parse_args_repeated_stages_keep_order() -> AppResult<()> {
    let args = parse_test_args([
        "stagerun",
        "--stage",
        "10s:50",
        "--stage",
        "1m30s:20",
        "--stage",
        "0:0",
    ])?;

    let expected = [
        (Duration::from_secs(10), 50),
        (Duration::from_secs(90), 20),
        (Duration::ZERO, 0),
    ];
    if args.stages.len() != expected.len() {
        return Err(AppError::validation(format!(
            "Expected 3 stages, got {}",
            args.stages.len()
        )));
    }
    for (stage, (duration, target)) in args.stages.iter().zip(expected) {
        if stage.duration != duration || stage.target != target {
            return Err(AppError::validation(format!(
                "Unexpected stage: {:?}",
                stage
            )));
        }
    }
    Ok(())
}

#[test]
fn parse_args_headers_script_with_urls() -> AppResult<()> {
    let args = parse_test_args([
        "stagerun",
        "-s",
        "headers",
        "-u",
        "http://a.test/headers",
        "-u",
        "http://b.test/headers",
        "-u",
        "http://c.test/headers",
    ])?;

    if !matches!(args.script, ScriptKind::Headers) {
        return Err(AppError::validation("Expected ScriptKind::Headers"));
    }
    if args.urls.len() != 3 {
        return Err(AppError::validation("Expected three URLs"));
    }
    Ok(())
}

#[test]
fn parse_args_constant_vus() -> AppResult<()> {
    let args = parse_test_args(["stagerun", "--vus", "25", "-d", "2m"])?;

    if args.vus.map(PositiveU64::get) != Some(25) {
        return Err(AppError::validation("Unexpected vus"));
    }
    if args.duration != Some(Duration::from_secs(120)) {
        return Err(AppError::validation("Unexpected duration"));
    }
    Ok(())
}

#[test]
fn parse_args_rejects_zero_vus() -> AppResult<()> {
    if parse_test_args(["stagerun", "--vus", "0", "-d", "10s"]).is_ok() {
        return Err(AppError::validation("Expected --vus 0 to be rejected"));
    }
    Ok(())
}

#[test]
fn parse_args_thresholds_split_at_first_equals() -> AppResult<()> {
    let args = parse_test_args([
        "stagerun",
        "--threshold",
        "failed_requests_1=rate<0.1",
        "--threshold",
        "http_req_duration=p(95)<=500",
    ])?;

    let expected = [
        ("failed_requests_1", "rate<0.1"),
        ("http_req_duration", "p(95)<=500"),
    ];
    for ((metric, expression), (want_metric, want_expression)) in
        args.thresholds.iter().zip(expected)
    {
        if metric != want_metric || expression != want_expression {
            return Err(AppError::validation(format!(
                "Unexpected threshold {}={}",
                metric, expression
            )));
        }
    }
    Ok(())
}

#[test]
fn parse_threshold_arg_rejects_missing_parts() -> AppResult<()> {
    for value in ["checks", "=rate>0.9", "checks=", "  =  "] {
        if parse_threshold_arg(value).is_ok() {
            return Err(AppError::validation(format!(
                "Expected '{}' to be rejected",
                value
            )));
        }
    }
    Ok(())
}

#[test]
fn parse_duration_arg_units() -> AppResult<()> {
    let cases = [
        ("15", Duration::from_secs(15)),
        ("250ms", Duration::from_millis(250)),
        ("15s", Duration::from_secs(15)),
        ("2m", Duration::from_secs(120)),
        ("1h", Duration::from_secs(3_600)),
        ("1m30s", Duration::from_secs(90)),
        ("1s500ms", Duration::from_millis(1_500)),
    ];
    for (input, expected) in cases {
        let parsed = parse_duration_arg(input)?;
        if parsed != expected {
            return Err(AppError::validation(format!(
                "Expected {} to parse as {:?}, got {:?}",
                input, expected, parsed
            )));
        }
    }
    Ok(())
}

#[test]
fn parse_duration_arg_rejects_bad_values() -> AppResult<()> {
    for input in ["", "0", "0s", "s", "10x", "1.5s", "-3s", "10s5"] {
        if parse_duration_arg(input).is_ok() {
            return Err(AppError::validation(format!(
                "Expected '{}' to be rejected",
                input
            )));
        }
    }
    Ok(())
}

#[test]
fn parse_stage_duration_allows_zero() -> AppResult<()> {
    if parse_stage_duration("0s")? != Duration::ZERO {
        return Err(AppError::validation("Expected zero stage duration"));
    }
    Ok(())
}

#[test]
fn parse_stage_rejects_malformed_values() -> AppResult<()> {
    for input in ["15s", "15s:", "15s:-1", "abc:10", ":10"] {
        if parse_stage(input).is_ok() {
            return Err(AppError::validation(format!(
                "Expected stage '{}' to be rejected",
                input
            )));
        }
    }
    Ok(())
}

#[test]
fn threshold_sources_put_config_first() -> AppResult<()> {
    let mut args = parse_test_args(["stagerun", "--threshold", "checks=rate>0.5"])?;
    args.config_thresholds
        .insert("http_req_failed".to_owned(), vec!["rate<0.1".to_owned()]);

    let sources = args.threshold_sources();
    let names: Vec<&str> = sources.iter().map(|(metric, _)| metric.as_str()).collect();
    if names != ["http_req_failed", "checks"] {
        return Err(AppError::validation(format!(
            "Unexpected threshold order: {:?}",
            names
        )));
    }
    Ok(())
}

#[test]
fn load_profile_defaults_to_standard_ramp() -> AppResult<()> {
    let args = parse_test_args(["stagerun"])?;
    if args.load_profile()? != crate::profile::LoadProfile::standard_ramp() {
        return Err(AppError::validation("Expected the standard ramp"));
    }
    Ok(())
}

#[test]
fn load_profile_from_vus_and_duration() -> AppResult<()> {
    let args = parse_test_args(["stagerun", "--vus", "5", "--duration", "20s"])?;
    let profile = args.load_profile()?;
    if profile.peak_vus() != 5 || profile.total_duration() != Duration::from_secs(20) {
        return Err(AppError::validation(format!(
            "Unexpected constant profile: {:?}",
            profile
        )));
    }
    Ok(())
}

#[test]
fn load_profile_from_stages_keeps_start_vus() -> AppResult<()> {
    let args = parse_test_args(["stagerun", "--start-vus", "3", "--stage", "5s:10"])?;
    let profile = args.load_profile()?;
    if profile.start_vus != 3 || profile.stages.len() != 1 {
        return Err(AppError::validation(format!(
            "Unexpected staged profile: {:?}",
            profile
        )));
    }
    Ok(())
}

#[test]
fn load_profile_rejects_mixed_or_partial_shapes() -> AppResult<()> {
    let cases: [&[&str]; 3] = [
        &["stagerun", "--vus", "5"],
        &["stagerun", "--duration", "5s"],
        &["stagerun", "--vus", "5", "--duration", "5s", "--stage", "5s:5"],
    ];
    for case in cases {
        let args = parse_test_args(case.iter().copied())?;
        if args.load_profile().is_ok() {
            return Err(AppError::validation(format!(
                "Expected {:?} to be rejected",
                case
            )));
        }
    }
    Ok(())
}

#[test]
fn load_profile_rejects_all_zero_stages() -> AppResult<()> {
    let args = parse_test_args(["stagerun", "--stage", "10s:0"])?;
    if args.load_profile().is_ok() {
        return Err(AppError::validation("Expected a VU-less ramp to be rejected"));
    }
    Ok(())
}
