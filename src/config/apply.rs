use clap::ArgMatches;
use clap::parser::ValueSource;

use crate::args::{PositiveU64, TesterArgs};
use crate::error::{AppError, AppResult, ConfigError, ValidationError};
use crate::profile::Stage;

use super::types::{ConfigFile, DurationValue, StageConfig};

/// Applies configuration values to CLI arguments. Options given on the
/// command line always win.
///
/// # Errors
///
/// Returns an error when config values are invalid or conflict with each other.
pub fn apply_config(
    args: &mut TesterArgs,
    matches: &ArgMatches,
    config: &ConfigFile,
) -> AppResult<()> {
    if config.stages.is_some() && (config.vus.is_some() || config.duration.is_some()) {
        return Err(AppError::config(ConfigError::Conflict {
            left: "stages",
            right: "vus/duration",
        }));
    }

    if !is_cli(matches, "script")
        && let Some(script) = config.script
    {
        args.script = script;
    }

    if !is_cli(matches, "urls")
        && let Some(urls) = config.urls.as_ref()
    {
        args.urls.clone_from(urls);
    }

    apply_load(args, matches, config)?;

    if !is_cli(matches, "request_timeout")
        && let Some(timeout) = config.timeout.as_ref()
    {
        args.request_timeout = field_duration(timeout, "timeout")?;
    }

    if !is_cli(matches, "connect_timeout")
        && let Some(timeout) = config.connect_timeout.as_ref()
    {
        args.connect_timeout = field_duration(timeout, "connect_timeout")?;
    }

    if !is_cli(matches, "graceful_stop")
        && let Some(stop) = config.graceful_stop.as_ref()
    {
        args.graceful_stop = field_duration(stop, "graceful_stop")?;
    }

    if !is_cli(matches, "tick_interval")
        && let Some(tick) = config.tick.as_ref()
    {
        args.tick_interval = field_duration(tick, "tick")?;
    }

    if !is_cli(matches, "think_time")
        && let Some(think_time) = config.think_time.as_ref()
    {
        args.think_time = Some(field_duration(think_time, "think_time")?);
    }

    if let Some(thresholds) = config.thresholds.as_ref() {
        args.config_thresholds.clone_from(thresholds);
    }

    if !is_cli(matches, "summary_export")
        && let Some(path) = config.summary_export.as_ref()
    {
        args.summary_export = Some(path.clone());
    }

    apply_flag(matches, "no_summary", config.no_summary, &mut args.no_summary);
    apply_flag(matches, "insecure", config.insecure, &mut args.insecure);
    apply_flag(matches, "no_ua", config.no_ua, &mut args.no_ua);
    apply_flag(matches, "no_color", config.no_color, &mut args.no_color);

    Ok(())
}

/// Stages and constant vus/duration are two ways of describing the same
/// thing, so the config only fills in a shape the CLI did not pick.
fn apply_load(args: &mut TesterArgs, matches: &ArgMatches, config: &ConfigFile) -> AppResult<()> {
    let cli_stages = is_cli(matches, "stages");
    let cli_constant = is_cli(matches, "vus") || is_cli(matches, "duration");

    if !is_cli(matches, "start_vus")
        && let Some(start_vus) = config.start_vus
    {
        args.start_vus = start_vus;
    }

    if !cli_stages
        && !cli_constant
        && let Some(stages) = config.stages.as_ref()
    {
        args.stages = parse_stages(stages)?;
    }

    if !cli_stages {
        if !is_cli(matches, "vus")
            && let Some(vus) = config.vus
        {
            let vus = PositiveU64::try_from(vus).map_err(|err| {
                AppError::config(ConfigError::InvalidField {
                    field: "vus",
                    source: err,
                })
            })?;
            args.vus = Some(vus);
        }
        if !is_cli(matches, "duration")
            && let Some(duration) = config.duration.as_ref()
        {
            args.duration = Some(field_duration(duration, "duration")?);
        }
    }

    Ok(())
}

fn parse_stages(stages: &[StageConfig]) -> AppResult<Vec<Stage>> {
    stages
        .iter()
        .enumerate()
        .map(|(idx, stage)| {
            let duration = stage.duration.to_stage_duration().map_err(|err| {
                AppError::config(ConfigError::InvalidStageDuration {
                    index: idx.saturating_add(1),
                    source: err,
                })
            })?;
            Ok(Stage::new(duration, stage.target))
        })
        .collect()
}

fn field_duration(
    value: &DurationValue,
    field: &'static str,
) -> AppResult<std::time::Duration> {
    value.to_duration().map_err(|err: ValidationError| {
        AppError::config(ConfigError::InvalidField { field, source: err })
    })
}

fn apply_flag(matches: &ArgMatches, name: &str, value: Option<bool>, target: &mut bool) {
    if !is_cli(matches, name)
        && let Some(value) = value
    {
        *target = value;
    }
}

fn is_cli(matches: &ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(ValueSource::CommandLine)
}
