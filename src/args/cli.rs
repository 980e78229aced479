use clap::Parser;
use std::collections::BTreeMap;
use std::time::Duration;

use crate::error::{AppError, AppResult, ValidationError};
use crate::profile::{LoadProfile, Stage};

use super::parsers::{parse_duration_arg, parse_stage, parse_threshold_arg};
use super::types::{PositiveU64, ScriptKind};

#[derive(Debug, Parser, Clone)]
#[clap(
    version,
    about = "Staged virtual-user HTTP load runner in Rust - ramped VU schedules, per-iteration checks, named rate metrics, and threshold-gated exit codes.",
    next_help_heading = "Advanced Options"
)]
pub struct TesterArgs {
    /// Built-in iteration function to run for every virtual user
    #[arg(
        long,
        short = 's',
        default_value = "predict",
        value_enum,
        help_heading = "Common Options"
    )]
    pub script: ScriptKind,

    /// Ramp stage in 'DURATION:TARGET' format, e.g. 15s:200 (repeatable, replaces the script's default stages)
    #[arg(
        long = "stage",
        value_parser = parse_stage,
        help_heading = "Common Options"
    )]
    pub stages: Vec<Stage>,

    /// Virtual users running before the first stage starts ramping
    #[arg(long = "start-vus", default_value = "0")]
    pub start_vus: u64,

    /// Constant number of virtual users (requires --duration)
    #[arg(long, help_heading = "Common Options")]
    pub vus: Option<PositiveU64>,

    /// Length of a constant-VU run (supports ms/s/m/h, requires --vus)
    #[arg(
        long,
        short = 'd',
        value_parser = parse_duration_arg,
        help_heading = "Common Options"
    )]
    pub duration: Option<Duration>,

    /// Target URL override (repeatable; predict takes 1, headers takes 3)
    #[arg(long = "url", short = 'u', help_heading = "Common Options")]
    pub urls: Vec<String>,

    /// Request timeout (supports ms/s/m/h)
    #[arg(
        long = "timeout",
        default_value = "60s",
        value_parser = parse_duration_arg
    )]
    pub request_timeout: Duration,

    /// Timeout for establishing a new connection (supports ms/s/m/h)
    #[arg(
        long = "connect-timeout",
        default_value = "10s",
        value_parser = parse_duration_arg
    )]
    pub connect_timeout: Duration,

    /// How long in-flight iterations may run after the last stage ends
    #[arg(
        long = "graceful-stop",
        default_value = "30s",
        value_parser = parse_duration_arg
    )]
    pub graceful_stop: Duration,

    /// Scheduler tick used to spawn and retire virtual users
    #[arg(
        long = "tick",
        default_value = "100ms",
        value_parser = parse_duration_arg
    )]
    pub tick_interval: Duration,

    /// Pause each virtual user between iterations
    #[arg(long = "think-time", value_parser = parse_duration_arg)]
    pub think_time: Option<Duration>,

    /// Pass/fail criterion in 'METRIC=EXPRESSION' format, e.g. checks=rate>0.99 (repeatable)
    #[arg(
        long = "threshold",
        value_parser = parse_threshold_arg,
        help_heading = "Common Options"
    )]
    pub thresholds: Vec<(String, String)>,

    /// Write the end-of-run summary as JSON to this path
    #[arg(long = "summary-export")]
    pub summary_export: Option<String>,

    /// Do not print the end-of-run summary
    #[arg(long = "no-summary")]
    pub no_summary: bool,

    /// Skip TLS certificate verification
    #[arg(long)]
    pub insecure: bool,

    /// Disable the default User-Agent header (stagerun/<version>)
    #[arg(long = "no-ua")]
    pub no_ua: bool,

    /// Enable verbose logging (sets log level to debug unless overridden by STAGERUN_LOG/RUST_LOG)
    #[arg(long, short = 'v')]
    pub verbose: bool,

    /// Disable color output
    #[arg(long = "no-color")]
    pub no_color: bool,

    /// Path to config file (TOML/JSON). Defaults to ./stagerun.toml or ./stagerun.json if present.
    #[arg(long)]
    pub config: Option<String>,

    #[arg(skip)]
    pub config_thresholds: BTreeMap<String, Vec<String>>,
}

impl TesterArgs {
    /// Resolves the ramp this run follows: explicit stages, a constant
    /// `--vus`/`--duration` pair, or the standard 0 → 200 → 500 ramp.
    ///
    /// # Errors
    ///
    /// Returns an error when stages and vus/duration are mixed, when only one
    /// of vus/duration is set, or when the stages never run anything.
    pub fn load_profile(&self) -> AppResult<LoadProfile> {
        match (self.vus, self.duration) {
            (Some(_), _) | (_, Some(_)) if !self.stages.is_empty() => Err(AppError::validation(
                ValidationError::VusDurationStagesConflict,
            )),
            (Some(vus), Some(duration)) => LoadProfile::constant(vus.get(), duration),
            (Some(_), None) | (None, Some(_)) => {
                Err(AppError::validation(ValidationError::VusDurationIncomplete))
            }
            (None, None) if self.stages.is_empty() => {
                let mut profile = LoadProfile::standard_ramp();
                profile.start_vus = self.start_vus;
                Ok(profile)
            }
            (None, None) => LoadProfile::new(self.start_vus, self.stages.clone()),
        }
    }

    /// Thresholds from the config file followed by the ones given on the command line.
    #[must_use]
    pub fn threshold_sources(&self) -> Vec<(String, String)> {
        let mut sources: Vec<(String, String)> = self
            .config_thresholds
            .iter()
            .flat_map(|(metric, expressions)| {
                expressions
                    .iter()
                    .map(move |expression| (metric.clone(), expression.clone()))
            })
            .collect();
        sources.extend(self.thresholds.iter().cloned());
        sources
    }
}
