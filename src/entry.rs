use std::sync::Arc;

use chrono::Utc;
use clap::{ArgMatches, CommandFactory, FromArgMatches};
use tokio::sync::mpsc;
use tracing::info;

use crate::args::TesterArgs;
use crate::config::{apply_config, load_config};
use crate::error::AppResult;
use crate::http::{ReqwestHttp, build_client};
use crate::metrics::{ChannelRecorder, await_report, setup_metrics_collector};
use crate::runner::{RunnerConfig, run_schedule};
use crate::script::{HttpCapability, build_script};
use crate::shutdown::{setup_signal_shutdown_handler, shutdown_channel};
use crate::summary::{
    RunSummary, ensure_thresholds_passed, evaluate_thresholds, export_summary, parse_thresholds,
    summary_lines,
};

/// Parses the command line, overlays the config file, and runs the load test
/// on a multi-threaded runtime.
///
/// # Errors
///
/// Returns an error for invalid arguments or configuration, when the run
/// cannot be set up, or when a threshold is crossed.
pub fn run() -> AppResult<()> {
    let (mut args, matches) = parse_args()?;
    apply_config_file(&mut args, &matches)?;

    crate::logger::init_logging(args.verbose, args.no_color);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(run_async(args))
}

fn parse_args() -> AppResult<(TesterArgs, ArgMatches)> {
    let matches = TesterArgs::command().get_matches();
    let args = TesterArgs::from_arg_matches(&matches)?;
    Ok((args, matches))
}

fn apply_config_file(args: &mut TesterArgs, matches: &ArgMatches) -> AppResult<()> {
    if let Some(config) = load_config(args.config.as_deref())? {
        apply_config(args, matches, &config)?;
    }
    Ok(())
}

async fn run_async(args: TesterArgs) -> AppResult<()> {
    let script = build_script(args.script, &args.urls)?;
    let kind = script.kind();
    let runner = RunnerConfig::from_args(&args)?;
    let thresholds = parse_thresholds(&args.threshold_sources(), &script.rate_metrics())?;

    let (tx, rx) = mpsc::unbounded_channel();
    let collector = setup_metrics_collector(rx);
    let recorder = ChannelRecorder::new(tx);
    let http: Arc<dyn HttpCapability> =
        Arc::new(ReqwestHttp::new(build_client(&args)?, recorder.clone()));

    let (shutdown_tx, _) = shutdown_channel();
    let signal_handle = setup_signal_shutdown_handler(&shutdown_tx);

    info!(
        "Running '{}' script: {} stage(s), {:?} total, peak {} VUs",
        kind.as_str(),
        runner.profile.stages.len(),
        runner.profile.total_duration(),
        runner.profile.peak_vus()
    );
    let started_at = Utc::now();
    let outcome = run_schedule(&runner, script, http, recorder, &shutdown_tx).await;

    drop(shutdown_tx.send(()));
    signal_handle.await?;

    let report = await_report(collector).await?;
    let summary = RunSummary {
        script: kind,
        started_at,
        duration: outcome.elapsed,
        vus_max: outcome.vus_max,
        interrupted: outcome.interrupted,
        thresholds: evaluate_thresholds(&thresholds, &report),
        report,
    };

    if !args.no_summary {
        for line in summary_lines(&summary) {
            println!("{}", line);
        }
    }

    if let Some(path) = args.summary_export.as_deref() {
        export_summary(path, &summary).await?;
        info!("Summary exported to {}", path);
    }

    ensure_thresholds_passed(&summary.thresholds)
}
