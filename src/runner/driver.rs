use std::sync::Arc;
use std::sync::atomic::Ordering;

use futures_util::future::join_all;
use tokio::sync::watch;
use tokio::task::{AbortHandle, JoinHandle};
use tokio::time::{Instant, MissedTickBehavior, interval, sleep};
use tracing::{debug, info, warn};

use crate::metrics::ChannelRecorder;
use crate::profile::Schedule;
use crate::script::{HttpCapability, Script};
use crate::shutdown::ShutdownSender;

use super::vu::{VuContext, VuCounters, run_vu};
use super::{RunOutcome, RunnerConfig};

/// Drives the schedule to completion.
///
/// Every tick publishes the current VU target and fills empty or finished
/// slots below it. VUs above the target retire on their own after their
/// current iteration. Once the ramp is over (or a shutdown is broadcast) the
/// target drops to zero, in-flight iterations get `graceful_stop` to finish,
/// and whatever is still running after that is aborted.
///
/// The recorder passed in is dropped before returning, so the collector can
/// finish as soon as the caller drops its own clones.
pub async fn run_schedule(
    config: &RunnerConfig,
    script: Arc<dyn Script>,
    http: Arc<dyn HttpCapability>,
    recorder: ChannelRecorder,
    shutdown_tx: &ShutdownSender,
) -> RunOutcome {
    let schedule = Schedule::new(&config.profile);
    let mut slots: Vec<Option<JoinHandle<()>>> = Vec::new();
    let mut slots_capped = false;

    let counters = Arc::new(VuCounters::default());
    let (target_tx, target_rx) = watch::channel(0_u64);
    let mut shutdown_rx = shutdown_tx.subscribe();

    let mut ticker = interval(config.tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let ramp_end = sleep(schedule.total_duration());
    tokio::pin!(ramp_end);

    let started = Instant::now();
    let mut current_stage = None;
    let mut interrupted = false;
    info!(
        "Ramping {} stage(s) over {:?}, up to {} VUs",
        config.profile.stages.len(),
        schedule.total_duration(),
        config.profile.peak_vus()
    );

    loop {
        tokio::select! {
            () = &mut ramp_end => break,
            _ = shutdown_rx.recv() => {
                interrupted = true;
                break;
            }
            _ = ticker.tick() => {
                let elapsed = started.elapsed();
                let stage = schedule.stage_index_at(elapsed);
                if stage != current_stage {
                    if let Some(index) = stage
                        && let Some(next) = config.profile.stages.get(index)
                    {
                        info!(
                            "Stage {}/{}: {} VUs over {:?}",
                            index.saturating_add(1),
                            config.profile.stages.len(),
                            next.target,
                            next.duration
                        );
                    }
                    current_stage = stage;
                }

                let target = schedule.target_at(elapsed);
                target_tx.send_if_modified(|current| {
                    if *current == target {
                        return false;
                    }
                    *current = target;
                    true
                });

                let wanted = usize::try_from(target).unwrap_or(usize::MAX);
                if !grow_slots(&mut slots, wanted) && !slots_capped {
                    slots_capped = true;
                    warn!(
                        "Cannot allocate {} VU slots, holding at {} VUs",
                        wanted,
                        slots.len()
                    );
                }
                for (id, slot) in slots.iter_mut().enumerate().take(wanted) {
                    if slot.as_ref().is_some_and(|handle| !handle.is_finished()) {
                        continue;
                    }
                    *slot = Some(tokio::spawn(run_vu(VuContext {
                        id: u64::try_from(id).unwrap_or(u64::MAX),
                        script: Arc::clone(&script),
                        http: Arc::clone(&http),
                        recorder: recorder.clone(),
                        target_rx: target_rx.clone(),
                        think_time: config.think_time,
                        counters: Arc::clone(&counters),
                    })));
                }
            }
        }
    }

    if interrupted {
        info!("Shutdown requested, stopping virtual users.");
    } else {
        debug!("Ramp finished after {:?}", started.elapsed());
    }
    target_tx.send_replace(0);
    drop(target_rx);
    drop(recorder);

    let handles: Vec<JoinHandle<()>> = slots.into_iter().flatten().collect();
    let aborted_vus = stop_gracefully(handles, config).await;

    RunOutcome {
        elapsed: started.elapsed(),
        vus_max: counters.peak.load(Ordering::Relaxed),
        iterations: counters.iterations.load(Ordering::Relaxed),
        interrupted,
        aborted_vus,
    }
}

/// Extends `slots` to `wanted` entries. Returns `false` when the allocation
/// fails, leaving the table at its previous length.
fn grow_slots(slots: &mut Vec<Option<JoinHandle<()>>>, wanted: usize) -> bool {
    let Some(missing) = wanted.checked_sub(slots.len()) else {
        return true;
    };
    if missing == 0 {
        return true;
    }
    if slots.try_reserve(missing).is_err() {
        return false;
    }
    slots.resize_with(wanted, || None);
    true
}

/// Waits up to `graceful_stop` for the remaining VUs, then aborts the rest.
/// Returns how many had to be aborted.
async fn stop_gracefully(handles: Vec<JoinHandle<()>>, config: &RunnerConfig) -> usize {
    let abort_handles: Vec<AbortHandle> = handles.iter().map(JoinHandle::abort_handle).collect();
    let running = abort_handles
        .iter()
        .filter(|handle| !handle.is_finished())
        .count();
    if running > 0 {
        info!(
            "Waiting up to {:?} for {} VU(s) to finish their iteration",
            config.graceful_stop, running
        );
    }

    if tokio::time::timeout(config.graceful_stop, join_all(handles))
        .await
        .is_ok()
    {
        return 0;
    }

    let unfinished: Vec<&AbortHandle> = abort_handles
        .iter()
        .filter(|handle| !handle.is_finished())
        .collect();
    warn!(
        "Graceful stop of {:?} expired, aborting {} VU(s)",
        config.graceful_stop,
        unfinished.len()
    );
    for handle in &unfinished {
        handle.abort();
    }
    unfinished.len()
}
