use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{Instant, sleep_until};
use tracing::trace;

use crate::metrics::ChannelRecorder;
use crate::script::{HttpCapability, Script};

/// Shared counters the driver reads back once the run is over.
#[derive(Debug, Default)]
pub(super) struct VuCounters {
    pub(super) active: AtomicU64,
    pub(super) peak: AtomicU64,
    pub(super) iterations: AtomicU64,
}

pub(super) struct VuContext {
    pub(super) id: u64,
    pub(super) script: Arc<dyn Script>,
    pub(super) http: Arc<dyn HttpCapability>,
    pub(super) recorder: ChannelRecorder,
    pub(super) target_rx: watch::Receiver<u64>,
    pub(super) think_time: Option<Duration>,
    pub(super) counters: Arc<VuCounters>,
}

struct ActiveGuard<'counters> {
    counters: &'counters VuCounters,
}

impl<'counters> ActiveGuard<'counters> {
    fn acquire(counters: &'counters VuCounters) -> Self {
        let now_active = counters
            .active
            .fetch_add(1, Ordering::Relaxed)
            .saturating_add(1);
        counters.peak.fetch_max(now_active, Ordering::Relaxed);
        Self { counters }
    }
}

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        let active = &self.counters.active;
        loop {
            let current = active.load(Ordering::Relaxed);
            let Some(next) = current.checked_sub(1) else {
                break;
            };
            if active
                .compare_exchange(current, next, Ordering::Relaxed, Ordering::Relaxed)
                .is_ok()
            {
                break;
            }
        }
    }
}

/// Runs iterations until the published target drops to or below this VU's
/// slot, or the driver goes away. A running iteration is never cut short here.
pub(super) async fn run_vu(mut ctx: VuContext) {
    let _active = ActiveGuard::acquire(&ctx.counters);
    trace!("VU {} started", ctx.id);

    loop {
        if !is_wanted(&ctx.target_rx, ctx.id) {
            break;
        }

        let started = Instant::now();
        ctx.script.iterate(ctx.http.as_ref(), &ctx.recorder).await;
        ctx.recorder.record_iteration(started.elapsed());
        ctx.counters.iterations.fetch_add(1, Ordering::Relaxed);

        match ctx.think_time {
            Some(pause) => {
                if !think(&mut ctx.target_rx, ctx.id, pause).await {
                    break;
                }
            }
            None => tokio::task::yield_now().await,
        }
    }

    trace!("VU {} retired", ctx.id);
}

fn is_wanted(target_rx: &watch::Receiver<u64>, id: u64) -> bool {
    id < *target_rx.borrow()
}

/// Sleeps for `pause`, waking early only to retire. Returns `false` when the
/// VU should stop.
async fn think(target_rx: &mut watch::Receiver<u64>, id: u64, pause: Duration) -> bool {
    let deadline = Instant::now().checked_add(pause).unwrap_or_else(Instant::now);
    loop {
        tokio::select! {
            () = sleep_until(deadline) => return true,
            changed = target_rx.changed() => {
                if changed.is_err() || !is_wanted(target_rx, id) {
                    return false;
                }
            }
        }
    }
}
