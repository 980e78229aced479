use std::time::Duration;

use super::LoadProfile;

#[derive(Debug, Clone, Copy)]
struct ScheduledStage {
    start_ms: u64,
    span_ms: u64,
    from: u64,
    to: u64,
}

/// A load profile resolved into absolute stage windows so the VU target can
/// be read at any point of the run.
#[derive(Debug, Clone)]
pub struct Schedule {
    stages: Vec<ScheduledStage>,
    start_vus: u64,
    total_ms: u64,
}

impl Schedule {
    #[must_use]
    pub fn new(profile: &LoadProfile) -> Self {
        let mut stages = Vec::with_capacity(profile.stages.len());
        let mut start_ms: u64 = 0;
        let mut from = profile.start_vus;
        for stage in &profile.stages {
            let span_ms = duration_millis(stage.duration);
            stages.push(ScheduledStage {
                start_ms,
                span_ms,
                from,
                to: stage.target,
            });
            start_ms = start_ms.saturating_add(span_ms);
            from = stage.target;
        }
        Self {
            stages,
            start_vus: profile.start_vus,
            total_ms: start_ms,
        }
    }

    #[must_use]
    pub const fn total_duration(&self) -> Duration {
        Duration::from_millis(self.total_ms)
    }

    /// Linearly interpolated VU target at `elapsed` into the run.
    #[must_use]
    pub fn target_at(&self, elapsed: Duration) -> u64 {
        let elapsed_ms = duration_millis(elapsed);
        match self.stage_at_ms(elapsed_ms) {
            Some((_, stage)) => interpolate(
                stage.from,
                stage.to,
                elapsed_ms.saturating_sub(stage.start_ms),
                stage.span_ms,
            ),
            None => self
                .stages
                .last()
                .map_or(self.start_vus, |stage| stage.to),
        }
    }

    /// Zero-based index of the stage running at `elapsed`, `None` once the
    /// schedule is over.
    #[must_use]
    pub fn stage_index_at(&self, elapsed: Duration) -> Option<usize> {
        self.stage_at_ms(duration_millis(elapsed))
            .map(|(idx, _)| idx)
    }

    fn stage_at_ms(&self, elapsed_ms: u64) -> Option<(usize, &ScheduledStage)> {
        self.stages.iter().enumerate().find(|(_, stage)| {
            elapsed_ms >= stage.start_ms
                && elapsed_ms < stage.start_ms.saturating_add(stage.span_ms)
        })
    }
}

fn interpolate(from: u64, to: u64, elapsed_ms: u64, span_ms: u64) -> u64 {
    if span_ms == 0 {
        return to;
    }
    let elapsed = u128::from(elapsed_ms.min(span_ms));
    let span = u128::from(span_ms);
    if to >= from {
        let step = u128::from(to.saturating_sub(from))
            .saturating_mul(elapsed)
            .checked_div(span)
            .unwrap_or(0);
        from.saturating_add(u64::try_from(step).unwrap_or(u64::MAX))
    } else {
        let step = u128::from(from.saturating_sub(to))
            .saturating_mul(elapsed)
            .checked_div(span)
            .unwrap_or(0);
        from.saturating_sub(u64::try_from(step).unwrap_or(u64::MAX))
    }
}

fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
