//! Load profile declaration and the VU schedule derived from it.
mod schedule;


use std::time::Duration;

use crate::error::{AppError, AppResult, ValidationError};

pub use schedule::Schedule;

/// A time-bounded ramp towards a concurrent virtual-user target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stage {
    pub duration: Duration,
    pub target: u64,
}

impl Stage {
    #[must_use]
    pub const fn new(duration: Duration, target: u64) -> Self {
        Self { duration, target }
    }
}

/// Ordered ramp stages plus the VU count the ramp starts from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadProfile {
    pub start_vus: u64,
    pub stages: Vec<Stage>,
}

impl LoadProfile {
    /// Builds a profile and rejects ones that would never run anything.
    ///
    /// # Errors
    ///
    /// Returns an error when the stages add up to zero time or no point of
    /// the ramp asks for a virtual user.
    pub fn new(start_vus: u64, stages: Vec<Stage>) -> AppResult<Self> {
        let profile = Self { start_vus, stages };
        if profile.total_duration().is_zero() {
            return Err(AppError::validation(ValidationError::ProfileWithoutDuration));
        }
        if profile.peak_vus() == 0 {
            return Err(AppError::validation(ValidationError::ProfileWithoutVus));
        }
        Ok(profile)
    }

    /// Constant load: `vus` users for `duration`.
    ///
    /// # Errors
    ///
    /// Returns an error when `duration` is zero.
    pub fn constant(vus: u64, duration: Duration) -> AppResult<Self> {
        Self::new(vus, vec![Stage::new(duration, vus)])
    }

    /// 0 → 200 VUs over 15s, then 200 → 500 over the next 15s.
    #[must_use]
    pub fn standard_ramp() -> Self {
        Self {
            start_vus: 0,
            stages: vec![
                Stage::new(Duration::from_secs(15), 200),
                Stage::new(Duration::from_secs(15), 500),
            ],
        }
    }

    #[must_use]
    pub fn total_duration(&self) -> Duration {
        self.stages
            .iter()
            .fold(Duration::ZERO, |total, stage| {
                total.saturating_add(stage.duration)
            })
    }

    /// Largest VU count the ramp ever asks for; bounds the worker pool.
    #[must_use]
    pub fn peak_vus(&self) -> u64 {
        self.stages
            .iter()
            .map(|stage| stage.target)
            .fold(self.start_vus, u64::max)
    }
}
