//! Virtual-user driver: follows the schedule, keeps one task per active VU,
//! and winds everything down when the ramp ends or a shutdown arrives.
mod driver;
mod vu;


use std::time::Duration;

use crate::args::TesterArgs;
use crate::error::AppResult;
use crate::profile::LoadProfile;

pub use driver::run_schedule;

#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub profile: LoadProfile,
    pub tick: Duration,
    pub graceful_stop: Duration,
    pub think_time: Option<Duration>,
}

impl RunnerConfig {
    /// # Errors
    ///
    /// Returns an error when the arguments do not describe a runnable profile.
    pub fn from_args(args: &TesterArgs) -> AppResult<Self> {
        Ok(Self {
            profile: args.load_profile()?,
            tick: args.tick_interval,
            graceful_stop: args.graceful_stop,
            think_time: args.think_time,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOutcome {
    pub elapsed: Duration,
    /// Most virtual users that were running at the same time.
    pub vus_max: u64,
    pub iterations: u64,
    /// Stopped early by a shutdown signal.
    pub interrupted: bool,
    /// VUs still mid-iteration when the graceful stop ran out.
    pub aborted_vus: usize,
}
