use std::time::Duration;

use tokio::sync::mpsc;

use crate::script::Recorder;

use super::{Observation, RequestSample};

/// Forwards observations to the collector task. Sending never blocks a VU; if
/// the collector is gone the observation is dropped.
#[derive(Debug, Clone)]
pub struct ChannelRecorder {
    tx: mpsc::UnboundedSender<Observation>,
}

impl ChannelRecorder {
    #[must_use]
    pub const fn new(tx: mpsc::UnboundedSender<Observation>) -> Self {
        Self { tx }
    }

    pub fn record_request(&self, sample: RequestSample) {
        drop(self.tx.send(Observation::Request(sample)));
    }

    pub fn record_iteration(&self, duration: Duration) {
        drop(self.tx.send(Observation::Iteration { duration }));
    }
}

impl Recorder for ChannelRecorder {
    fn check(&self, name: &str, passed: bool) {
        drop(self.tx.send(Observation::Check {
            name: name.to_owned(),
            passed,
        }));
    }

    fn add_rate(&self, name: &str, value: bool) {
        drop(self.tx.send(Observation::Rate {
            name: name.to_owned(),
            value,
        }));
    }
}
