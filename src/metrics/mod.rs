//! Observation types, the recorder handed to iterations, and the collector
//! task that aggregates everything into a [`MetricsReport`].
mod collector;
mod histogram;
mod recorder;
mod types;


pub(crate) use collector::await_report;
pub use collector::{MetricsCollector, setup_metrics_collector};
pub use histogram::LatencyHistogram;
pub use recorder::ChannelRecorder;
pub use types::{
    BASIS_POINTS, CheckTally, LatencySummary, MetricsReport, Observation, RateTally, RequestSample,
    RequestStats,
};
