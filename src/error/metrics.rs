use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("Histogram error during {context}: {source}")]
    Histogram {
        context: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("Metrics collector stopped before producing a report: {source}")]
    CollectorStopped {
        #[source]
        source: tokio::task::JoinError,
    },
    #[error("Failed to write summary export '{path}': {source}")]
    ExportWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to serialize summary export: {source}")]
    ExportSerialize {
        #[source]
        source: serde_json::Error,
    },
    #[cfg(test)]
    #[error("Test expectation failed: {message}")]
    TestExpectation { message: &'static str },
    #[cfg(test)]
    #[error("Test expectation failed: {message}: {value}")]
    TestExpectationValue {
        message: &'static str,
        value: String,
    },
}
