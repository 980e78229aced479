use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

use crate::args::{ScriptKind, parse_duration_arg};
use crate::error::ValidationError;

/// On-disk mirror of the CLI. Every field is optional; values only apply
/// where the command line left the option at its default.
#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    pub script: Option<ScriptKind>,
    pub start_vus: Option<u64>,
    pub stages: Option<Vec<StageConfig>>,
    pub vus: Option<u64>,
    pub duration: Option<DurationValue>,
    #[serde(alias = "url")]
    pub urls: Option<Vec<String>>,
    pub timeout: Option<DurationValue>,
    pub connect_timeout: Option<DurationValue>,
    pub graceful_stop: Option<DurationValue>,
    pub tick: Option<DurationValue>,
    pub think_time: Option<DurationValue>,
    pub thresholds: Option<BTreeMap<String, Vec<String>>>,
    pub summary_export: Option<String>,
    pub no_summary: Option<bool>,
    pub insecure: Option<bool>,
    pub no_ua: Option<bool>,
    pub no_color: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StageConfig {
    pub duration: DurationValue,
    pub target: u64,
}

/// Either whole seconds (`15`) or a unit string (`"15s"`, `"1m30s"`).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DurationValue {
    Seconds(u64),
    Text(String),
}

impl DurationValue {
    pub(crate) fn to_duration(&self) -> Result<Duration, ValidationError> {
        match self {
            DurationValue::Seconds(secs) => {
                if *secs == 0 {
                    Err(ValidationError::DurationZero)
                } else {
                    Ok(Duration::from_secs(*secs))
                }
            }
            DurationValue::Text(text) => parse_duration_arg(text),
        }
    }

    /// Stage durations may be zero (an instant jump to the target).
    pub(crate) fn to_stage_duration(&self) -> Result<Duration, ValidationError> {
        match self {
            DurationValue::Seconds(secs) => Ok(Duration::from_secs(*secs)),
            DurationValue::Text(text) => crate::args::parse_stage_duration(text),
        }
    }
}
