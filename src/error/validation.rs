use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Duration must not be empty.")]
    DurationEmpty,
    #[error("Invalid duration '{value}'.")]
    InvalidDurationFormat { value: String },
    #[error("Invalid duration '{value}': {source}")]
    InvalidDurationNumber {
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("Duration overflow.")]
    DurationOverflow,
    #[error("Invalid duration unit '{unit}'.")]
    InvalidDurationUnit { unit: String },
    #[error("Duration must be > 0.")]
    DurationZero,
    #[error("Value must be >= {min}.")]
    ValueTooSmall { min: u64 },
    #[error("Invalid value: {source}")]
    InvalidNumber {
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("Invalid stage '{value}'. Expected 'DURATION:TARGET' (e.g. 15s:200).")]
    InvalidStageFormat { value: String },
    #[error("Invalid stage target in '{value}': {source}")]
    InvalidStageTarget {
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("Load profile must last longer than 0s.")]
    ProfileWithoutDuration,
    #[error("Load profile never schedules a virtual user.")]
    ProfileWithoutVus,
    #[error("--vus and --duration must be used together.")]
    VusDurationIncomplete,
    #[error("--vus/--duration cannot be combined with --stage.")]
    VusDurationStagesConflict,
    #[error("Script '{script}' needs {expected} URL(s), got {actual}.")]
    UrlCountMismatch {
        script: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("Invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("Unsupported URL scheme in '{url}'. Use http or https.")]
    UnsupportedUrlScheme { url: String },
    #[error("Invalid threshold '{value}'. Expected 'METRIC=EXPRESSION'.")]
    InvalidThresholdFormat { value: String },
    #[error("Invalid threshold expression '{expression}'.")]
    InvalidThresholdExpression { expression: String },
    #[error("Invalid threshold value in '{expression}'.")]
    InvalidThresholdValue { expression: String },
    #[error("Threshold '{expression}' does not apply to metric '{metric}'.")]
    ThresholdAggregationMismatch { metric: String, expression: String },
    #[error("Unknown threshold metric '{metric}'.")]
    UnknownThresholdMetric { metric: String },
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
