use std::time::Duration;

use crate::error::{AppError, AppResult, ValidationError};
use crate::profile::Stage;

/// Milliseconds per supported duration unit.
const MILLIS_PER_SECOND: u64 = 1_000;
const MILLIS_PER_MINUTE: u64 = 60_000;
const MILLIS_PER_HOUR: u64 = 3_600_000;

/// Parses a duration that must be longer than zero (e.g. `500ms`, `15s`, `1m30s`).
pub(crate) fn parse_duration_arg(s: &str) -> Result<Duration, ValidationError> {
    let duration = parse_duration_value(s)?;
    if duration.is_zero() {
        return Err(ValidationError::DurationZero);
    }
    Ok(duration)
}

/// Parses a stage duration. Zero is allowed and means an immediate jump.
pub(crate) fn parse_stage_duration(s: &str) -> Result<Duration, ValidationError> {
    parse_duration_value(s)
}

pub(super) fn parse_stage(s: &str) -> AppResult<Stage> {
    let (duration_part, target_part) = s.split_once(':').ok_or_else(|| {
        AppError::validation(ValidationError::InvalidStageFormat {
            value: s.to_owned(),
        })
    })?;
    let duration = parse_stage_duration(duration_part).map_err(AppError::validation)?;
    let target: u64 = target_part.trim().parse().map_err(|err| {
        AppError::validation(ValidationError::InvalidStageTarget {
            value: s.to_owned(),
            source: err,
        })
    })?;
    Ok(Stage { duration, target })
}

pub(crate) fn parse_threshold_arg(s: &str) -> Result<(String, String), ValidationError> {
    match s.split_once('=') {
        Some((metric, expression))
            if !metric.trim().is_empty() && !expression.trim().is_empty() =>
        {
            Ok((metric.trim().to_owned(), expression.trim().to_owned()))
        }
        Some(_) | None => Err(ValidationError::InvalidThresholdFormat {
            value: s.to_owned(),
        }),
    }
}

fn parse_duration_value(s: &str) -> Result<Duration, ValidationError> {
    let value = s.trim();
    if value.is_empty() {
        return Err(ValidationError::DurationEmpty);
    }

    if value.chars().all(|ch| ch.is_ascii_digit()) {
        let secs: u64 = value
            .parse()
            .map_err(|err| ValidationError::InvalidDurationNumber {
                value: value.to_owned(),
                source: err,
            })?;
        return Ok(Duration::from_secs(secs));
    }

    let mut total_ms: u64 = 0;
    let mut rest = value;
    while !rest.is_empty() {
        let digits_len = rest.chars().take_while(char::is_ascii_digit).count();
        if digits_len == 0 {
            return Err(ValidationError::InvalidDurationFormat {
                value: value.to_owned(),
            });
        }
        let (num_part, tail) = rest.split_at(digits_len);
        let unit_len = tail
            .chars()
            .take_while(char::is_ascii_alphabetic)
            .count();
        if unit_len == 0 {
            return Err(ValidationError::InvalidDurationFormat {
                value: value.to_owned(),
            });
        }
        let (unit, remainder) = tail.split_at(unit_len);

        let number: u64 = num_part
            .parse()
            .map_err(|err| ValidationError::InvalidDurationNumber {
                value: value.to_owned(),
                source: err,
            })?;
        let factor = match unit {
            "ms" => 1,
            "s" => MILLIS_PER_SECOND,
            "m" => MILLIS_PER_MINUTE,
            "h" => MILLIS_PER_HOUR,
            _ => {
                return Err(ValidationError::InvalidDurationUnit {
                    unit: unit.to_owned(),
                });
            }
        };
        let part_ms = number
            .checked_mul(factor)
            .ok_or(ValidationError::DurationOverflow)?;
        total_ms = total_ms
            .checked_add(part_ms)
            .ok_or(ValidationError::DurationOverflow)?;
        rest = remainder;
    }

    Ok(Duration::from_millis(total_ms))
}
