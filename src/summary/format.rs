use std::time::Duration;

/// Basis points per percent.
const BP_PER_PERCENT: u64 = 100;
const MICROS_PER_MS: u128 = 1_000;
const MICROS_PER_SEC: u128 = 1_000_000;
/// Hundredths of a millisecond, expressed in microseconds.
const MICROS_PER_CENTI_MS: u128 = 10;
/// Hundredths of a second, expressed in microseconds.
const MICROS_PER_CENTI_SEC: u128 = 10_000;

/// `9950` → `"99.50%"`.
pub(crate) fn format_basis_points(basis_points: u64) -> String {
    format!(
        "{}.{:02}%",
        basis_points / BP_PER_PERCENT,
        basis_points % BP_PER_PERCENT
    )
}

/// Two decimals in the largest unit that keeps the whole part non-zero.
pub(crate) fn format_latency(duration: Duration) -> String {
    let micros = duration.as_micros();
    if micros >= MICROS_PER_SEC {
        format!(
            "{}.{:02}s",
            micros / MICROS_PER_SEC,
            (micros % MICROS_PER_SEC) / MICROS_PER_CENTI_SEC
        )
    } else if micros >= MICROS_PER_MS {
        format!(
            "{}.{:02}ms",
            micros / MICROS_PER_MS,
            (micros % MICROS_PER_MS) / MICROS_PER_CENTI_MS
        )
    } else {
        format!("{}µs", micros)
    }
}
