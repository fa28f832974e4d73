//! Duration strings in the `1h30m` / `1.5s` / `300ms` notation.
//!
//! A duration is a sequence of decimal numbers, each with an optional
//! fraction and a mandatory unit suffix: `ns`, `us` (`µs`), `ms`, `s`,
//! `m`, `h`. The bare string `0` is also accepted.

use std::time::Duration;

use thiserror::Error;

const NANOS_PER_SEC: u128 = 1_000_000_000;

/// Fraction digits beyond this are ignored (well below nanosecond precision).
const MAX_FRACTION_DIGITS: usize = 18;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DurationError {
    #[error("empty duration")]
    Empty,

    #[error("negative duration: {0}")]
    Negative(String),

    #[error("invalid duration: {0}")]
    Invalid(String),

    #[error("missing unit in duration: {0}")]
    MissingUnit(String),

    #[error("unknown unit '{unit}' in duration: {input}")]
    UnknownUnit { unit: String, input: String },

    #[error("duration out of range: {0}")]
    Overflow(String),
}

fn unit_nanos(unit: &str) -> Option<u128> {
    Some(match unit {
        "ns" => 1,
        "us" | "µs" | "μs" => 1_000,
        "ms" => 1_000_000,
        "s" => NANOS_PER_SEC,
        "m" => 60 * NANOS_PER_SEC,
        "h" => 3600 * NANOS_PER_SEC,
        _ => return None,
    })
}

/// Parse a duration such as `90s`, `2h45m` or `1.5h`.
pub fn parse_duration(input: &str) -> Result<Duration, DurationError> {
    let mut s = input.trim();
    if s.is_empty() {
        return Err(DurationError::Empty);
    }
    if s == "0" {
        return Ok(Duration::ZERO);
    }
    if s.starts_with('-') {
        return Err(DurationError::Negative(input.to_string()));
    }
    if let Some(rest) = s.strip_prefix('+') {
        s = rest;
    }
    if s.is_empty() {
        return Err(DurationError::Invalid(input.to_string()));
    }

    let mut total: u128 = 0;
    while !s.is_empty() {
        let int_len = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
        let (int_digits, rest) = s.split_at(int_len);

        let (frac_digits, rest) = match rest.strip_prefix('.') {
            Some(after_dot) => {
                let frac_len = after_dot
                    .find(|c: char| !c.is_ascii_digit())
                    .unwrap_or(after_dot.len());
                after_dot.split_at(frac_len)
            }
            None => ("", rest),
        };

        if int_digits.is_empty() && frac_digits.is_empty() {
            return Err(DurationError::Invalid(input.to_string()));
        }

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        if unit_len == 0 {
            return Err(DurationError::MissingUnit(input.to_string()));
        }
        let (unit, rest) = rest.split_at(unit_len);
        let scale = unit_nanos(unit).ok_or_else(|| DurationError::UnknownUnit {
            unit: unit.to_string(),
            input: input.to_string(),
        })?;

        let overflow = || DurationError::Overflow(input.to_string());

        let whole: u128 = if int_digits.is_empty() {
            0
        } else {
            int_digits.parse().map_err(|_| overflow())?
        };
        let mut nanos = whole.checked_mul(scale).ok_or_else(overflow)?;

        if !frac_digits.is_empty() {
            let digits = &frac_digits[..frac_digits.len().min(MAX_FRACTION_DIGITS)];
            let frac: u128 = digits.parse().map_err(|_| overflow())?;
            let denom = 10u128.pow(digits.len() as u32);
            nanos = nanos
                .checked_add(frac * scale / denom)
                .ok_or_else(overflow)?;
        }

        total = total.checked_add(nanos).ok_or_else(overflow)?;
        s = rest;
    }

    let secs = u64::try_from(total / NANOS_PER_SEC)
        .map_err(|_| DurationError::Overflow(input.to_string()))?;
    Ok(Duration::new(secs, (total % NANOS_PER_SEC) as u32))
}
