//! Human-readable duration grammar, e.g. `1w2d3h4m5s6ms`.
use std::sync::LazyLock;

use chrono::Duration;
use thiserror::Error;

static DURATION_RE: LazyLock<regex::Regex> = LazyLock::new(|| {
    // every unit optional, order fixed, whitespace tolerated between parts
    regex::Regex::new(
        r"(?x)^\s*(-)?\s*
          (?:(\d+)\s*w)?\s*
          (?:(\d+)\s*d)?\s*
          (?:(\d+)\s*h)?\s*
          (?:(\d+)\s*m)?\s*
          (?:(\d+)\s*s)?\s*
          (?:(\d+)\s*ms)?\s*$",
    )
    .unwrap()
});

#[derive(Debug, Error, PartialEq, Eq)]
#[error(
    "illegal duration format '{0}', expected a value such as '1w2d3h4m5s' \
     (weeks/days/hours/minutes/seconds/milliseconds, each optional, in that order)"
)]
pub struct DurationParseError(String);

/// Parse a duration such as `2h30m` or `-90s`.
///
/// Blank input (or a bare sign) parses to `None`. Each unit may appear at
/// most once and units must keep their order, so `500m2000s` is legal while
/// `2h 3d` is not.
pub fn parse_duration(value: &str) -> Result<Option<Duration>, DurationParseError> {
    let captures = DURATION_RE
        .captures(value)
        .ok_or_else(|| DurationParseError(value.to_string()))?;

    let unit = |idx: usize| -> Result<Option<i64>, DurationParseError> {
        captures
            .get(idx)
            .map(|m| m.as_str().parse::<i64>())
            .transpose()
            .map_err(|_| DurationParseError(value.to_string()))
    };

    let mut millis: i64 = 0;
    let mut any = false;
    for (idx, factor) in [
        (2, 7 * 24 * 60 * 60 * 1000),
        (3, 24 * 60 * 60 * 1000),
        (4, 60 * 60 * 1000),
        (5, 60 * 1000),
        (6, 1000),
        (7, 1),
    ] {
        if let Some(amount) = unit(idx)? {
            any = true;
            millis = amount
                .checked_mul(factor)
                .and_then(|part| millis.checked_add(part))
                .ok_or_else(|| DurationParseError(value.to_string()))?;
        }
    }

    if !any {
        return Ok(None);
    }
    if captures.get(1).is_some() {
        millis = -millis;
    }
    Ok(Some(Duration::milliseconds(millis)))
}
