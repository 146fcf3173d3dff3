//! Time utilities for namesys.
//!
//! All timestamps are Unix epoch microseconds (u64).

use std::time::Duration;

/// Return the current time as microseconds since Unix epoch.
///
/// A clock set before the epoch reads as zero.
pub fn now_micros() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_micros() as u64)
        .unwrap_or(0)
}

/// Add a duration to a microsecond timestamp, saturating at `u64::MAX`.
pub fn add_duration(micros: u64, duration: Duration) -> u64 {
    let delta = u64::try_from(duration.as_micros()).unwrap_or(u64::MAX);
    micros.saturating_add(delta)
}

/// Convert microseconds to an RFC 3339 string.
pub fn micros_to_rfc3339(micros: u64) -> String {
    let secs = (micros / 1_000_000) as i64;
    let nsecs = ((micros % 1_000_000) * 1000) as u32;
    let dt = chrono::DateTime::from_timestamp(secs, nsecs).unwrap_or(chrono::DateTime::UNIX_EPOCH);
    dt.to_rfc3339()
}

/// Parse a human duration like `"24h"`, `"7d"`, `"1h30m"` or `"500ms"`.
///
/// A bare number is read as seconds. Values that overflow `Duration` are
/// rejected.
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(secs) = s.parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }

    let mut total = Duration::ZERO;
    let mut digits = String::new();
    let mut chars = s.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch.is_ascii_digit() {
            digits.push(ch);
            continue;
        }
        let val: u64 = digits.parse().ok()?;
        digits.clear();
        let unit = match ch {
            'm' if chars.peek() == Some(&'s') => {
                chars.next();
                Duration::from_millis(val)
            }
            's' => Duration::from_secs(val),
            'm' => Duration::from_secs(val.checked_mul(60)?),
            'h' => Duration::from_secs(val.checked_mul(3600)?),
            'd' => Duration::from_secs(val.checked_mul(86_400)?),
            _ => return None,
        };
        total = total.checked_add(unit)?;
    }
    if !digits.is_empty() {
        return None;
    }
    Some(total)
}
