//! Display formatting shared by the normalization pass.
//!
//! Values arrive as loose JSON, so every helper here accepts whatever shape the
//! metrics source produced and falls back to [`PLACEHOLDER`] instead of failing.

use std::fmt::Write as _;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::Value as JsonValue;

/// Shown for any absent field.
pub const PLACEHOLDER: &str = "–";

const SECS_PER_DAY: f64 = 86_400.0;
const SECS_PER_HOUR: f64 = 3_600.0;
const SECS_PER_MIN: f64 = 60.0;

/// Formats a number the way a browser prints it: integral values carry no
/// fractional part.
pub fn js_number(x: f64) -> String {
    if x.is_nan() {
        return "NaN".to_string();
    }
    if x.is_infinite() {
        return if x > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if x.fract() == 0.0 && x.abs() < 1e21 {
        // `-0` prints as `0`
        return format!("{:.0}", x + 0.0);
    }
    format!("{x}")
}

/// `<d>d <h>h <m>m <s>s`, dropping leading zero-valued units. Seconds are
/// always present. Negative or non-finite input is treated as zero.
pub fn format_uptime(seconds: f64) -> String {
    let total = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };

    let days = (total / SECS_PER_DAY).floor();
    let rem = total % SECS_PER_DAY;
    let hrs = (rem / SECS_PER_HOUR).floor();
    let rem = rem % SECS_PER_HOUR;
    let mins = (rem / SECS_PER_MIN).floor();
    let secs = rem % SECS_PER_MIN;

    let mut out = String::new();
    if days > 0.0 {
        let _ = write!(out, "{}d ", js_number(days));
    }
    if hrs > 0.0 || days > 0.0 {
        let _ = write!(out, "{}h ", js_number(hrs));
    }
    if mins > 0.0 || hrs > 0.0 || days > 0.0 {
        let _ = write!(out, "{}m ", js_number(mins));
    }
    let _ = write!(out, "{}s", js_number(secs));
    out
}

/// Verbatim display of a scalar. Only `null` counts as absent; `0`, `false`
/// and `""` are real values.
pub fn display_value(v: &JsonValue) -> Option<String> {
    match v {
        JsonValue::Null => None,
        JsonValue::Bool(b) => Some(b.to_string()),
        JsonValue::Number(n) => Some(n.as_f64().map(js_number).unwrap_or_else(|| n.to_string())),
        JsonValue::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

pub fn is_truthy(v: &JsonValue) -> bool {
    match v {
        JsonValue::Null => false,
        JsonValue::Bool(b) => *b,
        JsonValue::Number(n) => n.as_f64().map(|x| x != 0.0 && !x.is_nan()).unwrap_or(true),
        JsonValue::String(s) => !s.is_empty(),
        JsonValue::Array(_) | JsonValue::Object(_) => true,
    }
}

/// Loose numeric coercion used for fractions and chart values.
pub fn as_number(v: &JsonValue) -> Option<f64> {
    match v {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.trim().parse::<f64>().ok(),
        JsonValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

/// `round(value * 100)%`. Absent and `null` both render the placeholder;
/// any other value that is not numeric counts as zero, so the result is
/// always a percentage and never `NaN%`.
pub fn format_win_rate(v: Option<&JsonValue>) -> String {
    match v {
        None | Some(JsonValue::Null) => PLACEHOLDER.to_string(),
        Some(raw) => {
            let frac = as_number(raw).filter(|x| x.is_finite()).unwrap_or(0.0);
            // half-up, matching the browser's Math.round
            let pct = (frac * 100.0 + 0.5).floor();
            format!("{}%", js_number(pct))
        }
    }
}

/// Numbers are epoch milliseconds. Strings may be RFC 3339, a naive date-time
/// (ISO or the backend's `MM/DD/YYYY, hh:mm:ss AM` form, read as local time)
/// or a bare date (read as UTC midnight).
pub fn parse_timestamp(v: &JsonValue) -> Option<DateTime<Local>> {
    match v {
        JsonValue::Number(n) => {
            let ms = n.as_f64()?;
            if !ms.is_finite() {
                return None;
            }
            Local.timestamp_millis_opt(ms.trunc() as i64).single()
        }
        JsonValue::String(s) => parse_timestamp_str(s.trim()),
        _ => None,
    }
}

fn parse_timestamp_str(s: &str) -> Option<DateTime<Local>> {
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Local));
    }
    for fmt in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%m/%d/%Y, %I:%M:%S %p",
        "%m/%d/%Y %H:%M:%S",
    ] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return naive.and_local_timezone(Local).earliest();
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive).with_timezone(&Local))
}

/// en-US style local date-time, e.g. `10/16/2026, 3:04:05 PM`.
pub fn format_local(dt: &DateTime<Local>) -> String {
    dt.format("%-m/%-d/%Y, %-I:%M:%S %p").to_string()
}
