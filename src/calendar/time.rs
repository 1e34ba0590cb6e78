// src/calendar/time.rs

//! Timestamp and duration text forms.
//!
//! Timestamps are `YYYYMMDDHH[MM]`; durations and offsets are
//! `[-][D:]HH:MM:SS`, where hours may exceed 23 when no day field is given.

use std::sync::LazyLock;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use serde::Serializer;

static OFFSET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(-)?(?:(\d+):)?(\d+):(\d{2}):(\d{2})$").expect("offset regex is valid")
});

/// Parse `YYYYMMDDHH` or `YYYYMMDDHHMM`.
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if !(text.len() == 10 || text.len() == 12) || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let date = NaiveDate::parse_from_str(&text[..8], "%Y%m%d").ok()?;
    let hour: u32 = text[8..10].parse().ok()?;
    let minute: u32 = if text.len() == 12 {
        text[10..12].parse().ok()?
    } else {
        0
    };
    let time = NaiveTime::from_hms_opt(hour, minute, 0)?;
    Some(date.and_time(time))
}

/// Render as `YYYYMMDDHHMM`, the form cycle definitions use.
pub fn format_cycle_stamp(t: NaiveDateTime) -> String {
    t.format("%Y%m%d%H%M").to_string()
}

/// Render as `YYYYMMDDHH`, the form configuration values use.
pub fn format_ymdh(t: NaiveDateTime) -> String {
    t.format("%Y%m%d%H").to_string()
}

/// Render a duration as `[-]HH:MM:SS` with unbounded hours.
pub fn format_hms(d: Duration) -> String {
    let total = d.num_seconds();
    let sign = if total < 0 { "-" } else { "" };
    let total = total.abs();
    format!(
        "{sign}{:02}:{:02}:{:02}",
        total / 3600,
        (total % 3600) / 60,
        total % 60
    )
}

/// Parse `[-][D:]HH:MM:SS`.
pub fn parse_offset(text: &str) -> Option<Duration> {
    let caps = OFFSET_RE.captures(text.trim())?;
    let days: i64 = match caps.get(2) {
        Some(m) => m.as_str().parse().ok()?,
        None => 0,
    };
    let hours: i64 = caps[3].parse().ok()?;
    let minutes: i64 = caps[4].parse().ok()?;
    let seconds: i64 = caps[5].parse().ok()?;
    if minutes > 59 || seconds > 59 {
        return None;
    }
    let magnitude = Duration::try_days(days)?
        .checked_add(&Duration::try_hours(hours)?)?
        .checked_add(&Duration::minutes(minutes))?
        .checked_add(&Duration::seconds(seconds))?;
    Some(if caps.get(1).is_some() { -magnitude } else { magnitude })
}

pub(crate) fn serialize_hms<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&format_hms(*d))
}

pub(crate) fn serialize_opt_hms<S: Serializer>(
    d: &Option<Duration>,
    s: S,
) -> Result<S::Ok, S::Error> {
    match d {
        Some(d) => s.serialize_some(&format_hms(*d)),
        None => s.serialize_none(),
    }
}
