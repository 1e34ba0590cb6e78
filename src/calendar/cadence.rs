// src/calendar/cadence.rs

//! Cadences and the secondary-cadence resolver.

use chrono::{Duration, NaiveDateTime, Timelike};
use serde::Serialize;
use tracing::{debug, warn};

use crate::calendar::time::{format_hms, serialize_hms};
use crate::errors::{CycledagError, Result};
use crate::types::CadenceId;

/// How many times per day the secondary cycle runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CycleFrequency {
    Disabled,
    Daily,
    TwiceDaily,
    FourTimesDaily,
}

impl CycleFrequency {
    /// Map a cycles-per-day count (`0`, `1`, `2` or `4`).
    pub fn from_count(count: i64) -> Result<Self> {
        match count {
            0 => Ok(CycleFrequency::Disabled),
            1 => Ok(CycleFrequency::Daily),
            2 => Ok(CycleFrequency::TwiceDaily),
            4 => Ok(CycleFrequency::FourTimesDaily),
            other => Err(CycledagError::invalid(
                "gfs_cyc",
                other.to_string(),
                "0, 1, 2 or 4 cycles per day",
            )),
        }
    }

    pub fn per_day(&self) -> i64 {
        match self {
            CycleFrequency::Disabled => 0,
            CycleFrequency::Daily => 1,
            CycleFrequency::TwiceDaily => 2,
            CycleFrequency::FourTimesDaily => 4,
        }
    }

    pub fn interval(&self) -> Option<Duration> {
        match self.per_day() {
            0 => None,
            n => Some(Duration::hours(24 / n)),
        }
    }
}

/// Named recurrence rule: `start`, `end` and a fixed `interval`.
///
/// A cadence with `valid == false` produces no cycles and must not be
/// referenced by any emitted task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cadence {
    pub id: CadenceId,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    #[serde(serialize_with = "serialize_hms")]
    pub interval: Duration,
    pub valid: bool,
}

impl Cadence {
    pub fn new(id: CadenceId, start: NaiveDateTime, end: NaiveDateTime, interval: Duration) -> Self {
        Self {
            id,
            start,
            end,
            interval,
            valid: true,
        }
    }

    /// Cadence producing no cycles, pinned to `at`.
    pub fn disabled(id: CadenceId, at: NaiveDateTime, interval: Duration) -> Self {
        Self {
            id,
            start: at,
            end: at,
            interval,
            valid: false,
        }
    }

    /// Interval in `HH:MM:SS` form.
    pub fn interval_hms(&self) -> String {
        format_hms(self.interval)
    }

    /// Every cycle time of a valid cadence, in order.
    pub fn cycles(&self) -> Vec<NaiveDateTime> {
        if !self.valid || self.interval <= Duration::zero() {
            return Vec::new();
        }
        let mut out = Vec::new();
        let mut next = Some(self.start);
        while let Some(t) = next.filter(|t| *t <= self.end) {
            out.push(t);
            next = t.checked_add_signed(self.interval);
        }
        out
    }
}

/// Anchoring rules for secondary cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Alignment {
    /// Hour of day every secondary cycle boundary is counted from.
    pub anchor_hour: u32,
    /// Minimum gap between the primary start and the first secondary cycle.
    pub lead_in: Duration,
}

impl Alignment {
    /// Boundaries at 00Z plus multiples of the interval, one 6-hourly cycle
    /// of lead-in.
    pub fn synoptic() -> Self {
        Self {
            anchor_hour: 0,
            lead_in: Duration::hours(6),
        }
    }
}

/// Result of resolving the secondary cadence.
///
/// `frequency` is [`CycleFrequency::Disabled`] when the request was disabled
/// or had to be coerced off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecondaryCadence {
    pub frequency: CycleFrequency,
    pub cadence: Cadence,
}

/// Resolve the secondary ("gfs") cadence inside the primary window.
///
/// The first secondary cycle is the first aligned boundary at or after
/// `primary_start + delay + lead_in`; the last is the last aligned boundary
/// at or before `primary_end`. A negative delay counts as zero. If that
/// leaves no cycles, or the start is past the representable range, the
/// cadence is returned disabled, a warning is logged and compilation
/// continues.
pub fn resolve_secondary_cadence(
    primary_start: NaiveDateTime,
    primary_end: NaiveDateTime,
    alignment: Alignment,
    delay: Duration,
    frequency: CycleFrequency,
) -> SecondaryCadence {
    let Some(interval) = frequency.interval() else {
        debug!("secondary cadence disabled by configuration");
        return SecondaryCadence {
            frequency: CycleFrequency::Disabled,
            cadence: Cadence::disabled(CadenceId::Gfs, primary_end, Duration::hours(24)),
        };
    };

    let start = primary_start
        .checked_add_signed(delay.max(Duration::zero()))
        .and_then(|t| t.checked_add_signed(alignment.lead_in))
        .and_then(|t| ceil_to_boundary(t, interval, alignment.anchor_hour));

    let start = match start {
        Some(start) if start <= primary_end => start,
        _ => {
            warn!(
                start = ?start,
                primary_end = %primary_end,
                "secondary cadence starts after the experiment ends; disabling it"
            );
            return SecondaryCadence {
                frequency: CycleFrequency::Disabled,
                cadence: Cadence::disabled(CadenceId::Gfs, primary_end, interval),
            };
        }
    };
    let end = floor_to_boundary(primary_end, interval, alignment.anchor_hour);

    debug!(%start, %end, interval = %format_hms(interval), "resolved secondary cadence");
    SecondaryCadence {
        frequency,
        cadence: Cadence::new(CadenceId::Gfs, start, end, interval),
    }
}

/// Offset of `t` past the most recent anchor boundary, in seconds.
fn seconds_past_boundary(t: NaiveDateTime, interval: Duration, anchor_hour: u32) -> i64 {
    let mut anchor = t
        .date()
        .and_hms_opt(anchor_hour % 24, 0, 0)
        .unwrap_or(t);
    if anchor > t {
        anchor = anchor.checked_sub_signed(Duration::days(1)).unwrap_or(t);
    }
    let step = interval.num_seconds().max(1);
    (t - anchor).num_seconds().rem_euclid(step)
}

fn ceil_to_boundary(t: NaiveDateTime, interval: Duration, anchor_hour: u32) -> Option<NaiveDateTime> {
    let t = t.with_second(0).unwrap_or(t);
    match seconds_past_boundary(t, interval, anchor_hour) {
        0 => Some(t),
        rem => t.checked_add_signed(interval - Duration::seconds(rem)),
    }
}

fn floor_to_boundary(t: NaiveDateTime, interval: Duration, anchor_hour: u32) -> NaiveDateTime {
    t - Duration::seconds(seconds_past_boundary(t, interval, anchor_hour))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::time::parse_timestamp;

    fn ts(s: &str) -> NaiveDateTime {
        parse_timestamp(s).unwrap()
    }

    #[test]
    fn counts_map_to_frequencies() {
        assert_eq!(CycleFrequency::from_count(4).unwrap().interval(), Some(Duration::hours(6)));
        assert_eq!(CycleFrequency::from_count(1).unwrap().interval(), Some(Duration::hours(24)));
        assert_eq!(CycleFrequency::from_count(0).unwrap().interval(), None);
        assert!(CycleFrequency::from_count(3).is_err());
    }

    #[test]
    fn daily_secondary_waits_for_next_midnight() {
        let s = resolve_secondary_cadence(
            ts("2021122000"),
            ts("2021122500"),
            Alignment::synoptic(),
            Duration::zero(),
            CycleFrequency::Daily,
        );
        assert!(s.cadence.valid);
        assert_eq!(s.cadence.start, ts("2021122100"));
        assert_eq!(s.cadence.end, ts("2021122500"));
        assert_eq!(s.cadence.interval_hms(), "24:00:00");
    }

    #[test]
    fn twice_daily_from_late_start() {
        let s = resolve_secondary_cadence(
            ts("2021122018"),
            ts("2021122209"),
            Alignment::synoptic(),
            Duration::zero(),
            CycleFrequency::TwiceDaily,
        );
        assert_eq!(s.cadence.start, ts("2021122100"));
        assert_eq!(s.cadence.end, ts("2021122200"));
        assert_eq!(s.cadence.cycles().len(), 3);
    }

    #[test]
    fn four_times_daily_is_six_hourly() {
        let s = resolve_secondary_cadence(
            ts("2021122018"),
            ts("2021122200"),
            Alignment::synoptic(),
            Duration::zero(),
            CycleFrequency::FourTimesDaily,
        );
        assert_eq!(s.cadence.interval_hms(), "06:00:00");
        assert_eq!(s.cadence.start, ts("2021122100"));
    }

    #[test]
    fn delay_past_window_disables_without_error() {
        let s = resolve_secondary_cadence(
            ts("2022010100"),
            ts("2022011100"),
            Alignment::synoptic(),
            Duration::days(30),
            CycleFrequency::FourTimesDaily,
        );
        assert_eq!(s.frequency, CycleFrequency::Disabled);
        assert!(!s.cadence.valid);
        assert!(s.cadence.cycles().is_empty());
        assert!(s.cadence.end <= ts("2022011100"));
    }

    #[test]
    fn four_times_daily_over_nine_days() {
        let s = resolve_secondary_cadence(
            ts("2023010100"),
            ts("2023011000"),
            Alignment::synoptic(),
            Duration::zero(),
            CycleFrequency::FourTimesDaily,
        );
        assert!(s.cadence.valid);
        assert_eq!(s.cadence.interval_hms(), "06:00:00");
        assert_eq!(s.cadence.start, ts("2023010106"));
        assert_eq!(s.cadence.end, ts("2023011000"));
        assert!(s.cadence.cycles().iter().all(|t| t.hour() % 6 == 0 && t.minute() == 0));
    }

    #[test]
    fn unrepresentable_delay_disables() {
        let s = resolve_secondary_cadence(
            ts("2022010100"),
            ts("2022011100"),
            Alignment::synoptic(),
            Duration::MAX,
            CycleFrequency::FourTimesDaily,
        );
        assert_eq!(s.frequency, CycleFrequency::Disabled);
        assert!(!s.cadence.valid);
        assert_eq!(s.cadence.start, ts("2022011100"));
    }

    #[test]
    fn negative_delay_stays_inside_window() {
        let s = resolve_secondary_cadence(
            ts("2022010100"),
            ts("2022010300"),
            Alignment::synoptic(),
            -Duration::days(3),
            CycleFrequency::FourTimesDaily,
        );
        assert!(s.cadence.valid);
        assert_eq!(s.cadence.start, ts("2022010106"));
        assert!(s.cadence.cycles().iter().all(|t| *t >= ts("2022010100")));
    }
}
