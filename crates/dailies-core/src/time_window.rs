//! Day and week accounting windows.
//!
//! Windows are computed in a calendar time zone. The plain functions use the
//! process-local zone (`chrono::Local`); the `_in` variants take any
//! [`TimeZone`] so callers (and tests) can pin the zone explicitly.
//!
//! Both ends of a window are inclusive. A window ends one millisecond before
//! the next window starts, which is 23:59:59.999 on days without a DST
//! transition at midnight.

use chrono::{Datelike, Days, Duration, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::ResetInterval;

/// Milliseconds in a calendar day without DST transitions.
pub const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Step used to walk past a DST gap that swallows local midnight.
const GAP_STEP_MINUTES: i64 = 15;

/// Longest DST gap we are willing to walk across (in steps).
const MAX_GAP_STEPS: usize = 16;

/// An accounting window, in milliseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeWindow {
    /// First millisecond of the window (inclusive)
    pub start_timestamp: i64,

    /// Last millisecond of the window (inclusive)
    pub end_timestamp: i64,
}

impl TimeWindow {
    pub fn new(start_timestamp: i64, end_timestamp: i64) -> Self {
        Self {
            start_timestamp,
            end_timestamp,
        }
    }

    /// The active window for `interval` at `timestamp`, in the local zone.
    pub fn current(interval: ResetInterval, timestamp: i64) -> Self {
        window_for(interval, timestamp)
    }

    /// Inclusive-inclusive membership test.
    pub fn contains(&self, timestamp: i64) -> bool {
        self.start_timestamp <= timestamp && timestamp <= self.end_timestamp
    }

    /// True when the window ends strictly before `timestamp`.
    pub fn is_closed_at(&self, timestamp: i64) -> bool {
        self.end_timestamp < timestamp
    }

    /// Span from start to end, in milliseconds.
    pub fn span_millis(&self) -> i64 {
        self.end_timestamp - self.start_timestamp
    }
}

/// Current wall-clock time in milliseconds since the Unix epoch.
pub fn current_timestamp() -> i64 {
    Utc::now().timestamp_millis()
}

/// Inclusive-inclusive membership test.
pub fn contains(window: &TimeWindow, timestamp: i64) -> bool {
    window.contains(timestamp)
}

pub fn start_of_day(timestamp: i64) -> i64 {
    start_of_day_in(&Local, timestamp)
}

pub fn end_of_day(timestamp: i64) -> i64 {
    end_of_day_in(&Local, timestamp)
}

pub fn start_of_week(timestamp: i64) -> i64 {
    start_of_week_in(&Local, timestamp)
}

pub fn end_of_week(timestamp: i64) -> i64 {
    end_of_week_in(&Local, timestamp)
}

pub fn window_for(interval: ResetInterval, timestamp: i64) -> TimeWindow {
    window_for_in(&Local, interval, timestamp)
}

/// Local midnight of the calendar day containing `timestamp`.
pub fn start_of_day_in<Tz: TimeZone>(tz: &Tz, timestamp: i64) -> i64 {
    local_date(tz, timestamp)
        .and_then(|date| midnight_millis(tz, date))
        .unwrap_or(timestamp)
}

/// Last millisecond of the calendar day containing `timestamp`.
pub fn end_of_day_in<Tz: TimeZone>(tz: &Tz, timestamp: i64) -> i64 {
    local_date(tz, timestamp)
        .and_then(|date| date.checked_add_days(Days::new(1)))
        .and_then(|next| midnight_millis(tz, next))
        .map(|next_start| next_start - 1)
        .unwrap_or(timestamp)
}

/// Local midnight of the Sunday on or before the day containing `timestamp`.
pub fn start_of_week_in<Tz: TimeZone>(tz: &Tz, timestamp: i64) -> i64 {
    local_date(tz, timestamp)
        .and_then(|date| {
            let since_sunday = u64::from(date.weekday().num_days_from_sunday());
            date.checked_sub_days(Days::new(since_sunday))
        })
        .and_then(|sunday| midnight_millis(tz, sunday))
        .unwrap_or(timestamp)
}

/// Last millisecond of the Saturday on or after the day containing `timestamp`.
pub fn end_of_week_in<Tz: TimeZone>(tz: &Tz, timestamp: i64) -> i64 {
    local_date(tz, timestamp)
        .and_then(|date| {
            let until_next_sunday = 7 - u64::from(date.weekday().num_days_from_sunday());
            date.checked_add_days(Days::new(until_next_sunday))
        })
        .and_then(|next_sunday| midnight_millis(tz, next_sunday))
        .map(|next_start| next_start - 1)
        .unwrap_or(timestamp)
}

pub fn window_for_in<Tz: TimeZone>(tz: &Tz, interval: ResetInterval, timestamp: i64) -> TimeWindow {
    match interval {
        ResetInterval::Daily => TimeWindow::new(
            start_of_day_in(tz, timestamp),
            end_of_day_in(tz, timestamp),
        ),
        ResetInterval::Weekly => TimeWindow::new(
            start_of_week_in(tz, timestamp),
            end_of_week_in(tz, timestamp),
        ),
    }
}

fn local_date<Tz: TimeZone>(tz: &Tz, timestamp: i64) -> Option<NaiveDate> {
    tz.timestamp_millis_opt(timestamp)
        .single()
        .map(|dt| dt.date_naive())
}

fn midnight_millis<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> Option<i64> {
    resolve_local(tz, date.and_hms_opt(0, 0, 0)?)
}

/// Map a wall-clock time to an instant.
///
/// Ambiguous times resolve to the earliest instant. Times inside a DST gap
/// resolve to the first representable wall-clock time after the gap.
fn resolve_local<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> Option<i64> {
    let mut candidate = naive;
    for _ in 0..=MAX_GAP_STEPS {
        if let Some(dt) = tz.from_local_datetime(&candidate).earliest() {
            return Some(dt.timestamp_millis());
        }
        candidate = candidate.checked_add_signed(Duration::minutes(GAP_STEP_MINUTES))?;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;
    use chrono_tz::America::Santiago;
    use chrono_tz::Atlantic::Azores;

    fn utc_millis(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> i64 {
        Utc.with_ymd_and_hms(y, m, d, h, min, s)
            .single()
            .expect("valid UTC datetime")
            .timestamp_millis()
    }

    fn sample_timestamps() -> Vec<i64> {
        // Two weeks of samples at an awkward stride so every weekday and
        // many times of day are covered.
        let base = utc_millis(2024, 12, 20, 0, 0, 0);
        let stride = 37 * 60 * 1000 + 13_000;
        (0..((14 * MILLIS_PER_DAY) / stride))
            .map(|i| base + i * stride)
            .collect()
    }

    #[test]
    fn test_start_and_end_of_day_utc() {
        // 2024-12-25 is a Wednesday
        let t = utc_millis(2024, 12, 25, 15, 30, 0);
        assert_eq!(start_of_day_in(&Utc, t), utc_millis(2024, 12, 25, 0, 0, 0));
        assert_eq!(
            end_of_day_in(&Utc, t),
            utc_millis(2024, 12, 26, 0, 0, 0) - 1
        );
    }

    #[test]
    fn test_week_runs_sunday_to_saturday() {
        let t = utc_millis(2024, 12, 25, 15, 30, 0);
        assert_eq!(start_of_week_in(&Utc, t), utc_millis(2024, 12, 22, 0, 0, 0));
        assert_eq!(
            end_of_week_in(&Utc, t),
            utc_millis(2024, 12, 29, 0, 0, 0) - 1
        );
    }

    #[test]
    fn test_week_boundaries_on_sunday_and_saturday() {
        let sunday = utc_millis(2024, 12, 22, 0, 0, 0);
        assert_eq!(start_of_week_in(&Utc, sunday), sunday);

        let saturday_late = utc_millis(2024, 12, 28, 23, 59, 59) + 999;
        assert_eq!(end_of_week_in(&Utc, saturday_late), saturday_late);
        assert_eq!(start_of_week_in(&Utc, saturday_late), sunday);
    }

    #[test]
    fn test_fixed_offset_uses_local_calendar_day() {
        // 03:00 UTC on the 25th is still the 24th at UTC-05:00.
        let tz = FixedOffset::west_opt(5 * 3600).expect("valid offset");
        let t = utc_millis(2024, 12, 25, 3, 0, 0);
        assert_eq!(start_of_day_in(&tz, t), utc_millis(2024, 12, 24, 5, 0, 0));
        assert_eq!(end_of_day_in(&tz, t), utc_millis(2024, 12, 25, 5, 0, 0) - 1);
    }

    #[test]
    fn test_day_window_brackets_timestamp() {
        let tz = FixedOffset::east_opt(9 * 3600).expect("valid offset");
        for t in sample_timestamps() {
            assert!(start_of_day_in(&tz, t) <= t, "start after {}", t);
            assert!(t <= end_of_day_in(&tz, t), "end before {}", t);
        }
    }

    #[test]
    fn test_week_window_contains_day_window() {
        let tz = FixedOffset::west_opt(7 * 3600).expect("valid offset");
        for t in sample_timestamps() {
            assert!(start_of_week_in(&tz, t) <= start_of_day_in(&tz, t));
            assert!(end_of_day_in(&tz, t) <= end_of_week_in(&tz, t));
        }
    }

    #[test]
    fn test_window_lengths_are_fixed() {
        let tz = FixedOffset::east_opt(5 * 3600 + 1800).expect("valid offset");
        for t in sample_timestamps() {
            let daily = window_for_in(&tz, ResetInterval::Daily, t);
            let weekly = window_for_in(&tz, ResetInterval::Weekly, t);
            assert_eq!(daily.span_millis(), MILLIS_PER_DAY - 1);
            assert_eq!(weekly.span_millis(), 7 * MILLIS_PER_DAY - 1);
            assert!(daily.contains(t));
            assert!(weekly.contains(t));
        }
    }

    #[test]
    fn test_contains_is_inclusive_on_both_ends() {
        let window = TimeWindow::new(100, 200);
        assert!(contains(&window, 100));
        assert!(contains(&window, 200));
        assert!(!contains(&window, 99));
        assert!(!contains(&window, 201));
        assert!(window.is_closed_at(201));
        assert!(!window.is_closed_at(200));
    }

    #[test]
    fn test_consecutive_days_do_not_overlap() {
        let t = utc_millis(2024, 12, 25, 12, 0, 0);
        let today = window_for_in(&Utc, ResetInterval::Daily, t);
        let tomorrow = window_for_in(&Utc, ResetInterval::Daily, t + MILLIS_PER_DAY);
        assert_eq!(today.end_timestamp + 1, tomorrow.start_timestamp);
    }

    #[test]
    fn test_local_zone_brackets_now() {
        let now = current_timestamp();
        assert!(start_of_day(now) <= now && now <= end_of_day(now));
        assert!(start_of_week(now) <= start_of_day(now));
        assert!(end_of_day(now) <= end_of_week(now));
        assert!(TimeWindow::current(ResetInterval::Weekly, now).contains(now));
    }

    #[test]
    fn test_out_of_range_timestamp_is_returned_unchanged() {
        assert_eq!(start_of_day_in(&Utc, i64::MAX), i64::MAX);
        assert_eq!(end_of_week_in(&Utc, i64::MIN), i64::MIN);
    }

    // Santiago skips 00:00-00:59 on 2024-09-08 (-04 to -03).
    const SANTIAGO_GAP_NOON: i64 = 1_725_807_600_000;
    const SANTIAGO_GAP_START: i64 = 1_725_768_000_000;
    const SANTIAGO_NEXT_MIDNIGHT: i64 = 1_725_850_800_000;
    const SANTIAGO_PREVIOUS_NOON: i64 = 1_725_724_800_000;

    #[test]
    fn test_midnight_in_dst_gap_starts_after_gap() {
        let start = start_of_day_in(&Santiago, SANTIAGO_GAP_NOON);
        assert_eq!(start, SANTIAGO_GAP_START);
        let local = Santiago.timestamp_millis_opt(start).unwrap();
        assert_eq!(local.to_rfc3339(), "2024-09-08T01:00:00-03:00");

        assert_eq!(
            end_of_day_in(&Santiago, SANTIAGO_PREVIOUS_NOON) + 1,
            SANTIAGO_GAP_START
        );
        assert_eq!(
            end_of_day_in(&Santiago, SANTIAGO_GAP_NOON),
            SANTIAGO_NEXT_MIDNIGHT - 1
        );

        // 2024-09-08 is a Sunday, so the week starts after the gap too.
        assert_eq!(start_of_week_in(&Santiago, SANTIAGO_GAP_NOON), SANTIAGO_GAP_START);
        assert_eq!(
            end_of_week_in(&Santiago, SANTIAGO_PREVIOUS_NOON) + 1,
            SANTIAGO_GAP_START
        );
    }

    #[test]
    fn test_ambiguous_midnight_resolves_to_earliest_instant() {
        // Azores repeats 00:00-00:59 on 2024-10-27 (+00 back to -01).
        let noon = 1_730_034_000_000;
        let previous_noon = 1_729_944_000_000;
        let earliest_midnight = 1_729_987_200_000;
        let next_midnight = 1_730_077_200_000;

        assert_eq!(start_of_day_in(&Azores, noon), earliest_midnight);
        assert_eq!(end_of_day_in(&Azores, previous_noon) + 1, earliest_midnight);

        let window = window_for_in(&Azores, ResetInterval::Daily, noon);
        assert_eq!(window.end_timestamp, next_midnight - 1);
        assert_eq!(window.span_millis(), MILLIS_PER_DAY + 60 * 60 * 1000 - 1);
    }

    fn assert_days_tile<Tz: TimeZone>(tz: &Tz, from: i64, days: usize) {
        let mut timestamp = from;
        for _ in 0..days {
            let window = window_for_in(tz, ResetInterval::Daily, timestamp);
            assert!(window.contains(timestamp));
            let next = window_for_in(tz, ResetInterval::Daily, window.end_timestamp + 1);
            assert_eq!(next.start_timestamp, window.end_timestamp + 1);
            timestamp = next.start_timestamp + 12 * 60 * 60 * 1000;
        }
    }

    #[test]
    fn test_windows_tile_across_dst_transitions() {
        assert_days_tile(&Santiago, SANTIAGO_PREVIOUS_NOON - 2 * MILLIS_PER_DAY, 5);
        assert_days_tile(&Azores, 1_729_944_000_000 - 2 * MILLIS_PER_DAY, 5);
    }
}
