//! Restock window math. Every category refreshes on a fixed interval anchored
//! at local midnight; this module computes, for a given `now`, the most recent
//! reset at or before it and the next one after it. Pure functions — callers
//! pass the current time in, so the same `now` always yields the same window.

use std::time::Duration;

use chrono::{Duration as Delta, NaiveDateTime, NaiveTime};

use crate::config::restock_intervals;
use crate::types::Category;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestockWindow {
    pub interval: Duration,
    pub last_reset: NaiveDateTime,
    pub next_reset: NaiveDateTime,
    /// Time remaining until `next_reset`, clamped at zero.
    pub countdown: Duration,
    /// Signed time since `last_reset` (negative only under clock skew).
    pub since_last_reset: Delta,
}

impl RestockWindow {
    pub fn countdown_string(&self) -> String {
        format_countdown(self.interval, self.countdown)
    }

    pub fn time_since_string(&self) -> String {
        format_time_since(self.since_last_reset)
    }
}

/// Computes the restock window for `interval` at `now`.
///
/// `last_reset` is the largest `midnight + k·interval` that is ≤ `now`, where
/// midnight is the start of the calendar day containing `now` — re-derived on
/// every call, so a day rollover never reuses a stale anchor. An exact
/// boundary counts as a completed reset: `last_reset == now`, full countdown.
pub fn compute_restock_window(interval: Duration, now: NaiveDateTime) -> RestockWindow {
    let midnight = NaiveDateTime::new(now.date(), NaiveTime::MIN);
    let interval_ms = (interval.as_millis() as i64).max(1);
    let elapsed_ms = (now - midnight).num_milliseconds();

    let intervals_passed = elapsed_ms / interval_ms;
    let last_reset = midnight + Delta::milliseconds(intervals_passed * interval_ms);
    let next_reset = last_reset + Delta::milliseconds(interval_ms);

    let countdown = (next_reset - now)
        .to_std()
        .unwrap_or(Duration::ZERO);

    RestockWindow {
        interval,
        last_reset,
        next_reset,
        countdown,
        since_last_reset: now - last_reset,
    }
}

/// The fixed restock interval for a category. Seeds and gear share one
/// interval, as do the night and blood shops.
pub fn category_interval(category: Category) -> Duration {
    let secs = match category {
        Category::Seed | Category::Gear => restock_intervals::SEED_GEAR_SECS,
        Category::Egg => restock_intervals::EGG_SECS,
        Category::Night | Category::Blood => restock_intervals::NIGHT_BLOOD_SECS,
        Category::Cosmetic => restock_intervals::COSMETIC_SECS,
    };
    Duration::from_secs(secs)
}

/// Zero-padded `HHh MMm SSs` countdown; the hours segment is omitted for
/// sub-hour intervals.
pub fn format_countdown(interval: Duration, countdown: Duration) -> String {
    let total = countdown.as_secs();
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    if interval < Duration::from_secs(3600) {
        format!("{minutes:02}m {seconds:02}s")
    } else {
        format!("{hours:02}h {minutes:02}m {seconds:02}s")
    }
}

/// Coarse human-readable "time since": seconds under a minute, minutes under
/// an hour, hours otherwise. A negative delta (clock skew) reads "in a bit".
pub fn format_time_since(delta: Delta) -> String {
    let seconds = delta.num_seconds();
    if seconds < 0 {
        return "in a bit".to_string();
    }
    if seconds < 60 {
        return format!("{seconds}s ago");
    }
    let minutes = seconds / 60;
    if minutes < 60 {
        return format!("{minutes}m ago");
    }
    format!("{}h ago", minutes / 60)
}

/// Wall-clock rendering of a reset instant, e.g. `2:05 PM`.
pub fn format_clock_time(t: NaiveDateTime) -> String {
    t.format("%-I:%M %p").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 10)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn five_minute_interval_mid_window() {
        let w = compute_restock_window(Duration::from_secs(300), at(14, 7, 0));
        assert_eq!(w.last_reset, at(14, 5, 0));
        assert_eq!(w.next_reset, at(14, 10, 0));
        assert_eq!(w.countdown_string(), "03m 00s");
    }

    #[test]
    fn exact_boundary_counts_as_completed_reset() {
        let w = compute_restock_window(Duration::from_secs(1800), at(0, 0, 0));
        assert_eq!(w.last_reset, at(0, 0, 0));
        assert_eq!(w.next_reset, at(0, 30, 0));
        assert_eq!(w.countdown, Duration::from_secs(1800));
        assert_eq!(w.countdown_string(), "30m 00s");
    }

    #[test]
    fn hour_and_longer_intervals_keep_the_hours_segment() {
        let w = compute_restock_window(Duration::from_secs(4 * 3600), at(1, 30, 15));
        assert_eq!(w.last_reset, at(0, 0, 0));
        assert_eq!(w.next_reset, at(4, 0, 0));
        assert_eq!(w.countdown_string(), "02h 29m 45s");
    }

    #[test]
    fn same_now_yields_identical_windows() {
        let now = at(9, 41, 23);
        let a = compute_restock_window(Duration::from_secs(300), now);
        let b = compute_restock_window(Duration::from_secs(300), now);
        assert_eq!(a, b);
    }

    #[test]
    fn anchor_follows_the_calendar_day() {
        let day1 = NaiveDate::from_ymd_opt(2025, 6, 10)
            .unwrap()
            .and_hms_opt(23, 58, 0)
            .unwrap();
        let day2 = NaiveDate::from_ymd_opt(2025, 6, 11)
            .unwrap()
            .and_hms_opt(0, 2, 0)
            .unwrap();
        let w1 = compute_restock_window(Duration::from_secs(300), day1);
        let w2 = compute_restock_window(Duration::from_secs(300), day2);
        assert_eq!(w1.next_reset, NaiveDate::from_ymd_opt(2025, 6, 11).unwrap().and_hms_opt(0, 0, 0).unwrap());
        assert_eq!(w2.last_reset, NaiveDate::from_ymd_opt(2025, 6, 11).unwrap().and_hms_opt(0, 0, 0).unwrap());
    }

    #[test]
    fn time_since_buckets() {
        assert_eq!(format_time_since(Delta::seconds(42)), "42s ago");
        assert_eq!(format_time_since(Delta::seconds(61)), "1m ago");
        assert_eq!(format_time_since(Delta::minutes(59)), "59m ago");
        assert_eq!(format_time_since(Delta::hours(3)), "3h ago");
        assert_eq!(format_time_since(Delta::seconds(-5)), "in a bit");
    }

    #[test]
    fn shared_interval_for_seed_and_gear() {
        assert_eq!(
            category_interval(Category::Seed),
            category_interval(Category::Gear)
        );
        let now = at(11, 3, 30);
        let seed = compute_restock_window(category_interval(Category::Seed), now);
        let gear = compute_restock_window(category_interval(Category::Gear), now);
        assert_eq!(seed, gear);
    }
}
