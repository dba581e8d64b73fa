//! Chart axis and clock labels.
//!
//! Labels are computed in the viewer's local time zone. The `*_naive`
//! functions take an already-localized time so they can be tested without
//! depending on the host zone.

use chrono::{Datelike, Local, NaiveDateTime, TimeZone, Timelike};

use crate::shared::Period;

/// `9:05 AM` style clock label.
pub fn clock_label_naive(t: &NaiveDateTime) -> String {
    let (is_pm, hour12) = t.hour12();
    format!(
        "{}:{:02} {}",
        hour12,
        t.minute(),
        if is_pm { "PM" } else { "AM" }
    )
}

/// `3/14 9PM` style day label used on the weekly chart.
pub fn day_label_naive(t: &NaiveDateTime) -> String {
    let (is_pm, hour12) = t.hour12();
    format!(
        "{}/{} {}{}",
        t.month(),
        t.day(),
        hour12,
        if is_pm { "PM" } else { "AM" }
    )
}

/// Axis label for a point of the given period.
pub fn axis_label_naive(period: Period, t: &NaiveDateTime) -> String {
    match period {
        Period::Days7 => day_label_naive(t),
        Period::Hours12 | Period::Hours24 => clock_label_naive(t),
    }
}

/// Unix milliseconds to local naive time. Out-of-range input yields `None`.
pub fn local_naive(ms: i64) -> Option<NaiveDateTime> {
    Local
        .timestamp_millis_opt(ms)
        .single()
        .map(|dt| dt.naive_local())
}

/// Axis label for a Unix-millisecond timestamp in local time.
pub fn axis_label(period: Period, ms: i64) -> String {
    local_naive(ms)
        .map(|t| axis_label_naive(period, &t))
        .unwrap_or_default()
}

/// Clock label for a Unix-millisecond timestamp in local time.
pub fn clock_label(ms: i64) -> String {
    local_naive(ms)
        .map(|t| clock_label_naive(&t))
        .unwrap_or_default()
}
