//! Relative time labels for signal cards
//!
//! `createdAt` timestamps are bucketed against an injected "now" in a fixed
//! reference zone (Asia/Kolkata by default):
//!
//! | Bucket | Label |
//! |---|---|
//! | same calendar day | `Today 1:30 PM` |
//! | previous calendar day | `Yesterday 1:30 PM` |
//! | same week (weeks start on Sunday) | `Tuesday, 1:30 PM` |
//! | anything else | `1st May` |
//!
//! Nothing here reads the system clock.

use chrono::{
    DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveDateTime, Offset, TimeZone, Utc,
    Weekday,
};

/// Asia/Kolkata, UTC+05:30 (no DST)
pub const REFERENCE_OFFSET_MINUTES: i32 = 5 * 60 + 30;

/// The default reference zone
pub fn reference_zone() -> FixedOffset {
    zone_from_minutes(REFERENCE_OFFSET_MINUTES).unwrap_or_else(|| Utc.fix())
}

/// Fixed offset east of UTC, `None` when out of range
pub fn zone_from_minutes(minutes: i32) -> Option<FixedOffset> {
    minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
}

/// Calendar bucket of a timestamp relative to now
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeBucket {
    Today,
    Yesterday,
    SameWeek(Weekday),
    Earlier,
}

/// First day (Sunday) of the week containing `date`
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_sunday()))
}

pub fn classify(at: DateTime<Utc>, now: DateTime<Utc>, zone: &FixedOffset) -> TimeBucket {
    let day = at.with_timezone(zone).date_naive();
    let today = now.with_timezone(zone).date_naive();

    if day == today {
        TimeBucket::Today
    } else if today.pred_opt() == Some(day) {
        TimeBucket::Yesterday
    } else if week_start(day) == week_start(today) {
        TimeBucket::SameWeek(day.weekday())
    } else {
        TimeBucket::Earlier
    }
}

/// Label for an already-parsed timestamp
pub fn bucket_label(at: DateTime<Utc>, now: DateTime<Utc>, zone: &FixedOffset) -> String {
    let local = at.with_timezone(zone);
    match classify(at, now, zone) {
        TimeBucket::Today => format!("Today {}", clock(&local)),
        TimeBucket::Yesterday => format!("Yesterday {}", clock(&local)),
        TimeBucket::SameWeek(day) => format!("{}, {}", weekday_name(day), clock(&local)),
        TimeBucket::Earlier => day_month(local.date_naive()),
    }
}

/// Label for a raw `createdAt` string; unparseable input is returned as-is.
/// Callers report bad input through [`unparseable`], outside any render pass.
pub fn format_created_at(raw: &str, now: DateTime<Utc>, zone: &FixedOffset) -> String {
    match parse_timestamp(raw) {
        Some(at) => bucket_label(at, now, zone),
        None => raw.to_string(),
    }
}

/// `1st May` style date for subscription start/end dates
pub fn format_day_month(raw: &str, zone: &FixedOffset) -> String {
    match parse_timestamp(raw) {
        Some(at) => day_month(at.with_timezone(zone).date_naive()),
        None => raw.to_string(),
    }
}

/// Raw values that [`parse_timestamp`] rejects, in input order
pub fn unparseable<'a>(raws: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    raws.into_iter()
        .filter(|raw| parse_timestamp(raw).is_none())
        .map(str::to_string)
        .collect()
}

/// RFC 3339, or a zone-less ISO date-time read as UTC
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}

pub fn day_month(date: NaiveDate) -> String {
    format!("{} {}", ordinal(date.day()), date.format("%B"))
}

pub fn ordinal(n: u32) -> String {
    let suffix = if (11..=13).contains(&(n % 100)) {
        "th"
    } else {
        match n % 10 {
            1 => "st",
            2 => "nd",
            3 => "rd",
            _ => "th",
        }
    };
    format!("{}{}", n, suffix)
}

fn clock(local: &DateTime<FixedOffset>) -> String {
    local.format("%-I:%M %p").to_string()
}

fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}
