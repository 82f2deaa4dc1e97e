//! Time granularities, masked dates, and whole-unit date arithmetic.
//!
//! Interval constraints and date anchors never compare raw timestamps.
//! They either compare under a granularity mask (every component below the
//! unit is dropped before comparing) or measure elapsed time in signed
//! whole units. Seconds through weeks are exact durations; months and
//! years are calendar differences: a whole month from Jan 31 lands on the
//! clamped anniversary (Feb 28/29), not 30 days later.

use std::cmp::Ordering;
use std::fmt;

use chrono::{Datelike, Days, Months, NaiveDateTime, NaiveTime, Timelike};

/// Granularity for masked comparison and elapsed-time measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeUnit {
    /// Whole seconds (sub-second components masked).
    Seconds,
    /// Whole minutes.
    Minutes,
    /// Whole hours.
    Hours,
    /// Whole days.
    Days,
    /// Whole weeks; masking truncates to the preceding Monday.
    Weeks,
    /// Whole calendar months.
    Months,
    /// Whole calendar years.
    Years,
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Seconds => "seconds",
            Self::Minutes => "minutes",
            Self::Hours => "hours",
            Self::Days => "days",
            Self::Weeks => "weeks",
            Self::Months => "months",
            Self::Years => "years",
        };
        f.write_str(name)
    }
}

/// Truncates a timestamp to the given granularity, dropping every
/// component below it.
///
/// `Weeks` truncates to midnight of the preceding (or same) Monday, the
/// ISO week start.
#[must_use]
pub fn truncate_to(ts: NaiveDateTime, unit: TimeUnit) -> NaiveDateTime {
    let date = ts.date();
    let time = ts.time();
    match unit {
        TimeUnit::Seconds => NaiveTime::from_hms_opt(time.hour(), time.minute(), time.second())
            .map_or(ts, |t| NaiveDateTime::new(date, t)),
        TimeUnit::Minutes => NaiveTime::from_hms_opt(time.hour(), time.minute(), 0)
            .map_or(ts, |t| NaiveDateTime::new(date, t)),
        TimeUnit::Hours => NaiveTime::from_hms_opt(time.hour(), 0, 0)
            .map_or(ts, |t| NaiveDateTime::new(date, t)),
        TimeUnit::Days => NaiveDateTime::new(date, NaiveTime::MIN),
        TimeUnit::Weeks => {
            let monday = date
                .checked_sub_days(Days::new(u64::from(date.weekday().num_days_from_monday())))
                .unwrap_or(date);
            NaiveDateTime::new(monday, NaiveTime::MIN)
        }
        TimeUnit::Months => {
            NaiveDateTime::new(date.with_day(1).unwrap_or(date), NaiveTime::MIN)
        }
        TimeUnit::Years => {
            let jan1 = date.with_month(1).and_then(|d| d.with_day(1)).unwrap_or(date);
            NaiveDateTime::new(jan1, NaiveTime::MIN)
        }
    }
}

/// Compares two timestamps under a granularity mask.
///
/// Both sides are truncated to `unit` before comparing, so e.g. any two
/// instants inside the same calendar month are `Equal` at `Months`.
#[must_use]
pub fn compare_dates(a: NaiveDateTime, b: NaiveDateTime, unit: TimeUnit) -> Ordering {
    truncate_to(a, unit).cmp(&truncate_to(b, unit))
}

/// Signed elapsed time from `from` to `to` in whole `unit`s, truncated
/// toward zero.
///
/// Seconds through weeks divide the exact duration. Months and years
/// count completed calendar anniversaries: the month count only advances
/// once the (day-clamped) anniversary has been reached, so
/// Jan 15 → Mar 14 is one whole month, not two.
#[must_use]
pub fn date_diff(from: NaiveDateTime, to: NaiveDateTime, unit: TimeUnit) -> i64 {
    let elapsed = to.signed_duration_since(from);
    match unit {
        TimeUnit::Seconds => elapsed.num_seconds(),
        TimeUnit::Minutes => elapsed.num_minutes(),
        TimeUnit::Hours => elapsed.num_hours(),
        TimeUnit::Days => elapsed.num_days(),
        TimeUnit::Weeks => elapsed.num_weeks(),
        TimeUnit::Months => whole_months(from, to),
        TimeUnit::Years => whole_months(from, to) / 12,
    }
}

/// Completed calendar months from `from` to `to`, signed.
///
/// Starts from the raw year/month component difference, then steps back
/// toward zero if the final partial month has not completed (checked
/// against the day-clamped anniversary).
fn whole_months(from: NaiveDateTime, to: NaiveDateTime) -> i64 {
    let mut months = (i64::from(to.year()) - i64::from(from.year())) * 12
        + i64::from(to.month())
        - i64::from(from.month());
    if months > 0 && shift_months(from, months).is_some_and(|anniversary| anniversary > to) {
        months -= 1;
    } else if months < 0 && shift_months(from, months).is_some_and(|anniversary| anniversary < to)
    {
        months += 1;
    }
    months
}

fn shift_months(ts: NaiveDateTime, months: i64) -> Option<NaiveDateTime> {
    let magnitude = Months::new(months.unsigned_abs() as u32);
    if months >= 0 {
        ts.checked_add_months(magnitude)
    } else {
        ts.checked_sub_months(magnitude)
    }
}

/// A date that only exists down to a chosen granularity.
///
/// Construction truncates immediately; the original sub-unit components
/// are gone. Date anchors carry these so that "June 2024" compares equal
/// to any instant inside June 2024.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MaskedDate {
    floor: NaiveDateTime,
    unit: TimeUnit,
}

impl MaskedDate {
    /// Creates a masked date, truncating `date` to `unit`.
    #[must_use]
    pub fn new(date: NaiveDateTime, unit: TimeUnit) -> Self {
        Self {
            floor: truncate_to(date, unit),
            unit,
        }
    }

    /// The earliest instant inside the masked date.
    #[must_use]
    pub const fn floor(&self) -> NaiveDateTime {
        self.floor
    }

    /// The granularity this date is masked to.
    #[must_use]
    pub const fn unit(&self) -> TimeUnit {
        self.unit
    }

    /// Whether `ts` falls inside or after the masked date.
    #[must_use]
    pub fn reached_by(&self, ts: NaiveDateTime) -> bool {
        truncate_to(ts, self.unit) >= self.floor
    }
}

impl fmt::Display for MaskedDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let formatted = match self.unit {
            TimeUnit::Years => self.floor.format("%Y"),
            TimeUnit::Months => self.floor.format("%Y-%m"),
            TimeUnit::Weeks | TimeUnit::Days => self.floor.format("%Y-%m-%d"),
            TimeUnit::Hours => self.floor.format("%Y-%m-%d %H:00"),
            TimeUnit::Minutes => self.floor.format("%Y-%m-%d %H:%M"),
            TimeUnit::Seconds => self.floor.format("%Y-%m-%d %H:%M:%S"),
        };
        write!(f, "{formatted}")
    }
}
