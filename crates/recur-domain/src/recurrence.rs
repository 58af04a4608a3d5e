//! Recurrence periods and the due-date calculator.
//!
//! Month and year rollover use an explicit clamp: when the source day does not exist in
//! the target month, the last day of that month is used (Jan 31 → Feb 28/29,
//! Feb 29 → Feb 28 in non-leap years). The clamp never carries into the following month.

use std::{fmt, str::FromStr};

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Cadence at which a recurring template comes due.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecurrencePeriod {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl RecurrencePeriod {
    pub const ALL: [RecurrencePeriod; 4] = [
        RecurrencePeriod::Daily,
        RecurrencePeriod::Weekly,
        RecurrencePeriod::Monthly,
        RecurrencePeriod::Yearly,
    ];

    pub fn label(self) -> &'static str {
        match self {
            RecurrencePeriod::Daily => "Daily",
            RecurrencePeriod::Weekly => "Weekly",
            RecurrencePeriod::Monthly => "Monthly",
            RecurrencePeriod::Yearly => "Yearly",
        }
    }

    /// Calculates the due date one period after `from`.
    pub fn next_date(self, from: NaiveDate) -> Result<NaiveDate, DomainError> {
        next_due_date(from, self)
    }
}

impl fmt::Display for RecurrencePeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RecurrencePeriod::Daily => "DAILY",
            RecurrencePeriod::Weekly => "WEEKLY",
            RecurrencePeriod::Monthly => "MONTHLY",
            RecurrencePeriod::Yearly => "YEARLY",
        };
        f.write_str(label)
    }
}

impl FromStr for RecurrencePeriod {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "DAILY" => Ok(RecurrencePeriod::Daily),
            "WEEKLY" => Ok(RecurrencePeriod::Weekly),
            "MONTHLY" => Ok(RecurrencePeriod::Monthly),
            "YEARLY" => Ok(RecurrencePeriod::Yearly),
            other => Err(DomainError::InvalidPeriod(other.to_string())),
        }
    }
}

/// How a sweep treats templates whose due date lies several periods in the past.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum CatchUpPolicy {
    /// Execute each due template once per sweep, advancing a single period.
    #[default]
    SinglePeriod,
    /// Keep executing a template until its next due date is after the sweep date.
    UntilCurrent,
}

impl fmt::Display for CatchUpPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CatchUpPolicy::SinglePeriod => "single-period",
            CatchUpPolicy::UntilCurrent => "until-current",
        };
        f.write_str(label)
    }
}

/// Returns the due date one `period` after `date`.
pub fn next_due_date(date: NaiveDate, period: RecurrencePeriod) -> Result<NaiveDate, DomainError> {
    let next = match period {
        RecurrencePeriod::Daily => date.checked_add_signed(Duration::days(1)),
        RecurrencePeriod::Weekly => date.checked_add_signed(Duration::weeks(1)),
        RecurrencePeriod::Monthly => shift_month(date, 1),
        RecurrencePeriod::Yearly => shift_year(date, 1),
    };
    next.ok_or(DomainError::DateOutOfRange(date))
}

fn shift_month(date: NaiveDate, months: i32) -> Option<NaiveDate> {
    let index = date.year() * 12 + date.month0() as i32 + months;
    let year = index.div_euclid(12);
    let month = index.rem_euclid(12) as u32 + 1;
    let day = date.day().min(days_in_month(year, month)?);
    NaiveDate::from_ymd_opt(year, month, day)
}

fn shift_year(date: NaiveDate, years: i32) -> Option<NaiveDate> {
    let year = date.year().checked_add(years)?;
    let day = date.day().min(days_in_month(year, date.month())?);
    NaiveDate::from_ymd_opt(year, date.month(), day)
}

fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let (next_year, next_month) = if month == 12 {
        (year.checked_add(1)?, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)?
        .pred_opt()
        .map(|last| last.day())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn daily_and_weekly_add_fixed_days() {
        let start = date(2024, 12, 31);
        assert_eq!(
            next_due_date(start, RecurrencePeriod::Daily).unwrap(),
            date(2025, 1, 1)
        );
        assert_eq!(
            next_due_date(start, RecurrencePeriod::Weekly).unwrap(),
            date(2025, 1, 7)
        );
    }

    #[test]
    fn monthly_clamps_to_end_of_february() {
        assert_eq!(
            next_due_date(date(2023, 1, 31), RecurrencePeriod::Monthly).unwrap(),
            date(2023, 2, 28)
        );
        assert_eq!(
            next_due_date(date(2024, 1, 31), RecurrencePeriod::Monthly).unwrap(),
            date(2024, 2, 29)
        );
    }

    #[test]
    fn monthly_clamps_thirty_first_into_thirty_day_month() {
        assert_eq!(
            next_due_date(date(2024, 3, 31), RecurrencePeriod::Monthly).unwrap(),
            date(2024, 4, 30)
        );
    }

    #[test]
    fn monthly_rolls_over_december() {
        assert_eq!(
            next_due_date(date(2024, 12, 15), RecurrencePeriod::Monthly).unwrap(),
            date(2025, 1, 15)
        );
    }

    #[test]
    fn clamped_dates_do_not_recover_the_original_day() {
        let feb = next_due_date(date(2023, 1, 31), RecurrencePeriod::Monthly).unwrap();
        assert_eq!(
            next_due_date(feb, RecurrencePeriod::Monthly).unwrap(),
            date(2023, 3, 28)
        );
    }

    #[test]
    fn yearly_clamps_leap_day() {
        assert_eq!(
            next_due_date(date(2024, 2, 29), RecurrencePeriod::Yearly).unwrap(),
            date(2025, 2, 28)
        );
        assert_eq!(
            next_due_date(date(2023, 3, 1), RecurrencePeriod::Yearly).unwrap(),
            date(2024, 3, 1)
        );
    }

    #[test]
    fn end_of_calendar_reports_out_of_range() {
        let err = next_due_date(NaiveDate::MAX, RecurrencePeriod::Daily).unwrap_err();
        assert_eq!(err, DomainError::DateOutOfRange(NaiveDate::MAX));
    }

    #[test]
    fn unknown_period_text_is_rejected() {
        assert_eq!(
            "monthly".parse::<RecurrencePeriod>().unwrap(),
            RecurrencePeriod::Monthly
        );
        assert_eq!(
            "BIWEEKLY".parse::<RecurrencePeriod>().unwrap_err(),
            DomainError::InvalidPeriod("BIWEEKLY".into())
        );
    }

    #[test]
    fn every_period_moves_strictly_forward() {
        let start = date(2024, 2, 29);
        for period in RecurrencePeriod::ALL {
            assert!(period.next_date(start).unwrap() > start, "{period} did not advance");
        }
    }
}
