//! Period arithmetic: reporting weeks, HR months and time-bank cycles.

use chrono::{Datelike, Duration, Months, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::models::{BankCycle, CycleUnit};

/// An inclusive range of dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    /// First date of the range.
    pub start: NaiveDate,
    /// Last date of the range.
    pub end: NaiveDate,
}

impl DateRange {
    /// Creates a range, rejecting a start after the end.
    pub fn new(start: NaiveDate, end: NaiveDate) -> EngineResult<Self> {
        if start > end {
            return Err(EngineError::InvalidPeriod { start, end });
        }
        Ok(Self { start, end })
    }

    /// Returns true if `date` falls inside the range.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Number of days in the range.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

/// Returns the reporting week containing `date`.
///
/// # Examples
///
/// ```
/// use timebank_engine::calculation::week_bounds;
/// use chrono::{NaiveDate, Weekday};
///
/// let thursday = NaiveDate::from_ymd_opt(2026, 1, 15).unwrap();
/// let week = week_bounds(thursday, Weekday::Sun);
/// assert_eq!(week.start, NaiveDate::from_ymd_opt(2026, 1, 11).unwrap());
/// assert_eq!(week.end, NaiveDate::from_ymd_opt(2026, 1, 17).unwrap());
/// ```
pub fn week_bounds(date: NaiveDate, week_start: Weekday) -> DateRange {
    let offset = (date.weekday().num_days_from_monday() + 7
        - week_start.num_days_from_monday())
        % 7;
    let start = date - Duration::days(i64::from(offset));
    DateRange {
        start,
        end: start + Duration::days(6),
    }
}

/// Returns the HR period containing `date` for periods starting on
/// `start_day` of each month.
///
/// # Errors
///
/// Returns `InvalidRules` unless `start_day` is in `1..=28`.
pub fn rh_period_bounds(date: NaiveDate, start_day: u32) -> EngineResult<DateRange> {
    if !(1..=28).contains(&start_day) {
        return Err(EngineError::InvalidRules {
            field: "rh_period_start_day".to_string(),
            message: "must be between 1 and 28".to_string(),
        });
    }

    let this_month = date.with_day(start_day).ok_or_else(|| out_of_range(date))?;
    let start = if date.day() >= start_day {
        this_month
    } else {
        this_month
            .checked_sub_months(Months::new(1))
            .ok_or_else(|| out_of_range(date))?
    };
    let next = start
        .checked_add_months(Months::new(1))
        .ok_or_else(|| out_of_range(date))?;

    Ok(DateRange {
        start,
        end: next - Duration::days(1),
    })
}

/// Returns the time-bank cycle containing `date`, counting cycles from
/// `anchor`.
///
/// # Errors
///
/// Returns `InvalidRules` for a zero-length cycle and `InvalidPeriod` for a
/// date before the anchor.
pub fn bank_cycle_bounds(
    date: NaiveDate,
    anchor: NaiveDate,
    cycle: BankCycle,
) -> EngineResult<DateRange> {
    if cycle.length == 0 {
        return Err(EngineError::InvalidRules {
            field: "time_bank.cycle.length".to_string(),
            message: "must be at least 1".to_string(),
        });
    }
    if date < anchor {
        return Err(EngineError::InvalidPeriod {
            start: anchor,
            end: date,
        });
    }

    match cycle.unit {
        CycleUnit::Weeks => {
            let span = 7 * i64::from(cycle.length);
            let index = (date - anchor).num_days() / span;
            let start = anchor + Duration::days(index * span);
            Ok(DateRange {
                start,
                end: start + Duration::days(span - 1),
            })
        }
        CycleUnit::Months => {
            let elapsed = (date.year() - anchor.year()) * 12 + date.month() as i32
                - anchor.month() as i32;
            let mut index = elapsed as u32 / cycle.length;
            let start_at = |index: u32| {
                anchor
                    .checked_add_months(Months::new(index * cycle.length))
                    .ok_or_else(|| out_of_range(date))
            };
            let mut start = start_at(index)?;
            if start > date && index > 0 {
                index -= 1;
                start = start_at(index)?;
            }
            let next = start_at(index + 1)?;
            Ok(DateRange {
                start,
                end: next - Duration::days(1),
            })
        }
    }
}

fn out_of_range(date: NaiveDate) -> EngineError {
    EngineError::CalculationError {
        message: format!("Period around {} is out of range", date),
    }
}
