//! Aggregation of daily summaries over a period.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::models::{DailySummary, minutes_to_hours};

use super::periods::DateRange;

/// Totals for one employment over an inclusive date range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodSummary {
    /// The summarized range.
    pub period: DateRange,
    /// The employment, when at least one day was summarized.
    pub employment_id: Option<String>,
    /// Days inside the range that had a summary.
    pub days_summarized: usize,
    /// Days with at least one closed interval.
    pub days_worked: usize,
    /// Days with an odd number of punches.
    pub incomplete_days: Vec<NaiveDate>,
    /// Total worked minutes.
    pub worked_minutes: i64,
    /// Total expected minutes.
    pub expected_minutes: i64,
    /// Total balance minutes.
    pub balance_minutes: i64,
    /// Worked time in decimal hours.
    pub worked_hours: Decimal,
    /// Expected time in decimal hours.
    pub expected_hours: Decimal,
    /// Balance in decimal hours.
    pub balance_hours: Decimal,
}

/// Sums the daily summaries falling inside `[start, end]`.
///
/// Summaries outside the range are ignored. When a date appears more than
/// once the last summary for it wins, matching how the ledger replaces a
/// re-recorded day.
///
/// # Errors
///
/// Returns `InvalidPeriod` if `start > end` and `EmploymentMismatch` if the
/// summaries belong to more than one employment.
pub fn summarize_period(
    summaries: &[DailySummary],
    start: NaiveDate,
    end: NaiveDate,
) -> EngineResult<PeriodSummary> {
    let period = DateRange::new(start, end)?;

    let mut by_date: BTreeMap<NaiveDate, &DailySummary> = BTreeMap::new();
    for summary in summaries.iter().filter(|s| period.contains(s.date)) {
        by_date.insert(summary.date, summary);
    }

    let employment_id = by_date.values().next().map(|s| s.employment_id.clone());
    if let Some(expected) = &employment_id {
        if let Some(other) = by_date.values().find(|s| &s.employment_id != expected) {
            return Err(EngineError::EmploymentMismatch {
                expected: expected.clone(),
                actual: other.employment_id.clone(),
            });
        }
    }

    let worked_minutes: i64 = by_date.values().map(|s| s.worked_minutes).sum();
    let expected_minutes: i64 = by_date.values().map(|s| s.expected_minutes).sum();
    let balance_minutes: i64 = by_date.values().map(|s| s.balance_minutes).sum();

    Ok(PeriodSummary {
        period,
        employment_id,
        days_summarized: by_date.len(),
        days_worked: by_date.values().filter(|s| s.has_worked()).count(),
        incomplete_days: by_date
            .values()
            .filter(|s| s.punch_count > 0 && !s.is_complete)
            .map(|s| s.date)
            .collect(),
        worked_minutes,
        expected_minutes,
        balance_minutes,
        worked_hours: minutes_to_hours(worked_minutes),
        expected_hours: minutes_to_hours(expected_minutes),
        balance_hours: minutes_to_hours(balance_minutes),
    })
}
