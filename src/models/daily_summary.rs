//! Daily summary models.
//!
//! A [`DailySummary`] is the engine's per-day output: paired work intervals,
//! worked and expected minutes, and the resulting balance.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How the calendar classified a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayKind {
    /// Regular scheduled day.
    Workday,
    /// Saturday or Sunday.
    Weekend,
    /// Any non-bridge holiday.
    Holiday,
    /// Bridge day.
    Bridge,
    /// Day covered by an absence.
    Absence,
}

impl std::fmt::Display for DayKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DayKind::Workday => write!(f, "workday"),
            DayKind::Weekend => write!(f, "weekend"),
            DayKind::Holiday => write!(f, "holiday"),
            DayKind::Bridge => write!(f, "bridge"),
            DayKind::Absence => write!(f, "absence"),
        }
    }
}

/// A paired clock-in/clock-out interval, in considered time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkInterval {
    /// Id of the opening punch.
    pub clock_in_id: Uuid,
    /// Id of the closing punch.
    pub clock_out_id: Uuid,
    /// Considered start.
    pub start: NaiveDateTime,
    /// Considered end.
    pub end: NaiveDateTime,
    /// Whole minutes between start and end.
    pub minutes: i64,
}

impl WorkInterval {
    /// Exact length, seconds included.
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

/// Worked, expected and balance minutes for one employment on one date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailySummary {
    /// The summarized date.
    pub date: NaiveDate,
    /// The employment the summary belongs to.
    pub employment_id: String,
    /// Minutes worked across all paired intervals.
    pub worked_minutes: i64,
    /// Minutes the schedule expected.
    pub expected_minutes: i64,
    /// `worked_minutes - expected_minutes`.
    pub balance_minutes: i64,
    /// True iff the day has an even, non-zero number of punches.
    pub is_complete: bool,
    /// Number of punches on the day.
    pub punch_count: usize,
    /// Paired intervals in considered-time order.
    pub intervals: Vec<WorkInterval>,
    /// Calendar classification of the day.
    pub day_kind: DayKind,
    /// Whether the break tolerance moved a punch.
    pub tolerance_applied: bool,
    /// Bridge-day add-on included in `expected_minutes`.
    pub bridge_add_on_minutes: i64,
}

impl DailySummary {
    /// Worked time in decimal hours.
    pub fn worked_hours(&self) -> Decimal {
        minutes_to_hours(self.worked_minutes)
    }

    /// Balance in decimal hours.
    pub fn balance_hours(&self) -> Decimal {
        minutes_to_hours(self.balance_minutes)
    }

    /// Whether at least one interval was closed on this day.
    pub fn has_worked(&self) -> bool {
        !self.intervals.is_empty()
    }
}

/// Converts minutes to decimal hours rounded to two places.
///
/// # Examples
///
/// ```
/// use timebank_engine::models::minutes_to_hours;
/// use rust_decimal::Decimal;
///
/// assert_eq!(minutes_to_hours(90), Decimal::new(150, 2));
/// assert_eq!(minutes_to_hours(-20), Decimal::new(-33, 2));
/// ```
pub fn minutes_to_hours(minutes: i64) -> Decimal {
    (Decimal::from(minutes) / Decimal::from(60)).round_dp(2)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_summary(worked: i64, expected: i64) -> DailySummary {
        DailySummary {
            date: NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
            employment_id: "emp_001".to_string(),
            worked_minutes: worked,
            expected_minutes: expected,
            balance_minutes: worked - expected,
            is_complete: false,
            punch_count: 0,
            intervals: vec![],
            day_kind: DayKind::Workday,
            tolerance_applied: false,
            bridge_add_on_minutes: 0,
        }
    }

    #[test]
    fn test_minutes_to_hours_whole_and_fraction() {
        assert_eq!(minutes_to_hours(480), Decimal::new(8, 0));
        assert_eq!(minutes_to_hours(45), Decimal::new(75, 2));
        assert_eq!(minutes_to_hours(0), Decimal::ZERO);
    }

    #[test]
    fn test_minutes_to_hours_rounds_thirds() {
        assert_eq!(minutes_to_hours(20), Decimal::new(33, 2));
        assert_eq!(minutes_to_hours(40), Decimal::new(67, 2));
    }

    #[test]
    fn test_summary_hours_helpers() {
        let summary = empty_summary(510, 480);
        assert_eq!(summary.worked_hours(), Decimal::new(85, 1));
        assert_eq!(summary.balance_hours(), Decimal::new(5, 1));
        assert!(!summary.has_worked());
    }

    #[test]
    fn test_day_kind_serialization() {
        assert_eq!(
            serde_json::to_string(&DayKind::Bridge).unwrap(),
            "\"bridge\""
        );
    }
}
