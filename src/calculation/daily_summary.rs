//! Daily summary calculation.
//!
//! Pairs a day's punches into work intervals by position and compares the
//! worked time against the calendar's expectation.

use chrono::{Datelike, Duration, NaiveDate};

use crate::models::{
    AuditStep, BridgeDayConfig, DailySummary, Punch, WorkInterval, is_weekend, sort_by_considered,
};

use super::calendar::DayResolution;

/// Pairs punches into intervals: 0↔1, 2↔3, and so on.
///
/// Punches are ordered by considered time first. A trailing unmatched
/// punch yields no interval; a forgotten clock-out therefore leaves the
/// open interval uncounted instead of guessing its end.
///
/// # Examples
///
/// ```
/// use timebank_engine::calculation::pair_intervals;
/// use timebank_engine::models::Punch;
/// use chrono::NaiveDateTime;
///
/// let at = |s: &str| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap();
/// let punches = vec![
///     Punch::new("emp_001", at("2026-01-15 08:00")),
///     Punch::new("emp_001", at("2026-01-15 12:00")),
///     Punch::new("emp_001", at("2026-01-15 13:00")),
/// ];
///
/// let intervals = pair_intervals(&punches);
/// assert_eq!(intervals.len(), 1);
/// assert_eq!(intervals[0].minutes, 240);
/// ```
pub fn pair_intervals(punches: &[Punch]) -> Vec<WorkInterval> {
    let mut sorted = punches.to_vec();
    sort_by_considered(&mut sorted);

    sorted
        .chunks_exact(2)
        .map(|pair| {
            let (clock_in, clock_out) = (&pair[0], &pair[1]);
            let start = clock_in.considered_time();
            let end = clock_out.considered_time();
            WorkInterval {
                clock_in_id: clock_in.id,
                clock_out_id: clock_out.id,
                start,
                end,
                minutes: (end - start).num_minutes(),
            }
        })
        .collect()
}

/// Sums the exact length of every interval.
pub fn total_worked_duration(intervals: &[WorkInterval]) -> Duration {
    intervals
        .iter()
        .fold(Duration::zero(), |total, interval| total + interval.duration())
}

/// Worked minutes of the day, truncated once after summing.
pub fn total_worked_minutes(intervals: &[WorkInterval]) -> i64 {
    total_worked_duration(intervals).num_minutes()
}

/// Returns the bridge add-on owed on a day, or 0.
///
/// The add-on only lands on weekdays that expect work. Scheduled weekend
/// days are left out, matching the working-day count the add-on was
/// divided by.
pub fn bridge_add_on_for(day: &DayResolution, bridge: Option<&BridgeDayConfig>) -> i64 {
    match bridge {
        Some(config)
            if !day.is_zeroed()
                && day.expected_minutes > 0
                && !is_weekend(day.date.weekday())
                && config.applies_to(&day.employment_id, day.date.year()) =>
        {
            config.daily_add_on_minutes
        }
        _ => 0,
    }
}

/// Computes the summary of one day from post-tolerance punches.
///
/// Expected minutes come from `day` (already zeroed for absences,
/// holidays, bridges and unscheduled weekends) plus the bridge add-on.
/// The result depends only on the inputs, not on punch order.
pub fn compute_daily_summary(
    date: NaiveDate,
    punches: &[Punch],
    day: &DayResolution,
    bridge: Option<&BridgeDayConfig>,
) -> DailySummary {
    let intervals = pair_intervals(punches);
    let worked_minutes = total_worked_minutes(&intervals);
    let bridge_add_on_minutes = bridge_add_on_for(day, bridge);
    let expected_minutes = day.expected_minutes + bridge_add_on_minutes;
    let punch_count = punches.len();

    DailySummary {
        date,
        employment_id: day.employment_id.clone(),
        worked_minutes,
        expected_minutes,
        balance_minutes: worked_minutes - expected_minutes,
        is_complete: punch_count > 0 && punch_count % 2 == 0,
        punch_count,
        intervals,
        day_kind: day.day_kind,
        tolerance_applied: punches.iter().any(Punch::is_adjusted),
        bridge_add_on_minutes,
    }
}

/// Builds the audit step describing a computed summary.
pub fn summary_audit_step(summary: &DailySummary, step_number: u32) -> AuditStep {
    let reasoning = if !summary.is_complete && summary.punch_count > 0 {
        format!(
            "{} punches on {}; the unmatched last punch is not counted",
            summary.punch_count, summary.date
        )
    } else if summary.balance_minutes > 0 {
        format!(
            "{} minutes worked exceeds {} expected by {}",
            summary.worked_minutes, summary.expected_minutes, summary.balance_minutes
        )
    } else if summary.balance_minutes < 0 {
        format!(
            "{} minutes worked is {} short of {} expected",
            summary.worked_minutes, -summary.balance_minutes, summary.expected_minutes
        )
    } else {
        format!(
            "{} minutes worked matches {} expected",
            summary.worked_minutes, summary.expected_minutes
        )
    };

    AuditStep {
        step_number,
        rule_id: "daily_summary".to_string(),
        rule_name: "Daily Summary".to_string(),
        input: serde_json::json!({
            "date": summary.date.to_string(),
            "punch_count": summary.punch_count,
            "day_kind": summary.day_kind,
        }),
        output: serde_json::json!({
            "worked_minutes": summary.worked_minutes,
            "expected_minutes": summary.expected_minutes,
            "balance_minutes": summary.balance_minutes,
            "bridge_add_on_minutes": summary.bridge_add_on_minutes,
            "is_complete": summary.is_complete,
        }),
        reasoning,
    }
}
