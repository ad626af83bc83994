//! Break tolerance.
//!
//! A day's principal break may run over the minimum break by up to the
//! configured tolerance without cost: the return punch is then considered
//! to have happened exactly when the minimum break ended. The rule is
//! applied to at most one pause per day and never forgives a deficit.

use chrono::{Duration, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{AuditStep, EmploymentRules, Punch, sort_by_timestamp};

/// The subset of employment rules the tolerance rule reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToleranceSettings {
    /// Minimum break length in minutes.
    pub min_break_minutes: i64,
    /// Excess over the minimum that is forgiven.
    pub tolerance_minutes: i64,
    /// Preferred break start used to pick the principal pause.
    pub ideal_break_start: Option<NaiveTime>,
}

impl From<&EmploymentRules> for ToleranceSettings {
    fn from(rules: &EmploymentRules) -> Self {
        Self {
            min_break_minutes: rules.min_break_minutes,
            tolerance_minutes: rules.break_tolerance_minutes,
            ideal_break_start: rules.ideal_break_start,
        }
    }
}

/// A gap between a clock-out and the following clock-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakPause {
    /// Id of the punch that started the break.
    pub clock_out_id: Uuid,
    /// Id of the punch that ended the break.
    pub clock_in_id: Uuid,
    /// When the break started.
    pub start: NaiveDateTime,
    /// When the break ended.
    pub end: NaiveDateTime,
    /// Break length in whole minutes, for reporting.
    pub minutes: i64,
}

impl BreakPause {
    /// Exact break length, seconds included.
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

/// The single adjustment the tolerance rule made on a day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToleranceAdjustment {
    /// The return punch that was moved.
    pub punch_id: Uuid,
    /// Its actual time.
    pub actual: NaiveDateTime,
    /// Its considered time (`break start + minimum`).
    pub considered: NaiveDateTime,
    /// Length of the principal pause.
    pub pause_minutes: i64,
    /// Minutes forgiven.
    pub forgiven_minutes: i64,
}

/// The result of applying the tolerance rule to a day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToleranceResult {
    /// The day's punches in timestamp order with considered times set.
    pub punches: Vec<Punch>,
    /// The adjustment made, if any.
    pub adjustment: Option<ToleranceAdjustment>,
    /// The audit step recording the decision.
    pub audit_step: AuditStep,
}

/// Lists the pauses between each clock-out and the next clock-in.
///
/// Punches are paired by position after sorting by actual time, so the
/// pauses are (1→2), (3→4), and so on.
pub fn find_break_pauses(punches: &[Punch]) -> Vec<BreakPause> {
    let mut sorted = punches.to_vec();
    sort_by_timestamp(&mut sorted);

    sorted
        .iter()
        .enumerate()
        .skip(1)
        .step_by(2)
        .filter_map(|(i, clock_out)| {
            sorted.get(i + 1).map(|clock_in| BreakPause {
                clock_out_id: clock_out.id,
                clock_in_id: clock_in.id,
                start: clock_out.timestamp,
                end: clock_in.timestamp,
                minutes: (clock_in.timestamp - clock_out.timestamp).num_minutes(),
            })
        })
        .collect()
}

/// Picks the principal pause among those at least `min_break_minutes` long.
///
/// With an ideal break start the pause whose start is closest to it wins
/// (ties go to the earlier pause); otherwise the first long-enough pause.
pub fn select_principal_pause<'a>(
    pauses: &'a [BreakPause],
    settings: &ToleranceSettings,
) -> Option<&'a BreakPause> {
    let mut long_enough = pauses
        .iter()
        .filter(|p| p.duration() >= Duration::minutes(settings.min_break_minutes));

    match settings.ideal_break_start {
        Some(ideal) => long_enough.min_by_key(|p| (p.start.time() - ideal).num_seconds().abs()),
        None => long_enough.next(),
    }
}

/// Applies the break tolerance to one day's punches.
///
/// Every punch gets `considered_timestamp` reset to its actual time, except
/// the return punch of an eligible principal pause, which is moved to
/// `break start + minimum`. A pause is eligible when its length lies in
/// `[minimum, minimum + tolerance]`.
///
/// # Examples
///
/// ```
/// use timebank_engine::calculation::{ToleranceSettings, apply_tolerance};
/// use timebank_engine::models::Punch;
/// use chrono::NaiveDateTime;
///
/// let at = |s: &str| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap();
/// let punches = vec![
///     Punch::new("emp_001", at("2026-01-15 08:00")),
///     Punch::new("emp_001", at("2026-01-15 12:00")),
///     Punch::new("emp_001", at("2026-01-15 13:14")),
///     Punch::new("emp_001", at("2026-01-15 17:00")),
/// ];
/// let settings = ToleranceSettings {
///     min_break_minutes: 60,
///     tolerance_minutes: 15,
///     ideal_break_start: None,
/// };
///
/// let result = apply_tolerance(&punches, &settings, 1);
/// assert_eq!(result.punches[2].considered_time(), at("2026-01-15 13:00"));
/// ```
pub fn apply_tolerance(
    punches: &[Punch],
    settings: &ToleranceSettings,
    step_number: u32,
) -> ToleranceResult {
    let mut adjusted = punches.to_vec();
    sort_by_timestamp(&mut adjusted);
    for punch in adjusted.iter_mut() {
        punch.considered_timestamp = Some(punch.timestamp);
    }

    let pauses = find_break_pauses(&adjusted);
    let principal = if settings.min_break_minutes > 0 {
        select_principal_pause(&pauses, settings)
    } else {
        None
    };

    let window_end = settings.min_break_minutes + settings.tolerance_minutes.max(0);
    let eligible = principal.filter(|p| p.duration() <= Duration::minutes(window_end));

    let adjustment = eligible.and_then(|pause| {
        let considered = pause.start + Duration::minutes(settings.min_break_minutes);
        let forgiven = pause.end - considered;
        if forgiven <= Duration::zero() {
            return None;
        }
        let punch = adjusted.iter_mut().find(|p| p.id == pause.clock_in_id)?;
        punch.considered_timestamp = Some(considered);
        Some(ToleranceAdjustment {
            punch_id: punch.id,
            actual: punch.timestamp,
            considered,
            pause_minutes: pause.minutes,
            forgiven_minutes: forgiven.num_minutes(),
        })
    });

    let reasoning = match (principal, &adjustment) {
        (None, _) => format!(
            "No pause of at least {} minutes; no tolerance applied",
            settings.min_break_minutes
        ),
        (Some(p), Some(adj)) => format!(
            "Principal pause of {} minutes is within [{}, {}]; return considered at {} ({} minutes forgiven)",
            p.minutes,
            settings.min_break_minutes,
            window_end,
            adj.considered.time(),
            adj.forgiven_minutes
        ),
        (Some(p), None) if p.duration() > Duration::minutes(window_end) => format!(
            "Principal pause of {} minutes exceeds {} minute window; no tolerance applied",
            p.minutes, window_end
        ),
        (Some(p), None) => format!(
            "Principal pause of {} minutes equals the minimum; nothing to forgive",
            p.minutes
        ),
    };

    let audit_step = AuditStep {
        step_number,
        rule_id: "break_tolerance".to_string(),
        rule_name: "Break Tolerance".to_string(),
        input: serde_json::json!({
            "punch_count": adjusted.len(),
            "min_break_minutes": settings.min_break_minutes,
            "tolerance_minutes": settings.tolerance_minutes,
            "ideal_break_start": settings.ideal_break_start.map(|t| t.to_string()),
        }),
        output: serde_json::json!({
            "principal_pause_minutes": principal.map(|p| p.minutes),
            "adjusted_punch": adjustment.as_ref().map(|a| a.punch_id.to_string()),
            "forgiven_minutes": adjustment.as_ref().map_or(0, |a| a.forgiven_minutes),
        }),
        reasoning,
    };

    ToleranceResult {
        punches: adjusted,
        adjustment,
        audit_step,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn at(time: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(&format!("2026-01-15 {}", time), "%Y-%m-%d %H:%M").unwrap()
    }

    fn at_secs(time: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(&format!("2026-01-15 {}", time), "%Y-%m-%d %H:%M:%S")
            .unwrap()
    }

    fn day(times: &[&str]) -> Vec<Punch> {
        times.iter().map(|t| Punch::new("emp_001", at(t))).collect()
    }

    fn settings(min: i64, tolerance: i64, ideal: Option<&str>) -> ToleranceSettings {
        ToleranceSettings {
            min_break_minutes: min,
            tolerance_minutes: tolerance,
            ideal_break_start: ideal.map(|s| NaiveTime::parse_from_str(s, "%H:%M").unwrap()),
        }
    }

    fn considered(result: &ToleranceResult) -> Vec<NaiveDateTime> {
        result.punches.iter().map(Punch::considered_time).collect()
    }

    // ==========================================================================
    // TOL-001: 74 minute pause with 60 + 15 window is forgiven
    // ==========================================================================
    #[test]
    fn test_tol_001_pause_within_window_is_adjusted() {
        let punches = day(&["08:00", "12:00", "13:14", "17:00"]);
        let result = apply_tolerance(&punches, &settings(60, 15, None), 1);

        assert_eq!(
            considered(&result),
            vec![at("08:00"), at("12:00"), at("13:00"), at("17:00")]
        );
        let adjustment = result.adjustment.unwrap();
        assert_eq!(adjustment.pause_minutes, 74);
        assert_eq!(adjustment.forgiven_minutes, 14);
        assert_eq!(adjustment.actual, at("13:14"));
        assert_eq!(result.audit_step.rule_id, "break_tolerance");
    }

    // ==========================================================================
    // TOL-002: 80 minute pause is outside the window
    // ==========================================================================
    #[test]
    fn test_tol_002_pause_beyond_window_is_untouched() {
        let punches = day(&["08:00", "12:00", "13:20", "17:00"]);
        let result = apply_tolerance(&punches, &settings(60, 15, None), 1);

        assert!(result.adjustment.is_none());
        assert_eq!(
            considered(&result),
            vec![at("08:00"), at("12:00"), at("13:20"), at("17:00")]
        );
        assert!(result.audit_step.reasoning.contains("exceeds"));
    }

    #[test]
    fn test_window_upper_bound_is_inclusive() {
        let punches = day(&["08:00", "12:00", "13:15", "17:00"]);
        let result = apply_tolerance(&punches, &settings(60, 15, None), 1);
        assert_eq!(result.adjustment.unwrap().forgiven_minutes, 15);
    }

    #[test]
    fn test_window_is_checked_on_exact_pause_length() {
        // 75 minutes and 30 seconds: past the 60 + 15 window.
        let punches: Vec<Punch> = ["08:00:00", "12:00:00", "13:15:30", "17:00:00"]
            .iter()
            .map(|t| Punch::new("emp_001", at_secs(t)))
            .collect();
        let result = apply_tolerance(&punches, &settings(60, 15, None), 1);

        assert!(result.adjustment.is_none());
        assert_eq!(result.punches[2].considered_time(), at_secs("13:15:30"));
        assert!(result.audit_step.reasoning.contains("exceeds"));
    }

    #[test]
    fn test_pause_seconds_short_of_minimum_is_not_principal() {
        // 59 minutes and 30 seconds never reaches the minimum break.
        let punches: Vec<Punch> = ["08:00:00", "12:00:00", "12:59:30", "17:00:00"]
            .iter()
            .map(|t| Punch::new("emp_001", at_secs(t)))
            .collect();
        let pauses = find_break_pauses(&punches);

        assert!(select_principal_pause(&pauses, &settings(60, 15, None)).is_none());
    }

    #[test]
    fn test_partial_minute_inside_window_is_forgiven_exactly() {
        let punches: Vec<Punch> = ["08:00:00", "12:00:00", "13:14:30", "17:00:00"]
            .iter()
            .map(|t| Punch::new("emp_001", at_secs(t)))
            .collect();
        let result = apply_tolerance(&punches, &settings(60, 15, None), 1);

        assert_eq!(result.punches[2].considered_time(), at_secs("13:00:00"));
        assert_eq!(result.adjustment.unwrap().forgiven_minutes, 14);
    }

    #[test]
    fn test_short_pause_deficit_is_never_forgiven() {
        let punches = day(&["08:00", "12:00", "12:45", "17:00"]);
        let result = apply_tolerance(&punches, &settings(60, 15, None), 1);

        assert!(result.adjustment.is_none());
        assert_eq!(result.punches[2].considered_time(), at("12:45"));
    }

    #[test]
    fn test_exact_minimum_pause_needs_no_adjustment() {
        let punches = day(&["08:00", "12:00", "13:00", "17:00"]);
        let result = apply_tolerance(&punches, &settings(60, 15, None), 1);
        assert!(result.adjustment.is_none());
        assert!(result.audit_step.reasoning.contains("equals the minimum"));
    }

    #[test]
    fn test_first_long_pause_is_principal_without_ideal() {
        // First long pause (10:00-11:05) is eligible, second (14:00-15:10) is not adjusted.
        let punches = day(&["08:00", "10:00", "11:05", "14:00", "15:10", "18:00"]);
        let result = apply_tolerance(&punches, &settings(60, 15, None), 1);

        assert_eq!(
            considered(&result),
            vec![at("08:00"), at("10:00"), at("11:00"), at("14:00"), at("15:10"), at("18:00")]
        );
    }

    #[test]
    fn test_ideal_start_picks_closest_pause() {
        let punches = day(&["08:00", "10:00", "11:05", "12:00", "13:10", "18:00"]);
        let result = apply_tolerance(&punches, &settings(60, 15, Some("12:00")), 1);

        assert_eq!(result.adjustment.as_ref().unwrap().actual, at("13:10"));
        assert_eq!(result.punches[2].considered_time(), at("11:05"));
        assert_eq!(result.punches[4].considered_time(), at("13:00"));
    }

    #[test]
    fn test_ineligible_principal_blocks_other_pauses() {
        // Closest to ideal is 12:00-13:30 (90 min, ineligible); the 65 min pause stays untouched.
        let punches = day(&["07:00", "09:00", "10:05", "12:00", "13:30", "17:00"]);
        let result = apply_tolerance(&punches, &settings(60, 15, Some("12:00")), 1);

        assert!(result.adjustment.is_none());
        assert_eq!(result.punches[2].considered_time(), at("10:05"));
    }

    #[test]
    fn test_short_pauses_are_not_candidates() {
        // 15 minute coffee break is ignored; lunch is the principal pause.
        let punches = day(&["08:00", "10:00", "10:15", "12:00", "13:10", "17:00"]);
        let result = apply_tolerance(&punches, &settings(60, 15, None), 1);
        assert_eq!(result.adjustment.unwrap().actual, at("13:10"));
    }

    #[test]
    fn test_unsorted_input_is_sorted() {
        let punches = day(&["13:14", "08:00", "17:00", "12:00"]);
        let result = apply_tolerance(&punches, &settings(60, 15, None), 1);
        assert_eq!(result.punches[0].timestamp, at("08:00"));
        assert_eq!(result.punches[2].considered_time(), at("13:00"));
    }

    #[test]
    fn test_stale_considered_time_is_reset() {
        let mut punches = day(&["08:00", "12:00"]);
        punches[1].considered_timestamp = Some(at("11:00"));
        let result = apply_tolerance(&punches, &settings(60, 15, None), 1);
        assert_eq!(result.punches[1].considered_time(), at("12:00"));
    }

    #[test]
    fn test_zero_minimum_disables_tolerance() {
        let punches = day(&["08:00", "12:00", "12:10", "17:00"]);
        let result = apply_tolerance(&punches, &settings(0, 15, None), 1);
        assert!(result.adjustment.is_none());
    }

    #[test]
    fn test_odd_punch_count_pauses() {
        let punches = day(&["08:00", "12:00", "13:05"]);
        let pauses = find_break_pauses(&punches);
        assert_eq!(pauses.len(), 1);
        assert_eq!(pauses[0].minutes, 65);
    }

    proptest! {
        #[test]
        fn prop_at_most_one_punch_moves_and_only_backwards(
            gaps in proptest::collection::vec(1i64..10_800, 1..8),
            min in 30i64..90,
            tolerance in 0i64..30,
        ) {
            let base = at("06:00");
            let mut t = base;
            let mut punches = vec![Punch::new("emp_001", t)];
            for gap in &gaps {
                t += Duration::seconds(*gap);
                punches.push(Punch::new("emp_001", t));
            }

            let result = apply_tolerance(&punches, &settings(min, tolerance, None), 1);
            let moved: Vec<&Punch> = result.punches.iter().filter(|p| p.is_adjusted()).collect();

            prop_assert!(moved.len() <= 1);
            for punch in moved {
                prop_assert!(punch.considered_time() < punch.timestamp);
                let forgiven = punch.timestamp - punch.considered_time();
                prop_assert!(forgiven <= Duration::minutes(tolerance));
            }
        }
    }
}
