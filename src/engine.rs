//! Engine facade tying the calculation steps together.
//!
//! [`WorkTimeEngine`] borrows one employment's snapshot (rules history,
//! holidays, absences and bridge configurations) and runs calendar
//! resolution, break tolerance and summarization in order, recording each
//! step in an [`AuditTrace`].

use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::calculation::{
    AcceptedPunch, BridgeDayDistribution, CalendarResolver, DayResolution, PeriodSummary,
    PunchCandidate, PunchRejection, ToleranceAdjustment, ToleranceSettings, apply_tolerance,
    compute_daily_summary, count_bridge_days, distribute_bridge_days, summarize_period,
    summary_audit_step,
};
use crate::error::{EngineError, EngineResult};
use crate::models::{
    Absence, AuditTrace, AuditWarning, BridgeDayConfig, DailySummary, Employment,
    EmploymentRules, Holiday, Punch,
};

/// A computed day with the punches as considered and the audit trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyCalculation {
    /// The day's summary.
    pub summary: DailySummary,
    /// The punches with their considered times.
    pub punches: Vec<Punch>,
    /// The tolerance adjustment, if one was made.
    pub tolerance: Option<ToleranceAdjustment>,
    /// Steps and warnings produced along the way.
    pub audit_trace: AuditTrace,
}

/// Runs the work-time calculations for one employment.
#[derive(Debug, Clone, Copy)]
pub struct WorkTimeEngine<'a> {
    employment: &'a Employment,
    holidays: &'a [Holiday],
    absences: &'a [Absence],
    bridge_configs: &'a [BridgeDayConfig],
}

impl<'a> WorkTimeEngine<'a> {
    /// Creates an engine over an employment snapshot.
    pub fn new(
        employment: &'a Employment,
        holidays: &'a [Holiday],
        absences: &'a [Absence],
        bridge_configs: &'a [BridgeDayConfig],
    ) -> Self {
        Self {
            employment,
            holidays,
            absences,
            bridge_configs,
        }
    }

    /// Returns the employment this engine calculates for.
    pub fn employment(&self) -> &'a Employment {
        self.employment
    }

    /// Returns the rules version effective on `date`.
    pub fn rules_on(&self, date: NaiveDate) -> EngineResult<&'a EmploymentRules> {
        self.employment.rules.effective_on(date)
    }

    /// Resolves the calendar for `date` under the rules effective on it.
    pub fn resolve_day(&self, date: NaiveDate, step_number: u32) -> EngineResult<DayResolution> {
        let rules = self.rules_on(date)?;
        Ok(CalendarResolver::new(self.holidays, self.absences).resolve(
            date,
            &self.employment.id,
            &self.employment.location,
            rules,
            step_number,
        ))
    }

    /// Computes one day's summary from its raw punches.
    ///
    /// Punches dated on other days are ignored with a warning.
    ///
    /// # Errors
    ///
    /// Returns `RulesNotFound` if no rules version covers `date` and
    /// `EmploymentMismatch` for a punch of another employment.
    ///
    /// # Examples
    ///
    /// ```
    /// use timebank_engine::engine::WorkTimeEngine;
    /// use timebank_engine::models::{Employment, EmploymentRules, Location, Punch, RulesHistory};
    /// use chrono::NaiveDate;
    ///
    /// let date = NaiveDate::from_ymd_opt(2026, 1, 15).unwrap();
    /// let employment = Employment {
    ///     id: "emp_001".to_string(),
    ///     name: "Acme".to_string(),
    ///     location: Location::default(),
    ///     rules: RulesHistory::new("emp_001", vec![
    ///         EmploymentRules::new(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(), 480),
    ///     ]),
    /// };
    /// let punches = vec![
    ///     Punch::new("emp_001", date.and_hms_opt(8, 0, 0).unwrap()),
    ///     Punch::new("emp_001", date.and_hms_opt(17, 0, 0).unwrap()),
    /// ];
    ///
    /// let engine = WorkTimeEngine::new(&employment, &[], &[], &[]);
    /// let day = engine.compute_daily_summary(date, &punches)?;
    /// assert_eq!(day.summary.worked_minutes, 540);
    /// assert_eq!(day.summary.balance_minutes, 60);
    /// # Ok::<(), timebank_engine::error::EngineError>(())
    /// ```
    pub fn compute_daily_summary(
        &self,
        date: NaiveDate,
        punches: &[Punch],
    ) -> EngineResult<DailyCalculation> {
        let mut trace = AuditTrace::default();
        let rules = self.rules_on(date)?;

        if let Some(foreign) = punches.iter().find(|p| p.employment_id != self.employment.id) {
            return Err(EngineError::EmploymentMismatch {
                expected: self.employment.id.clone(),
                actual: foreign.employment_id.clone(),
            });
        }
        let (day_punches, outside): (Vec<Punch>, Vec<Punch>) =
            punches.iter().cloned().partition(|p| p.date() == date);
        if !outside.is_empty() {
            trace.warnings.push(AuditWarning::new(
                "punch_outside_day",
                format!("{} punch(es) not dated {} were ignored", outside.len(), date),
                "low",
            ));
        }

        let day = self.resolve_day(date, trace.next_step_number())?;
        trace.warnings.extend(day.warnings.iter().cloned());
        trace.steps.push(day.audit_step.clone());

        let tolerance = apply_tolerance(
            &day_punches,
            &ToleranceSettings::from(rules),
            trace.next_step_number(),
        );
        trace.steps.push(tolerance.audit_step);

        if day_punches.len() % 2 == 1 {
            trace.warnings.push(AuditWarning::new(
                "incomplete_day",
                format!(
                    "{} has {} punches; the last one is unmatched",
                    date,
                    day_punches.len()
                ),
                "medium",
            ));
        }

        let bridge = self
            .bridge_configs
            .iter()
            .find(|c| c.applies_to(&self.employment.id, date.year()));
        let summary = compute_daily_summary(date, &tolerance.punches, &day, bridge);
        let step_number = trace.next_step_number();
        trace.steps.push(summary_audit_step(&summary, step_number));

        Ok(DailyCalculation {
            summary,
            punches: tolerance.punches,
            tolerance: tolerance.adjustment,
            audit_trace: trace,
        })
    }

    /// Computes a summary for every date in `[start, end]`, grouping the
    /// punches by date.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPeriod` if `start > end`; otherwise the first error
    /// of [`compute_daily_summary`](Self::compute_daily_summary).
    pub fn compute_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        punches: &[Punch],
    ) -> EngineResult<Vec<DailySummary>> {
        if start > end {
            return Err(EngineError::InvalidPeriod { start, end });
        }

        let mut by_date: BTreeMap<NaiveDate, Vec<Punch>> = BTreeMap::new();
        for punch in punches {
            by_date.entry(punch.date()).or_default().push(punch.clone());
        }

        let mut summaries = Vec::new();
        let mut date = start;
        while date <= end {
            let day_punches = by_date.get(&date).map(Vec::as_slice).unwrap_or(&[]);
            summaries.push(self.compute_daily_summary(date, day_punches)?.summary);
            date += Duration::days(1);
        }
        Ok(summaries)
    }

    /// Computes every day in `[start, end]` and aggregates the result.
    pub fn summarize_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        punches: &[Punch],
    ) -> EngineResult<PeriodSummary> {
        let summaries = self.compute_range(start, end, punches)?;
        summarize_period(&summaries, start, end)
    }

    /// Validates a candidate punch against the day's existing punches.
    ///
    /// The outer result fails when the day cannot be evaluated at all (no
    /// rules, wrong employment); the inner result is the verdict.
    pub fn validate_punch(
        &self,
        candidate: &PunchCandidate,
        existing: &[Punch],
        now: NaiveDateTime,
    ) -> EngineResult<Result<AcceptedPunch, PunchRejection>> {
        if candidate.employment_id != self.employment.id {
            return Err(EngineError::EmploymentMismatch {
                expected: self.employment.id.clone(),
                actual: candidate.employment_id.clone(),
            });
        }
        let rules = self.rules_on(candidate.date)?;
        let day = self.resolve_day(candidate.date, 1)?;
        let same_day: Vec<Punch> = existing
            .iter()
            .filter(|p| p.date() == candidate.date)
            .cloned()
            .collect();

        Ok(crate::calculation::validate_punch(
            candidate, &same_day, rules, &day, now,
        ))
    }

    /// Distributes the year's bridge days over its working days.
    ///
    /// The daily target is taken from the rules effective on January 1st,
    /// or from the first version starting during the year. When
    /// `bridge_days` is `None` the applicable bridge holidays are counted.
    pub fn distribute_bridge_days(
        &self,
        year: i32,
        bridge_days: Option<u32>,
    ) -> EngineResult<BridgeDayDistribution> {
        let rules = self.rules_for_year(year)?;
        let location = &self.employment.location;
        let bridge_days = match bridge_days {
            Some(count) => count,
            None => count_bridge_days(year, &self.employment.id, location, self.holidays)?,
        };

        distribute_bridge_days(
            year,
            &self.employment.id,
            rules.daily_target_minutes,
            bridge_days,
            self.holidays,
            location,
            1,
        )
    }

    fn rules_for_year(&self, year: i32) -> EngineResult<&'a EmploymentRules> {
        let first_day = NaiveDate::from_ymd_opt(year, 1, 1).ok_or_else(|| {
            EngineError::CalculationError {
                message: format!("Year {} is out of range", year),
            }
        })?;
        self.rules_on(first_day).or_else(|err| {
            self.employment
                .rules
                .versions()
                .iter()
                .find(|rules| rules.effective_from.year() == year)
                .ok_or(err)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AbsenceType, HolidayKind, Location, PunchKind, RulesHistory};
    use chrono::NaiveTime;

    fn make_date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn make_datetime(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    fn employment() -> Employment {
        let mut rules = EmploymentRules::new(make_date("2026-01-01"), 480);
        rules.break_tolerance_minutes = 15;
        let mut reduced = EmploymentRules::new(make_date("2026-03-01"), 360);
        reduced.break_tolerance_minutes = 15;
        Employment {
            id: "emp_001".to_string(),
            name: "Acme".to_string(),
            location: Location::new("SP", "São Paulo"),
            rules: RulesHistory::new("emp_001", vec![rules, reduced]),
        }
    }

    fn punches(times: &[&str]) -> Vec<Punch> {
        times
            .iter()
            .map(|t| Punch::new("emp_001", make_datetime(t)))
            .collect()
    }

    fn full_day(date: &str) -> Vec<Punch> {
        punches(&[
            &format!("{} 08:00", date),
            &format!("{} 12:00", date),
            &format!("{} 13:14", date),
            &format!("{} 17:14", date),
        ])
    }

    // ==========================================================================
    // ENG-001: tolerance forgives a 74-minute lunch
    // ==========================================================================
    #[test]
    fn test_eng_001_tolerance_feeds_summary() {
        let employment = employment();
        let engine = WorkTimeEngine::new(&employment, &[], &[], &[]);

        let result = engine
            .compute_daily_summary(make_date("2026-01-15"), &full_day("2026-01-15"))
            .unwrap();

        // 240 + 254 with the return considered at 13:00
        assert_eq!(result.summary.worked_minutes, 494);
        assert_eq!(result.summary.balance_minutes, 14);
        assert!(result.summary.tolerance_applied);
        assert_eq!(result.tolerance.unwrap().forgiven_minutes, 14);

        let rule_ids: Vec<&str> = result
            .audit_trace
            .steps
            .iter()
            .map(|s| s.rule_id.as_str())
            .collect();
        assert_eq!(rule_ids, vec!["calendar_resolution", "break_tolerance", "daily_summary"]);
        let numbers: Vec<u32> = result.audit_trace.steps.iter().map(|s| s.step_number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
    }

    #[test]
    fn test_rules_version_follows_date() {
        let employment = employment();
        let engine = WorkTimeEngine::new(&employment, &[], &[], &[]);

        let before = engine.compute_daily_summary(make_date("2026-02-27"), &[]).unwrap();
        let after = engine.compute_daily_summary(make_date("2026-03-02"), &[]).unwrap();

        assert_eq!(before.summary.expected_minutes, 480);
        assert_eq!(after.summary.expected_minutes, 360);
    }

    #[test]
    fn test_date_before_first_rules_fails() {
        let employment = employment();
        let engine = WorkTimeEngine::new(&employment, &[], &[], &[]);
        assert!(matches!(
            engine.compute_daily_summary(make_date("2025-12-31"), &[]),
            Err(EngineError::RulesNotFound { .. })
        ));
    }

    #[test]
    fn test_vacation_day_via_engine() {
        let employment = employment();
        let vacation = Absence::new(
            "emp_001",
            AbsenceType::Vacation,
            make_date("2026-01-12"),
            make_date("2026-01-23"),
        );
        let absences = [vacation];
        let engine = WorkTimeEngine::new(&employment, &[], &absences, &[]);

        let idle = engine.compute_daily_summary(make_date("2026-01-15"), &[]).unwrap();
        assert_eq!(idle.summary.expected_minutes, 0);
        assert_eq!(idle.summary.balance_minutes, 0);

        let worked = engine
            .compute_daily_summary(
                make_date("2026-01-16"),
                &punches(&["2026-01-16 08:00", "2026-01-16 16:00"]),
            )
            .unwrap();
        assert_eq!(worked.summary.balance_minutes, 480);
    }

    #[test]
    fn test_bridge_add_on_applies_to_matching_year() {
        let employment = employment();
        let config = BridgeDayConfig {
            year: 2026,
            employment_id: "emp_001".to_string(),
            bridge_days: 3,
            total_compensable_minutes: 1440,
            working_days: 248,
            daily_add_on_minutes: 6,
            margin_minutes: 48,
        };
        let configs = [config];
        let engine = WorkTimeEngine::new(&employment, &[], &[], &configs);

        let result = engine.compute_daily_summary(make_date("2026-01-15"), &[]).unwrap();
        assert_eq!(result.summary.expected_minutes, 486);
        assert_eq!(result.summary.bridge_add_on_minutes, 6);
    }

    #[test]
    fn test_punches_of_other_days_are_ignored_with_warning() {
        let employment = employment();
        let engine = WorkTimeEngine::new(&employment, &[], &[], &[]);
        let mut mixed = full_day("2026-01-15");
        mixed.extend(punches(&["2026-01-16 08:00"]));

        let result = engine.compute_daily_summary(make_date("2026-01-15"), &mixed).unwrap();
        assert_eq!(result.summary.punch_count, 4);
        assert!(result.audit_trace.warnings.iter().any(|w| w.code == "punch_outside_day"));
    }

    #[test]
    fn test_odd_punch_day_warns() {
        let employment = employment();
        let engine = WorkTimeEngine::new(&employment, &[], &[], &[]);
        let result = engine
            .compute_daily_summary(
                make_date("2026-01-15"),
                &punches(&["2026-01-15 08:00", "2026-01-15 12:00", "2026-01-15 13:00"]),
            )
            .unwrap();

        assert!(!result.summary.is_complete);
        assert_eq!(result.summary.worked_minutes, 240);
        assert!(result.audit_trace.warnings.iter().any(|w| w.code == "incomplete_day"));
    }

    #[test]
    fn test_foreign_punch_rejected() {
        let employment = employment();
        let engine = WorkTimeEngine::new(&employment, &[], &[], &[]);
        let foreign = vec![Punch::new("emp_002", make_datetime("2026-01-15 08:00"))];

        assert!(matches!(
            engine.compute_daily_summary(make_date("2026-01-15"), &foreign),
            Err(EngineError::EmploymentMismatch { .. })
        ));
    }

    #[test]
    fn test_summarize_range_counts_every_day() {
        let employment = employment();
        let engine = WorkTimeEngine::new(&employment, &[], &[], &[]);
        let mut all = full_day("2026-01-12");
        all.extend(full_day("2026-01-13"));

        // Monday to Sunday: five weekdays expected, two worked with +14 each.
        let week = engine
            .summarize_range(make_date("2026-01-12"), make_date("2026-01-18"), &all)
            .unwrap();
        assert_eq!(week.days_summarized, 7);
        assert_eq!(week.days_worked, 2);
        assert_eq!(week.expected_minutes, 5 * 480);
        assert_eq!(week.balance_minutes, 2 * 494 - 5 * 480);
    }

    #[test]
    fn test_validate_punch_uses_day_rules() {
        let employment = employment();
        let engine = WorkTimeEngine::new(&employment, &[], &[], &[]);
        let date = make_date("2026-01-15");
        let existing = punches(&["2026-01-15 08:00", "2026-01-15 12:00"]);

        let candidate = PunchCandidate::new("emp_001", date, NaiveTime::from_hms_opt(13, 0, 0).unwrap())
            .declared(PunchKind::ClockOut);
        let verdict = engine
            .validate_punch(&candidate, &existing, make_datetime("2026-01-15 18:00"))
            .unwrap();

        assert!(verdict.unwrap_err().has("sequence_mismatch"));
    }

    #[test]
    fn test_distribute_bridge_days_counts_bridges() {
        let employment = employment();
        let holidays = vec![
            Holiday::single_year("Bridge", HolidayKind::Bridge, make_date("2026-01-02")),
            Holiday::annual("New Year", HolidayKind::National, 1, 1),
        ];
        let engine = WorkTimeEngine::new(&employment, &holidays, &[], &[]);

        let result = engine.distribute_bridge_days(2026, None).unwrap();
        assert_eq!(result.config.bridge_days, 1);
        // 261 weekdays minus New Year and the bridge
        assert_eq!(result.config.working_days, 259);
        assert_eq!(result.config.daily_add_on_minutes, 2);
    }
}
