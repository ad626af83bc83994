//! Calendar resolution for a single date.
//!
//! This module classifies a date as holiday, bridge, weekend, absence or
//! regular workday for one employment, and derives the expected minutes
//! and whether punches may be registered on it.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::models::{
    Absence, AuditStep, AuditWarning, DayKind, EmploymentRules, Holiday, HolidayKind, Location,
    is_weekend,
};

/// Why a day's expected minutes were forced to zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZeroReason {
    /// A zeroing absence covers the day.
    Absence,
    /// A non-bridge holiday falls on the day.
    Holiday,
    /// The day is a bridge day.
    Bridge,
    /// Weekend day without a schedule override.
    UnscheduledWeekend,
}

/// The calendar context of one date for one employment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayResolution {
    /// The resolved date.
    pub date: NaiveDate,
    /// The employment the resolution applies to.
    pub employment_id: String,
    /// Highest-priority applicable holiday, if any.
    pub holiday: Option<Holiday>,
    /// Whether the date is a Saturday or Sunday.
    pub is_weekend: bool,
    /// Absence covering the date, if any.
    pub absence: Option<Absence>,
    /// Whether the winning holiday is a bridge day.
    pub is_bridge: bool,
    /// Minutes the schedule expects on this weekday, `None` when unscheduled.
    pub scheduled_minutes: Option<i64>,
    /// Expected minutes after calendar modifiers (bridge add-on excluded).
    pub expected_minutes: i64,
    /// Why expected minutes are zero, if they were zeroed.
    pub zeroed_by: Option<ZeroReason>,
    /// Whether punches may be registered on the date.
    pub registration_allowed: bool,
    /// Overall classification of the day.
    pub day_kind: DayKind,
    /// Ambiguities found while resolving.
    pub warnings: Vec<AuditWarning>,
    /// The audit step recording this resolution.
    pub audit_step: AuditStep,
}

impl DayResolution {
    /// Whether calendar context forces zero expected minutes.
    pub fn is_zeroed(&self) -> bool {
        self.zeroed_by.is_some()
    }
}

/// Read-only view over the holiday and absence stores.
///
/// The resolver never mutates the records it is given.
///
/// # Example
///
/// ```
/// use timebank_engine::calculation::CalendarResolver;
/// use timebank_engine::models::{EmploymentRules, Holiday, HolidayKind, Location};
/// use chrono::NaiveDate;
///
/// let holidays = vec![Holiday::annual("Christmas", HolidayKind::National, 12, 25)];
/// let resolver = CalendarResolver::new(&holidays, &[]);
/// let rules = EmploymentRules::new(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(), 480);
///
/// let day = resolver.resolve(
///     NaiveDate::from_ymd_opt(2026, 12, 25).unwrap(),
///     "emp_001",
///     &Location::default(),
///     &rules,
///     1,
/// );
/// assert_eq!(day.expected_minutes, 0);
/// assert_eq!(day.holiday.unwrap().name, "Christmas");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct CalendarResolver<'a> {
    holidays: &'a [Holiday],
    absences: &'a [Absence],
}

impl<'a> CalendarResolver<'a> {
    /// Creates a resolver over holiday and absence snapshots.
    pub fn new(holidays: &'a [Holiday], absences: &'a [Absence]) -> Self {
        Self { holidays, absences }
    }

    /// Returns the applicable holidays on `date`, highest priority first.
    ///
    /// Ties on priority are broken by name so the order is deterministic.
    pub fn holidays_on(
        &self,
        date: NaiveDate,
        employment_id: &str,
        location: &Location,
    ) -> Vec<&'a Holiday> {
        let mut matching: Vec<&Holiday> = self
            .holidays
            .iter()
            .filter(|h| h.occurs_on(date) && h.applies_to(employment_id, location))
            .collect();
        matching.sort_by(|a, b| {
            a.priority_rank()
                .cmp(&b.priority_rank())
                .then_with(|| a.name.cmp(&b.name))
                .then_with(|| a.id.cmp(&b.id))
        });
        matching
    }

    /// Returns the highest-priority applicable holiday on `date`.
    pub fn holiday_on(
        &self,
        date: NaiveDate,
        employment_id: &str,
        location: &Location,
    ) -> Option<&'a Holiday> {
        self.holidays_on(date, employment_id, location)
            .into_iter()
            .next()
    }

    /// Returns the absence covering `date`, plus a warning if several do.
    ///
    /// Overlaps should have been rejected on insert; when they slip through,
    /// a zeroing absence wins, then the earliest start.
    pub fn absence_on(
        &self,
        date: NaiveDate,
        employment_id: &str,
    ) -> (Option<&'a Absence>, Vec<AuditWarning>) {
        let mut covering: Vec<&Absence> = self
            .absences
            .iter()
            .filter(|a| a.employment_id == employment_id && a.covers(date))
            .collect();
        covering.sort_by(|a, b| {
            b.zeroes_expected()
                .cmp(&a.zeroes_expected())
                .then(a.start_date.cmp(&b.start_date))
                .then(a.id.cmp(&b.id))
        });

        let mut warnings = Vec::new();
        if covering.len() > 1 {
            warnings.push(AuditWarning::new(
                "overlapping_absences",
                format!(
                    "{} active absences cover {}; using {} ({})",
                    covering.len(),
                    date,
                    covering[0].id,
                    covering[0].absence_type
                ),
                "medium",
            ));
        }
        (covering.first().copied(), warnings)
    }

    /// Resolves the calendar context of `date` under `rules`.
    ///
    /// Expected minutes are zero when a zeroing absence covers the day, when
    /// a holiday or bridge falls on it, or when it is a weekend day without
    /// a schedule override. Otherwise they are the weekday's scheduled
    /// minutes; a non-zeroing absence leaves them untouched.
    pub fn resolve(
        &self,
        date: NaiveDate,
        employment_id: &str,
        location: &Location,
        rules: &EmploymentRules,
        step_number: u32,
    ) -> DayResolution {
        let weekend = is_weekend(date.weekday());
        let scheduled_minutes = rules.expected_minutes_for(date.weekday());
        let holiday = self.holiday_on(date, employment_id, location);
        let (absence, warnings) = self.absence_on(date, employment_id);
        let is_bridge = holiday.is_some_and(|h| h.kind == HolidayKind::Bridge);

        let zeroed_by = if absence.is_some_and(Absence::zeroes_expected) {
            Some(ZeroReason::Absence)
        } else if let Some(h) = holiday.filter(|h| h.kind.zeroes_expected()) {
            if h.kind == HolidayKind::Bridge {
                Some(ZeroReason::Bridge)
            } else {
                Some(ZeroReason::Holiday)
            }
        } else if scheduled_minutes.is_none() {
            Some(ZeroReason::UnscheduledWeekend)
        } else {
            None
        };

        let expected_minutes = match zeroed_by {
            Some(_) => 0,
            None => scheduled_minutes.unwrap_or(0),
        };

        let day_kind = if absence.is_some_and(Absence::zeroes_expected) {
            DayKind::Absence
        } else if is_bridge {
            DayKind::Bridge
        } else if holiday.is_some() {
            DayKind::Holiday
        } else if absence.is_some() {
            DayKind::Absence
        } else if weekend {
            DayKind::Weekend
        } else {
            DayKind::Workday
        };

        let registration_allowed = scheduled_minutes.is_some();

        let reasoning = match zeroed_by {
            Some(ZeroReason::Absence) => format!(
                "{} absence zeroes expected time on {}",
                absence.map(|a| a.absence_type.to_string()).unwrap_or_default(),
                date
            ),
            Some(ZeroReason::Holiday) | Some(ZeroReason::Bridge) => format!(
                "{} holiday '{}' zeroes expected time on {}",
                holiday.map(|h| h.kind.to_string()).unwrap_or_default(),
                holiday.map(|h| h.name.as_str()).unwrap_or_default(),
                date
            ),
            Some(ZeroReason::UnscheduledWeekend) => format!(
                "{} is a weekend day without a schedule; expected time is zero and registration is blocked",
                date
            ),
            None => format!(
                "{} is a {} with {} expected minutes",
                date, day_kind, expected_minutes
            ),
        };

        let audit_step = AuditStep {
            step_number,
            rule_id: "calendar_resolution".to_string(),
            rule_name: "Calendar Resolution".to_string(),
            input: serde_json::json!({
                "date": date.to_string(),
                "employment_id": employment_id,
                "state": location.state,
                "municipality": location.municipality,
            }),
            output: serde_json::json!({
                "day_kind": day_kind,
                "holiday": holiday.map(|h| h.name.clone()),
                "absence": absence.map(|a| a.absence_type),
                "expected_minutes": expected_minutes,
                "registration_allowed": registration_allowed,
            }),
            reasoning,
        };

        DayResolution {
            date,
            employment_id: employment_id.to_string(),
            holiday: holiday.cloned(),
            is_weekend: weekend,
            absence: absence.cloned(),
            is_bridge,
            scheduled_minutes,
            expected_minutes,
            zeroed_by,
            registration_allowed,
            day_kind,
            warnings,
            audit_step,
        }
    }
}
