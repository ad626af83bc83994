//! Punch validation.
//!
//! A candidate punch is checked against the day's existing punches before
//! it is persisted. Every rule runs independently and the caller receives
//! the full list of violations, so a form can show all problems at once.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{EmploymentRules, Punch, PunchKind};

use super::calendar::DayResolution;
use super::daily_summary::{pair_intervals, total_worked_duration};

/// A punch the caller wants to register.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PunchCandidate {
    /// The employment the punch belongs to.
    pub employment_id: String,
    /// The day the punch is registered on.
    pub date: NaiveDate,
    /// The time of the punch.
    pub time: NaiveTime,
    /// The kind the caller believes this punch is.
    #[serde(default)]
    pub declared_kind: Option<PunchKind>,
    /// Accept a time later than `now` on today's date.
    #[serde(default)]
    pub allow_future_time: bool,
    /// Last punch of the previous working day, for the rest check.
    #[serde(default)]
    pub previous_day_last_punch: Option<NaiveDateTime>,
}

impl PunchCandidate {
    /// Creates a candidate with no declared kind and no overrides.
    pub fn new(employment_id: impl Into<String>, date: NaiveDate, time: NaiveTime) -> Self {
        Self {
            employment_id: employment_id.into(),
            date,
            time,
            declared_kind: None,
            allow_future_time: false,
            previous_day_last_punch: None,
        }
    }

    /// Sets the declared kind.
    pub fn declared(mut self, kind: PunchKind) -> Self {
        self.declared_kind = Some(kind);
        self
    }

    /// Returns the candidate's full timestamp.
    pub fn timestamp(&self) -> NaiveDateTime {
        self.date.and_time(self.time)
    }
}

/// A rule a candidate punch violates.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum PunchViolation {
    /// The date is after today.
    #[error("Date {date} is in the future (today is {today})")]
    FutureDate {
        /// The candidate date.
        date: NaiveDate,
        /// The caller's current date.
        today: NaiveDate,
    },

    /// The time is after now on today's date.
    #[error("Time {time} is later than now ({now})")]
    FutureTime {
        /// The candidate timestamp.
        time: NaiveDateTime,
        /// The caller's current time.
        now: NaiveDateTime,
    },

    /// The day already holds the maximum number of punches.
    #[error("Day already has the maximum of {max} punches")]
    MaxPunchesReached {
        /// The configured maximum.
        max: usize,
    },

    /// A punch with the exact same time exists.
    #[error("A punch at {time} already exists")]
    DuplicateTime {
        /// The duplicated timestamp.
        time: NaiveDateTime,
    },

    /// The declared kind does not match the position in the day.
    #[error("Expected a {expected} at this position but got a {declared}")]
    SequenceMismatch {
        /// The kind implied by position.
        expected: PunchKind,
        /// The kind the caller declared.
        declared: PunchKind,
    },

    /// The candidate is too close to an existing punch.
    #[error("Punch is {actual_minutes} minutes from {neighbor}; minimum spacing is {min_spacing_minutes}")]
    SpacingTooShort {
        /// The nearby punch.
        neighbor: NaiveDateTime,
        /// Whole minutes between the two punches.
        actual_minutes: i64,
        /// The configured minimum.
        min_spacing_minutes: i64,
    },

    /// Closing the interval would exceed the maximum shift length.
    #[error("Worked time would reach {worked_minutes} minutes; maximum is {max_shift_minutes}")]
    ShiftTooLong {
        /// Worked minutes including the candidate.
        worked_minutes: i64,
        /// The configured maximum.
        max_shift_minutes: i64,
    },

    /// The calendar forbids registering punches on the date.
    #[error("Punches cannot be registered on {date}: {reason}")]
    RegistrationNotAllowed {
        /// The candidate date.
        date: NaiveDate,
        /// Why registration is blocked.
        reason: String,
    },

    /// Not enough rest since the previous day's last punch.
    #[error("Only {rest_minutes} minutes of rest since the previous day; minimum is {required_minutes}")]
    InsufficientRest {
        /// Minutes since the previous day's last punch.
        rest_minutes: i64,
        /// The configured minimum rest.
        required_minutes: i64,
    },
}

impl PunchViolation {
    /// A stable code for programmatic handling.
    pub fn code(&self) -> &'static str {
        match self {
            PunchViolation::FutureDate { .. } => "future_date",
            PunchViolation::FutureTime { .. } => "future_time",
            PunchViolation::MaxPunchesReached { .. } => "max_punches_reached",
            PunchViolation::DuplicateTime { .. } => "duplicate_time",
            PunchViolation::SequenceMismatch { .. } => "sequence_mismatch",
            PunchViolation::SpacingTooShort { .. } => "spacing_too_short",
            PunchViolation::ShiftTooLong { .. } => "shift_too_long",
            PunchViolation::RegistrationNotAllowed { .. } => "registration_not_allowed",
            PunchViolation::InsufficientRest { .. } => "insufficient_rest",
        }
    }
}

/// A rejected punch with every rule it violates.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("Punch rejected with {} violation(s)", .violations.len())]
pub struct PunchRejection {
    /// The violated rules, in check order.
    pub violations: Vec<PunchViolation>,
}

impl PunchRejection {
    /// Returns true if any violation has the given code.
    pub fn has(&self, code: &str) -> bool {
        self.violations.iter().any(|v| v.code() == code)
    }
}

/// A punch that passed every check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptedPunch {
    /// The full timestamp to persist.
    pub timestamp: NaiveDateTime,
    /// The kind implied by its position.
    pub kind: PunchKind,
    /// Zero-based position among the day's punches.
    pub position: usize,
}

/// Validates a candidate punch against the day's existing punches.
///
/// `now` is supplied by the caller; the engine never reads a clock.
///
/// # Errors
///
/// Returns a [`PunchRejection`] listing every violated rule.
///
/// # Examples
///
/// ```
/// use timebank_engine::calculation::{CalendarResolver, PunchCandidate, validate_punch};
/// use timebank_engine::models::{EmploymentRules, Location, Punch, PunchKind};
/// use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
///
/// let date = NaiveDate::from_ymd_opt(2026, 1, 15).unwrap();
/// let rules = EmploymentRules::new(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(), 480);
/// let day = CalendarResolver::new(&[], &[]).resolve(date, "emp_001", &Location::default(), &rules, 1);
/// let now = date.and_hms_opt(18, 0, 0).unwrap();
/// let existing = vec![Punch::new("emp_001", date.and_hms_opt(8, 0, 0).unwrap())];
///
/// let candidate = PunchCandidate::new("emp_001", date, NaiveTime::from_hms_opt(12, 0, 0).unwrap())
///     .declared(PunchKind::ClockOut);
/// let accepted = validate_punch(&candidate, &existing, &rules, &day, now).unwrap();
/// assert_eq!(accepted.kind, PunchKind::ClockOut);
/// ```
pub fn validate_punch(
    candidate: &PunchCandidate,
    existing: &[Punch],
    rules: &EmploymentRules,
    day: &DayResolution,
    now: NaiveDateTime,
) -> Result<AcceptedPunch, PunchRejection> {
    let timestamp = candidate.timestamp();
    let today = now.date();
    let mut violations = Vec::new();

    if !day.registration_allowed {
        violations.push(PunchViolation::RegistrationNotAllowed {
            date: candidate.date,
            reason: "weekend day without a configured schedule".to_string(),
        });
    }

    if candidate.date > today {
        violations.push(PunchViolation::FutureDate {
            date: candidate.date,
            today,
        });
    } else if candidate.date == today && timestamp > now && !candidate.allow_future_time {
        violations.push(PunchViolation::FutureTime {
            time: timestamp,
            now,
        });
    }

    if existing.len() >= rules.max_punches_per_day {
        violations.push(PunchViolation::MaxPunchesReached {
            max: rules.max_punches_per_day,
        });
    }

    if existing.iter().any(|p| p.timestamp == timestamp) {
        violations.push(PunchViolation::DuplicateTime { time: timestamp });
    }

    let position = existing.iter().filter(|p| p.timestamp < timestamp).count();
    let kind = PunchKind::at_position(position);
    if let Some(declared) = candidate.declared_kind {
        if declared != kind {
            violations.push(PunchViolation::SequenceMismatch {
                expected: kind,
                declared,
            });
        }
    }

    let min_spacing = Duration::minutes(rules.min_punch_spacing_minutes);
    if let Some(neighbor) = existing
        .iter()
        .filter(|p| p.timestamp != timestamp)
        .min_by_key(|p| (p.timestamp - timestamp).abs())
    {
        let distance = (neighbor.timestamp - timestamp).abs();
        if distance < min_spacing {
            violations.push(PunchViolation::SpacingTooShort {
                neighbor: neighbor.timestamp,
                actual_minutes: distance.num_minutes(),
                min_spacing_minutes: rules.min_punch_spacing_minutes,
            });
        }
    }

    if kind == PunchKind::ClockOut {
        let worked = worked_with(existing, candidate, timestamp);
        if worked > Duration::minutes(rules.max_shift_minutes) {
            violations.push(PunchViolation::ShiftTooLong {
                worked_minutes: worked.num_minutes(),
                max_shift_minutes: rules.max_shift_minutes,
            });
        }
    }

    if position == 0 {
        if let Some(previous) = candidate.previous_day_last_punch {
            let rest_minutes = (timestamp - previous).num_minutes();
            if rest_minutes < rules.min_interjourney_rest_minutes {
                violations.push(PunchViolation::InsufficientRest {
                    rest_minutes,
                    required_minutes: rules.min_interjourney_rest_minutes,
                });
            }
        }
    }

    if violations.is_empty() {
        Ok(AcceptedPunch {
            timestamp,
            kind,
            position,
        })
    } else {
        Err(PunchRejection { violations })
    }
}

/// Worked time of the day with the candidate inserted, on actual times.
fn worked_with(existing: &[Punch], candidate: &PunchCandidate, timestamp: NaiveDateTime) -> Duration {
    let mut punches: Vec<Punch> = existing
        .iter()
        .cloned()
        .map(|mut p| {
            p.considered_timestamp = None;
            p
        })
        .collect();
    punches.push(Punch::new(candidate.employment_id.clone(), timestamp));
    total_worked_duration(&pair_intervals(&punches))
}
