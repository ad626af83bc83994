//! Absence model and overlap checks.
//!
//! Absences cover an inclusive date range. Whether an absence zeroes the
//! expected time of the days it covers is a property of its type.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};

/// The type of an absence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbsenceType {
    /// Paid vacation ("férias").
    #[serde(alias = "ferias")]
    Vacation,
    /// Medical leave backed by a certificate.
    Medical,
    /// Attendance declaration (appointment, court, etc.).
    Declaration,
    /// Absence justified by law or agreement.
    JustifiedAbsence,
    /// Day off compensated from the time bank ("folga").
    DayOff,
    /// Absence without justification.
    UnjustifiedAbsence,
}

impl AbsenceType {
    /// Whether a covered day has zero expected minutes.
    ///
    /// Day-off and unjustified absences keep the scheduled expectation, so a
    /// day without punches ends with a negative balance.
    ///
    /// # Example
    ///
    /// ```
    /// use timebank_engine::models::AbsenceType;
    ///
    /// assert!(AbsenceType::Vacation.zeroes_expected());
    /// assert!(!AbsenceType::DayOff.zeroes_expected());
    /// ```
    pub fn zeroes_expected(self) -> bool {
        match self {
            AbsenceType::Vacation
            | AbsenceType::Medical
            | AbsenceType::Declaration
            | AbsenceType::JustifiedAbsence => true,
            AbsenceType::DayOff | AbsenceType::UnjustifiedAbsence => false,
        }
    }
}

impl std::fmt::Display for AbsenceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AbsenceType::Vacation => write!(f, "vacation"),
            AbsenceType::Medical => write!(f, "medical"),
            AbsenceType::Declaration => write!(f, "declaration"),
            AbsenceType::JustifiedAbsence => write!(f, "justified_absence"),
            AbsenceType::DayOff => write!(f, "day_off"),
            AbsenceType::UnjustifiedAbsence => write!(f, "unjustified_absence"),
        }
    }
}

fn default_active() -> bool {
    true
}

/// An absence of one employment over an inclusive date range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Absence {
    /// Unique identifier for the absence.
    pub id: Uuid,
    /// The employment this absence belongs to.
    pub employment_id: String,
    /// The absence type.
    pub absence_type: AbsenceType,
    /// First covered date.
    pub start_date: NaiveDate,
    /// Last covered date (inclusive).
    pub end_date: NaiveDate,
    /// Inactive absences are ignored everywhere.
    #[serde(default = "default_active")]
    pub active: bool,
    /// Free-text note.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl Absence {
    /// Creates an active absence with a fresh id.
    pub fn new(
        employment_id: impl Into<String>,
        absence_type: AbsenceType,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            employment_id: employment_id.into(),
            absence_type,
            start_date,
            end_date,
            active: true,
            note: None,
        }
    }

    /// Returns true if the absence is active and covers `date`.
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.active && self.start_date <= date && date <= self.end_date
    }

    /// Whether covered days have zero expected minutes.
    pub fn zeroes_expected(&self) -> bool {
        self.absence_type.zeroes_expected()
    }

    /// Returns the overlapping date range with `other`, if both are active
    /// and belong to the same employment.
    pub fn overlap_with(&self, other: &Absence) -> Option<(NaiveDate, NaiveDate)> {
        if !self.active || !other.active || self.employment_id != other.employment_id {
            return None;
        }
        let start = self.start_date.max(other.start_date);
        let end = self.end_date.min(other.end_date);
        (start <= end).then_some((start, end))
    }

    /// Checks the range is well-formed.
    pub fn validate(&self) -> EngineResult<()> {
        if self.start_date > self.end_date {
            return Err(EngineError::InvalidAbsence {
                absence_id: self.id,
                message: format!(
                    "start {} is after end {}",
                    self.start_date, self.end_date
                ),
            });
        }
        Ok(())
    }
}

/// Rejects `candidate` if it is malformed or overlaps an active absence of
/// the same employment in `existing`.
///
/// An entry of `existing` with the candidate's id is treated as the record
/// being edited and skipped.
pub fn check_absence_overlap(candidate: &Absence, existing: &[Absence]) -> EngineResult<()> {
    candidate.validate()?;
    for other in existing.iter().filter(|a| a.id != candidate.id) {
        if let Some((start, end)) = candidate.overlap_with(other) {
            return Err(EngineError::OverlappingAbsence {
                candidate: candidate.id,
                existing: other.id,
                start,
                end,
            });
        }
    }
    Ok(())
}

/// Returns every pair of overlapping active absences in `absences`.
pub fn find_overlapping_absences(absences: &[Absence]) -> Vec<(Uuid, Uuid)> {
    let mut pairs = Vec::new();
    for (i, a) in absences.iter().enumerate() {
        for b in &absences[i + 1..] {
            if a.overlap_with(b).is_some() {
                pairs.push((a.id, b.id));
            }
        }
    }
    pairs
}
