//! Request types for the work-time accounting API.
//!
//! This module defines the JSON request structures for every endpoint and
//! their conversion into domain types.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::calculation::PunchCandidate;
use crate::error::EngineResult;
use crate::models::{Absence, AbsenceType, ClosureKind, Punch, PunchKind, check_absence_overlap};

/// A punch as sent by a client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PunchRequest {
    /// Existing punch id; a new one is generated when absent.
    #[serde(default)]
    pub id: Option<Uuid>,
    /// The recorded time.
    pub timestamp: NaiveDateTime,
    /// Whether the punch was edited by hand.
    #[serde(default)]
    pub manually_edited: bool,
    /// Free-text note.
    #[serde(default)]
    pub note: Option<String>,
}

impl PunchRequest {
    /// Converts the request into a punch of `employment_id`.
    pub fn into_punch(self, employment_id: &str) -> Punch {
        let mut punch = Punch::new(employment_id, self.timestamp);
        if let Some(id) = self.id {
            punch.id = id;
        }
        punch.manually_edited = self.manually_edited;
        punch.note = self.note;
        punch
    }
}

/// An absence as sent by a client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbsenceRequest {
    /// Existing absence id; a new one is generated when absent.
    #[serde(default)]
    pub id: Option<Uuid>,
    /// The absence type.
    pub absence_type: AbsenceType,
    /// First covered date.
    pub start_date: NaiveDate,
    /// Last covered date (inclusive).
    pub end_date: NaiveDate,
    /// Free-text note.
    #[serde(default)]
    pub note: Option<String>,
}

/// Converts absence requests into validated, non-overlapping absences.
pub fn into_absences(requests: Vec<AbsenceRequest>, employment_id: &str) -> EngineResult<Vec<Absence>> {
    let mut absences: Vec<Absence> = Vec::with_capacity(requests.len());
    for request in requests {
        let mut absence = Absence::new(
            employment_id,
            request.absence_type,
            request.start_date,
            request.end_date,
        );
        if let Some(id) = request.id {
            absence.id = id;
        }
        absence.note = request.note;
        absence.validate()?;
        check_absence_overlap(&absence, &absences)?;
        absences.push(absence);
    }
    Ok(absences)
}

/// Request body for `POST /summary`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryRequest {
    /// The employment to summarize.
    pub employment_id: String,
    /// The day to summarize.
    pub date: NaiveDate,
    /// The day's punches in any order.
    #[serde(default)]
    pub punches: Vec<PunchRequest>,
    /// Absences of the employment.
    #[serde(default)]
    pub absences: Vec<AbsenceRequest>,
}

/// Request body for `POST /punches/validate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidatePunchRequest {
    /// The employment registering the punch.
    pub employment_id: String,
    /// The day of the punch.
    pub date: NaiveDate,
    /// The time of the punch.
    pub time: NaiveTime,
    /// The kind the client believes the punch is.
    #[serde(default)]
    pub declared_kind: Option<PunchKind>,
    /// Accept a time later than now on today's date.
    #[serde(default)]
    pub allow_future_time: bool,
    /// Last punch of the previous working day.
    #[serde(default)]
    pub previous_day_last_punch: Option<NaiveDateTime>,
    /// Punches already registered on the day.
    #[serde(default)]
    pub existing: Vec<PunchRequest>,
    /// Absences of the employment.
    #[serde(default)]
    pub absences: Vec<AbsenceRequest>,
    /// The client's current time; the server clock is used when absent.
    #[serde(default)]
    pub now: Option<NaiveDateTime>,
}

impl ValidatePunchRequest {
    /// Returns the candidate described by the request.
    pub fn candidate(&self) -> PunchCandidate {
        PunchCandidate {
            employment_id: self.employment_id.clone(),
            date: self.date,
            time: self.time,
            declared_kind: self.declared_kind,
            allow_future_time: self.allow_future_time,
            previous_day_last_punch: self.previous_day_last_punch,
        }
    }
}

/// Request body for `POST /bridge-days`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeDaysRequest {
    /// The employment to distribute for.
    pub employment_id: String,
    /// The year to distribute.
    pub year: i32,
    /// Number of bridge days; counted from the holiday store when absent.
    #[serde(default)]
    pub bridge_days: Option<u32>,
}

/// One day of punches to fold into a ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayPunchesRequest {
    /// The day.
    pub date: NaiveDate,
    /// The day's punches.
    #[serde(default)]
    pub punches: Vec<PunchRequest>,
}

/// Request body for `POST /ledger/:employment_id/days`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordDaysRequest {
    /// The days to summarize and record.
    pub days: Vec<DayPunchesRequest>,
    /// Absences of the employment.
    #[serde(default)]
    pub absences: Vec<AbsenceRequest>,
}

/// Request body for `POST /ledger/:employment_id/closures`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloseCycleRequest {
    /// First date of the closed period.
    pub period_start: NaiveDate,
    /// Last date of the closed period.
    pub period_end: NaiveDate,
    /// The kind of period closed.
    pub kind: ClosureKind,
    /// The client's current date; the server clock is used when absent.
    #[serde(default)]
    pub today: Option<NaiveDate>,
}

/// Request body for `POST /ledger/:employment_id/adjustments`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdjustmentRequest {
    /// The date the adjustment counts towards.
    pub date: NaiveDate,
    /// Signed minutes.
    pub delta_minutes: i64,
    /// Mandatory reason.
    #[serde(default)]
    pub justification: String,
    /// The client's current time; the server clock is used when absent.
    #[serde(default)]
    pub now: Option<NaiveDateTime>,
}

/// Query string of `GET /ledger/:employment_id/balance`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceQuery {
    /// The date to report the balance at.
    pub date: NaiveDate,
}
