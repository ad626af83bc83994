//! Punch model and related types.
//!
//! This module defines the [`Punch`] struct for representing clock-in/out
//! events and the [`PunchKind`] inferred from a punch's position in the day.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Whether a punch opens or closes a work interval.
///
/// The kind is never stored; it follows from the punch's position in the
/// day's ordered list (even index opens, odd index closes).
///
/// # Example
///
/// ```
/// use timebank_engine::models::PunchKind;
///
/// assert_eq!(PunchKind::at_position(0), PunchKind::ClockIn);
/// assert_eq!(PunchKind::at_position(3), PunchKind::ClockOut);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PunchKind {
    /// Start of a work interval.
    ClockIn,
    /// End of a work interval.
    ClockOut,
}

impl PunchKind {
    /// Returns the kind implied by a zero-based position in the day.
    pub fn at_position(index: usize) -> Self {
        if index % 2 == 0 {
            PunchKind::ClockIn
        } else {
            PunchKind::ClockOut
        }
    }
}

impl std::fmt::Display for PunchKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PunchKind::ClockIn => write!(f, "clock-in"),
            PunchKind::ClockOut => write!(f, "clock-out"),
        }
    }
}

/// A single clock-in/out event.
///
/// `considered_timestamp` is the time used for balance math. It is derived
/// per calculation by the tolerance rule and falls back to `timestamp` when
/// absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Punch {
    /// Unique identifier for the punch.
    pub id: Uuid,
    /// The employment this punch belongs to.
    pub employment_id: String,
    /// The actual time the punch was registered.
    pub timestamp: NaiveDateTime,
    /// The tolerance-adjusted time, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub considered_timestamp: Option<NaiveDateTime>,
    /// Whether the punch was edited by hand after registration.
    #[serde(default)]
    pub manually_edited: bool,
    /// Free-text note.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl Punch {
    /// Creates a punch with a fresh id and no considered override.
    ///
    /// # Examples
    ///
    /// ```
    /// use timebank_engine::models::Punch;
    /// use chrono::NaiveDateTime;
    ///
    /// let at = NaiveDateTime::parse_from_str("2026-01-15 08:00:00", "%Y-%m-%d %H:%M:%S").unwrap();
    /// let punch = Punch::new("emp_001", at);
    /// assert_eq!(punch.considered_time(), at);
    /// assert!(!punch.manually_edited);
    /// ```
    pub fn new(employment_id: impl Into<String>, timestamp: NaiveDateTime) -> Self {
        Self {
            id: Uuid::new_v4(),
            employment_id: employment_id.into(),
            timestamp,
            considered_timestamp: None,
            manually_edited: false,
            note: None,
        }
    }

    /// Returns the time used for balance math.
    pub fn considered_time(&self) -> NaiveDateTime {
        self.considered_timestamp.unwrap_or(self.timestamp)
    }

    /// Returns the calendar date of the actual timestamp.
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }

    /// Returns true if tolerance moved the considered time.
    pub fn is_adjusted(&self) -> bool {
        self.considered_timestamp
            .is_some_and(|considered| considered != self.timestamp)
    }
}

/// Sorts punches by actual timestamp, breaking ties by id for stability.
pub(crate) fn sort_by_timestamp(punches: &mut [Punch]) {
    punches.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.id.cmp(&b.id)));
}

/// Sorts punches by considered timestamp, breaking ties by actual time then id.
pub(crate) fn sort_by_considered(punches: &mut [Punch]) {
    punches.sort_by(|a, b| {
        a.considered_time()
            .cmp(&b.considered_time())
            .then(a.timestamp.cmp(&b.timestamp))
            .then(a.id.cmp(&b.id))
    });
}
