//! Holiday model and its applicability rules.
//!
//! Holidays come either from manual entry or from an external import
//! collaborator. This module only deals with validated records: when a
//! holiday occurs, whom it applies to, and how it ranks against others
//! falling on the same date.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};

use super::employment::Location;

/// The kind of a holiday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HolidayKind {
    /// Country-wide holiday.
    National,
    /// Holiday of a single state.
    State,
    /// Holiday of a single municipality.
    Municipal,
    /// Optional day off ("ponto facultativo").
    Optional,
    /// Workday between a holiday and a weekend, compensated across the year.
    Bridge,
}

impl HolidayKind {
    /// Rank among globally scoped holidays on the same date (lower wins).
    ///
    /// Employment-scoped holidays outrank every kind; see
    /// [`Holiday::priority_rank`].
    pub fn priority_rank(self) -> u8 {
        match self {
            HolidayKind::Municipal => 1,
            HolidayKind::State => 2,
            HolidayKind::National => 3,
            HolidayKind::Optional => 4,
            HolidayKind::Bridge => 5,
        }
    }

    /// Whether a day carrying this holiday has zero expected minutes.
    pub fn zeroes_expected(self) -> bool {
        match self {
            HolidayKind::National
            | HolidayKind::State
            | HolidayKind::Municipal
            | HolidayKind::Optional
            | HolidayKind::Bridge => true,
        }
    }
}

impl std::fmt::Display for HolidayKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HolidayKind::National => write!(f, "national"),
            HolidayKind::State => write!(f, "state"),
            HolidayKind::Municipal => write!(f, "municipal"),
            HolidayKind::Optional => write!(f, "optional"),
            HolidayKind::Bridge => write!(f, "bridge"),
        }
    }
}

/// When a holiday occurs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HolidayRecurrence {
    /// Every year on the same month and day.
    Annual {
        /// Month (1..=12).
        month: u32,
        /// Day of month.
        day: u32,
    },
    /// A single date; its year is the reference year.
    SingleYear {
        /// The holiday's date.
        date: NaiveDate,
    },
}

impl HolidayRecurrence {
    /// Returns true if the recurrence falls on `date`.
    ///
    /// An annual Feb 29 holiday only matches in leap years.
    pub fn occurs_on(&self, date: NaiveDate) -> bool {
        match *self {
            HolidayRecurrence::Annual { month, day } => date.month() == month && date.day() == day,
            HolidayRecurrence::SingleYear { date: fixed } => fixed == date,
        }
    }

    /// Returns the reference year of a single-year holiday.
    pub fn reference_year(&self) -> Option<i32> {
        match self {
            HolidayRecurrence::Annual { .. } => None,
            HolidayRecurrence::SingleYear { date } => Some(date.year()),
        }
    }
}

/// Who a holiday applies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "employment_id", rename_all = "snake_case")]
pub enum HolidayScope {
    /// Every employment.
    Global,
    /// A single employment.
    Employment(String),
}

fn default_active() -> bool {
    true
}

/// A holiday record.
///
/// # Example
///
/// ```
/// use timebank_engine::models::{Holiday, HolidayKind, HolidayRecurrence, HolidayScope, Location};
/// use chrono::NaiveDate;
///
/// let christmas = Holiday::annual("Christmas", HolidayKind::National, 12, 25);
/// let date = NaiveDate::from_ymd_opt(2026, 12, 25).unwrap();
///
/// assert!(christmas.occurs_on(date));
/// assert!(christmas.applies_to("emp_001", &Location::default()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holiday {
    /// Unique identifier for the holiday.
    pub id: Uuid,
    /// Holiday name.
    pub name: String,
    /// Holiday kind.
    pub kind: HolidayKind,
    /// When the holiday occurs.
    pub recurrence: HolidayRecurrence,
    /// Who the holiday applies to.
    pub scope: HolidayScope,
    /// State qualifier for state and municipal holidays.
    #[serde(default)]
    pub state: Option<String>,
    /// Municipality qualifier for municipal holidays.
    #[serde(default)]
    pub municipality: Option<String>,
    /// Inactive holidays are ignored everywhere.
    #[serde(default = "default_active")]
    pub active: bool,
}

impl Holiday {
    /// Creates an active, globally scoped annual holiday.
    pub fn annual(name: impl Into<String>, kind: HolidayKind, month: u32, day: u32) -> Self {
        Self::with_recurrence(name, kind, HolidayRecurrence::Annual { month, day })
    }

    /// Creates an active, globally scoped single-year holiday.
    pub fn single_year(name: impl Into<String>, kind: HolidayKind, date: NaiveDate) -> Self {
        Self::with_recurrence(name, kind, HolidayRecurrence::SingleYear { date })
    }

    fn with_recurrence(
        name: impl Into<String>,
        kind: HolidayKind,
        recurrence: HolidayRecurrence,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            kind,
            recurrence,
            scope: HolidayScope::Global,
            state: None,
            municipality: None,
            active: true,
        }
    }

    /// Returns true if the holiday is active and falls on `date`.
    pub fn occurs_on(&self, date: NaiveDate) -> bool {
        self.active && self.recurrence.occurs_on(date)
    }

    /// Returns true if the holiday applies to the employment at `location`.
    ///
    /// National and optional holidays apply unconditionally. State and
    /// municipal holidays apply when either side leaves the qualifier unset
    /// or both sides match (case-insensitive). Employment-scoped holidays
    /// apply only to their own employment.
    pub fn applies_to(&self, employment_id: &str, location: &Location) -> bool {
        if let HolidayScope::Employment(owner) = &self.scope {
            if owner != employment_id {
                return false;
            }
        }

        match self.kind {
            HolidayKind::National | HolidayKind::Optional | HolidayKind::Bridge => true,
            HolidayKind::State => qualifier_matches(&self.state, &location.state),
            HolidayKind::Municipal => {
                qualifier_matches(&self.state, &location.state)
                    && qualifier_matches(&self.municipality, &location.municipality)
            }
        }
    }

    /// Rank on a shared date (lower wins): employment-specific first, then
    /// municipal, state, national, optional, bridge.
    pub fn priority_rank(&self) -> u8 {
        match self.scope {
            HolidayScope::Employment(_) => 0,
            HolidayScope::Global => self.kind.priority_rank(),
        }
    }

    /// Checks the recurrence describes a real calendar day.
    pub fn validate(&self) -> EngineResult<()> {
        if let HolidayRecurrence::Annual { month, day } = self.recurrence {
            // 2024 is a leap year so Feb 29 is accepted.
            if NaiveDate::from_ymd_opt(2024, month, day).is_none() {
                return Err(EngineError::InvalidHoliday {
                    name: self.name.clone(),
                    message: format!("{:02}-{:02} is not a calendar day", month, day),
                });
            }
        }
        if self.name.trim().is_empty() {
            return Err(EngineError::InvalidHoliday {
                name: self.name.clone(),
                message: "name must not be blank".to_string(),
            });
        }
        Ok(())
    }
}

fn qualifier_matches(holiday: &Option<String>, location: &Option<String>) -> bool {
    match (holiday, location) {
        (Some(h), Some(l)) => h.trim().eq_ignore_ascii_case(l.trim()),
        _ => true,
    }
}
