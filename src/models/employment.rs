//! Employment model and its effective-dated rules.
//!
//! This module defines the [`Employment`] record, the per-version
//! [`EmploymentRules`] and the [`RulesHistory`] used to resolve which
//! version applies on a given date.

use chrono::{NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

const MINUTES_PER_DAY: i64 = 24 * 60;

/// Geographic qualifiers used to filter state and municipal holidays.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// State or province code (e.g., "SP").
    #[serde(default)]
    pub state: Option<String>,
    /// Municipality name.
    #[serde(default)]
    pub municipality: Option<String>,
}

impl Location {
    /// Creates a location with both qualifiers set.
    pub fn new(state: impl Into<String>, municipality: impl Into<String>) -> Self {
        Self {
            state: Some(state.into()),
            municipality: Some(municipality.into()),
        }
    }
}

/// Per-weekday expected minutes overriding the daily target.
///
/// An unset weekday falls back to the daily target on Monday through Friday
/// and to "unscheduled" on Saturday and Sunday.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeeklySchedule {
    /// Monday override.
    pub monday: Option<i64>,
    /// Tuesday override.
    pub tuesday: Option<i64>,
    /// Wednesday override.
    pub wednesday: Option<i64>,
    /// Thursday override.
    pub thursday: Option<i64>,
    /// Friday override.
    pub friday: Option<i64>,
    /// Saturday override.
    pub saturday: Option<i64>,
    /// Sunday override.
    pub sunday: Option<i64>,
}

impl WeeklySchedule {
    /// Returns the override configured for a weekday, if any.
    pub fn minutes_for(&self, weekday: Weekday) -> Option<i64> {
        match weekday {
            Weekday::Mon => self.monday,
            Weekday::Tue => self.tuesday,
            Weekday::Wed => self.wednesday,
            Weekday::Thu => self.thursday,
            Weekday::Fri => self.friday,
            Weekday::Sat => self.saturday,
            Weekday::Sun => self.sunday,
        }
    }

    fn entries(&self) -> [(Weekday, Option<i64>); 7] {
        [
            (Weekday::Mon, self.monday),
            (Weekday::Tue, self.tuesday),
            (Weekday::Wed, self.wednesday),
            (Weekday::Thu, self.thursday),
            (Weekday::Fri, self.friday),
            (Weekday::Sat, self.saturday),
            (Weekday::Sun, self.sunday),
        ]
    }
}

/// Returns true for Saturday and Sunday.
pub fn is_weekend(weekday: Weekday) -> bool {
    matches!(weekday, Weekday::Sat | Weekday::Sun)
}

/// Unit of a time-bank cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleUnit {
    /// Cycle measured in weeks.
    Weeks,
    /// Cycle measured in calendar months.
    Months,
}

/// Length of a time-bank cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankCycle {
    /// Unit of the cycle.
    pub unit: CycleUnit,
    /// Number of units per cycle (at least 1).
    pub length: u32,
}

/// Time-bank enablement and cycle length.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeBankSettings {
    /// Whether the employment accumulates a time bank.
    #[serde(default)]
    pub enabled: bool,
    /// The closing cycle, if the bank closes periodically.
    #[serde(default)]
    pub cycle: Option<BankCycle>,
    /// Balance carried into the ledger when it opens.
    #[serde(default)]
    pub opening_balance_minutes: i64,
}

fn default_max_shift_minutes() -> i64 {
    600
}

fn default_min_interjourney_rest_minutes() -> i64 {
    660
}

fn default_min_break_minutes() -> i64 {
    60
}

fn default_week_start() -> Weekday {
    Weekday::Mon
}

fn default_rh_period_start_day() -> u32 {
    1
}

fn default_max_punches_per_day() -> usize {
    4
}

fn default_min_punch_spacing_minutes() -> i64 {
    1
}

/// One version of an employment's working rules.
///
/// A version applies from `effective_from` until the next version's
/// `effective_from`. All durations are whole minutes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmploymentRules {
    /// First date this version applies to.
    pub effective_from: NaiveDate,
    /// Expected minutes on a regular scheduled day.
    pub daily_target_minutes: i64,
    /// Per-weekday overrides of the daily target.
    #[serde(default)]
    pub schedule: WeeklySchedule,
    /// Maximum worked minutes allowed in a day.
    #[serde(default = "default_max_shift_minutes")]
    pub max_shift_minutes: i64,
    /// Minimum rest between the last punch of a day and the first of the next.
    #[serde(default = "default_min_interjourney_rest_minutes")]
    pub min_interjourney_rest_minutes: i64,
    /// Minimum length of the main break.
    #[serde(default = "default_min_break_minutes")]
    pub min_break_minutes: i64,
    /// Excess over the minimum break that is forgiven.
    #[serde(default)]
    pub break_tolerance_minutes: i64,
    /// Preferred time for the main break to start.
    #[serde(default)]
    pub ideal_break_start: Option<NaiveTime>,
    /// First day of the reporting week.
    #[serde(default = "default_week_start")]
    pub week_start: Weekday,
    /// Day of month on which the HR period starts (1..=28).
    #[serde(default = "default_rh_period_start_day")]
    pub rh_period_start_day: u32,
    /// Maximum punches accepted per day.
    #[serde(default = "default_max_punches_per_day")]
    pub max_punches_per_day: usize,
    /// Minimum distance between two punches of the same day.
    #[serde(default = "default_min_punch_spacing_minutes")]
    pub min_punch_spacing_minutes: i64,
    /// Time-bank settings.
    #[serde(default)]
    pub time_bank: TimeBankSettings,
}

impl EmploymentRules {
    /// Creates rules with the given target and default values elsewhere.
    ///
    /// # Examples
    ///
    /// ```
    /// use timebank_engine::models::EmploymentRules;
    /// use chrono::{NaiveDate, Weekday};
    ///
    /// let rules = EmploymentRules::new(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(), 480);
    /// assert_eq!(rules.expected_minutes_for(Weekday::Wed), Some(480));
    /// assert_eq!(rules.expected_minutes_for(Weekday::Sat), None);
    /// ```
    pub fn new(effective_from: NaiveDate, daily_target_minutes: i64) -> Self {
        Self {
            effective_from,
            daily_target_minutes,
            schedule: WeeklySchedule::default(),
            max_shift_minutes: default_max_shift_minutes(),
            min_interjourney_rest_minutes: default_min_interjourney_rest_minutes(),
            min_break_minutes: default_min_break_minutes(),
            break_tolerance_minutes: 0,
            ideal_break_start: None,
            week_start: default_week_start(),
            rh_period_start_day: default_rh_period_start_day(),
            max_punches_per_day: default_max_punches_per_day(),
            min_punch_spacing_minutes: default_min_punch_spacing_minutes(),
            time_bank: TimeBankSettings::default(),
        }
    }

    /// Returns the scheduled minutes for a weekday, or `None` when the day
    /// is an unscheduled weekend day.
    pub fn expected_minutes_for(&self, weekday: Weekday) -> Option<i64> {
        match self.schedule.minutes_for(weekday) {
            Some(minutes) => Some(minutes),
            None if is_weekend(weekday) => None,
            None => Some(self.daily_target_minutes),
        }
    }

    /// Checks that every field is within range.
    pub fn validate(&self) -> EngineResult<()> {
        check_day_minutes("daily_target_minutes", self.daily_target_minutes)?;
        for (weekday, minutes) in self.schedule.entries() {
            if let Some(minutes) = minutes {
                check_day_minutes(&format!("schedule.{}", weekday), minutes)?;
            }
        }
        if self.max_shift_minutes <= 0 || self.max_shift_minutes > MINUTES_PER_DAY {
            return Err(invalid("max_shift_minutes", "must be between 1 and 1440"));
        }
        if self.min_interjourney_rest_minutes < 0 {
            return Err(invalid("min_interjourney_rest_minutes", "must not be negative"));
        }
        if self.min_break_minutes < 0 {
            return Err(invalid("min_break_minutes", "must not be negative"));
        }
        if self.break_tolerance_minutes < 0 {
            return Err(invalid("break_tolerance_minutes", "must not be negative"));
        }
        if !(1..=28).contains(&self.rh_period_start_day) {
            return Err(invalid("rh_period_start_day", "must be between 1 and 28"));
        }
        if self.max_punches_per_day == 0 {
            return Err(invalid("max_punches_per_day", "must be at least 1"));
        }
        if self.min_punch_spacing_minutes < 0 {
            return Err(invalid("min_punch_spacing_minutes", "must not be negative"));
        }
        if let Some(cycle) = self.time_bank.cycle {
            if cycle.length == 0 {
                return Err(invalid("time_bank.cycle.length", "must be at least 1"));
            }
        }
        Ok(())
    }
}

fn check_day_minutes(field: &str, minutes: i64) -> EngineResult<()> {
    if (0..=MINUTES_PER_DAY).contains(&minutes) {
        Ok(())
    } else {
        Err(invalid(field, "must be between 0 and 1440"))
    }
}

fn invalid(field: &str, message: &str) -> EngineError {
    EngineError::InvalidRules {
        field: field.to_string(),
        message: message.to_string(),
    }
}

/// Effective-dated rule versions for one employment, oldest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RulesHistory {
    employment_id: String,
    versions: Vec<EmploymentRules>,
}

impl RulesHistory {
    /// Creates a history, sorting the versions by effective date.
    pub fn new(employment_id: impl Into<String>, versions: Vec<EmploymentRules>) -> Self {
        let mut sorted = versions;
        sorted.sort_by(|a, b| a.effective_from.cmp(&b.effective_from));
        Self {
            employment_id: employment_id.into(),
            versions: sorted,
        }
    }

    /// Returns the employment id.
    pub fn employment_id(&self) -> &str {
        &self.employment_id
    }

    /// Returns every version, oldest first.
    pub fn versions(&self) -> &[EmploymentRules] {
        &self.versions
    }

    /// Returns the most recent version effective on or before `date`.
    ///
    /// # Examples
    ///
    /// ```
    /// use timebank_engine::models::{EmploymentRules, RulesHistory};
    /// use chrono::NaiveDate;
    ///
    /// let history = RulesHistory::new("emp_001", vec![
    ///     EmploymentRules::new(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(), 480),
    ///     EmploymentRules::new(NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(), 360),
    /// ]);
    ///
    /// let feb = NaiveDate::from_ymd_opt(2026, 2, 27).unwrap();
    /// assert_eq!(history.effective_on(feb)?.daily_target_minutes, 480);
    /// # Ok::<(), timebank_engine::error::EngineError>(())
    /// ```
    pub fn effective_on(&self, date: NaiveDate) -> EngineResult<&EmploymentRules> {
        self.versions
            .iter()
            .rev()
            .find(|rules| rules.effective_from <= date)
            .ok_or_else(|| EngineError::RulesNotFound {
                employment_id: self.employment_id.clone(),
                date,
            })
    }

    /// Validates every version.
    pub fn validate(&self) -> EngineResult<()> {
        self.versions.iter().try_for_each(EmploymentRules::validate)
    }
}

/// An employment record: who, where, and under which rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Employment {
    /// Unique identifier for the employment.
    pub id: String,
    /// Human-readable name (employer or job title).
    pub name: String,
    /// Location used for state and municipal holidays.
    pub location: Location,
    /// Effective-dated rules.
    pub rules: RulesHistory,
}
