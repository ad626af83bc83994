//! Configuration types for the work-time accounting engine.
//!
//! This module contains the strongly-typed structures deserialized from the
//! YAML files of a configuration directory, and the aggregated
//! [`EngineConfig`] built from them.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Deserialize;

use crate::error::{EngineError, EngineResult};
use crate::models::{
    Employment, EmploymentRules, Holiday, HolidayKind, HolidayRecurrence, HolidayScope, Location,
    RulesHistory,
};

/// Metadata describing a configuration set.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineMetadata {
    /// The configuration set's name.
    pub name: String,
    /// The version of the configuration set.
    pub version: String,
    /// Free-text description.
    #[serde(default)]
    pub description: Option<String>,
}

fn default_active() -> bool {
    true
}

/// A holiday as written in `holidays.yaml`.
///
/// Either `date` (single-year) or both `month` and `day` (annual) must be set.
#[derive(Debug, Clone, Deserialize)]
pub struct HolidayEntry {
    /// Holiday name.
    pub name: String,
    /// Holiday kind.
    pub kind: HolidayKind,
    /// Date of a single-year holiday.
    #[serde(default)]
    pub date: Option<NaiveDate>,
    /// Month of an annual holiday.
    #[serde(default)]
    pub month: Option<u32>,
    /// Day of an annual holiday.
    #[serde(default)]
    pub day: Option<u32>,
    /// Restricts the holiday to one employment.
    #[serde(default)]
    pub employment_id: Option<String>,
    /// State qualifier.
    #[serde(default)]
    pub state: Option<String>,
    /// Municipality qualifier.
    #[serde(default)]
    pub municipality: Option<String>,
    /// Inactive entries are loaded but ignored.
    #[serde(default = "default_active")]
    pub active: bool,
}

impl TryFrom<HolidayEntry> for Holiday {
    type Error = EngineError;

    fn try_from(entry: HolidayEntry) -> EngineResult<Self> {
        let recurrence = match (entry.date, entry.month, entry.day) {
            (Some(date), None, None) => HolidayRecurrence::SingleYear { date },
            (None, Some(month), Some(day)) => HolidayRecurrence::Annual { month, day },
            _ => {
                return Err(EngineError::InvalidHoliday {
                    name: entry.name,
                    message: "set either 'date' or both 'month' and 'day'".to_string(),
                });
            }
        };

        let mut holiday = match recurrence {
            HolidayRecurrence::SingleYear { date } => {
                Holiday::single_year(entry.name, entry.kind, date)
            }
            HolidayRecurrence::Annual { month, day } => {
                Holiday::annual(entry.name, entry.kind, month, day)
            }
        };
        holiday.scope = match entry.employment_id {
            Some(id) => HolidayScope::Employment(id),
            None => HolidayScope::Global,
        };
        holiday.state = entry.state;
        holiday.municipality = entry.municipality;
        holiday.active = entry.active;
        holiday.validate()?;
        Ok(holiday)
    }
}

/// Holidays configuration file structure.
#[derive(Debug, Clone, Deserialize)]
pub struct HolidaysConfig {
    /// Every configured holiday.
    pub holidays: Vec<HolidayEntry>,
}

/// One employment file under `employments/`.
#[derive(Debug, Clone, Deserialize)]
pub struct EmploymentConfig {
    /// Employment id.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Location for state and municipal holidays.
    #[serde(default)]
    pub location: Location,
    /// Effective-dated rule versions.
    pub rules: Vec<EmploymentRules>,
}

impl TryFrom<EmploymentConfig> for Employment {
    type Error = EngineError;

    fn try_from(config: EmploymentConfig) -> EngineResult<Self> {
        if config.rules.is_empty() {
            return Err(EngineError::InvalidRules {
                field: format!("{}.rules", config.id),
                message: "at least one rules version is required".to_string(),
            });
        }
        let rules = RulesHistory::new(config.id.clone(), config.rules);
        rules.validate()?;
        Ok(Employment {
            id: config.id,
            name: config.name,
            location: config.location,
            rules,
        })
    }
}

/// Complete configuration loaded from a directory.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    metadata: EngineMetadata,
    holidays: Vec<Holiday>,
    employments: HashMap<String, Employment>,
}

impl EngineConfig {
    /// Creates a configuration from its component parts.
    pub fn new(
        metadata: EngineMetadata,
        holidays: Vec<Holiday>,
        employments: HashMap<String, Employment>,
    ) -> Self {
        Self {
            metadata,
            holidays,
            employments,
        }
    }

    /// Returns the metadata.
    pub fn metadata(&self) -> &EngineMetadata {
        &self.metadata
    }

    /// Returns every holiday.
    pub fn holidays(&self) -> &[Holiday] {
        &self.holidays
    }

    /// Returns every employment keyed by id.
    pub fn employments(&self) -> &HashMap<String, Employment> {
        &self.employments
    }
}
