//! Bridge-day compensation model.

use serde::{Deserialize, Serialize};

/// How a year's bridge days are compensated across its working days.
///
/// By construction `daily_add_on_minutes * working_days >=
/// total_compensable_minutes`; the difference is `margin_minutes`.
///
/// # Example
///
/// ```
/// use timebank_engine::models::BridgeDayConfig;
///
/// let config = BridgeDayConfig {
///     year: 2026,
///     employment_id: "emp_001".to_string(),
///     bridge_days: 3,
///     total_compensable_minutes: 1440,
///     working_days: 248,
///     daily_add_on_minutes: 6,
///     margin_minutes: 48,
/// };
/// assert!(config.is_fully_compensated());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeDayConfig {
    /// The compensated year.
    pub year: i32,
    /// The employment the configuration belongs to.
    pub employment_id: String,
    /// Number of bridge days in the year.
    pub bridge_days: u32,
    /// `bridge_days * daily_target_minutes`.
    pub total_compensable_minutes: i64,
    /// Weekdays of the year that are not holidays or bridges.
    pub working_days: u32,
    /// Minutes added to every working day, rounded up.
    pub daily_add_on_minutes: i64,
    /// Minutes compensated beyond what was owed.
    pub margin_minutes: i64,
}

impl BridgeDayConfig {
    /// Whether the add-on covers every compensable minute.
    ///
    /// Only a degenerate year with zero working days can fail this.
    pub fn is_fully_compensated(&self) -> bool {
        self.daily_add_on_minutes * i64::from(self.working_days) >= self.total_compensable_minutes
    }

    /// Returns true if this configuration applies to the employment and year.
    pub fn applies_to(&self, employment_id: &str, year: i32) -> bool {
        self.employment_id == employment_id && self.year == year
    }
}
