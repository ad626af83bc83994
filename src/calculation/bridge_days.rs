//! Bridge-day distribution.
//!
//! Bridge days are not worked; their hours are spread across the year's
//! remaining working days as a small daily add-on. Rounding is always
//! upward so the add-on never under-compensates.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::models::{AuditStep, AuditWarning, BridgeDayConfig, Holiday, HolidayKind, Location, is_weekend};

use super::calendar::CalendarResolver;

/// The result of distributing a year's bridge days.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeDayDistribution {
    /// The resulting configuration.
    pub config: BridgeDayConfig,
    /// Warnings, e.g. a year without working days.
    pub warnings: Vec<AuditWarning>,
    /// The audit step recording the distribution.
    pub audit_step: AuditStep,
}

/// Returns `ceil(total / working_days)`, or 0 when there are no working days.
///
/// # Examples
///
/// ```
/// use timebank_engine::calculation::bridge_add_on_minutes;
///
/// assert_eq!(bridge_add_on_minutes(1440, 248), 6);
/// assert_eq!(bridge_add_on_minutes(1440, 240), 6);
/// assert_eq!(bridge_add_on_minutes(1440, 0), 0);
/// ```
pub fn bridge_add_on_minutes(total_compensable_minutes: i64, working_days: u32) -> i64 {
    if working_days == 0 || total_compensable_minutes <= 0 {
        return 0;
    }
    let days = i64::from(working_days);
    (total_compensable_minutes + days - 1) / days
}

fn year_dates(year: i32) -> EngineResult<impl Iterator<Item = NaiveDate>> {
    let first = NaiveDate::from_ymd_opt(year, 1, 1).ok_or_else(|| EngineError::CalculationError {
        message: format!("Year {} is out of range", year),
    })?;
    Ok(first.iter_days().take_while(move |d| d.year() == year))
}

/// Counts the weekdays of `year` without any applicable holiday.
///
/// Bridge days are excluded as well: they are the days being compensated.
pub fn count_working_days(
    year: i32,
    employment_id: &str,
    location: &Location,
    holidays: &[Holiday],
) -> EngineResult<u32> {
    let resolver = CalendarResolver::new(holidays, &[]);
    let count = year_dates(year)?
        .filter(|d| !is_weekend(d.weekday()))
        .filter(|d| resolver.holiday_on(*d, employment_id, location).is_none())
        .count();
    Ok(count as u32)
}

/// Counts the weekdays of `year` carrying an applicable bridge holiday.
pub fn count_bridge_days(
    year: i32,
    employment_id: &str,
    location: &Location,
    holidays: &[Holiday],
) -> EngineResult<u32> {
    let resolver = CalendarResolver::new(holidays, &[]);
    let count = year_dates(year)?
        .filter(|d| !is_weekend(d.weekday()))
        .filter(|d| {
            resolver
                .holidays_on(*d, employment_id, location)
                .iter()
                .any(|h| h.kind == HolidayKind::Bridge)
        })
        .count();
    Ok(count as u32)
}

/// Builds a bridge-day configuration from an already known working-day count.
pub fn compute_bridge_config(
    year: i32,
    employment_id: &str,
    daily_target_minutes: i64,
    bridge_days: u32,
    working_days: u32,
) -> (BridgeDayConfig, Vec<AuditWarning>) {
    let total = i64::from(bridge_days) * daily_target_minutes.max(0);
    let add_on = bridge_add_on_minutes(total, working_days);
    let margin = add_on * i64::from(working_days) - total;

    let mut warnings = Vec::new();
    if working_days == 0 && total > 0 {
        warnings.push(AuditWarning::new(
            "degenerate_bridge_distribution",
            format!(
                "{} has no working days to absorb {} compensable minutes",
                year, total
            ),
            "high",
        ));
    }

    let config = BridgeDayConfig {
        year,
        employment_id: employment_id.to_string(),
        bridge_days,
        total_compensable_minutes: total,
        working_days,
        daily_add_on_minutes: add_on,
        margin_minutes: margin.max(0),
    };
    (config, warnings)
}

/// Spreads `bridge_days × daily_target_minutes` across the working days of
/// `year` for one employment.
///
/// # Errors
///
/// Returns `InvalidRules` for a negative daily target and
/// `CalculationError` for a year chrono cannot represent.
pub fn distribute_bridge_days(
    year: i32,
    employment_id: &str,
    daily_target_minutes: i64,
    bridge_days: u32,
    holidays: &[Holiday],
    location: &Location,
    step_number: u32,
) -> EngineResult<BridgeDayDistribution> {
    if daily_target_minutes < 0 {
        return Err(EngineError::InvalidRules {
            field: "daily_target_minutes".to_string(),
            message: "must not be negative".to_string(),
        });
    }

    let working_days = count_working_days(year, employment_id, location, holidays)?;
    let (config, warnings) = compute_bridge_config(
        year,
        employment_id,
        daily_target_minutes,
        bridge_days,
        working_days,
    );

    let reasoning = if working_days == 0 {
        format!("{} has no working days; add-on is 0", year)
    } else {
        format!(
            "{} bridge days × {} minutes = {} minutes over {} working days = {} minutes/day (margin {})",
            bridge_days,
            daily_target_minutes,
            config.total_compensable_minutes,
            working_days,
            config.daily_add_on_minutes,
            config.margin_minutes
        )
    };

    let audit_step = AuditStep {
        step_number,
        rule_id: "bridge_day_distribution".to_string(),
        rule_name: "Bridge Day Distribution".to_string(),
        input: serde_json::json!({
            "year": year,
            "employment_id": employment_id,
            "daily_target_minutes": daily_target_minutes,
            "bridge_days": bridge_days,
        }),
        output: serde_json::json!({
            "working_days": working_days,
            "total_compensable_minutes": config.total_compensable_minutes,
            "daily_add_on_minutes": config.daily_add_on_minutes,
            "margin_minutes": config.margin_minutes,
        }),
        reasoning,
    };

    Ok(BridgeDayDistribution {
        config,
        warnings,
        audit_step,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn make_date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    /// National holidays of 2026 plus three bridges, leaving 248 working days.
    fn holidays_2026() -> Vec<Holiday> {
        let mut holidays: Vec<Holiday> = [
            ("New Year", 1, 1),
            ("Tiradentes", 4, 21),
            ("Labour Day", 5, 1),
            ("Independence", 9, 7),
            ("Our Lady", 10, 12),
            ("All Souls", 11, 2),
            ("Republic", 11, 15), // Sunday in 2026
            ("Black Consciousness", 11, 20),
            ("Christmas", 12, 25),
        ]
        .iter()
        .map(|(name, month, day)| Holiday::annual(*name, HolidayKind::National, *month, *day))
        .collect();
        holidays.push(Holiday::single_year(
            "Good Friday",
            HolidayKind::National,
            make_date("2026-04-03"),
        ));
        holidays.push(Holiday::single_year(
            "Corpus Christi",
            HolidayKind::Optional,
            make_date("2026-06-04"),
        ));
        for bridge in ["2026-01-02", "2026-04-20", "2026-06-05"] {
            holidays.push(Holiday::single_year(
                "Bridge",
                HolidayKind::Bridge,
                make_date(bridge),
            ));
        }
        holidays
    }

    // ==========================================================================
    // BRD-001: 3 bridge days × 480 over 248 working days
    // ==========================================================================
    #[test]
    fn test_brd_001_three_bridges_over_248_days() {
        let holidays = holidays_2026();
        let result =
            distribute_bridge_days(2026, "emp_001", 480, 3, &holidays, &Location::default(), 1)
                .unwrap();

        assert_eq!(result.config.working_days, 248);
        assert_eq!(result.config.total_compensable_minutes, 1440);
        assert_eq!(result.config.daily_add_on_minutes, 6);
        assert_eq!(result.config.margin_minutes, 48);
        assert!(result.config.is_fully_compensated());
        assert!(result.warnings.is_empty());
        assert_eq!(result.audit_step.rule_id, "bridge_day_distribution");
    }

    #[test]
    fn test_count_bridge_days_2026() {
        let holidays = holidays_2026();
        assert_eq!(
            count_bridge_days(2026, "emp_001", &Location::default(), &holidays).unwrap(),
            3
        );
    }

    #[test]
    fn test_year_without_holidays_counts_weekdays() {
        assert_eq!(
            count_working_days(2026, "emp_001", &Location::default(), &[]).unwrap(),
            261
        );
        // 2024 is a leap year starting on Monday.
        assert_eq!(
            count_working_days(2024, "emp_001", &Location::default(), &[]).unwrap(),
            262
        );
    }

    #[test]
    fn test_holidays_of_other_locations_do_not_reduce_divisor() {
        let mut rio = Holiday::annual("Saint Sebastian", HolidayKind::Municipal, 1, 20);
        rio.state = Some("RJ".to_string());
        rio.municipality = Some("Rio de Janeiro".to_string());

        let in_sao_paulo = Location::new("SP", "São Paulo");
        assert_eq!(
            count_working_days(2026, "emp_001", &in_sao_paulo, &[rio]).unwrap(),
            261
        );
    }

    #[test]
    fn test_exact_division_has_no_margin() {
        let (config, warnings) = compute_bridge_config(2026, "emp_001", 480, 1, 240);
        assert_eq!(config.daily_add_on_minutes, 2);
        assert_eq!(config.margin_minutes, 0);
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_zero_working_days_is_degenerate() {
        let (config, warnings) = compute_bridge_config(2026, "emp_001", 480, 2, 0);
        assert_eq!(config.daily_add_on_minutes, 0);
        assert!(!config.is_fully_compensated());
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].code, "degenerate_bridge_distribution");
    }

    #[test]
    fn test_no_bridge_days_means_no_add_on() {
        let result =
            distribute_bridge_days(2026, "emp_001", 480, 0, &[], &Location::default(), 1).unwrap();
        assert_eq!(result.config.daily_add_on_minutes, 0);
        assert_eq!(result.config.margin_minutes, 0);
    }

    #[test]
    fn test_negative_target_is_rejected() {
        let result = distribute_bridge_days(2026, "emp_001", -1, 1, &[], &Location::default(), 1);
        assert!(matches!(result, Err(EngineError::InvalidRules { .. })));
    }

    proptest! {
        #[test]
        fn prop_add_on_never_under_compensates(
            bridge_days in 0u32..20,
            target in 0i64..720,
            working_days in 1u32..366,
        ) {
            let (config, _) = compute_bridge_config(2026, "emp_001", target, bridge_days, working_days);
            prop_assert!(config.is_fully_compensated());
            prop_assert!(config.margin_minutes < i64::from(working_days));
        }
    }
}
