//! Core data models for the work-time accounting engine.
//!
//! This module contains all the domain models used throughout the engine.

mod absence;
mod audit;
mod bridge_day;
mod daily_summary;
mod employment;
mod holiday;
mod punch;
mod time_bank;

pub use absence::{Absence, AbsenceType, check_absence_overlap, find_overlapping_absences};
pub use audit::{AuditStep, AuditTrace, AuditWarning};
pub use bridge_day::BridgeDayConfig;
pub use daily_summary::{DailySummary, DayKind, WorkInterval, minutes_to_hours};
pub use employment::{
    BankCycle, CycleUnit, Employment, EmploymentRules, Location, RulesHistory, TimeBankSettings,
    WeeklySchedule, is_weekend,
};
pub use holiday::{Holiday, HolidayKind, HolidayRecurrence, HolidayScope};
pub use punch::{Punch, PunchKind};
pub use time_bank::{BalanceAdjustment, ClosureKind, PeriodClosure};

pub(crate) use punch::{sort_by_considered, sort_by_timestamp};
