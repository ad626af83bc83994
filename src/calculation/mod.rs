//! Calculation logic for the work-time accounting engine.
//!
//! This module contains the calendar resolution that decides how many
//! minutes a day expects, the break tolerance applied to punches, bridge-day
//! distribution, punch validation, daily and period summaries, and the
//! time-bank ledger that accumulates daily balances across closures.

mod bridge_days;
mod calendar;
mod daily_summary;
mod period_summary;
mod periods;
mod punch_validation;
mod time_bank;
mod tolerance;

pub use bridge_days::{
    BridgeDayDistribution, bridge_add_on_minutes, compute_bridge_config, count_bridge_days,
    count_working_days, distribute_bridge_days,
};
pub use calendar::{CalendarResolver, DayResolution, ZeroReason};
pub use daily_summary::{
    bridge_add_on_for, compute_daily_summary, pair_intervals, summary_audit_step,
    total_worked_duration, total_worked_minutes,
};
pub use period_summary::{PeriodSummary, summarize_period};
pub use periods::{DateRange, bank_cycle_bounds, rh_period_bounds, week_bounds};
pub use punch_validation::{
    AcceptedPunch, PunchCandidate, PunchRejection, PunchViolation, validate_punch,
};
pub use time_bank::{LedgerRegistry, TimeBankLedger};
pub use tolerance::{
    BreakPause, ToleranceAdjustment, ToleranceResult, ToleranceSettings, apply_tolerance,
    find_break_pauses, select_principal_pause,
};
