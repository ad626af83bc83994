//! Time-bank ledger records: closures and manual adjustments.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The kind of period a closure ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClosureKind {
    /// A reporting week.
    Weekly,
    /// An HR month.
    Monthly,
    /// A full time-bank cycle.
    TimeBankCycle,
}

impl std::fmt::Display for ClosureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClosureKind::Weekly => write!(f, "weekly"),
            ClosureKind::Monthly => write!(f, "monthly"),
            ClosureKind::TimeBankCycle => write!(f, "time_bank_cycle"),
        }
    }
}

/// A snapshot-and-reset ending an accounting period.
///
/// Closures are never edited; undoing one means deleting it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodClosure {
    /// Unique identifier for the closure.
    pub id: Uuid,
    /// The employment the closure belongs to.
    pub employment_id: String,
    /// When the closure was made.
    pub closed_on: NaiveDate,
    /// First date of the closed period.
    pub period_start: NaiveDate,
    /// Last date of the closed period.
    pub period_end: NaiveDate,
    /// Running balance at the time of closing, in minutes.
    pub balance_minutes: i64,
    /// The kind of period closed.
    pub kind: ClosureKind,
}

/// A signed manual correction to the running balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceAdjustment {
    /// Unique identifier for the adjustment.
    pub id: Uuid,
    /// The employment the adjustment belongs to.
    pub employment_id: String,
    /// The date the adjustment counts towards.
    pub date: NaiveDate,
    /// Signed minutes added to the balance.
    pub delta_minutes: i64,
    /// Mandatory reason, kept for audit.
    pub justification: String,
    /// When the adjustment was recorded.
    pub created_at: NaiveDateTime,
}
