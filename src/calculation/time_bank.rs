//! Time-bank ledger.
//!
//! The ledger keeps one balance per recorded date, signed manual
//! adjustments and period closures. A closure snapshots the running balance
//! and resets it; later balances only count entries after the closure's end.
//! Every historical query is answered from the retained entries, so undoing
//! a closure needs no recomputation beyond removing it.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, RwLock};

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::models::{BalanceAdjustment, ClosureKind, DailySummary, Employment, PeriodClosure};

/// The balance history of one employment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeBankLedger {
    employment_id: String,
    start_date: NaiveDate,
    opening_balance_minutes: i64,
    daily: BTreeMap<NaiveDate, i64>,
    adjustments: Vec<BalanceAdjustment>,
    closures: Vec<PeriodClosure>,
}

impl TimeBankLedger {
    /// Opens an empty ledger on `start_date` carrying an opening balance.
    pub fn new(
        employment_id: impl Into<String>,
        start_date: NaiveDate,
        opening_balance_minutes: i64,
    ) -> Self {
        Self {
            employment_id: employment_id.into(),
            start_date,
            opening_balance_minutes,
            daily: BTreeMap::new(),
            adjustments: Vec::new(),
            closures: Vec::new(),
        }
    }

    /// Returns the employment id.
    pub fn employment_id(&self) -> &str {
        &self.employment_id
    }

    /// Returns the first date the ledger accepts.
    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    /// Returns the balance carried in on the start date.
    pub fn opening_balance_minutes(&self) -> i64 {
        self.opening_balance_minutes
    }

    /// Returns the closures, oldest first.
    pub fn closures(&self) -> &[PeriodClosure] {
        &self.closures
    }

    /// Returns the adjustments in the order they were recorded.
    pub fn adjustments(&self) -> &[BalanceAdjustment] {
        &self.adjustments
    }

    /// Returns the recorded balance of a date, if any.
    pub fn daily_balance(&self, date: NaiveDate) -> Option<i64> {
        self.daily.get(&date).copied()
    }

    /// Folds a day's balance into the ledger.
    ///
    /// Recording a date again replaces its previous balance, so recomputing
    /// a day after its punches change is idempotent.
    ///
    /// # Errors
    ///
    /// Returns `EmploymentMismatch` for another employment's summary and
    /// `BalanceBeforeLedgerStart` for a date before the ledger opened.
    pub fn record_day(&mut self, summary: &DailySummary) -> EngineResult<()> {
        self.check_employment(&summary.employment_id)?;
        self.check_started(summary.date)?;

        if let Some(closure) = self.closure_covering(summary.date) {
            warn!(
                employment_id = %self.employment_id,
                date = %summary.date,
                closure_id = %closure.id,
                "Recording a day inside a closed period; the closure snapshot is unchanged"
            );
        }

        let previous = self.daily.insert(summary.date, summary.balance_minutes);
        debug!(
            employment_id = %self.employment_id,
            date = %summary.date,
            balance_minutes = summary.balance_minutes,
            replaced = previous.is_some(),
            "Recorded daily balance"
        );
        Ok(())
    }

    /// Closes `[period_start, period_end]`, snapshotting the running balance
    /// up to `period_end` and resetting it.
    ///
    /// # Errors
    ///
    /// - `InvalidPeriod` if the start is after the end.
    /// - `CycleNotElapsed` unless `period_end` is before `today`.
    /// - `OverlappingClosure` if the period does not start after the
    ///   previous closure's end.
    pub fn close_cycle(
        &mut self,
        period_start: NaiveDate,
        period_end: NaiveDate,
        kind: ClosureKind,
        today: NaiveDate,
    ) -> EngineResult<PeriodClosure> {
        if period_start > period_end {
            return Err(EngineError::InvalidPeriod {
                start: period_start,
                end: period_end,
            });
        }
        if period_end >= today {
            return Err(EngineError::CycleNotElapsed { period_end, today });
        }
        if let Some(previous) = self.closures.last() {
            if period_start <= previous.period_end {
                return Err(EngineError::OverlappingClosure {
                    period_start,
                    previous_end: previous.period_end,
                });
            }
        }

        let balance_minutes = self.balance_as_of(period_end)?;
        let closure = PeriodClosure {
            id: Uuid::new_v4(),
            employment_id: self.employment_id.clone(),
            closed_on: today,
            period_start,
            period_end,
            balance_minutes,
            kind,
        };

        info!(
            employment_id = %self.employment_id,
            closure_id = %closure.id,
            kind = %kind,
            period_start = %period_start,
            period_end = %period_end,
            balance_minutes,
            "Closed time-bank period"
        );

        self.closures.push(closure.clone());
        Ok(closure)
    }

    /// Undoes the most recent closure.
    ///
    /// # Errors
    ///
    /// Returns `ClosureNotFound` for an unknown id and `ClosureNotLatest`
    /// when a later closure exists.
    pub fn delete_closure(&mut self, closure_id: Uuid) -> EngineResult<PeriodClosure> {
        let position = self
            .closures
            .iter()
            .position(|c| c.id == closure_id)
            .ok_or(EngineError::ClosureNotFound { closure_id })?;
        if position + 1 != self.closures.len() {
            return Err(EngineError::ClosureNotLatest { closure_id });
        }

        let removed = self.closures.remove(position);
        info!(
            employment_id = %self.employment_id,
            closure_id = %removed.id,
            period_end = %removed.period_end,
            "Deleted time-bank closure"
        );
        Ok(removed)
    }

    /// Applies a signed manual correction dated `date`.
    ///
    /// # Errors
    ///
    /// Returns `MissingJustification` for a blank justification,
    /// `ZeroAdjustment` for a zero delta and `BalanceBeforeLedgerStart` for
    /// a date before the ledger opened.
    pub fn adjust(
        &mut self,
        date: NaiveDate,
        delta_minutes: i64,
        justification: &str,
        now: NaiveDateTime,
    ) -> EngineResult<BalanceAdjustment> {
        let justification = justification.trim();
        if justification.is_empty() {
            return Err(EngineError::MissingJustification);
        }
        if delta_minutes == 0 {
            return Err(EngineError::ZeroAdjustment);
        }
        self.check_started(date)?;

        if let Some(closure) = self.closure_covering(date) {
            warn!(
                employment_id = %self.employment_id,
                date = %date,
                closure_id = %closure.id,
                "Adjustment dated inside a closed period; the closure snapshot is unchanged"
            );
        }

        let adjustment = BalanceAdjustment {
            id: Uuid::new_v4(),
            employment_id: self.employment_id.clone(),
            date,
            delta_minutes,
            justification: justification.to_string(),
            created_at: now,
        };

        info!(
            employment_id = %self.employment_id,
            adjustment_id = %adjustment.id,
            date = %date,
            delta_minutes,
            justification = %adjustment.justification,
            "Applied time-bank adjustment"
        );

        self.adjustments.push(adjustment.clone());
        Ok(adjustment)
    }

    /// Returns the balance at the end of `date`.
    ///
    /// Only the most recent closure ending strictly before `date` counts;
    /// daily balances and adjustments after it up to and including `date`
    /// are summed on top of zero. Without such a closure the sum starts from
    /// the opening balance on the ledger's start date.
    ///
    /// # Errors
    ///
    /// Returns `BalanceBeforeLedgerStart` for a date before the ledger opened.
    pub fn balance_as_of(&self, date: NaiveDate) -> EngineResult<i64> {
        self.check_started(date)?;
        let (base, from) = self.baseline_for(date);
        Ok(base + self.sum_between(from, date))
    }

    /// Returns the balance accumulated since the latest closure, including
    /// every recorded entry.
    pub fn running_balance(&self) -> i64 {
        let (base, from) = match self.closures.last() {
            Some(closure) => (0, closure.period_end + Duration::days(1)),
            None => (self.opening_balance_minutes, self.start_date),
        };
        let daily: i64 = self.daily.range(from..).map(|(_, minutes)| minutes).sum();
        let adjusted: i64 = self
            .adjustments
            .iter()
            .filter(|a| a.date >= from)
            .map(|a| a.delta_minutes)
            .sum();
        base + daily + adjusted
    }

    /// Returns the most recent closure ending strictly before `date`.
    ///
    /// # Errors
    ///
    /// Returns `NoPriorClosure` when no closure qualifies.
    pub fn last_closure_before(&self, date: NaiveDate) -> EngineResult<&PeriodClosure> {
        self.closures
            .iter()
            .rev()
            .find(|c| c.period_end < date)
            .ok_or_else(|| EngineError::NoPriorClosure {
                employment_id: self.employment_id.clone(),
                date,
            })
    }

    fn baseline_for(&self, date: NaiveDate) -> (i64, NaiveDate) {
        match self.last_closure_before(date) {
            Ok(closure) => (0, closure.period_end + Duration::days(1)),
            Err(_) => (self.opening_balance_minutes, self.start_date),
        }
    }

    fn sum_between(&self, from: NaiveDate, to: NaiveDate) -> i64 {
        if from > to {
            return 0;
        }
        let daily: i64 = self.daily.range(from..=to).map(|(_, minutes)| minutes).sum();
        let adjusted: i64 = self
            .adjustments
            .iter()
            .filter(|a| a.date >= from && a.date <= to)
            .map(|a| a.delta_minutes)
            .sum();
        daily + adjusted
    }

    fn closure_covering(&self, date: NaiveDate) -> Option<&PeriodClosure> {
        self.closures
            .iter()
            .find(|c| c.period_start <= date && date <= c.period_end)
    }

    fn check_employment(&self, employment_id: &str) -> EngineResult<()> {
        if employment_id == self.employment_id {
            Ok(())
        } else {
            Err(EngineError::EmploymentMismatch {
                expected: self.employment_id.clone(),
                actual: employment_id.to_string(),
            })
        }
    }

    fn check_started(&self, date: NaiveDate) -> EngineResult<()> {
        if date < self.start_date {
            Err(EngineError::BalanceBeforeLedgerStart {
                date,
                start_date: self.start_date,
            })
        } else {
            Ok(())
        }
    }
}

/// One ledger per employment, each behind its own lock.
///
/// Writers to different employments never contend; writers to the same
/// employment are serialized by that ledger's mutex.
#[derive(Debug, Default)]
pub struct LedgerRegistry {
    ledgers: RwLock<HashMap<String, Arc<Mutex<TimeBankLedger>>>>,
}

impl LedgerRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the employment's ledger, opening it on first use.
    ///
    /// The ledger opens on the first rules version with the time bank
    /// enabled, carrying that version's opening balance.
    ///
    /// # Errors
    ///
    /// Returns `TimeBankDisabled` if no rules version enables the time bank
    /// and `LedgerUnavailable` if the registry lock is poisoned.
    pub fn ledger_for(&self, employment: &Employment) -> EngineResult<Arc<Mutex<TimeBankLedger>>> {
        let unavailable = || EngineError::LedgerUnavailable {
            employment_id: employment.id.clone(),
        };

        if let Some(ledger) = self.ledgers.read().map_err(|_| unavailable())?.get(&employment.id) {
            return Ok(Arc::clone(ledger));
        }

        let enabled = employment
            .rules
            .versions()
            .iter()
            .find(|rules| rules.time_bank.enabled)
            .ok_or_else(|| EngineError::TimeBankDisabled {
                employment_id: employment.id.clone(),
            })?;

        let mut ledgers = self.ledgers.write().map_err(|_| unavailable())?;
        let ledger = ledgers.entry(employment.id.clone()).or_insert_with(|| {
            info!(
                employment_id = %employment.id,
                start_date = %enabled.effective_from,
                opening_balance_minutes = enabled.time_bank.opening_balance_minutes,
                "Opened time-bank ledger"
            );
            Arc::new(Mutex::new(TimeBankLedger::new(
                employment.id.clone(),
                enabled.effective_from,
                enabled.time_bank.opening_balance_minutes,
            )))
        });
        Ok(Arc::clone(ledger))
    }

    /// Runs `f` with exclusive access to the employment's ledger.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`ledger_for`](Self::ledger_for) and from `f`;
    /// a poisoned ledger lock maps to `LedgerUnavailable`.
    pub fn with_ledger<T>(
        &self,
        employment: &Employment,
        f: impl FnOnce(&mut TimeBankLedger) -> EngineResult<T>,
    ) -> EngineResult<T> {
        let ledger = self.ledger_for(employment)?;
        let mut guard = ledger.lock().map_err(|_| EngineError::LedgerUnavailable {
            employment_id: employment.id.clone(),
        })?;
        f(&mut guard)
    }

    /// Returns the number of open ledgers.
    pub fn len(&self) -> usize {
        self.ledgers.read().map(|l| l.len()).unwrap_or(0)
    }

    /// Returns true if no ledger has been opened.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
