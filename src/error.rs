//! Error types for the work-time accounting engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for configuration, calendar and ledger failures. Punch validation has
//! its own error type, [`PunchRejection`](crate::calculation::PunchRejection),
//! because it always carries the full list of violated rules.

use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

/// The main error type for the work-time accounting engine.
///
/// Every failure is a data-level result; nothing in the engine panics for
/// flow control.
///
/// # Example
///
/// ```
/// use timebank_engine::error::EngineError;
///
/// let error = EngineError::ConfigNotFound {
///     path: "/missing/engine.yaml".to_string(),
/// };
/// assert_eq!(error.to_string(), "Configuration file not found: /missing/engine.yaml");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// No employment with the given id is configured.
    #[error("Employment not found: {employment_id}")]
    EmploymentNotFound {
        /// The employment id that was requested.
        employment_id: String,
    },

    /// No rules version is effective for the employment on the given date.
    #[error("No rules effective for employment '{employment_id}' on {date}")]
    RulesNotFound {
        /// The employment id.
        employment_id: String,
        /// The date for which rules were requested.
        date: NaiveDate,
    },

    /// A rules field holds an out-of-range value.
    #[error("Invalid rules field '{field}': {message}")]
    InvalidRules {
        /// The offending field.
        field: String,
        /// What made the field invalid.
        message: String,
    },

    /// A holiday record is malformed.
    #[error("Invalid holiday '{name}': {message}")]
    InvalidHoliday {
        /// The holiday name.
        name: String,
        /// What made the holiday invalid.
        message: String,
    },

    /// An absence record is malformed.
    #[error("Invalid absence '{absence_id}': {message}")]
    InvalidAbsence {
        /// The absence id.
        absence_id: Uuid,
        /// What made the absence invalid.
        message: String,
    },

    /// Two active absences of the same employment overlap.
    #[error("Absence '{candidate}' overlaps existing absence '{existing}' ({start} to {end})")]
    OverlappingAbsence {
        /// The absence being registered.
        candidate: Uuid,
        /// The active absence it collides with.
        existing: Uuid,
        /// First overlapping date.
        start: NaiveDate,
        /// Last overlapping date.
        end: NaiveDate,
    },

    /// The employment does not have a time bank enabled.
    #[error("Time bank is disabled for employment '{employment_id}'")]
    TimeBankDisabled {
        /// The employment id.
        employment_id: String,
    },

    /// A record belongs to a different employment than the ledger.
    #[error("Record for employment '{actual}' cannot be applied to ledger of '{expected}'")]
    EmploymentMismatch {
        /// The ledger's employment id.
        expected: String,
        /// The employment id carried by the record.
        actual: String,
    },

    /// A period's start date is after its end date.
    #[error("Invalid period: start {start} is after end {end}")]
    InvalidPeriod {
        /// Period start.
        start: NaiveDate,
        /// Period end.
        end: NaiveDate,
    },

    /// A cycle was closed before its end date had passed.
    #[error("Cannot close period ending {period_end}: it has not elapsed as of {today}")]
    CycleNotElapsed {
        /// The requested period end.
        period_end: NaiveDate,
        /// The caller's current date.
        today: NaiveDate,
    },

    /// A closure would overlap the previous closure's period.
    #[error("Period starting {period_start} overlaps previous closure ending {previous_end}")]
    OverlappingClosure {
        /// The requested period start.
        period_start: NaiveDate,
        /// The end of the latest existing closure.
        previous_end: NaiveDate,
    },

    /// No closure with the given id exists.
    #[error("Closure not found: {closure_id}")]
    ClosureNotFound {
        /// The closure id.
        closure_id: Uuid,
    },

    /// Only the most recent closure may be undone.
    #[error("Closure '{closure_id}' is not the most recent closure")]
    ClosureNotLatest {
        /// The closure id.
        closure_id: Uuid,
    },

    /// A manual adjustment was submitted without a justification.
    #[error("Balance adjustment requires a justification")]
    MissingJustification,

    /// A manual adjustment of zero minutes was submitted.
    #[error("Balance adjustment must be non-zero")]
    ZeroAdjustment,

    /// A balance was requested for a date before the ledger was opened.
    #[error("No balance baseline for {date}: ledger starts on {start_date}")]
    BalanceBeforeLedgerStart {
        /// The queried date.
        date: NaiveDate,
        /// The ledger's start date.
        start_date: NaiveDate,
    },

    /// No closure ends strictly before the queried date.
    #[error("No closure for employment '{employment_id}' ends before {date}")]
    NoPriorClosure {
        /// The employment id.
        employment_id: String,
        /// The queried date.
        date: NaiveDate,
    },

    /// The ledger lock was poisoned by a panicking writer.
    #[error("Ledger for employment '{employment_id}' is unavailable")]
    LedgerUnavailable {
        /// The employment id.
        employment_id: String,
    },

    /// A general calculation error occurred.
    #[error("Calculation error: {message}")]
    CalculationError {
        /// A description of the calculation error.
        message: String,
    },
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;
