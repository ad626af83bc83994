//! Response types for the work-time accounting API.
//!
//! This module defines the success payloads, the error response structure
//! and the mapping from engine errors to HTTP statuses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::calculation::{AcceptedPunch, PunchRejection, PunchViolation};
use crate::engine::DailyCalculation;
use crate::error::EngineError;
use crate::models::{DailySummary, minutes_to_hours};

/// API error response structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Optional details about the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Creates a new API error with details.
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: Some(details.into()),
        }
    }

    /// Creates a validation error response.
    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    /// Creates a malformed JSON error response.
    pub fn malformed_json(message: impl Into<String>) -> Self {
        Self::new("MALFORMED_JSON", message)
    }
}

/// API error with HTTP status code.
pub struct ApiErrorResponse {
    /// The HTTP status code.
    pub status: StatusCode,
    /// The error body.
    pub error: ApiError,
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.error)).into_response()
    }
}

impl From<EngineError> for ApiErrorResponse {
    fn from(error: EngineError) -> Self {
        let message = error.to_string();
        let (status, code, details) = match &error {
            EngineError::ConfigNotFound { .. } | EngineError::ConfigParseError { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "CONFIG_ERROR",
                "The engine configuration could not be loaded",
            ),
            EngineError::EmploymentNotFound { .. } => (
                StatusCode::NOT_FOUND,
                "EMPLOYMENT_NOT_FOUND",
                "The employment id is not configured in this engine",
            ),
            EngineError::RulesNotFound { .. } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "RULES_NOT_FOUND",
                "No rules version is effective on the requested date",
            ),
            EngineError::InvalidRules { .. } => (
                StatusCode::BAD_REQUEST,
                "INVALID_RULES",
                "A rules field is out of range",
            ),
            EngineError::InvalidHoliday { .. } => (
                StatusCode::BAD_REQUEST,
                "INVALID_HOLIDAY",
                "The holiday data contains invalid information",
            ),
            EngineError::InvalidAbsence { .. } => (
                StatusCode::BAD_REQUEST,
                "INVALID_ABSENCE",
                "The absence data contains invalid information",
            ),
            EngineError::OverlappingAbsence { .. } => (
                StatusCode::CONFLICT,
                "OVERLAPPING_ABSENCE",
                "Active absences of one employment must not overlap",
            ),
            EngineError::TimeBankDisabled { .. } => (
                StatusCode::CONFLICT,
                "TIME_BANK_DISABLED",
                "The employment does not accumulate a time bank",
            ),
            EngineError::EmploymentMismatch { .. } => (
                StatusCode::BAD_REQUEST,
                "EMPLOYMENT_MISMATCH",
                "Every record must belong to the requested employment",
            ),
            EngineError::InvalidPeriod { .. } => (
                StatusCode::BAD_REQUEST,
                "INVALID_PERIOD",
                "The period start must not be after its end",
            ),
            EngineError::CycleNotElapsed { .. } => (
                StatusCode::CONFLICT,
                "CYCLE_NOT_ELAPSED",
                "A period can only be closed after its last day",
            ),
            EngineError::OverlappingClosure { .. } => (
                StatusCode::CONFLICT,
                "OVERLAPPING_CLOSURE",
                "A closure must start after the previous closure's end",
            ),
            EngineError::ClosureNotFound { .. } => (
                StatusCode::NOT_FOUND,
                "CLOSURE_NOT_FOUND",
                "No closure with this id exists for the employment",
            ),
            EngineError::ClosureNotLatest { .. } => (
                StatusCode::CONFLICT,
                "CLOSURE_NOT_LATEST",
                "Only the most recent closure can be deleted",
            ),
            EngineError::MissingJustification => (
                StatusCode::BAD_REQUEST,
                "MISSING_JUSTIFICATION",
                "Manual adjustments must explain why they are made",
            ),
            EngineError::ZeroAdjustment => (
                StatusCode::BAD_REQUEST,
                "ZERO_ADJUSTMENT",
                "Manual adjustments must change the balance",
            ),
            EngineError::BalanceBeforeLedgerStart { .. } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "BEFORE_LEDGER_START",
                "The ledger has no entries before its start date",
            ),
            EngineError::NoPriorClosure { .. } => (
                StatusCode::NOT_FOUND,
                "NO_PRIOR_CLOSURE",
                "No closure ends before the requested date",
            ),
            EngineError::LedgerUnavailable { .. } => (
                StatusCode::SERVICE_UNAVAILABLE,
                "LEDGER_UNAVAILABLE",
                "The ledger cannot be accessed",
            ),
            EngineError::CalculationError { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "CALCULATION_ERROR",
                "Calculation failed",
            ),
        };

        ApiErrorResponse {
            status,
            error: ApiError::with_details(code, message, details),
        }
    }
}

/// Response body for `POST /summary`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryResponse {
    /// The computed day.
    #[serde(flatten)]
    pub calculation: DailyCalculation,
    /// Worked time in decimal hours.
    pub worked_hours: Decimal,
    /// Balance in decimal hours.
    pub balance_hours: Decimal,
}

impl From<DailyCalculation> for SummaryResponse {
    fn from(calculation: DailyCalculation) -> Self {
        Self {
            worked_hours: calculation.summary.worked_hours(),
            balance_hours: calculation.summary.balance_hours(),
            calculation,
        }
    }
}

/// Response body for `POST /punches/validate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PunchValidationResponse {
    /// Whether the punch may be persisted.
    pub accepted: bool,
    /// The accepted punch, when accepted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub punch: Option<AcceptedPunch>,
    /// Every violated rule, when rejected.
    pub violations: Vec<PunchViolation>,
}

impl From<Result<AcceptedPunch, PunchRejection>> for PunchValidationResponse {
    fn from(verdict: Result<AcceptedPunch, PunchRejection>) -> Self {
        match verdict {
            Ok(punch) => Self {
                accepted: true,
                punch: Some(punch),
                violations: Vec::new(),
            },
            Err(rejection) => Self {
                accepted: false,
                punch: None,
                violations: rejection.violations,
            },
        }
    }
}

/// Response body for `POST /ledger/:employment_id/days`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordDaysResponse {
    /// The employment.
    pub employment_id: String,
    /// The summaries folded into the ledger.
    pub recorded: Vec<DailySummary>,
    /// Balance since the latest closure after recording.
    pub running_balance_minutes: i64,
    /// The same balance in decimal hours.
    pub running_balance_hours: Decimal,
}

/// Response body for `GET /ledger/:employment_id/balance`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceResponse {
    /// The employment.
    pub employment_id: String,
    /// The queried date.
    pub date: NaiveDate,
    /// Balance at the end of the date.
    pub balance_minutes: i64,
    /// The same balance in decimal hours.
    pub balance_hours: Decimal,
    /// The closure the balance counts from, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub since_closure: Option<Uuid>,
}

impl BalanceResponse {
    /// Builds a balance response.
    pub fn new(
        employment_id: impl Into<String>,
        date: NaiveDate,
        balance_minutes: i64,
        since_closure: Option<Uuid>,
    ) -> Self {
        Self {
            employment_id: employment_id.into(),
            date,
            balance_minutes,
            balance_hours: minutes_to_hours(balance_minutes),
            since_closure,
        }
    }
}
