//! HTTP API module for the work-time accounting engine.
//!
//! This module exposes daily summaries, punch validation, bridge-day
//! distribution and the per-employment time-bank ledger over JSON.

mod handlers;
mod request;
mod response;
mod state;

pub use handlers::create_router;
pub use request::{
    AbsenceRequest, AdjustmentRequest, BalanceQuery, BridgeDaysRequest, CloseCycleRequest,
    DayPunchesRequest, PunchRequest, RecordDaysRequest, SummaryRequest, ValidatePunchRequest,
};
pub use response::{
    ApiError, ApiErrorResponse, BalanceResponse, PunchValidationResponse, RecordDaysResponse,
    SummaryResponse,
};
pub use state::AppState;
