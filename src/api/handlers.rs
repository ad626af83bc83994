//! HTTP request handlers for the work-time accounting API.
//!
//! This module contains the handler functions for all API endpoints.

use std::collections::BTreeSet;
use std::time::Instant;

use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use chrono::{Datelike, Utc};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::ConfigLoader;
use crate::engine::WorkTimeEngine;
use crate::error::{EngineError, EngineResult};
use crate::models::{Absence, BridgeDayConfig, Employment, Holiday, Punch, minutes_to_hours};

use super::request::{
    AdjustmentRequest, BalanceQuery, BridgeDaysRequest, CloseCycleRequest, RecordDaysRequest,
    SummaryRequest, ValidatePunchRequest, into_absences,
};
use super::response::{
    ApiError, ApiErrorResponse, BalanceResponse, PunchValidationResponse, RecordDaysResponse,
    SummaryResponse,
};
use super::state::AppState;

/// Creates the API router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/summary", post(summary_handler))
        .route("/punches/validate", post(validate_punch_handler))
        .route("/bridge-days", post(bridge_days_handler))
        .route("/ledger/:employment_id/days", post(record_days_handler))
        .route("/ledger/:employment_id/closures", post(close_cycle_handler))
        .route(
            "/ledger/:employment_id/closures/:closure_id",
            delete(delete_closure_handler),
        )
        .route("/ledger/:employment_id/adjustments", post(adjust_handler))
        .route("/ledger/:employment_id/balance", get(balance_handler))
        .with_state(state)
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "application/json")],
        Json(body),
    )
        .into_response()
}

fn error_response(correlation_id: Uuid, err: EngineError) -> Response {
    warn!(
        correlation_id = %correlation_id,
        error = %err,
        "Request failed"
    );
    let api_error: ApiErrorResponse = err.into();
    json_response(api_error.status, api_error.error)
}

fn json_rejection_response(correlation_id: Uuid, rejection: JsonRejection) -> Response {
    let error = match rejection {
        JsonRejection::JsonDataError(err) => {
            let body_text = err.body_text();
            warn!(
                correlation_id = %correlation_id,
                error = %body_text,
                "JSON data error"
            );
            if body_text.contains("missing field") {
                ApiError::validation_error(body_text)
            } else {
                ApiError::malformed_json(body_text)
            }
        }
        JsonRejection::JsonSyntaxError(err) => {
            warn!(
                correlation_id = %correlation_id,
                error = %err,
                "JSON syntax error"
            );
            ApiError::malformed_json(format!("Invalid JSON syntax: {}", err))
        }
        JsonRejection::MissingJsonContentType(_) => {
            ApiError::new("MISSING_CONTENT_TYPE", "Content-Type must be application/json")
        }
        _ => ApiError::malformed_json("Failed to parse request body"),
    };
    json_response(StatusCode::BAD_REQUEST, error)
}

/// Computes the bridge-day configuration of every year in `years`.
fn bridge_configs(
    employment: &Employment,
    holidays: &[Holiday],
    absences: &[Absence],
    years: impl IntoIterator<Item = i32>,
) -> EngineResult<Vec<BridgeDayConfig>> {
    let engine = WorkTimeEngine::new(employment, holidays, absences, &[]);
    years
        .into_iter()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(|year| engine.distribute_bridge_days(year, None).map(|d| d.config))
        .collect()
}

/// Handler for POST /summary.
async fn summary_handler(
    State(state): State<AppState>,
    payload: Result<Json<SummaryRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Processing summary request");

    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return json_rejection_response(correlation_id, rejection),
    };

    let start_time = Instant::now();
    let employment_id = request.employment_id.clone();
    let date = request.date;
    match compute_summary(state.config(), request) {
        Ok(result) => {
            info!(
                correlation_id = %correlation_id,
                employment_id = %employment_id,
                date = %date,
                balance_minutes = result.calculation.summary.balance_minutes,
                duration_us = start_time.elapsed().as_micros(),
                "Summary computed"
            );
            json_response(StatusCode::OK, result)
        }
        Err(err) => error_response(correlation_id, err),
    }
}

fn compute_summary(config: &ConfigLoader, request: SummaryRequest) -> EngineResult<SummaryResponse> {
    let employment = config.employment(&request.employment_id)?;
    let absences = into_absences(request.absences, &employment.id)?;
    let punches: Vec<Punch> = request
        .punches
        .into_iter()
        .map(|p| p.into_punch(&employment.id))
        .collect();

    let bridges = bridge_configs(employment, config.holidays(), &absences, [request.date.year()])?;
    let engine = WorkTimeEngine::new(employment, config.holidays(), &absences, &bridges);
    Ok(engine.compute_daily_summary(request.date, &punches)?.into())
}

/// Handler for POST /punches/validate.
///
/// Returns 200 for an accepted punch and 422 with every violation for a
/// rejected one.
async fn validate_punch_handler(
    State(state): State<AppState>,
    payload: Result<Json<ValidatePunchRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Processing punch validation request");

    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return json_rejection_response(correlation_id, rejection),
    };

    match validate_punch(state.config(), request) {
        Ok(result) if result.accepted => {
            info!(correlation_id = %correlation_id, "Punch accepted");
            json_response(StatusCode::OK, result)
        }
        Ok(result) => {
            warn!(
                correlation_id = %correlation_id,
                violations = result.violations.len(),
                "Punch rejected"
            );
            json_response(StatusCode::UNPROCESSABLE_ENTITY, result)
        }
        Err(err) => error_response(correlation_id, err),
    }
}

fn validate_punch(
    config: &ConfigLoader,
    request: ValidatePunchRequest,
) -> EngineResult<PunchValidationResponse> {
    let employment = config.employment(&request.employment_id)?;
    let candidate = request.candidate();
    let now = request.now.unwrap_or_else(|| Utc::now().naive_utc());
    let absences = into_absences(request.absences, &employment.id)?;
    let existing: Vec<Punch> = request
        .existing
        .into_iter()
        .map(|p| p.into_punch(&employment.id))
        .collect();

    let engine = WorkTimeEngine::new(employment, config.holidays(), &absences, &[]);
    Ok(engine.validate_punch(&candidate, &existing, now)?.into())
}

/// Handler for POST /bridge-days.
async fn bridge_days_handler(
    State(state): State<AppState>,
    payload: Result<Json<BridgeDaysRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Processing bridge-day request");

    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return json_rejection_response(correlation_id, rejection),
    };

    let config = state.config();
    let result = config.employment(&request.employment_id).and_then(|employment| {
        WorkTimeEngine::new(employment, config.holidays(), &[], &[])
            .distribute_bridge_days(request.year, request.bridge_days)
    });

    match result {
        Ok(distribution) => {
            info!(
                correlation_id = %correlation_id,
                employment_id = %request.employment_id,
                year = request.year,
                daily_add_on_minutes = distribution.config.daily_add_on_minutes,
                "Bridge days distributed"
            );
            json_response(StatusCode::OK, distribution)
        }
        Err(err) => error_response(correlation_id, err),
    }
}

/// Handler for POST /ledger/:employment_id/days.
async fn record_days_handler(
    State(state): State<AppState>,
    Path(employment_id): Path<String>,
    payload: Result<Json<RecordDaysRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(
        correlation_id = %correlation_id,
        employment_id = %employment_id,
        "Processing ledger days request"
    );

    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return json_rejection_response(correlation_id, rejection),
    };

    match record_days(&state, &employment_id, request) {
        Ok(result) => {
            info!(
                correlation_id = %correlation_id,
                employment_id = %employment_id,
                days = result.recorded.len(),
                running_balance_minutes = result.running_balance_minutes,
                "Days recorded"
            );
            json_response(StatusCode::OK, result)
        }
        Err(err) => error_response(correlation_id, err),
    }
}

fn record_days(
    state: &AppState,
    employment_id: &str,
    request: RecordDaysRequest,
) -> EngineResult<RecordDaysResponse> {
    let config = state.config();
    let employment = config.employment(employment_id)?;
    let absences = into_absences(request.absences, &employment.id)?;

    let years = request.days.iter().map(|d| d.date.year()).collect::<Vec<_>>();
    let bridges = bridge_configs(employment, config.holidays(), &absences, years)?;
    let engine = WorkTimeEngine::new(employment, config.holidays(), &absences, &bridges);

    let summaries = request
        .days
        .into_iter()
        .map(|day| {
            let punches: Vec<Punch> = day
                .punches
                .into_iter()
                .map(|p| p.into_punch(&employment.id))
                .collect();
            engine
                .compute_daily_summary(day.date, &punches)
                .map(|calculation| calculation.summary)
        })
        .collect::<EngineResult<Vec<_>>>()?;

    let running_balance_minutes = state.ledgers().with_ledger(employment, |ledger| {
        if let Some(early) = summaries.iter().find(|s| s.date < ledger.start_date()) {
            return Err(EngineError::BalanceBeforeLedgerStart {
                date: early.date,
                start_date: ledger.start_date(),
            });
        }
        for summary in &summaries {
            ledger.record_day(summary)?;
        }
        Ok(ledger.running_balance())
    })?;

    Ok(RecordDaysResponse {
        employment_id: employment.id.clone(),
        recorded: summaries,
        running_balance_minutes,
        running_balance_hours: minutes_to_hours(running_balance_minutes),
    })
}

/// Handler for POST /ledger/:employment_id/closures.
async fn close_cycle_handler(
    State(state): State<AppState>,
    Path(employment_id): Path<String>,
    payload: Result<Json<CloseCycleRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(
        correlation_id = %correlation_id,
        employment_id = %employment_id,
        "Processing closure request"
    );

    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return json_rejection_response(correlation_id, rejection),
    };

    let today = request.today.unwrap_or_else(|| Utc::now().date_naive());
    let result = state
        .config()
        .employment(&employment_id)
        .and_then(|employment| {
            state.ledgers().with_ledger(employment, |ledger| {
                ledger.close_cycle(request.period_start, request.period_end, request.kind, today)
            })
        });

    match result {
        Ok(closure) => json_response(StatusCode::CREATED, closure),
        Err(err) => error_response(correlation_id, err),
    }
}

/// Handler for DELETE /ledger/:employment_id/closures/:closure_id.
async fn delete_closure_handler(
    State(state): State<AppState>,
    Path((employment_id, closure_id)): Path<(String, Uuid)>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(
        correlation_id = %correlation_id,
        employment_id = %employment_id,
        closure_id = %closure_id,
        "Processing closure deletion"
    );

    let result = state
        .config()
        .employment(&employment_id)
        .and_then(|employment| {
            state
                .ledgers()
                .with_ledger(employment, |ledger| ledger.delete_closure(closure_id))
        });

    match result {
        Ok(closure) => json_response(StatusCode::OK, closure),
        Err(err) => error_response(correlation_id, err),
    }
}

/// Handler for POST /ledger/:employment_id/adjustments.
async fn adjust_handler(
    State(state): State<AppState>,
    Path(employment_id): Path<String>,
    payload: Result<Json<AdjustmentRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(
        correlation_id = %correlation_id,
        employment_id = %employment_id,
        "Processing adjustment request"
    );

    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return json_rejection_response(correlation_id, rejection),
    };

    let now = request.now.unwrap_or_else(|| Utc::now().naive_utc());
    let result = state
        .config()
        .employment(&employment_id)
        .and_then(|employment| {
            state.ledgers().with_ledger(employment, |ledger| {
                ledger.adjust(request.date, request.delta_minutes, &request.justification, now)
            })
        });

    match result {
        Ok(adjustment) => json_response(StatusCode::CREATED, adjustment),
        Err(err) => error_response(correlation_id, err),
    }
}

/// Handler for GET /ledger/:employment_id/balance?date=YYYY-MM-DD.
async fn balance_handler(
    State(state): State<AppState>,
    Path(employment_id): Path<String>,
    query: Result<Query<BalanceQuery>, QueryRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();

    let Query(query) = match query {
        Ok(query) => query,
        Err(rejection) => {
            warn!(
                correlation_id = %correlation_id,
                error = %rejection.body_text(),
                "Invalid balance query"
            );
            return json_response(
                StatusCode::BAD_REQUEST,
                ApiError::validation_error(rejection.body_text()),
            );
        }
    };
    info!(
        correlation_id = %correlation_id,
        employment_id = %employment_id,
        date = %query.date,
        "Processing balance query"
    );

    let result = state
        .config()
        .employment(&employment_id)
        .and_then(|employment| {
            state.ledgers().with_ledger(employment, |ledger| {
                let balance = ledger.balance_as_of(query.date)?;
                let since = ledger.last_closure_before(query.date).ok().map(|c| c.id);
                Ok(BalanceResponse::new(&employment.id, query.date, balance, since))
            })
        });

    match result {
        Ok(balance) => json_response(StatusCode::OK, balance),
        Err(err) => error_response(correlation_id, err),
    }
}
