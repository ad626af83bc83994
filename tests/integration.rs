//! Integration tests for the work-time accounting API.
//!
//! This test suite drives the router end to end against the reference
//! configuration in `config/default`:
//! - Daily summaries (tolerance, bridge add-on, rules versions)
//! - Holidays and absences
//! - Bridge-day distribution
//! - Punch validation
//! - Time-bank ledger flow (record, close, adjust, delete, query)
//! - Error cases

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use rust_decimal::Decimal;
use serde_json::{Value, json};
use std::str::FromStr;
use tower::ServiceExt;

use timebank_engine::api::{AppState, create_router};
use timebank_engine::config::ConfigLoader;

// =============================================================================
// Test Helpers
// =============================================================================

fn create_router_for_test() -> Router {
    let config = ConfigLoader::load("./config/default").expect("Failed to load config");
    create_router(AppState::new(config))
}

fn decimal(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

async fn send(router: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header("Content-Type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = router
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}

async fn post(router: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(router, "POST", uri, Some(body)).await
}

async fn get(router: &Router, uri: &str) -> (StatusCode, Value) {
    send(router, "GET", uri, None).await
}

fn punches(date: &str, times: &[&str]) -> Vec<Value> {
    times
        .iter()
        .map(|t| json!({ "timestamp": format!("{}T{}:00", date, t) }))
        .collect()
}

/// 08:00-12:00 and 13:14-17:14: a 74-minute lunch forgiven down to 60.
fn full_day(date: &str) -> Vec<Value> {
    punches(date, &["08:00", "12:00", "13:14", "17:14"])
}

fn summary_request(employment_id: &str, date: &str, punches: Vec<Value>) -> Value {
    json!({
        "employment_id": employment_id,
        "date": date,
        "punches": punches
    })
}

async fn balance_on(router: &Router, employment_id: &str, date: &str) -> i64 {
    let (status, body) = get(
        router,
        &format!("/ledger/{}/balance?date={}", employment_id, date),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "balance query failed: {}", body);
    body["balance_minutes"].as_i64().unwrap()
}

// =============================================================================
// Daily summary
// =============================================================================

#[tokio::test]
async fn test_summary_applies_tolerance_and_bridge_add_on() {
    let router = create_router_for_test();
    let (status, body) = post(
        &router,
        "/summary",
        summary_request("emp_001", "2026-01-15", full_day("2026-01-15")),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["summary"]["worked_minutes"], 494);
    assert_eq!(body["summary"]["bridge_add_on_minutes"], 6);
    assert_eq!(body["summary"]["expected_minutes"], 486);
    assert_eq!(body["summary"]["balance_minutes"], 8);
    assert_eq!(body["summary"]["is_complete"], true);
    assert_eq!(body["summary"]["tolerance_applied"], true);
    assert_eq!(body["punches"][2]["considered_timestamp"], "2026-01-15T13:00:00");
    assert_eq!(
        decimal(body["worked_hours"].as_str().unwrap()),
        decimal("8.23")
    );
}

#[tokio::test]
async fn test_summary_empty_workday_is_negative() {
    let router = create_router_for_test();
    let (status, body) = post(
        &router,
        "/summary",
        summary_request("emp_001", "2026-01-14", vec![]),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["summary"]["balance_minutes"], -486);
    assert_eq!(body["summary"]["is_complete"], false);
}

#[tokio::test]
async fn test_summary_forgotten_clock_out_is_incomplete() {
    let router = create_router_for_test();
    let (status, body) = post(
        &router,
        "/summary",
        summary_request(
            "emp_001",
            "2026-01-15",
            punches("2026-01-15", &["08:00", "12:00", "13:00"]),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["summary"]["worked_minutes"], 240);
    assert_eq!(body["summary"]["is_complete"], false);
    let warnings = body["audit_trace"]["warnings"].as_array().unwrap();
    assert!(warnings.iter().any(|w| w["code"] == "incomplete_day"));
}

#[tokio::test]
async fn test_summary_uses_rules_version_of_the_date() {
    let router = create_router_for_test();
    // 2027 has no configured bridges and falls under the 360-minute version.
    let (status, body) = post(
        &router,
        "/summary",
        summary_request("emp_001", "2027-03-03", vec![]),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["summary"]["expected_minutes"], 360);
}

#[tokio::test]
async fn test_summary_unscheduled_weekend_expects_nothing() {
    let router = create_router_for_test();
    let (status, body) = post(
        &router,
        "/summary",
        summary_request(
            "emp_001",
            "2026-01-17",
            punches("2026-01-17", &["09:00", "11:00"]),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["summary"]["day_kind"], "weekend");
    assert_eq!(body["summary"]["expected_minutes"], 0);
    assert_eq!(body["summary"]["balance_minutes"], 120);
}

// =============================================================================
// Holidays and absences
// =============================================================================

#[tokio::test]
async fn test_state_holiday_applies_only_in_its_state() {
    let router = create_router_for_test();

    // Constitutionalist Revolution: SP only.
    let (_, sao_paulo) = post(
        &router,
        "/summary",
        summary_request("emp_001", "2026-07-09", vec![]),
    )
    .await;
    assert_eq!(sao_paulo["summary"]["day_kind"], "holiday");
    assert_eq!(sao_paulo["summary"]["expected_minutes"], 0);

    let (_, rio) = post(
        &router,
        "/summary",
        summary_request("emp_002", "2026-07-09", vec![]),
    )
    .await;
    assert_eq!(rio["summary"]["day_kind"], "workday");
    assert_eq!(rio["summary"]["expected_minutes"], 446);
}

#[tokio::test]
async fn test_municipal_holiday_zeroes_expected() {
    let router = create_router_for_test();
    // São Paulo Anniversary falls on a Monday in 2027.
    let (status, body) = post(
        &router,
        "/summary",
        summary_request("emp_001", "2027-01-25", vec![]),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["summary"]["day_kind"], "holiday");
    assert_eq!(body["summary"]["balance_minutes"], 0);
}

#[tokio::test]
async fn test_vacation_day_expects_nothing() {
    let router = create_router_for_test();
    let vacation = json!([{
        "absence_type": "vacation",
        "start_date": "2026-03-09",
        "end_date": "2026-03-20"
    }]);

    let (_, idle) = post(
        &router,
        "/summary",
        json!({ "employment_id": "emp_001", "date": "2026-03-10", "absences": vacation }),
    )
    .await;
    assert_eq!(idle["summary"]["day_kind"], "absence");
    assert_eq!(idle["summary"]["expected_minutes"], 0);
    assert_eq!(idle["summary"]["balance_minutes"], 0);

    let (_, worked) = post(
        &router,
        "/summary",
        json!({
            "employment_id": "emp_001",
            "date": "2026-03-11",
            "punches": punches("2026-03-11", &["08:00", "16:00"]),
            "absences": vacation
        }),
    )
    .await;
    assert_eq!(worked["summary"]["balance_minutes"], 480);
}

#[tokio::test]
async fn test_overlapping_absences_return_409() {
    let router = create_router_for_test();
    let (status, body) = post(
        &router,
        "/summary",
        json!({
            "employment_id": "emp_001",
            "date": "2026-03-10",
            "absences": [
                { "absence_type": "vacation", "start_date": "2026-03-09", "end_date": "2026-03-20" },
                { "absence_type": "medical", "start_date": "2026-03-20", "end_date": "2026-03-21" }
            ]
        }),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "OVERLAPPING_ABSENCE");
}

// =============================================================================
// Bridge days
// =============================================================================

#[tokio::test]
async fn test_bridge_days_counted_from_holiday_store() {
    let router = create_router_for_test();
    let (status, body) = post(
        &router,
        "/bridge-days",
        json!({ "employment_id": "emp_001", "year": 2026 }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["config"]["bridge_days"], 3);
    assert_eq!(body["config"]["total_compensable_minutes"], 1440);
    assert_eq!(body["config"]["working_days"], 247);
    assert_eq!(body["config"]["daily_add_on_minutes"], 6);
    assert_eq!(body["config"]["margin_minutes"], 42);
    assert_eq!(body["audit_step"]["rule_id"], "bridge_day_distribution");
}

#[tokio::test]
async fn test_bridge_days_explicit_count() {
    let router = create_router_for_test();
    let (status, body) = post(
        &router,
        "/bridge-days",
        json!({ "employment_id": "emp_001", "year": 2026, "bridge_days": 5 }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["config"]["total_compensable_minutes"], 2400);
    assert_eq!(body["config"]["daily_add_on_minutes"], 10);
    assert_eq!(body["config"]["margin_minutes"], 70);
}

// =============================================================================
// Punch validation
// =============================================================================

fn validation_request(time: &str, declared: Option<&str>, existing: &[&str]) -> Value {
    json!({
        "employment_id": "emp_001",
        "date": "2026-01-15",
        "time": format!("{}:00", time),
        "declared_kind": declared,
        "existing": punches("2026-01-15", existing),
        "now": "2026-01-15T23:00:00"
    })
}

#[tokio::test]
async fn test_valid_punch_is_accepted() {
    let router = create_router_for_test();
    let (status, body) = post(
        &router,
        "/punches/validate",
        validation_request("13:00", Some("clock_in"), &["08:00", "12:00"]),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["accepted"], true);
    assert_eq!(body["punch"]["kind"], "clock_in");
    assert_eq!(body["punch"]["position"], 2);
}

#[tokio::test]
async fn test_clock_out_after_clock_out_is_rejected() {
    let router = create_router_for_test();
    let (status, body) = post(
        &router,
        "/punches/validate",
        validation_request("13:00", Some("clock_out"), &["08:00", "12:00"]),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["accepted"], false);
    assert_eq!(body["violations"][0]["rule"], "sequence_mismatch");
    assert_eq!(body["violations"][0]["expected"], "clock_in");
}

#[tokio::test]
async fn test_fifth_punch_is_rejected() {
    let router = create_router_for_test();
    let (status, body) = post(
        &router,
        "/punches/validate",
        validation_request("18:00", None, &["08:00", "12:00", "13:00", "17:00"]),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let rules: Vec<&str> = body["violations"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["rule"].as_str().unwrap())
        .collect();
    assert!(rules.contains(&"max_punches_reached"));
}

#[tokio::test]
async fn test_weekend_registration_depends_on_schedule() {
    let router = create_router_for_test();
    let saturday = |employment_id: &str| {
        json!({
            "employment_id": employment_id,
            "date": "2026-01-17",
            "time": "09:00:00",
            "now": "2026-01-17T23:00:00"
        })
    };

    let (status, body) = post(&router, "/punches/validate", saturday("emp_001")).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["violations"][0]["rule"], "registration_not_allowed");

    // emp_002 works four hours on Saturdays.
    let (status, _) = post(&router, "/punches/validate", saturday("emp_002")).await;
    assert_eq!(status, StatusCode::OK);
}

// =============================================================================
// Time-bank ledger
// =============================================================================

#[tokio::test]
async fn test_ledger_flow_record_close_adjust_delete() {
    let router = create_router_for_test();

    let (status, body) = post(
        &router,
        "/ledger/emp_001/days",
        json!({
            "days": [
                { "date": "2026-02-02", "punches": full_day("2026-02-02") },
                { "date": "2026-02-03", "punches": full_day("2026-02-03") }
            ]
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["running_balance_minutes"], 16);
    assert_eq!(body["recorded"].as_array().unwrap().len(), 2);

    let (status, closure) = post(
        &router,
        "/ledger/emp_001/closures",
        json!({
            "period_start": "2026-02-01",
            "period_end": "2026-02-03",
            "kind": "weekly",
            "today": "2026-02-04"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(closure["balance_minutes"], 16);
    let closure_id = closure["id"].as_str().unwrap().to_string();

    // The closure ends on the 3rd, so it is ignored for the 2nd.
    assert_eq!(balance_on(&router, "emp_001", "2026-02-02").await, 8);
    assert_eq!(balance_on(&router, "emp_001", "2026-02-04").await, 0);

    let (status, adjustment) = post(
        &router,
        "/ledger/emp_001/adjustments",
        json!({
            "date": "2026-02-04",
            "delta_minutes": 30,
            "justification": "Overtime approved by manager",
            "now": "2026-02-05T09:00:00"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(adjustment["delta_minutes"], 30);
    assert_eq!(balance_on(&router, "emp_001", "2026-02-04").await, 30);

    let (status, _) = send(
        &router,
        "DELETE",
        &format!("/ledger/emp_001/closures/{}", closure_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(balance_on(&router, "emp_001", "2026-02-04").await, 46);
}

#[tokio::test]
async fn test_balance_reports_closure_it_counts_from() {
    let router = create_router_for_test();
    let (_, closure) = post(
        &router,
        "/ledger/emp_001/closures",
        json!({
            "period_start": "2026-01-01",
            "period_end": "2026-01-31",
            "kind": "monthly",
            "today": "2026-02-01"
        }),
    )
    .await;

    let (status, body) = get(&router, "/ledger/emp_001/balance?date=2026-02-10").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["since_closure"], closure["id"]);
    assert_eq!(decimal(body["balance_hours"].as_str().unwrap()), Decimal::ZERO);
}

#[tokio::test]
async fn test_recording_a_day_twice_is_idempotent() {
    let router = create_router_for_test();
    let request = json!({ "days": [{ "date": "2026-02-02", "punches": full_day("2026-02-02") }] });

    post(&router, "/ledger/emp_001/days", request.clone()).await;
    let (_, body) = post(&router, "/ledger/emp_001/days", request).await;

    assert_eq!(body["running_balance_minutes"], 8);
}

// =============================================================================
// Error cases
// =============================================================================

#[tokio::test]
async fn test_closing_unfinished_period_returns_409() {
    let router = create_router_for_test();
    let (status, body) = post(
        &router,
        "/ledger/emp_001/closures",
        json!({
            "period_start": "2026-02-01",
            "period_end": "2026-02-10",
            "kind": "time_bank_cycle",
            "today": "2026-02-10"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CYCLE_NOT_ELAPSED");
}

#[tokio::test]
async fn test_deleting_older_closure_returns_409() {
    let router = create_router_for_test();
    let close = |start: &str, end: &str| {
        json!({ "period_start": start, "period_end": end, "kind": "weekly", "today": "2026-03-01" })
    };

    let (_, first) = post(&router, "/ledger/emp_001/closures", close("2026-02-02", "2026-02-08")).await;
    post(&router, "/ledger/emp_001/closures", close("2026-02-09", "2026-02-15")).await;

    let (status, body) = send(
        &router,
        "DELETE",
        &format!("/ledger/emp_001/closures/{}", first["id"].as_str().unwrap()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CLOSURE_NOT_LATEST");
}

#[tokio::test]
async fn test_adjustment_without_justification_returns_400() {
    let router = create_router_for_test();
    let (status, body) = post(
        &router,
        "/ledger/emp_001/adjustments",
        json!({ "date": "2026-02-04", "delta_minutes": -20, "justification": "  " }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "MISSING_JUSTIFICATION");
}

#[tokio::test]
async fn test_disabled_time_bank_returns_409() {
    let router = create_router_for_test();
    let (status, body) = get(&router, "/ledger/emp_002/balance?date=2026-02-04").await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "TIME_BANK_DISABLED");
}

#[tokio::test]
async fn test_balance_before_ledger_start_returns_422() {
    let router = create_router_for_test();
    let (status, body) = get(&router, "/ledger/emp_001/balance?date=2024-12-31").await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "BEFORE_LEDGER_START");
}

#[tokio::test]
async fn test_balance_without_date_returns_400() {
    let router = create_router_for_test();
    let (status, body) = get(&router, "/ledger/emp_001/balance").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_unknown_employment_ledger_returns_404() {
    let router = create_router_for_test();
    let (status, body) = get(&router, "/ledger/nobody/balance?date=2026-02-04").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "EMPLOYMENT_NOT_FOUND");
}
