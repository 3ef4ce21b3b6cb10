//! HTTP-level tests for the API handlers with in-memory stores

use actix_web::{http::StatusCode, test, web, App};
use async_trait::async_trait;
use callmatch_api::{configure, SharedContacts, SharedEngine};
use callmatch_auth::JwtService;
use callmatch_core::models::{
    AuthContext, CallEvent, ContactRow, DateWindow, Disposition, UploadPolicy, UserRole,
};
use callmatch_core::traits::{CallRecordStore, ContactRepository};
use callmatch_core::{AppError, AppResult, PhoneNormalizer};
use callmatch_services::ReconciliationEngine;
use chrono::NaiveDate;
use serde_json::{json, Value};
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

const SECRET: &str = "api-test-secret";

struct InMemoryCallLog {
    calls: Vec<CallEvent>,
    fail: bool,
}

#[async_trait]
impl CallRecordStore for InMemoryCallLog {
    async fn query(
        &self,
        filter_numbers: &BTreeSet<String>,
        window: &DateWindow,
    ) -> AppResult<Vec<CallEvent>> {
        if self.fail {
            return Err(AppError::CallStore("connection refused".to_string()));
        }
        let normalizer = PhoneNormalizer::default();
        let mut calls: Vec<CallEvent> = self
            .calls
            .iter()
            .filter(|c| window.contains(&c.calldate))
            .filter(|c| {
                c.caller_numbers()
                    .iter()
                    .any(|d| normalizer.normalized(d).matches_any(filter_numbers))
            })
            .cloned()
            .collect();
        calls.sort_by(|a, b| b.calldate.cmp(&a.calldate));
        Ok(calls)
    }
}

#[derive(Default)]
struct InMemoryContacts {
    rows: Mutex<Vec<ContactRow>>,
}

#[async_trait]
impl ContactRepository for InMemoryContacts {
    async fn replace_batch(
        &self,
        ctx: &AuthContext,
        rows: &[ContactRow],
        policy: UploadPolicy,
    ) -> AppResult<usize> {
        ctx.require(callmatch_core::models::Permission::UploadContacts)?;
        let mut stored = self.rows.lock().unwrap();
        if policy.truncates_existing() {
            stored.clear();
        }
        for row in rows {
            let mut row = row.clone();
            row.id = Some(stored.len() as i64 + 1);
            stored.push(row);
        }
        Ok(rows.len())
    }

    async fn list(
        &self,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> AppResult<(Vec<ContactRow>, i64)> {
        let stored = self.rows.lock().unwrap();
        let matching: Vec<ContactRow> = stored
            .iter()
            .filter(|r| search.map_or(true, |s| r.company_name.contains(s)))
            .cloned()
            .collect();
        let total = matching.len() as i64;
        let page = matching
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect();
        Ok((page, total))
    }

    async fn find_all(&self) -> AppResult<Vec<ContactRow>> {
        Ok(self.rows.lock().unwrap().clone())
    }

    async fn save_reconciled(&self, rows: &[ContactRow]) -> AppResult<usize> {
        let mut stored = self.rows.lock().unwrap();
        let mut saved = 0;
        for row in rows {
            if let Some(slot) = stored.iter_mut().find(|s| s.id.is_some() && s.id == row.id) {
                *slot = row.clone();
                saved += 1;
            }
        }
        Ok(saved)
    }
}

fn call(src: &str, dst: &str, day: u32, disposition: &str, billsec: i32) -> CallEvent {
    CallEvent {
        calldate: NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap(),
        src: src.to_string(),
        dst: dst.to_string(),
        duration: billsec,
        billsec: Some(billsec),
        disposition: Disposition::parse(disposition),
        ..Default::default()
    }
}

fn scenario_calls() -> Vec<CallEvent> {
    vec![
        call("995555123456", "555987654", 10, "ANSWERED", 30),
        call("995555123456", "555987654", 11, "ANSWERED", 45),
        call("995555123456", "555987654", 12, "NO ANSWER", 0),
    ]
}

fn token(role: UserRole) -> String {
    JwtService::new(SECRET, 600)
        .create_token_for_user("tester", role)
        .unwrap()
}

macro_rules! app {
    ($store:expr, $contacts:expr) => {{
        let store: Arc<dyn CallRecordStore> = Arc::new($store);
        let engine: SharedEngine = ReconciliationEngine::new(store, PhoneNormalizer::default());
        let contacts: Arc<SharedContacts> = $contacts;
        test::init_service(
            App::new()
                .app_data(web::Data::new(Arc::new(JwtService::new(SECRET, 600))))
                .app_data(web::Data::new(engine))
                .app_data(web::Data::from(contacts))
                .service(web::scope("/api/v1").configure(configure)),
        )
        .await
    }};
}

fn log(calls: Vec<CallEvent>) -> InMemoryCallLog {
    InMemoryCallLog { calls, fail: false }
}

#[actix_web::test]
async fn test_health_is_public() {
    let app = app!(log(vec![]), Arc::new(InMemoryContacts::default()));

    let req = test::TestRequest::get().uri("/api/v1/health").to_request();
    let resp: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(resp["status"], "healthy");
}

#[actix_web::test]
async fn test_reconcile_requires_token() {
    let app = app!(log(vec![]), Arc::new(InMemoryContacts::default()));

    let req = test::TestRequest::post()
        .uri("/api/v1/reconcile")
        .set_json(json!({"rows": [{"callerNumber": "555123456"}]}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_reconcile_end_to_end() {
    let app = app!(log(scenario_calls()), Arc::new(InMemoryContacts::default()));

    let req = test::TestRequest::post()
        .uri("/api/v1/reconcile")
        .insert_header(("Authorization", format!("Bearer {}", token(UserRole::Operator))))
        .set_json(json!({
            "rows": [{"callerNumber": "555123456", "tel1": "995555987654", "contactPerson1": "Levan"}],
            "start_date": "2024-01-01",
            "end_date": "2024-01-31"
        }))
        .to_request();
    let resp: Value = test::call_and_read_body_json(&app, req).await;
    let row = &resp["data"]["rows"][0];

    assert_eq!(row["receiver_number"], "555987654");
    assert_eq!(row["receiverNumber"], "555987654");
    assert_eq!(row["call_count"], 3);
    assert_eq!(row["answeredCalls"], 2);
    assert_eq!(row["no_answer_calls"], 1);
    assert_eq!(row["busyCalls"], 0);
    assert_eq!(row["call_duration"], "00:01:15");
    assert_eq!(resp["data"]["summary"]["matched"], 1);
    assert_eq!(resp["data"]["start_date"], "2024-01-01");
}

#[actix_web::test]
async fn test_reconcile_forbidden_for_viewer() {
    let app = app!(log(scenario_calls()), Arc::new(InMemoryContacts::default()));

    let req = test::TestRequest::post()
        .uri("/api/v1/reconcile")
        .insert_header(("Authorization", format!("Bearer {}", token(UserRole::Viewer))))
        .set_json(json!({
            "rows": [{"callerNumber": "555123456"}],
            "start_date": "2024-01-01",
            "end_date": "2024-01-31"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn test_reconcile_without_window_is_bad_request() {
    let app = app!(log(scenario_calls()), Arc::new(InMemoryContacts::default()));

    let req = test::TestRequest::post()
        .uri("/api/v1/reconcile")
        .insert_header(("Authorization", format!("Bearer {}", token(UserRole::Operator))))
        .set_json(json!({"rows": [{"callerNumber": "555123456"}]}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_call_log_failure_is_bad_gateway() {
    let app = app!(
        InMemoryCallLog { calls: vec![], fail: true },
        Arc::new(InMemoryContacts::default())
    );

    let req = test::TestRequest::post()
        .uri("/api/v1/reconcile")
        .insert_header(("Authorization", format!("Bearer {}", token(UserRole::Operator))))
        .set_json(json!({
            "rows": [{"callerNumber": "555123456"}],
            "start_date": "2024-01-01",
            "end_date": "2024-01-31"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "call_store_unavailable");
}

#[actix_web::test]
async fn test_upload_then_reconcile_stored_batch() {
    let contacts = Arc::new(InMemoryContacts::default());
    let app = app!(log(scenario_calls()), contacts.clone());
    let auth = format!("Bearer {}", token(UserRole::Operator));

    let req = test::TestRequest::post()
        .uri("/api/v1/contacts/upload")
        .insert_header(("Authorization", auth.clone()))
        .set_json(json!({
            "rows": [
                {"company_name": "Acme", "caller_number": "555123456", "tel1": "555987654",
                 "call_date": "2024-01-01 - 2024-01-31"},
                {"company_name": "Globex", "caller_number": "577000000", "tel1": "555000111"}
            ]
        }))
        .to_request();
    let resp: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(resp["data"]["stored"], 2);
    assert_eq!(resp["data"]["policy"], "replace");

    let req = test::TestRequest::post()
        .uri("/api/v1/contacts/reconcile")
        .insert_header(("Authorization", auth.clone()))
        .set_json(json!({}))
        .to_request();
    let resp: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(resp["data"]["saved"], 2);
    assert_eq!(resp["data"]["summary"]["matched"], 1);
    assert_eq!(resp["data"]["summary"]["no_calls"], 1);

    let stored = contacts.rows.lock().unwrap().clone();
    assert_eq!(stored[0].call_count, Some(3));
    assert_eq!(stored[0].call_date.as_deref(), Some("2024-01-01 - 2024-01-31"));
    assert_eq!(stored[1].receiver_number.as_deref(), Some("N/A"));

    let req = test::TestRequest::get()
        .uri("/api/v1/contacts?page=1&per_page=1&search=Acme")
        .insert_header(("Authorization", auth))
        .to_request();
    let resp: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(resp["pagination"]["total"], 1);
    assert_eq!(resp["data"][0]["companyName"], "Acme");
}

#[actix_web::test]
async fn test_stored_batch_reconciled_over_two_windows() {
    let contacts = Arc::new(InMemoryContacts::default());
    let app = app!(log(scenario_calls()), contacts.clone());
    let auth = format!("Bearer {}", token(UserRole::Operator));

    let req = test::TestRequest::post()
        .uri("/api/v1/contacts/upload")
        .insert_header(("Authorization", auth.clone()))
        .set_json(json!({
            "rows": [{"company_name": "Acme", "caller_number": "555123456",
                      "tel1": "555987654", "contact_person1": "Levan"}]
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::post()
        .uri("/api/v1/contacts/reconcile")
        .insert_header(("Authorization", auth.clone()))
        .set_json(json!({"start_date": "2024-01-01", "end_date": "2024-01-31"}))
        .to_request();
    let resp: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(resp["data"]["summary"]["matched"], 1);
    {
        let stored = contacts.rows.lock().unwrap();
        assert_eq!(stored[0].call_date.as_deref(), Some("2024-01-12 12:00:00"));
        assert!(stored[0].call_date_backfilled);
        assert_eq!(stored[0].receiver_name.as_deref(), Some("Levan"));
    }

    let req = test::TestRequest::post()
        .uri("/api/v1/contacts/reconcile")
        .insert_header(("Authorization", auth))
        .set_json(json!({"start_date": "2024-02-01", "end_date": "2024-02-29"}))
        .to_request();
    let resp: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(resp["data"]["summary"]["no_calls"], 1);
    assert!(resp["data"]["rows"][0]["callDate"].is_null());

    let stored = contacts.rows.lock().unwrap();
    assert_eq!(stored[0].receiver_number.as_deref(), Some("N/A"));
    assert!(stored[0].receiver_name.is_none());
    assert_eq!(stored[0].call_count, Some(0));
    assert!(stored[0].call_date.is_none());
    assert!(!stored[0].call_date_backfilled);
}

#[actix_web::test]
async fn test_out_of_range_page_is_bad_request() {
    let app = app!(log(vec![]), Arc::new(InMemoryContacts::default()));

    let req = test::TestRequest::get()
        .uri("/api/v1/contacts?page=9223372036854775807&per_page=50")
        .insert_header(("Authorization", format!("Bearer {}", token(UserRole::Viewer))))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "validation_error");
}

#[actix_web::test]
async fn test_browse_call_log_by_any_number_form() {
    let app = app!(log(scenario_calls()), Arc::new(InMemoryContacts::default()));

    let req = test::TestRequest::get()
        .uri("/api/v1/cdrs?number=555-123-456&start_date=2024-01-01&end_date=2024-01-31&limit=2")
        .insert_header(("Authorization", format!("Bearer {}", token(UserRole::Viewer))))
        .to_request();
    let resp: Value = test::call_and_read_body_json(&app, req).await;

    let calls = resp["data"].as_array().unwrap();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0]["disposition"], "NO ANSWER");
    assert_eq!(calls[1]["talk_time"], "00:00:45");
}
