//! ImportClient against a local stub portal
//!
//! The stub answers from a scripted list of (status, body) pairs and counts
//! how many requests it saw.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::get,
    Router,
};
use clinic_common::retry::RetryPolicy;
use clinic_common::summary::DebriefRow;
use clinic_import::{ClientError, ImportClient};
use serde_json::json;

#[derive(Clone)]
struct Stub {
    script: Arc<Vec<(StatusCode, String)>>,
    hits: Arc<AtomicUsize>,
    keys: Arc<std::sync::Mutex<Vec<Option<String>>>>,
}

async fn respond(State(stub): State<Stub>, headers: HeaderMap) -> (StatusCode, String) {
    let n = stub.hits.fetch_add(1, Ordering::SeqCst);
    stub.keys.lock().unwrap().push(
        headers
            .get("x-api-key")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    );
    let index = n.min(stub.script.len() - 1);
    stub.script[index].clone()
}

/// Start a stub portal; returns its base URL and shared state
async fn start_stub(script: Vec<(StatusCode, String)>) -> (String, Stub) {
    let stub = Stub {
        script: Arc::new(script),
        hits: Arc::new(AtomicUsize::new(0)),
        keys: Arc::new(std::sync::Mutex::new(Vec::new())),
    };
    let app = Router::new()
        .route("/api/import-debriefs", get(respond).post(respond))
        .with_state(stub.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}", addr), stub)
}

fn fast_policy() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        base_delay_ms: 1,
        max_delay_ms: 5,
        jitter_ms: 0,
    }
}

fn rows() -> Vec<DebriefRow> {
    vec![DebriefRow {
        date: "12/1/2025".to_string(),
        clinic: "Consulting".to_string(),
        client: "Acme Bakery".to_string(),
        hours: 3.0,
        summary: "Pricing review".to_string(),
        student: "Sam".to_string(),
        questions: String::new(),
        action_items: String::new(),
    }]
}

fn import_ok() -> String {
    json!({
        "success": true,
        "results": {
            "totalRecords": 1,
            "inserted": 1,
            "duplicates": 0,
            "errors": [],
            "insertedRecords": [],
            "finalCount": 1
        },
        "message": "Imported 1 records, 0 duplicates skipped, 0 errors"
    })
    .to_string()
}

#[tokio::test]
async fn test_rate_limited_then_success() {
    let (url, stub) = start_stub(vec![
        (StatusCode::TOO_MANY_REQUESTS, "Too Many Requests".to_string()),
        (StatusCode::OK, import_ok()),
    ])
    .await;

    let client = ImportClient::new(&url, Some("s3cret".to_string()))
        .unwrap()
        .with_policy(fast_policy());
    let report = client.submit(&rows(), Some("Fall 2025")).await.unwrap();

    assert!(report.success);
    assert_eq!(report.results.inserted, 1);
    assert_eq!(stub.hits.load(Ordering::SeqCst), 2);
    assert!(stub
        .keys
        .lock()
        .unwrap()
        .iter()
        .all(|k| k.as_deref() == Some("s3cret")));
}

#[tokio::test]
async fn test_plain_text_throttle_page_is_retried() {
    let (url, stub) = start_stub(vec![
        (StatusCode::OK, "Too Many Requests".to_string()),
        (StatusCode::OK, import_ok()),
    ])
    .await;

    let client = ImportClient::new(&url, None).unwrap().with_policy(fast_policy());
    client.submit(&rows(), None).await.unwrap();

    assert_eq!(stub.hits.load(Ordering::SeqCst), 2);
    assert_eq!(stub.keys.lock().unwrap()[0], None);
}

#[tokio::test]
async fn test_client_error_not_retried() {
    let (url, stub) = start_stub(vec![(
        StatusCode::BAD_REQUEST,
        json!({ "error": "rows: missing field" }).to_string(),
    )])
    .await;

    let client = ImportClient::new(&url, None).unwrap().with_policy(fast_policy());
    let err = client.submit(&rows(), None).await.unwrap_err();

    assert!(matches!(err, ClientError::Api(400, _)));
    assert_eq!(stub.hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_retry_budget_exhausted() {
    let (url, stub) = start_stub(vec![(
        StatusCode::TOO_MANY_REQUESTS,
        json!({ "error": "Rate limited, please retry", "rateLimited": true }).to_string(),
    )])
    .await;

    let client = ImportClient::new(&url, None).unwrap().with_policy(fast_policy());
    let err = client.audit().await.unwrap_err();

    assert!(matches!(err, ClientError::RateLimited(_)));
    assert_eq!(stub.hits.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_audit_parses_counts() {
    let body = json!({
        "success": true,
        "totalRecords": 2,
        "records": [],
        "audit": {
            "uniqueClinics": ["Consulting"],
            "uniqueClients": ["Acme Bakery", "Birch Books"],
            "uniqueWeeks": ["2025-12-07"],
            "clinicCount": 1,
            "clientCount": 2,
            "weekCount": 1
        }
    });
    let (url, _stub) = start_stub(vec![(StatusCode::OK, body.to_string())]).await;

    let client = ImportClient::new(&url, None).unwrap().with_policy(fast_policy());
    let report = client.audit().await.unwrap();

    assert_eq!(report.total_records, 2);
    assert_eq!(report.audit.client_count, 2);
    assert_eq!(report.audit.unique_weeks, vec!["2025-12-07"]);
}
