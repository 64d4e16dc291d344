//! Integration tests for clinic-portal API endpoints
//!
//! Each test builds the full router over a private in-memory database and a
//! temporary uploads directory, then drives it with `oneshot` requests.
//!
//! Tests cover:
//! - Health endpoint and API-key middleware
//! - Debrief import, weekly summaries and debrief submission
//! - Stakeholder cards, profiles and student progress
//! - Semester schedule and weekly agenda editing
//! - Course material uploads
//! - Deliverable uploads, documents and evaluations
//! - Notifications and announcements
//! - Client portal: info, team, tasks, questions
//! - Agreements, scheduled meetings and prospects

use std::path::PathBuf;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use clinic_common::config::PortalConfig;
use clinic_common::db::init_memory_database;
use clinic_portal::{build_router, AppState};
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tempfile::TempDir;
use tower::util::ServiceExt; // for `oneshot` method

const SEMESTER: &str = "Fall 2025";

struct TestApp {
    router: Router,
    db: SqlitePool,
    uploads: PathBuf,
    _dir: TempDir,
}

impl TestApp {
    async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        let response = self.send(test_request("GET", uri)).await;
        let status = response.status();
        (status, extract_json(response.into_body()).await)
    }

    async fn send_json(&self, method: &str, uri: &str, body: Value) -> (StatusCode, Value) {
        let response = self.send(json_request(method, uri, body)).await;
        let status = response.status();
        (status, extract_json(response.into_body()).await)
    }
}

/// Test helper: app over a fresh database, optionally requiring an API key
async fn setup_app(service_key: Option<&str>) -> TestApp {
    let db = init_memory_database().await.expect("Should create database");
    let dir = tempfile::tempdir().expect("Should create temp dir");
    let uploads = dir.path().join("uploads");
    std::fs::create_dir_all(&uploads).unwrap();

    let config = PortalConfig {
        bind: "127.0.0.1:0".to_string(),
        database_path: dir.path().join("unused.db"),
        uploads_dir: uploads.clone(),
        service_key: service_key.map(str::to_string),
        default_semester: SEMESTER.to_string(),
    };
    let router = build_router(AppState::new(db.clone(), config));

    TestApp {
        router,
        db,
        uploads,
        _dir: dir,
    }
}

/// Test helper: request without a body
fn test_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Test helper: request with a JSON body
fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Test helper: Extract JSON body from response
async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

/// One clinic led by one director, two students on one client
async fn seed_people(db: &SqlitePool) {
    let statements = [
        "INSERT INTO clinics (id, name) VALUES ('cl-consult', 'Consulting')",
        "INSERT INTO directors (id, full_name, email, clinic, job_title)
         VALUES ('d1', 'Dana Director', 'dana@clinic.test', 'Consulting', 'Clinic Director')",
        "INSERT INTO clinic_directors (clinic_id, director_id) VALUES ('cl-consult', 'd1')",
        "INSERT INTO students (id, full_name, email, clinic_id, semester)
         VALUES ('s1', 'Sam Student', 'sam@school.test', 'cl-consult', 'Fall 2025')",
        "INSERT INTO students (id, full_name, email, clinic_id, is_team_leader, semester)
         VALUES ('s2', 'Riley Lead', 'riley@school.test', 'cl-consult', 1, 'Fall 2025')",
        "INSERT INTO clients (id, name, email, contact_name, clinic, auth_user_id, semester)
         VALUES ('c1', 'Acme Bakery', 'owner@acme.test', 'Pat Owner', 'Consulting', 'auth-1', 'Fall 2025')",
        "INSERT INTO client_assignments (id, client_id, student_id) VALUES ('a1', 'c1', 's1')",
        "INSERT INTO client_assignments (id, client_id, student_id) VALUES ('a2', 'c1', 's2')",
        "INSERT INTO client_directors (client_id, director_id, is_primary) VALUES ('c1', 'd1', 1)",
    ];
    for sql in statements {
        sqlx::query(sql).execute(db).await.expect("Should seed row");
    }
}

fn debrief_row(date: &str, clinic: &str, client: &str, hours: f64, student: &str) -> Value {
    json!({
        "date": date,
        "clinic": clinic,
        "client": client,
        "hours": hours,
        "summary": format!("Worked on {}", client),
        "student": student,
    })
}

// =============================================================================
// Health and authentication
// =============================================================================

#[tokio::test]
async fn test_health_endpoint_no_auth_required() {
    let app = setup_app(Some("s3cret")).await;

    let (status, body) = app.get("/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "clinic-portal");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_api_requires_key_when_configured() {
    let app = setup_app(Some("s3cret")).await;

    let (status, body) = app.get("/api/clinics").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());

    let wrong = Request::builder()
        .uri("/api/clinics")
        .header("x-api-key", "guess")
        .body(Body::empty())
        .unwrap();
    assert_eq!(app.send(wrong).await.status(), StatusCode::UNAUTHORIZED);

    let right = Request::builder()
        .uri("/api/clinics")
        .header("x-api-key", "s3cret")
        .body(Body::empty())
        .unwrap();
    assert_eq!(app.send(right).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_api_open_without_key() {
    let app = setup_app(None).await;
    let (status, body) = app.get("/api/clinics").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["clinics"], json!([]));
}

// =============================================================================
// Import and weekly summaries
// =============================================================================

#[tokio::test]
async fn test_import_counts_duplicates_on_rerun() {
    let app = setup_app(None).await;
    let payload = json!({
        "rows": [
            debrief_row("12/1/2025", "Consulting", "Acme Bakery", 3.0, "Sam"),
            debrief_row("12/2/2025", "Consulting", "Acme Bakery", 5.0, "Riley"),
            debrief_row("12/3/2025", "Funding", "Birch Books", 2.0, "Sam"),
            debrief_row("not a date", "Consulting", "Acme Bakery", 1.0, "Jo"),
        ]
    });

    let (status, first) = app.send_json("POST", "/api/import-debriefs", payload.clone()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["success"], true);
    assert_eq!(first["results"]["totalRecords"], 4);
    assert_eq!(first["results"]["inserted"], 2);
    assert_eq!(first["results"]["duplicates"], 0);
    assert_eq!(first["results"]["errors"].as_array().unwrap().len(), 1);
    assert_eq!(first["results"]["finalCount"], 2);

    let (_, second) = app.send_json("POST", "/api/import-debriefs", payload).await;
    assert_eq!(second["results"]["inserted"], 0);
    assert_eq!(second["results"]["duplicates"], 2);
    assert_eq!(second["results"]["finalCount"], 2);
    assert_eq!(
        second["message"],
        "Imported 0 records, 2 duplicates skipped, 1 errors"
    );

    let (status, week) = app.get("/api/weekly-summaries?week_ending=2025-12-07").await;
    assert_eq!(status, StatusCode::OK);
    let acme = &week["summaries"]["Acme Bakery"];
    assert_eq!(acme["total_hours"].as_f64(), Some(8.0));
    assert_eq!(acme["student_count"], 2);
    assert_eq!(acme["semester"], SEMESTER);
    assert_eq!(
        week["summaries"]["Birch Books"]["clinic"],
        "Resource Acquisition"
    );

    let (_, audit) = app.get("/api/import-debriefs").await;
    assert_eq!(audit["totalRecords"], 2);
    assert_eq!(audit["audit"]["uniqueWeeks"], json!(["2025-12-07"]));
    assert_eq!(audit["audit"]["clinicCount"], 2);
}

#[tokio::test]
async fn test_weekly_summaries_validation_and_upsert() {
    let app = setup_app(None).await;

    let (status, body) = app.get("/api/weekly-summaries").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "week_ending is required");

    let (status, body) = app
        .send_json("POST", "/api/weekly-summaries", json!({ "client_name": "Acme Bakery" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing required fields");

    let summary = |text: &str, hours: f64| {
        json!({
            "client_name": "Acme Bakery",
            "week_ending": "2025-12-07",
            "clinic": "Consulting",
            "summary": text,
            "total_hours": hours,
        })
    };
    let (status, first) = app
        .send_json("POST", "/api/weekly-summaries", summary("Draft", 4.0))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["success"], true);

    let (_, second) = app
        .send_json("POST", "/api/weekly-summaries", summary("Final", 6.5))
        .await;
    assert_eq!(second["data"]["summary"], "Final");
    assert_eq!(second["data"]["total_hours"].as_f64(), Some(6.5));

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM weekly_summaries")
        .fetch_one(&app.db)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = setup_app(None).await;
    let request = Request::builder()
        .method("POST")
        .uri("/api/weekly-summaries")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let response = app.send(request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response.into_body()).await;
    assert!(body["error"].is_string());
}

// =============================================================================
// Debriefs and student progress
// =============================================================================

#[tokio::test]
async fn test_submit_debrief_validation() {
    let app = setup_app(None).await;
    seed_people(&app.db).await;

    let (status, body) = app
        .send_json("POST", "/api/debriefs", json!({ "studentId": "s1", "hoursWorked": 2 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "debriefDate is required");

    let (status, body) = app
        .send_json(
            "POST",
            "/api/debriefs",
            json!({ "studentId": "s1", "clientId": "c1", "hoursWorked": 0, "debriefDate": "12/3/2025" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "hoursWorked must be positive");

    let (status, body) = app
        .send_json(
            "POST",
            "/api/debriefs",
            json!({ "studentId": "ghost", "clientId": "c1", "hoursWorked": 1, "debriefDate": "12/3/2025" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Student not found");
}

#[tokio::test]
async fn test_submit_debrief_fills_names_and_week() {
    let app = setup_app(None).await;
    seed_people(&app.db).await;

    let (status, body) = app
        .send_json(
            "POST",
            "/api/debriefs",
            json!({
                "studentId": "s1",
                "clientId": "c1",
                "hoursWorked": 2.5,
                "workSummary": "Cash-flow model",
                "debriefDate": "12/3/2025",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let debrief = &body["debrief"];
    assert_eq!(debrief["student_name"], "Sam Student");
    assert_eq!(debrief["client_name"], "Acme Bakery");
    assert_eq!(debrief["clinic"], "Consulting");
    assert_eq!(debrief["debrief_date"], "2025-12-03");
    assert_eq!(debrief["week_ending"], "2025-12-07");
    assert_eq!(debrief["semester"], SEMESTER);

    let (_, list) = app.get("/api/debriefs?studentId=s1").await;
    assert_eq!(list["debriefs"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_student_progress() {
    let app = setup_app(None).await;
    seed_people(&app.db).await;

    let (status, _) = app.get("/api/students/progress").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = app.get("/api/students/progress?studentId=ghost").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Two past weeks, one of them a break
    for (number, start, end, is_break) in [
        (1, "2025-09-01", "2025-09-07", false),
        (2, "2025-09-08", "2025-09-14", true),
    ] {
        let (status, _) = app
            .send_json(
                "POST",
                "/api/semester-schedule",
                json!({
                    "week_number": number,
                    "week_start": start,
                    "week_end": end,
                    "is_break": is_break,
                    "semester": SEMESTER,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
    }
    app.send_json(
        "POST",
        "/api/debriefs",
        json!({ "studentId": "s1", "clientId": "c1", "hoursWorked": 1, "debriefDate": "2025-09-03" }),
    )
    .await;

    let (status, body) = app.get("/api/students/progress?studentId=s1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["studentName"], "Sam Student");
    assert_eq!(body["semester"], SEMESTER);
    assert_eq!(body["totalClassWeeks"], 1);
    assert_eq!(body["elapsedClassWeeks"], 1);
    assert_eq!(body["debriefs"]["submitted"], 1);
    assert_eq!(body["debriefs"]["total"], 2);
    assert_eq!(body["debriefs"]["rate"], 50);
}

// =============================================================================
// Stakeholders and profiles
// =============================================================================

#[tokio::test]
async fn test_stakeholder_cards() {
    let app = setup_app(None).await;
    seed_people(&app.db).await;

    let (status, body) = app.get("/api/stakeholders/student/nobody").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Student not found");

    let (status, _) = app.get("/api/stakeholders/sponsor/x").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app.get("/api/stakeholders/client/c1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["name"], "Acme Bakery");
    assert_eq!(body["data"]["team_members"].as_array().unwrap().len(), 2);
    assert_eq!(body["data"]["directors"].as_array().unwrap().len(), 1);

    let (_, body) = app.get("/api/stakeholders/student/s1").await;
    assert_eq!(body["data"]["full_name"], "Sam Student");
    assert_eq!(body["data"]["clients"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_profile_read_and_update() {
    let app = setup_app(None).await;
    seed_people(&app.db).await;

    let (status, body) = app.get("/api/settings/profile?userId=s1").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing userId or userType");

    let (status, body) = app
        .get("/api/settings/profile?userId=d1&userType=director")
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["profile"]["clinic_name"], "Consulting");
    assert_eq!(body["profile"]["role"], "director");

    let (status, body) = app
        .send_json(
            "PUT",
            "/api/settings/profile",
            json!({ "userId": "s1", "userType": "student", "bio": "Finance minor" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["profile"]["bio"], "Finance minor");
    assert_eq!(body["profile"]["full_name"], "Sam Student");

    let (status, _) = app
        .send_json(
            "PUT",
            "/api/settings/profile",
            json!({ "userId": "ghost", "userType": "student", "bio": "x" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Semester schedule and agenda
// =============================================================================

async fn create_default_week(app: &TestApp) -> Value {
    let (status, body) = app
        .send_json(
            "POST",
            "/api/semester-schedule",
            json!({ "week_number": 1, "week_start": "2025-09-01", "week_end": "2025-09-07" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    body["schedule"].clone()
}

fn block_times(schedule: &Value) -> Vec<(String, String)> {
    schedule["activities"]
        .as_array()
        .unwrap()
        .iter()
        .map(|b| {
            (
                b["id"].as_str().unwrap().to_string(),
                b["time"].as_str().unwrap().to_string(),
            )
        })
        .collect()
}

#[tokio::test]
async fn test_create_week_defaults() {
    let app = setup_app(None).await;

    let (status, body) = app
        .send_json("POST", "/api/semester-schedule", json!({ "week_number": 1 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "week_start is required");

    let (status, _) = app
        .send_json(
            "POST",
            "/api/semester-schedule",
            json!({ "week_number": 1, "week_start": "2025-09-07", "week_end": "2025-09-01" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let week = create_default_week(&app).await;
    assert_eq!(week["week_label"], "Week 1");
    assert_eq!(week["class_time_minutes"], 90);
    assert_eq!(week["activities"].as_array().unwrap().len(), 4);

    let (status, list) = app.get("/api/semester-schedule?semester=Fall%202025").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["schedules"].as_array().unwrap().len(), 1);
    assert_eq!(list["metadata"]["totalWeeks"], 1);
    assert_eq!(list["metadata"]["totalClassWeeks"], 1);

    let (_, other) = app.get("/api/semester-schedule?semester=Spring%201999").await;
    assert_eq!(other["schedules"], json!([]));
}

#[tokio::test]
async fn test_update_and_delete_week() {
    let app = setup_app(None).await;
    let week = create_default_week(&app).await;
    let id = week["id"].as_str().unwrap();

    let (status, body) = app
        .send_json(
            "PATCH",
            "/api/semester-schedule",
            json!({ "id": id, "session_focus": "Kickoff", "is_break": true }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["schedule"]["session_focus"], "Kickoff");
    assert_eq!(body["schedule"]["is_break"], true);

    let (status, _) = app
        .send_json("PATCH", "/api/semester-schedule", json!({ "id": "missing", "notes": "x" }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app
        .send_json("DELETE", &format!("/api/semester-schedule?id={}", id), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (status, _) = app
        .send_json("DELETE", &format!("/api/semester-schedule?id={}", id), json!({}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_duration_change_cascades_to_later_blocks() {
    let app = setup_app(None).await;
    let week = create_default_week(&app).await;

    let (status, body) = app
        .send_json(
            "PATCH",
            "/api/semester-schedule/blocks/duration",
            json!({ "weekId": week["id"], "blockId": "2", "duration": 60 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        block_times(&body["schedule"]),
        vec![
            ("1".to_string(), "5:00 PM".to_string()),
            ("2".to_string(), "5:15 PM".to_string()),
            ("3".to_string(), "6:15 PM".to_string()),
            ("4".to_string(), "7:45 PM".to_string()),
        ]
    );
    assert_eq!(body["conflicts"], json!([]));

    let (status, _) = app
        .send_json(
            "PATCH",
            "/api/semester-schedule/blocks/duration",
            json!({ "weekId": week["id"], "blockId": "2", "duration": 0 }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_added_block_reports_conflicts() {
    let app = setup_app(None).await;
    let week = create_default_week(&app).await;

    let (status, body) = app
        .send_json(
            "POST",
            "/api/semester-schedule/blocks",
            json!({
                "weekId": week["id"],
                "id": "guest",
                "time": "5:05 PM",
                "activity": "Guest Speaker",
                "duration": 20,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["schedule"]["activities"].as_array().unwrap().len(), 5);
    assert_eq!(body["schedule"]["activities"][1]["id"], "guest");

    let conflicts = body["conflicts"].as_array().unwrap();
    assert_eq!(conflicts.len(), 2);
    assert!(conflicts
        .iter()
        .all(|c| c["first"] == "guest" || c["second"] == "guest"));
}

#[tokio::test]
async fn test_removing_last_session_removes_block() {
    let app = setup_app(None).await;
    let week = create_default_week(&app).await;
    let week_id = week["id"].as_str().unwrap();

    let response = app
        .send(test_request(
            "DELETE",
            &format!("/api/semester-schedule/blocks/session?weekId={}&blockId=2&sessionId=2-1", week_id),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["schedule"]["activities"][1]["sessions"].as_array().unwrap().len(), 3);

    let response = app
        .send(test_request(
            "DELETE",
            &format!("/api/semester-schedule/blocks/session?weekId={}&blockId=1&sessionId=1-1", week_id),
        ))
        .await;
    let body = extract_json(response.into_body()).await;
    let ids: Vec<&str> = body["schedule"]["activities"]
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["2", "3", "4"]);

    let response = app
        .send(test_request(
            "DELETE",
            &format!("/api/semester-schedule/blocks/session?weekId={}&blockId=1&sessionId=1-1", week_id),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_block_durations_bounded_to_one_day() {
    let app = setup_app(None).await;
    let week = create_default_week(&app).await;

    let (status, _) = app
        .send_json(
            "POST",
            "/api/semester-schedule/blocks",
            json!({
                "weekId": week["id"],
                "time": "11:00 PM",
                "activity": "Overnight",
                "duration": 4294967295u64,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send_json(
            "PATCH",
            "/api/semester-schedule/blocks/duration",
            json!({ "weekId": week["id"], "blockId": "2", "duration": 1441 }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, list) = app.get("/api/semester-schedule?semester=Fall%202025").await;
    assert_eq!(list["schedules"][0]["activities"].as_array().unwrap().len(), 4);
    assert_eq!(list["schedules"][0]["activities"][1]["duration"], 45);
}

#[tokio::test]
async fn test_patch_week_validates_blocks() {
    let app = setup_app(None).await;
    let week = create_default_week(&app).await;
    let id = week["id"].as_str().unwrap();

    let (status, _) = app
        .send_json(
            "PATCH",
            "/api/semester-schedule",
            json!({
                "id": id,
                "activities": [{ "id": "1", "time": "TBD", "activity": "All Hands", "duration": 15 }],
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send_json(
            "PATCH",
            "/api/semester-schedule",
            json!({
                "id": id,
                "activities": [{ "id": "1", "time": "5:00 PM", "activity": "All Hands", "duration": 0 }],
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // The stored agenda is untouched, so block routes keep working
    let (status, body) = app
        .send_json(
            "PATCH",
            "/api/semester-schedule/blocks/duration",
            json!({ "weekId": id, "blockId": "1", "duration": 30 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["schedule"]["activities"][1]["time"], "5:30 PM");

    let (status, body) = app
        .send_json(
            "PATCH",
            "/api/semester-schedule",
            json!({
                "id": id,
                "activities": [
                    { "id": "b", "time": "6:00 PM", "activity": "Work", "duration": 60 },
                    { "id": "a", "time": "17:00", "activity": "Opening", "duration": 30 },
                ],
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["schedule"]["activities"][0]["id"], "a");
}

// =============================================================================
// Course materials
// =============================================================================

const BOUNDARY: &str = "clinic-test-boundary";

fn multipart_request(fields: &[(&str, &str)], file: Option<(&str, &str)>) -> Request<Body> {
    multipart_to("/api/course-materials", fields, file)
}

fn multipart_to(uri: &str, fields: &[(&str, &str)], file: Option<(&str, &str)>) -> Request<Body> {
    let mut body = String::new();
    for (name, value) in fields {
        body.push_str(&format!(
            "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
            BOUNDARY, name, value
        ));
    }
    if let Some((file_name, content)) = file {
        body.push_str(&format!(
            "--{}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\nContent-Type: text/plain\r\n\r\n{}\r\n",
            BOUNDARY, file_name, content
        ));
    }
    body.push_str(&format!("--{}--\r\n", BOUNDARY));

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn test_material_upload_list_delete() {
    let app = setup_app(None).await;

    let response = app
        .send(multipart_request(&[("title", "Syllabus")], None))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"], "No file provided");

    let response = app
        .send(multipart_request(&[], Some(("notes.txt", "hello"))))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .send(multipart_request(
            &[("title", "Syllabus"), ("targetClinic", "Consulting")],
            Some(("week 1 notes.txt", "hello clinic")),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let material = extract_json(response.into_body()).await["material"].clone();
    assert_eq!(material["category"], "resource");
    assert_eq!(material["target_clinic"], "Consulting");
    assert_eq!(material["file_size"], 12);

    let file_url = material["file_url"].as_str().unwrap().to_string();
    assert!(file_url.starts_with("/files/course-materials/"));
    assert!(file_url.ends_with("-week_1_notes.txt"));
    let stored = app
        .uploads
        .join(file_url.trim_start_matches("/files/"));
    assert_eq!(std::fs::read_to_string(&stored).unwrap(), "hello clinic");

    // Served publicly
    let response = app.send(test_request("GET", &file_url)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"hello clinic");

    let (_, list) = app.get("/api/course-materials").await;
    assert_eq!(list["materials"].as_array().unwrap().len(), 1);

    let (status, body) = app
        .send_json("DELETE", "/api/course-materials", json!({ "id": material["id"] }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert!(!stored.exists());

    let (status, body) = app
        .send_json("DELETE", "/api/course-materials", json!({ "id": material["id"] }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Material not found");
}

// =============================================================================
// Deliverables and evaluations
// =============================================================================

#[tokio::test]
async fn test_deliverable_upload_carries_assignment() {
    let app = setup_app(None).await;
    seed_people(&app.db).await;

    let response = app
        .send(multipart_to(
            "/api/upload-deliverable",
            &[("studentId", "s1"), ("clientId", "c1")],
            Some(("plan.txt", "draft")),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"], "Missing required fields");

    let response = app
        .send(multipart_to(
            "/api/upload-deliverable",
            &[("studentId", "s1"), ("clientId", "ghost"), ("submissionType", "final")],
            Some(("plan.txt", "draft")),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(!app.uploads.join("deliverables").exists());

    let response = app
        .send(multipart_to(
            "/api/upload-deliverable",
            &[
                ("studentId", "s1"),
                ("studentName", "Sam Student"),
                ("clientId", "c1"),
                ("clientName", "Acme Bakery"),
                ("submissionType", "midterm"),
            ],
            Some(("Growth Plan.txt", "draft plan")),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["fileName"], "Growth Plan.txt");
    assert_eq!(body["fileSize"], 10);
    assert_eq!(body["clinic"], "Consulting");
    assert_eq!(body["clinicDirectorId"], "d1");
    assert_eq!(body["clientDirectorId"], "d1");

    let url = body["url"].as_str().unwrap().to_string();
    assert!(url.starts_with("/files/deliverables/c1/midterm/"));
    assert!(url.ends_with("_Growth_Plan.txt"));
    let stored = app.uploads.join(url.trim_start_matches("/files/"));
    assert_eq!(std::fs::read_to_string(&stored).unwrap(), "draft plan");

    let (_, list) = app.get("/api/documents?client=Acme%20Bakery").await;
    let documents = list["documents"].as_array().unwrap();
    assert_eq!(documents.len(), 1);
    assert_eq!(documents[0]["id"], body["documentId"]);
    assert_eq!(documents[0]["submission_type"], "midterm");
    assert_eq!(documents[0]["clinic_id"], "cl-consult");

    let (_, list) = app.get("/api/documents?client=Birch%20Books").await;
    assert!(list["documents"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_documents_create_patch_delete() {
    let app = setup_app(None).await;

    let (status, body) = app
        .send_json("POST", "/api/documents", json!({ "studentName": "Sam Student" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing required fields");

    let (status, body) = app
        .send_json(
            "POST",
            "/api/documents",
            json!({
                "studentName": "Sam Student",
                "clientName": "Acme Bakery",
                "fileUrl": "https://drive.example.com/plan",
                "fileName": "plan.pdf",
                "clinic": "Consulting"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let id = body["document"]["id"].as_str().unwrap().to_string();

    let (status, body) = app
        .send_json(
            "PATCH",
            &format!("/api/documents/{}", id),
            json!({ "fileName": "final-plan.pdf", "submissionType": "final" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["file_name"], "final-plan.pdf");
    assert_eq!(body["data"]["submission_type"], "final");

    let (status, body) = app
        .send_json("PATCH", "/api/documents/nope", json!({ "fileName": "x.pdf" }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Document not found");

    let (_, list) = app.get("/api/documents?client=all").await;
    assert_eq!(list["documents"].as_array().unwrap().len(), 1);

    let (status, body) = app
        .send_json("DELETE", &format!("/api/documents/{}", id), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (status, _) = app
        .send_json("DELETE", &format!("/api/documents/{}", id), json!({}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_evaluations_one_per_director() {
    let app = setup_app(None).await;

    let (_, body) = app
        .send_json(
            "POST",
            "/api/documents",
            json!({
                "studentName": "Sam Student",
                "clientName": "Acme Bakery",
                "fileUrl": "https://drive.example.com/plan",
                "fileName": "plan.pdf"
            }),
        )
        .await;
    let document_id = body["document"]["id"].as_str().unwrap().to_string();

    let (status, body) = app.get("/api/evaluations").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Document ID is required");

    let (status, body) = app
        .send_json(
            "POST",
            "/api/evaluations",
            json!({ "documentId": document_id, "directorName": "Dana", "question1Rating": 6 }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Ratings must be between 1 and 5");

    let (status, body) = app
        .send_json("POST", "/api/evaluations", json!({ "documentId": document_id }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Document ID and director name are required");

    let (status, _) = app
        .send_json(
            "POST",
            "/api/evaluations",
            json!({ "documentId": "missing", "directorName": "Dana", "question1Rating": 3 }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app
        .send_json(
            "POST",
            "/api/evaluations",
            json!({
                "documentId": document_id,
                "directorName": "Dana",
                "question1Rating": 3,
                "question1Notes": "Needs numbers"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["evaluation"]["question_1_rating"], 3);

    let (status, body) = app
        .send_json(
            "POST",
            "/api/evaluations",
            json!({ "documentId": document_id, "directorName": "Dana", "question1Rating": 5 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["evaluation"]["question_1_rating"], 5);
    assert_eq!(body["evaluation"]["question_1_notes"], Value::Null);

    let (_, body) = app
        .send_json(
            "POST",
            "/api/evaluations",
            json!({ "documentId": document_id, "directorName": "Lee", "question2Rating": 4 }),
        )
        .await;
    assert_eq!(body["evaluation"]["director_name"], "Lee");

    let (status, list) = app
        .get(&format!("/api/evaluations?documentId={}", document_id))
        .await;
    assert_eq!(status, StatusCode::OK);
    let evaluations = list["evaluations"].as_array().unwrap();
    assert_eq!(evaluations.len(), 2);
    let dana: Vec<&Value> = evaluations
        .iter()
        .filter(|e| e["director_name"] == "Dana")
        .collect();
    assert_eq!(dana.len(), 1);
    assert_eq!(dana[0]["question_1_rating"], 5);
}

// =============================================================================
// Notifications and announcements
// =============================================================================

#[tokio::test]
async fn test_notifications_feed_and_read_flag() {
    let app = setup_app(None).await;

    for (id, clinic) in [("n1", "Consulting"), ("n2", "Legal")] {
        sqlx::query(
            "INSERT INTO notifications (id, type, title, message, clinic, created_at)
             VALUES (?, 'debrief', 'New debrief', 'A debrief arrived', ?, '2025-10-01T12:00:00Z')",
        )
        .bind(id)
        .bind(clinic)
        .execute(&app.db)
        .await
        .unwrap();
    }

    let (_, body) = app.get("/api/notifications?clinic=all").await;
    assert_eq!(body["notifications"].as_array().unwrap().len(), 2);

    let (_, body) = app.get("/api/notifications?clinic=Consulting").await;
    let feed = body["notifications"].as_array().unwrap();
    assert_eq!(feed.len(), 1);
    assert_eq!(feed[0]["id"], "n1");
    assert_eq!(feed[0]["type"], "debrief");
    assert_eq!(feed[0]["is_read"], false);

    let (status, body) = app
        .send_json("PATCH", "/api/notifications/n1", json!({ "is_read": true }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (_, body) = app.get("/api/notifications?clinic=Consulting").await;
    assert_eq!(body["notifications"][0]["is_read"], true);

    let (status, _) = app
        .send_json("PATCH", "/api/notifications/n1", json!({}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send_json("PATCH", "/api/notifications/nope", json!({ "is_read": true }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_student_notifications_targeting() {
    let app = setup_app(None).await;
    seed_people(&app.db).await;

    let (status, _) = app
        .send_json("POST", "/api/student-notifications", json!({ "title": "Hi" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let posts = [
        json!({ "studentId": "s1", "title": "For Sam", "message": "Check your draft" }),
        json!({ "studentId": "s2", "clinicId": "cl-other", "title": "For Riley", "message": "Elsewhere" }),
        json!({ "clinicId": "cl-consult", "title": "Clinic note", "message": "Room 204", "type": "reminder" }),
    ];
    for post in posts {
        let (status, body) = app
            .send_json("POST", "/api/student-notifications", post)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["notification"]["target_audience"], "students");
    }

    let (_, body) = app
        .get("/api/student-notifications?studentId=s1&clinicId=cl-consult")
        .await;
    let mut titles: Vec<String> = body["notifications"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["title"].as_str().unwrap().to_string())
        .collect();
    titles.sort();
    assert_eq!(titles, vec!["Clinic note", "For Sam"]);

    let (_, body) = app.get("/api/student-notifications?clinicId=cl-other").await;
    let mut titles: Vec<&str> = body["notifications"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["title"].as_str().unwrap())
        .collect();
    titles.sort();
    // Rows without a clinic reach every clinic
    assert_eq!(titles, vec!["For Riley", "For Sam"]);
}

#[tokio::test]
async fn test_announcements_priority() {
    let app = setup_app(None).await;
    seed_people(&app.db).await;

    let (status, body) = app
        .send_json("POST", "/api/announcements", json!({ "title": "No body" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Title and content are required");

    let (status, body) = app
        .send_json(
            "POST",
            "/api/announcements",
            json!({
                "title": "Deadline moved",
                "content": "Finals are due Friday",
                "clinicId": "cl-consult",
                "priority": "high"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["announcement"]["title"], "Deadline moved");
    assert_eq!(body["announcement"]["priority"], "high");
    assert_eq!(body["announcement"]["clinicName"], "Consulting");
    assert_eq!(body["announcement"]["postedBy"], "Program Director");

    app.send_json(
        "POST",
        "/api/announcements",
        json!({ "title": "Pizza Friday", "content": "Lobby at noon", "postedBy": "Dana" }),
    )
    .await;

    let (_, body) = app.get("/api/announcements").await;
    let announcements = body["announcements"].as_array().unwrap();
    assert_eq!(announcements.len(), 2);
    let important = announcements
        .iter()
        .find(|a| a["priority"] == "high")
        .unwrap();
    assert_eq!(important["title"], "[Important] Deadline moved");
    assert_eq!(important["content"], "Finals are due Friday");
    assert_eq!(important["clinicName"], "Consulting");
    let casual = announcements
        .iter()
        .find(|a| a["priority"] == "normal")
        .unwrap();
    assert_eq!(casual["postedBy"], "Dana");
    assert_eq!(casual["clinicName"], Value::Null);
}

// =============================================================================
// Client portal
// =============================================================================

#[tokio::test]
async fn test_client_info_lookup() {
    let app = setup_app(None).await;
    seed_people(&app.db).await;

    let (status, body) = app.get("/api/client-portal/info").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "authUserId, clientId, or email required");

    let (status, _) = app.get("/api/client-portal/info?clientId=nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app.get("/api/client-portal/info?authUserId=auth-1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], "c1");
    assert_eq!(body["team_size"], 2);
    assert_eq!(body["primary_contact"], "Pat Owner");
    assert_eq!(body["phone"], "");

    let (_, body) = app.get("/api/client-portal/info?email=owner@acme.test").await;
    assert_eq!(body["name"], "Acme Bakery");
}

#[tokio::test]
async fn test_client_team() {
    let app = setup_app(None).await;
    seed_people(&app.db).await;

    let (status, body) = app.get("/api/client-portal/team?clientId=nope").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert_eq!(body["teamMembers"], json!([]));

    let (_, body) = app.get("/api/client-portal/team?clientId=c1").await;
    assert_eq!(body["success"], true);
    assert_eq!(body["client"]["name"], "Acme Bakery");

    let members = body["teamMembers"].as_array().unwrap();
    assert_eq!(members.len(), 2);
    let lead = members.iter().find(|m| m["id"] == "s2").unwrap();
    assert_eq!(lead["isTeamLeader"], true);
    assert_eq!(lead["clinic"], "Consulting");

    // The same director leads the clinic and the client: listed once
    assert_eq!(body["directors"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_weekly_progress_rollup() {
    let app = setup_app(None).await;
    seed_people(&app.db).await;

    let (status, body) = app.get("/api/client-portal/weekly-progress").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Client name or ID required");

    for (student, hours, date) in [("s1", 2.0, "12/1/2025"), ("s2", 3.0, "12/2/2025"), ("s1", 1.5, "12/9/2025")] {
        let (status, _) = app
            .send_json(
                "POST",
                "/api/debriefs",
                json!({ "studentId": student, "clientId": "c1", "hoursWorked": hours, "debriefDate": date }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = app.get("/api/client-portal/weekly-progress?clientId=c1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalHours"].as_f64(), Some(6.5));
    assert_eq!(body["uniqueStudents"], 2);
    assert_eq!(body["weeklyProgress"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_task_status_change_leaves_comment() {
    let app = setup_app(None).await;

    let (status, body) = app
        .send_json("POST", "/api/client-portal/tasks", json!({ "clientId": "c1", "title": "Send P&L" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing required fields");

    let (status, body) = app
        .send_json(
            "POST",
            "/api/client-portal/tasks",
            json!({ "clientId": "c1", "title": "Send P&L", "createdBy": "Dana" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let task_id = body["task"]["id"].as_str().unwrap().to_string();
    assert_eq!(body["task"]["priority"], "medium");
    assert_eq!(body["task"]["status"], "pending");

    let (status, body) = app
        .send_json(
            "PATCH",
            "/api/client-portal/tasks",
            json!({ "taskId": task_id, "status": "in_progress", "updatedBy": "Pat Owner" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["task"]["status"], "in_progress");

    let (status, _) = app
        .send_json("PATCH", "/api/client-portal/tasks", json!({ "taskId": "nope", "status": "done" }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = app
        .send_json(
            "POST",
            "/api/client-portal/tasks/comments",
            json!({
                "taskId": task_id,
                "commentText": "Uploaded last quarter",
                "authorName": "Pat Owner",
                "authorEmail": "owner@acme.test",
            }),
        )
        .await;
    assert_eq!(body["comment"]["client_id"], "c1");

    let (_, body) = app.get("/api/client-portal/tasks?clientId=c1").await;
    let comments = body["tasks"][0]["comments"].as_array().unwrap();
    assert_eq!(comments.len(), 2);
    assert!(comments
        .iter()
        .any(|c| c["comment_text"] == "Status changed to \"in_progress\" by Pat Owner"
            && c["author_type"] == "system"));
}

#[tokio::test]
async fn test_question_answer_flow() {
    let app = setup_app(None).await;

    let (status, body) = app.get("/api/client-portal/questions").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Client ID required");

    let (status, body) = app
        .send_json(
            "POST",
            "/api/client-portal/questions",
            json!({
                "clientId": "c1",
                "question": "When is the final presentation?",
                "askedBy": "Pat Owner",
                "askedByEmail": "owner@acme.test",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["question"]["category"], "general");
    assert_eq!(body["question"]["status"], "pending");
    let question_id = body["question"]["id"].clone();

    let (status, body) = app
        .send_json(
            "PATCH",
            "/api/client-portal/questions",
            json!({ "questionId": question_id, "answer": "Week 14", "answeredBy": "Dana" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["question"]["status"], "answered");
    assert_eq!(body["question"]["answer"], "Week 14");
    assert!(body["question"]["answered_at"].is_string());

    let (status, _) = app
        .send_json("PATCH", "/api/client-portal/questions", json!({ "answer": "x" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = app.get("/api/client-portal/questions?clientId=c1").await;
    assert_eq!(body["questions"].as_array().unwrap().len(), 1);
}

// =============================================================================
// Agreements, meetings and prospects
// =============================================================================

#[tokio::test]
async fn test_agreement_signing_upserts() {
    let app = setup_app(None).await;

    let (status, body) = app
        .send_json("POST", "/api/agreements", json!({ "agreementType": "nda", "userEmail": "sam@school.test" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "signature is required");

    for signature in ["Sam S", "Sam Student"] {
        let (status, body) = app
            .send_json(
                "POST",
                "/api/agreements",
                json!({
                    "agreementType": "nda",
                    "userEmail": "sam@school.test",
                    "userType": "student",
                    "signature": signature,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["agreement"]["signature"], signature);
    }
    app.send_json(
        "POST",
        "/api/agreements",
        json!({ "agreementType": "nda", "userEmail": "owner@acme.test", "userType": "client", "signature": "Pat" }),
    )
    .await;

    let (_, body) = app.get("/api/agreements?userEmail=sam@school.test").await;
    let agreements = body["agreements"].as_array().unwrap();
    assert_eq!(agreements.len(), 1);
    assert_eq!(agreements[0]["signature"], "Sam Student");

    let (_, body) = app.get("/api/agreements?userType=client").await;
    assert_eq!(body["agreements"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_meeting_overlap_reported() {
    let app = setup_app(None).await;
    let meeting = |client: &str, start: &str, room: &str| {
        json!({
            "semester_id": "sem-1",
            "week_number": 3,
            "client_name": client,
            "start_time": start,
            "minutes": 30,
            "room_assignment": room,
        })
    };

    let (status, body) = app
        .send_json("POST", "/api/scheduled-client-meetings", meeting("Acme Bakery", "6:00 PM", "201"))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["conflicts"], json!([]));

    let (status, body) = app
        .send_json("POST", "/api/scheduled-client-meetings", meeting("Birch Books", "6:15 PM", "201"))
        .await;
    assert_eq!(status, StatusCode::OK);
    let conflicts = body["conflicts"].as_array().unwrap();
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0]["clientName"], "Acme Bakery");
    assert_eq!(conflicts[0]["shared"], "room");

    let (_, body) = app
        .send_json("POST", "/api/scheduled-client-meetings", meeting("Cedar Farm", "6:30 PM", "305"))
        .await;
    assert_eq!(body["conflicts"], json!([]));

    let (status, _) = app
        .send_json("POST", "/api/scheduled-client-meetings", meeting("Bad Time", "25:00", "201"))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = app.get("/api/scheduled-client-meetings?weekNumber=3").await;
    assert_eq!(body["meetings"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_meeting_minutes_bounded_to_one_day() {
    let app = setup_app(None).await;
    let meeting = |client: &str, minutes: Value| {
        json!({
            "week_number": 3,
            "client_name": client,
            "start_time": "6:00 PM",
            "minutes": minutes,
            "room_assignment": "201",
        })
    };

    let (status, _) = app
        .send_json("POST", "/api/scheduled-client-meetings", meeting("Acme Bakery", json!(30)))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .send_json(
            "POST",
            "/api/scheduled-client-meetings",
            meeting("Birch Books", json!(4294967295u64)),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("minutes"));

    let (status, body) = app
        .send_json("POST", "/api/scheduled-client-meetings", meeting("Cedar Farm", json!(1440)))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["conflicts"].as_array().unwrap().len(), 1);

    let (_, body) = app.get("/api/scheduled-client-meetings?weekNumber=3").await;
    assert_eq!(body["meetings"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_prospect_filters_and_interviews() {
    let app = setup_app(None).await;

    let prospects = [
        json!({ "name": "Birch Books", "clinic_of_interest": "Consulting", "interviewer_id": "d1" }),
        json!({ "name": "Acme Bakery", "suggested_clinic": "Marketing", "director_in_charge_id": "d1" }),
        json!({ "name": "Cedar Farm", "clinic_of_interest": "consulting", "acceptance_status": "accepted" }),
    ];
    let mut ids = Vec::new();
    for prospect in prospects {
        let (status, body) = app.send_json("POST", "/api/prospects", prospect).await;
        assert_eq!(status, StatusCode::OK);
        ids.push(body["data"]["id"].as_str().unwrap().to_string());
    }

    let names = |body: &Value| -> Vec<String> {
        body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["name"].as_str().unwrap().to_string())
            .collect()
    };

    let (_, body) = app.get("/api/prospects").await;
    assert_eq!(names(&body), vec!["Acme Bakery", "Birch Books", "Cedar Farm"]);

    let (_, body) = app.get("/api/prospects?clinic=CONSULT").await;
    assert_eq!(names(&body), vec!["Birch Books", "Cedar Farm"]);

    let (_, body) = app.get("/api/prospects?directorId=d1").await;
    assert_eq!(names(&body), vec!["Acme Bakery", "Birch Books"]);

    let (_, body) = app.get("/api/prospects?status=pending").await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let (status, body) = app
        .send_json("PATCH", "/api/prospects", json!({ "id": ids[0], "acceptance_status": "declined" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["acceptance_status"], "declined");

    let (status, _) = app
        .send_json("POST", "/api/prospect-interviews", json!({ "prospect_id": "ghost" }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    for date in [Some("2025-10-01"), None, Some("2025-10-08")] {
        let (status, body) = app
            .send_json(
                "POST",
                "/api/prospect-interviews",
                json!({ "prospect_id": ids[0], "interviewer_id": "d1", "interview_date": date }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["interview_status"], "scheduled");
    }

    let (_, body) = app
        .get(&format!("/api/prospect-interviews?prospectId={}", ids[0]))
        .await;
    let dates: Vec<Value> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["interview_date"].clone())
        .collect();
    assert_eq!(dates, vec![json!("2025-10-08"), json!("2025-10-01"), Value::Null]);
}
