//! clinic-portal library - data-access service for the clinic program portal
//!
//! Students, clients and directors reach their dashboards, debriefs,
//! schedules, documents and onboarding records through the JSON routes
//! built here.

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::Router;
use clinic_common::config::PortalConfig;
use sqlx::SqlitePool;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod db;
pub mod error;

pub use error::{ApiError, ApiResult};

/// URL prefix uploaded files are served under
pub const FILES_PREFIX: &str = "/files";

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Resolved service configuration
    pub config: Arc<PortalConfig>,
}

impl AppState {
    /// Create new application state
    pub fn new(db: SqlitePool, config: PortalConfig) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }
}

/// Build application router
///
/// `/api/*` sits behind the API-key check; `/health` and the uploaded
/// files are public.
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::{delete, get, patch, post};

    let protected = Router::new()
        // Debriefs and weekly summaries
        .route(
            "/api/import-debriefs",
            get(api::import::audit_summaries).post(api::import::import_debriefs),
        )
        .route(
            "/api/weekly-summaries",
            get(api::summaries::get_summaries).post(api::summaries::upsert_summary),
        )
        .route(
            "/api/debriefs",
            get(api::debriefs::list_debriefs).post(api::debriefs::submit_debrief),
        )
        .route("/api/students/progress", get(api::directory::student_progress))
        // Profiles and directory
        .route(
            "/api/settings/profile",
            get(api::profile::get_profile).put(api::profile::update_profile),
        )
        .route("/api/clinics", get(api::directory::list_clinics))
        .route("/api/directors", get(api::directory::list_directors))
        .route("/api/stakeholders/:kind/:id", get(api::stakeholders::get_stakeholder))
        // Semester schedule and weekly agenda
        .route(
            "/api/semester-schedule",
            get(api::schedule::get_schedule)
                .post(api::schedule::create_week)
                .patch(api::schedule::update_week)
                .delete(api::schedule::delete_week),
        )
        .route("/api/semester-schedule/blocks", post(api::schedule::add_time_block))
        .route(
            "/api/semester-schedule/blocks/duration",
            patch(api::schedule::change_block_duration),
        )
        .route(
            "/api/semester-schedule/blocks/session",
            delete(api::schedule::remove_block_session),
        )
        .route(
            "/api/scheduled-client-meetings",
            get(api::meetings::list_meetings)
                .post(api::meetings::create_meeting)
                .patch(api::meetings::update_meeting)
                .delete(api::meetings::delete_meeting),
        )
        // Course materials
        .route(
            "/api/course-materials",
            get(api::materials::list_materials)
                .post(api::materials::upload_material)
                .delete(api::materials::delete_material)
                .layer(DefaultBodyLimit::max(api::materials::MAX_UPLOAD_BYTES)),
        )
        // Deliverables and evaluations
        .route(
            "/api/upload-deliverable",
            post(api::deliverables::upload_deliverable)
                .layer(DefaultBodyLimit::max(api::materials::MAX_UPLOAD_BYTES)),
        )
        .route(
            "/api/documents",
            get(api::deliverables::list_documents).post(api::deliverables::create_document),
        )
        .route(
            "/api/documents/:id",
            patch(api::deliverables::update_document).delete(api::deliverables::delete_document),
        )
        .route(
            "/api/evaluations",
            get(api::evaluations::list_evaluations).post(api::evaluations::submit_evaluation),
        )
        // Triage inbox and announcements
        .route("/api/notifications", get(api::notifications::list_notifications))
        .route("/api/notifications/:id", patch(api::notifications::mark_read))
        .route(
            "/api/student-notifications",
            get(api::notifications::student_notifications)
                .post(api::notifications::notify_students),
        )
        .route(
            "/api/announcements",
            get(api::notifications::list_announcements)
                .post(api::notifications::post_announcement),
        )
        // Client portal
        .route("/api/client-portal/info", get(api::client_portal::client_info))
        .route("/api/client-portal/team", get(api::client_portal::client_team))
        .route("/api/client-portal/progress", get(api::client_portal::client_progress))
        .route(
            "/api/client-portal/weekly-progress",
            get(api::client_portal::weekly_progress),
        )
        .route(
            "/api/client-portal/deliverables",
            get(api::client_portal::deliverables),
        )
        .route(
            "/api/client-portal/documents",
            get(api::client_portal::list_documents).post(api::client_portal::create_document),
        )
        .route(
            "/api/client-portal/messages",
            get(api::client_portal::list_messages).post(api::client_portal::create_message),
        )
        .route(
            "/api/client-portal/tasks",
            get(api::tasks::list_tasks)
                .post(api::tasks::create_task)
                .patch(api::tasks::update_task),
        )
        .route(
            "/api/client-portal/tasks/comments",
            get(api::tasks::list_comments).post(api::tasks::add_comment),
        )
        .route(
            "/api/client-portal/questions",
            get(api::questions::list_questions)
                .post(api::questions::ask_question)
                .patch(api::questions::update_question),
        )
        // Onboarding and prospects
        .route(
            "/api/agreements",
            get(api::agreements::list_agreements).post(api::agreements::sign_agreement),
        )
        .route(
            "/api/prospects",
            get(api::prospects::list_prospects)
                .post(api::prospects::create_prospect)
                .patch(api::prospects::update_prospect),
        )
        .route(
            "/api/prospect-interviews",
            get(api::prospects::list_interviews).post(api::prospects::create_interview),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::auth_middleware,
        ));

    let public = Router::new()
        .merge(api::health_routes())
        .nest_service(FILES_PREFIX, ServeDir::new(&state.config.uploads_dir));

    Router::new()
        .merge(protected)
        .merge(public)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
