//! Clinic and director listings, and per-student semester progress

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use clinic_common::db::models::{Clinic, Director};
use clinic_common::semester::{self, CompletionRate};
use clinic_common::time::today;
use serde::{Deserialize, Serialize};

use crate::api::schedule::{load_calendar, semester_for};
use crate::db::{debriefs, people};
use crate::error::{required, ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct ClinicList {
    pub clinics: Vec<Clinic>,
}

/// GET /api/clinics
pub async fn list_clinics(State(state): State<AppState>) -> ApiResult<Json<ClinicList>> {
    let clinics = people::list_clinics(&state.db).await?;
    Ok(Json(ClinicList { clinics }))
}

#[derive(Debug, Serialize)]
pub struct DirectorList {
    pub directors: Vec<Director>,
}

/// GET /api/directors
pub async fn list_directors(State(state): State<AppState>) -> ApiResult<Json<DirectorList>> {
    let directors = people::list_directors(&state.db).await?;
    Ok(Json(DirectorList { directors }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressQuery {
    pub student_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentProgress {
    pub success: bool,
    pub student_id: String,
    pub student_name: String,
    pub semester: Option<String>,
    pub debriefs: CompletionRate,
    pub current_week_number: i64,
    pub elapsed_class_weeks: i64,
    pub total_class_weeks: i64,
}

/// GET /api/students/progress
///
/// Debrief completion against the weeks of the student's semester that have
/// ended so far.
pub async fn student_progress(
    State(state): State<AppState>,
    query: Result<Query<ProgressQuery>, QueryRejection>,
) -> ApiResult<Json<StudentProgress>> {
    let Query(query) = query?;
    let student_id = required(query.student_id, "studentId")?;

    let student = people::find_student(&state.db, &student_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Student not found".to_string()))?;

    let semester = semester_for(&state, student.semester.as_deref()).await?;
    let calendar = match &semester {
        Some(config) => load_calendar(&state.db, Some(config.id.as_str())).await?,
        None => Vec::new(),
    };
    let submitted = debriefs::count_for_student(&state.db, &student.id).await?;
    let today = today();

    Ok(Json(StudentProgress {
        success: true,
        student_id: student.id,
        student_name: student.full_name,
        semester: semester.map(|s| s.semester),
        debriefs: semester::debrief_rate(submitted, &calendar, today),
        current_week_number: semester::current_week_number(&calendar, today),
        elapsed_class_weeks: semester::elapsed_class_count(&calendar, today),
        total_class_weeks: semester::total_class_count(&calendar),
    }))
}
