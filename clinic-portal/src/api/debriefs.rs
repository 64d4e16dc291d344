//! Student debriefs

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    Json,
};
use clinic_common::db::models::Debrief;
use clinic_common::weeks::{map_clinic_name, parse_us_date, week_ending};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::db::debriefs::{self, NewDebrief};
use crate::db::people::{self, ClientLookup};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebriefQuery {
    pub student_id: Option<String>,
    pub client_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DebriefList {
    pub debriefs: Vec<Debrief>,
}

/// GET /api/debriefs
pub async fn list_debriefs(
    State(state): State<AppState>,
    query: Result<Query<DebriefQuery>, QueryRejection>,
) -> ApiResult<Json<DebriefList>> {
    let Query(query) = query?;
    let debriefs =
        debriefs::list(&state.db, query.student_id.as_deref(), query.client_id.as_deref()).await?;
    Ok(Json(DebriefList { debriefs }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebriefSubmission {
    pub student_id: Option<String>,
    pub student_name: Option<String>,
    pub client_id: Option<String>,
    pub client_name: Option<String>,
    pub clinic: Option<String>,
    pub hours_worked: Option<f64>,
    pub work_summary: Option<String>,
    pub questions: Option<String>,
    pub action_items: Option<String>,
    pub debrief_date: Option<String>,
    pub semester: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DebriefCreated {
    pub success: bool,
    pub debrief: Debrief,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// POST /api/debriefs
///
/// The week ending is always derived from `debriefDate`; names missing from
/// the body are filled in from the referenced student and client.
pub async fn submit_debrief(
    State(state): State<AppState>,
    body: Result<Json<DebriefSubmission>, JsonRejection>,
) -> ApiResult<Json<DebriefCreated>> {
    let Json(body) = body?;

    let debrief_date = non_blank(body.debrief_date)
        .ok_or_else(|| ApiError::BadRequest("debriefDate is required".to_string()))?;
    let date = parse_us_date(&debrief_date)?;

    let hours_worked = body
        .hours_worked
        .ok_or_else(|| ApiError::BadRequest("hoursWorked is required".to_string()))?;
    if !hours_worked.is_finite() || hours_worked <= 0.0 {
        return Err(ApiError::BadRequest("hoursWorked must be positive".to_string()));
    }

    let student_id = non_blank(body.student_id);
    let mut student_name = non_blank(body.student_name);
    let mut clinic = non_blank(body.clinic);
    if let Some(id) = student_id.as_deref() {
        let student = people::find_student(&state.db, id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Student not found".to_string()))?;
        if clinic.is_none() {
            clinic = people::student_clinic_name(&state.db, &student).await?;
        }
        student_name.get_or_insert(student.full_name);
    }
    let student_name = student_name
        .ok_or_else(|| ApiError::BadRequest("studentId or studentName is required".to_string()))?;

    let client_id = non_blank(body.client_id);
    let mut client_name = non_blank(body.client_name);
    if let Some(id) = client_id.as_deref() {
        let client = people::find_client(&state.db, ClientLookup::Id(id))
            .await?
            .ok_or_else(|| ApiError::NotFound("Client not found".to_string()))?;
        client_name.get_or_insert(client.name);
    }
    let client_name = client_name
        .ok_or_else(|| ApiError::BadRequest("clientId or clientName is required".to_string()))?;

    let debrief = NewDebrief {
        student_id,
        student_name,
        client_id,
        client_name,
        clinic: clinic.map(|c| map_clinic_name(&c)),
        hours_worked,
        work_summary: body.work_summary,
        questions: body.questions,
        action_items: body.action_items,
        debrief_date: date.format("%Y-%m-%d").to_string(),
        week_ending: week_ending(date).format("%Y-%m-%d").to_string(),
        semester: non_blank(body.semester).or_else(|| Some(state.config.default_semester.clone())),
    };
    let debrief = debriefs::insert(&state.db, &debrief).await?;
    info!(
        "Debrief {} logged: {} for {} ({} h, week ending {})",
        debrief.id, debrief.student_name, debrief.client_name, debrief.hours_worked, debrief.week_ending
    );

    Ok(Json(DebriefCreated {
        success: true,
        debrief,
    }))
}
