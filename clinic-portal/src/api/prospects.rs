//! Prospective clients and their intake interviews
//!
//! Responses wrap the payload as `{"data": ...}`.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    Json,
};
use clinic_common::db::models::{Prospect, ProspectInterview};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::db::prospects::{self, NewInterview, NewProspect, ProspectFilter};
use crate::db::PartialUpdate;
use crate::error::{required, ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct Data<T> {
    pub data: T,
}

fn given(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProspectQuery {
    pub director_id: Option<String>,
    pub status: Option<String>,
    pub clinic: Option<String>,
    pub semester_id: Option<String>,
}

/// GET /api/prospects
pub async fn list_prospects(
    State(state): State<AppState>,
    query: Result<Query<ProspectQuery>, QueryRejection>,
) -> ApiResult<Json<Data<Vec<Prospect>>>> {
    let Query(query) = query?;
    let filter = ProspectFilter {
        director_id: given(&query.director_id),
        status: given(&query.status),
        clinic: given(&query.clinic),
        semester_id: given(&query.semester_id),
    };
    let data = prospects::list(&state.db, &filter).await?;
    Ok(Json(Data { data }))
}

/// Prospect columns as posted by the intake form
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ProspectBody {
    pub id: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub business_name: Option<String>,
    pub clinic_of_interest: Option<String>,
    pub suggested_clinic: Option<String>,
    pub interviewer_id: Option<String>,
    pub director_in_charge_id: Option<String>,
    pub acceptance_status: Option<String>,
    pub target_semester_id: Option<String>,
    pub notes: Option<String>,
}

/// POST /api/prospects
pub async fn create_prospect(
    State(state): State<AppState>,
    body: Result<Json<ProspectBody>, JsonRejection>,
) -> ApiResult<Json<Data<Prospect>>> {
    let Json(body) = body?;

    let prospect = NewProspect {
        name: required(body.name, "name")?,
        email: body.email,
        phone: body.phone,
        business_name: body.business_name,
        clinic_of_interest: body.clinic_of_interest,
        suggested_clinic: body.suggested_clinic,
        interviewer_id: body.interviewer_id,
        director_in_charge_id: body.director_in_charge_id,
        acceptance_status: body.acceptance_status.filter(|s| !s.is_empty()),
        target_semester_id: body.target_semester_id,
        notes: body.notes,
    };
    let data = prospects::insert(&state.db, &prospect).await?;
    info!("Added prospect {} ({})", data.name, data.id);

    Ok(Json(Data { data }))
}

/// PATCH /api/prospects
pub async fn update_prospect(
    State(state): State<AppState>,
    body: Result<Json<ProspectBody>, JsonRejection>,
) -> ApiResult<Json<Data<Prospect>>> {
    let Json(body) = body?;
    let id = required(body.id, "id")?;

    let mut update = PartialUpdate::new("prospects");
    update
        .set("name", body.name.filter(|s| !s.trim().is_empty()))
        .set("email", body.email)
        .set("phone", body.phone)
        .set("business_name", body.business_name)
        .set("clinic_of_interest", body.clinic_of_interest)
        .set("suggested_clinic", body.suggested_clinic)
        .set("interviewer_id", body.interviewer_id)
        .set("director_in_charge_id", body.director_in_charge_id)
        .set("acceptance_status", body.acceptance_status)
        .set("target_semester_id", body.target_semester_id)
        .set("notes", body.notes);

    let data = prospects::update(&state.db, &id, &update)
        .await?
        .ok_or_else(|| ApiError::NotFound("Prospect not found".to_string()))?;

    Ok(Json(Data { data }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewQuery {
    pub prospect_id: Option<String>,
    pub interviewer_id: Option<String>,
    pub status: Option<String>,
}

/// GET /api/prospect-interviews
pub async fn list_interviews(
    State(state): State<AppState>,
    query: Result<Query<InterviewQuery>, QueryRejection>,
) -> ApiResult<Json<Data<Vec<ProspectInterview>>>> {
    let Query(query) = query?;
    let data = prospects::list_interviews(
        &state.db,
        given(&query.prospect_id),
        given(&query.interviewer_id),
        given(&query.status),
    )
    .await?;
    Ok(Json(Data { data }))
}

#[derive(Debug, Deserialize)]
pub struct InterviewBody {
    pub prospect_id: Option<String>,
    pub interviewer_id: Option<String>,
    pub interview_date: Option<String>,
    pub interview_status: Option<String>,
    pub rating: Option<i64>,
    pub notes: Option<String>,
}

/// POST /api/prospect-interviews
pub async fn create_interview(
    State(state): State<AppState>,
    body: Result<Json<InterviewBody>, JsonRejection>,
) -> ApiResult<Json<Data<ProspectInterview>>> {
    let Json(body) = body?;
    let prospect_id = required(body.prospect_id, "prospect_id")?;

    if prospects::find(&state.db, &prospect_id).await?.is_none() {
        return Err(ApiError::NotFound("Prospect not found".to_string()));
    }

    let interview = NewInterview {
        prospect_id,
        interviewer_id: body.interviewer_id,
        interview_date: body.interview_date,
        interview_status: body.interview_status.filter(|s| !s.is_empty()),
        rating: body.rating,
        notes: body.notes,
    };
    let data = prospects::insert_interview(&state.db, &interview).await?;
    info!("Scheduled interview {} for prospect {}", data.id, data.prospect_id);

    Ok(Json(Data { data }))
}
