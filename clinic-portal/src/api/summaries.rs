//! Cached weekly summaries

use std::collections::BTreeMap;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    Json,
};
use clinic_common::db::models::WeeklySummary;
use clinic_common::summary::{SummaryDraft, SummaryKey};
use serde::{Deserialize, Serialize};

use crate::db::summaries;
use crate::error::{required, ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    pub week_ending: Option<String>,
    pub client_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SummaryMap {
    /// Keyed by client name
    pub summaries: BTreeMap<String, WeeklySummary>,
}

/// GET /api/weekly-summaries
pub async fn get_summaries(
    State(state): State<AppState>,
    query: Result<Query<SummaryQuery>, QueryRejection>,
) -> ApiResult<Json<SummaryMap>> {
    let Query(query) = query?;
    let week_ending = required(query.week_ending, "week_ending")?;

    let rows = summaries::for_week(&state.db, &week_ending, query.client_name.as_deref()).await?;
    let summaries = rows
        .into_iter()
        .map(|row| (row.client_name.clone(), row))
        .collect();

    Ok(Json(SummaryMap { summaries }))
}

#[derive(Debug, Deserialize)]
pub struct SummaryUpsert {
    pub client_name: Option<String>,
    pub week_ending: Option<String>,
    pub clinic: Option<String>,
    pub summary: Option<String>,
    #[serde(default)]
    pub total_hours: f64,
    #[serde(default)]
    pub student_count: i64,
    #[serde(default)]
    pub activity_count: i64,
}

#[derive(Debug, Serialize)]
pub struct UpsertResponse {
    pub success: bool,
    pub data: WeeklySummary,
}

/// POST /api/weekly-summaries
pub async fn upsert_summary(
    State(state): State<AppState>,
    body: Result<Json<SummaryUpsert>, JsonRejection>,
) -> ApiResult<Json<UpsertResponse>> {
    let Json(body) = body?;

    let (Some(client_name), Some(week_ending), Some(clinic), Some(summary)) =
        (body.client_name, body.week_ending, body.clinic, body.summary)
    else {
        return Err(ApiError::BadRequest("Missing required fields".to_string()));
    };
    if [&client_name, &week_ending, &clinic, &summary]
        .iter()
        .any(|v| v.trim().is_empty())
    {
        return Err(ApiError::BadRequest("Missing required fields".to_string()));
    }

    let draft = SummaryDraft {
        key: SummaryKey {
            week_ending,
            clinic,
            client_name,
        },
        total_hours: body.total_hours,
        student_count: body.student_count,
        activity_count: body.activity_count,
        summary,
    };
    let data = summaries::upsert(&state.db, &draft).await?;

    Ok(Json(UpsertResponse { success: true, data }))
}
