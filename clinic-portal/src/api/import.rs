//! Debrief import and summary audit
//!
//! POST takes a batch of raw debrief rows, rolls them up into weekly
//! summaries and stores every summary whose key is new. Re-running the same
//! batch only counts duplicates.

use std::collections::BTreeSet;

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use clinic_common::db::models::WeeklySummary;
use clinic_common::summary::{aggregate_debriefs, DebriefRow};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::db::summaries;
use crate::error::ApiResult;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ImportRequest {
    pub rows: Vec<DebriefRow>,
    /// Semester the summaries are filed under (service default when absent)
    pub semester: Option<String>,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResults {
    pub total_records: usize,
    pub inserted: usize,
    pub duplicates: usize,
    pub errors: Vec<String>,
    pub inserted_records: Vec<WeeklySummary>,
    pub final_count: i64,
}

#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub success: bool,
    pub results: ImportResults,
    pub message: String,
}

/// POST /api/import-debriefs
pub async fn import_debriefs(
    State(state): State<AppState>,
    body: Result<Json<ImportRequest>, JsonRejection>,
) -> ApiResult<Json<ImportResponse>> {
    let Json(request) = body?;
    let semester = request
        .semester
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| state.config.default_semester.clone());

    let aggregation = aggregate_debriefs(&request.rows);
    let mut results = ImportResults {
        total_records: request.rows.len(),
        errors: aggregation.rejected,
        ..Default::default()
    };

    for draft in &aggregation.drafts {
        match summaries::insert_if_absent(&state.db, draft, &semester).await {
            Ok(Some(row)) => {
                results.inserted += 1;
                results.inserted_records.push(row);
            }
            Ok(None) => results.duplicates += 1,
            Err(e) => {
                error!("[import-debriefs] Error inserting {}: {}", draft.key, e);
                results.errors.push(format!("Error inserting {}: {}", draft.key, e));
            }
        }
    }

    results.final_count = summaries::count(&state.db).await?;

    let message = format!(
        "Imported {} records, {} duplicates skipped, {} errors",
        results.inserted,
        results.duplicates,
        results.errors.len()
    );
    info!("[import-debriefs] {}", message);

    Ok(Json(ImportResponse {
        success: true,
        results,
        message,
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryAudit {
    pub unique_clinics: Vec<String>,
    pub unique_clients: Vec<String>,
    pub unique_weeks: Vec<String>,
    pub clinic_count: usize,
    pub client_count: usize,
    pub week_count: usize,
}

impl SummaryAudit {
    pub fn of(records: &[WeeklySummary]) -> Self {
        let clinics: BTreeSet<&str> = records.iter().map(|r| r.clinic.as_str()).collect();
        let clients: BTreeSet<&str> = records.iter().map(|r| r.client_name.as_str()).collect();
        let weeks: BTreeSet<&str> = records.iter().map(|r| r.week_ending.as_str()).collect();

        let owned = |set: BTreeSet<&str>| set.into_iter().map(str::to_string).collect::<Vec<_>>();

        Self {
            clinic_count: clinics.len(),
            client_count: clients.len(),
            week_count: weeks.len(),
            unique_clinics: owned(clinics),
            unique_clients: owned(clients),
            unique_weeks: owned(weeks),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditResponse {
    pub success: bool,
    pub total_records: usize,
    pub records: Vec<WeeklySummary>,
    pub audit: SummaryAudit,
}

/// GET /api/import-debriefs
pub async fn audit_summaries(State(state): State<AppState>) -> ApiResult<Json<AuditResponse>> {
    let records = summaries::list_all(&state.db).await?;

    Ok(Json(AuditResponse {
        success: true,
        total_records: records.len(),
        audit: SummaryAudit::of(&records),
        records,
    }))
}
