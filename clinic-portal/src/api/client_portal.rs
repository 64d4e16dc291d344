//! Client portal: what a client sees about its engagement
//!
//! Team, progress and deliverables are read-only views over student work;
//! documents and messages are written by the client.

use std::collections::{HashMap, HashSet};

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    Json,
};
use clinic_common::db::models::{
    Client, ClientDocument, ClientMessage, Debrief, Document, DocumentReview, Evaluation, MappingRow,
    WeeklySummary,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::info;

use crate::db::client_portal::{self, NewClientDocument, NewClientMessage};
use crate::db::deliverables::evaluations_for;
use crate::db::people::{self, ClientLookup};
use crate::db::{debriefs, summaries};
use crate::error::{required, ApiError, ApiResult};
use crate::AppState;

/// Debriefs shown on the progress card
const PROGRESS_LIMIT: i64 = 10;
/// Weekly summaries shown alongside the weekly rollup
const SUMMARY_LIMIT: i64 = 12;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientQuery {
    pub client_id: Option<String>,
    pub auth_user_id: Option<String>,
    pub email: Option<String>,
    pub client_name: Option<String>,
}

impl ClientQuery {
    /// Preferred lookup: id, then auth user, then email, then name
    fn lookup(&self) -> Option<ClientLookup<'_>> {
        fn pick(v: &Option<String>) -> Option<&str> {
            v.as_deref().filter(|s| !s.trim().is_empty())
        }

        pick(&self.client_id)
            .map(ClientLookup::Id)
            .or_else(|| pick(&self.auth_user_id).map(ClientLookup::AuthUserId))
            .or_else(|| pick(&self.email).map(ClientLookup::Email))
            .or_else(|| pick(&self.client_name).map(ClientLookup::Name))
    }
}

async fn find_client(pool: &SqlitePool, lookup: ClientLookup<'_>) -> ApiResult<Client> {
    people::find_client(pool, lookup)
        .await?
        .ok_or_else(|| ApiError::NotFound("Client not found".to_string()))
}

#[derive(Debug, Serialize)]
pub struct ClientInfo {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub team_size: i64,
    pub engagement_start: String,
    pub clinic: String,
    pub primary_contact: String,
    pub phone: String,
    pub website: String,
    pub project_type: String,
    pub status: String,
    pub semester: String,
}

/// GET /api/client-portal/info
pub async fn client_info(
    State(state): State<AppState>,
    query: Result<Query<ClientQuery>, QueryRejection>,
) -> ApiResult<Json<ClientInfo>> {
    let Query(query) = query?;
    let lookup = match (&query.client_id, &query.auth_user_id, &query.email) {
        (None, None, None) => None,
        _ => query.lookup(),
    }
    .ok_or_else(|| ApiError::BadRequest("authUserId, clientId, or email required".to_string()))?;

    let client = find_client(&state.db, lookup).await?;
    let team_size = people::team_size(&state.db, &client.id).await?;

    Ok(Json(ClientInfo {
        team_size,
        engagement_start: client.created_at,
        clinic: client.clinic.unwrap_or_default(),
        primary_contact: client.contact_name.unwrap_or_default(),
        phone: client.phone.unwrap_or_default(),
        website: client.website.unwrap_or_default(),
        project_type: client.project_type.unwrap_or_default(),
        status: client.status,
        semester: client.semester.unwrap_or_default(),
        id: client.id,
        name: client.name,
        email: client.email,
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientSummary {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub contact_name: Option<String>,
    pub website: Option<String>,
    pub project_type: Option<String>,
    pub status: String,
    pub semester: Option<String>,
    pub alumni_mentor: Option<String>,
}

impl From<Client> for ClientSummary {
    fn from(client: Client) -> Self {
        Self {
            id: client.id,
            name: client.name,
            email: client.email,
            contact_name: client.contact_name,
            website: client.website,
            project_type: client.project_type,
            status: client.status,
            semester: client.semester,
            alumni_mentor: client.alumni_mentor,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortalTeamMember {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: String,
    pub clinic: String,
    pub is_team_leader: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortalDirector {
    pub id: String,
    pub name: String,
    pub email: String,
    pub clinic_id: Option<String>,
    pub job_title: String,
    pub role: String,
    pub is_primary: bool,
}

/// Team members and directors from mapping rows, each listed once
pub fn team_from_mapping(rows: &[MappingRow]) -> (Vec<PortalTeamMember>, Vec<PortalDirector>) {
    let mut students = HashSet::new();
    let mut seen_directors = HashSet::new();
    let mut members = Vec::new();
    let mut directors = Vec::new();

    for row in rows {
        if students.insert(row.student_id.clone()) {
            let role = row.student_role.clone().unwrap_or_else(|| "Team Member".to_string());
            members.push(PortalTeamMember {
                id: row.student_id.clone(),
                name: row.student_name.clone(),
                email: row.student_email.clone().unwrap_or_default(),
                is_team_leader: role == "Team Leader",
                role,
                clinic: row.student_clinic_name.clone().unwrap_or_default(),
            });
        }

        if let Some(id) = &row.clinic_director_id {
            if seen_directors.insert(id.clone()) {
                directors.push(PortalDirector {
                    id: id.clone(),
                    name: row.clinic_director_name.clone().unwrap_or_else(|| "Unknown".to_string()),
                    email: row.clinic_director_email.clone().unwrap_or_default(),
                    clinic_id: row.student_clinic_id.clone(),
                    job_title: "Clinic Director".to_string(),
                    role: "Clinic Director".to_string(),
                    is_primary: false,
                });
            }
        }
        if let Some(id) = &row.client_director_id {
            if seen_directors.insert(id.clone()) {
                directors.push(PortalDirector {
                    id: id.clone(),
                    name: row.client_director_name.clone().unwrap_or_else(|| "Unknown".to_string()),
                    email: row.client_director_email.clone().unwrap_or_default(),
                    clinic_id: None,
                    job_title: "Client Director".to_string(),
                    role: "Client Director".to_string(),
                    is_primary: true,
                });
            }
        }
    }

    (members, directors)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub client: Option<ClientSummary>,
    pub team_members: Vec<PortalTeamMember>,
    pub directors: Vec<PortalDirector>,
}

/// GET /api/client-portal/team
///
/// An unknown client is not an error here: the body says `success: false`.
pub async fn client_team(
    State(state): State<AppState>,
    query: Result<Query<ClientQuery>, QueryRejection>,
) -> ApiResult<Json<TeamResponse>> {
    let Query(query) = query?;

    let client = match query.lookup() {
        Some(lookup) => people::find_client(&state.db, lookup).await?,
        None => None,
    };
    let Some(client) = client else {
        return Ok(Json(TeamResponse {
            success: false,
            error: Some("Client not found".to_string()),
            client: None,
            team_members: Vec::new(),
            directors: Vec::new(),
        }));
    };

    let rows = people::mapping_for_client(&state.db, &client.id, client.semester.as_deref()).await?;
    let (team_members, directors) = team_from_mapping(&rows);
    info!(
        "Client team for {}: {} members, {} directors",
        client.name,
        team_members.len(),
        directors.len()
    );

    Ok(Json(TeamResponse {
        success: true,
        error: None,
        client: Some(client.into()),
        team_members,
        directors,
    }))
}

#[derive(Debug, Serialize)]
pub struct ProgressResponse {
    pub progress: Vec<Debrief>,
}

/// GET /api/client-portal/progress
pub async fn client_progress(
    State(state): State<AppState>,
    query: Result<Query<ClientQuery>, QueryRejection>,
) -> ApiResult<Json<ProgressResponse>> {
    let Query(query) = query?;
    let client_name = required(query.client_name, "clientName")?;

    let progress = debriefs::recent_for_client_name(&state.db, &client_name, PROGRESS_LIMIT).await?;
    Ok(Json(ProgressResponse { progress }))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekActivity {
    pub student: String,
    pub summary: String,
    pub hours: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekRollup {
    #[serde(rename = "week_ending")]
    pub week_ending: String,
    pub hours: f64,
    pub activities: Vec<WeekActivity>,
    pub students: Vec<String>,
    pub student_count: usize,
}

/// Group debriefs per week ending, keeping the order weeks first appear in
pub fn weekly_rollup(debriefs: &[Debrief]) -> Vec<WeekRollup> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut weeks: Vec<WeekRollup> = Vec::new();

    for debrief in debriefs {
        let slot = *index.entry(debrief.week_ending.as_str()).or_insert_with(|| {
            weeks.push(WeekRollup {
                week_ending: debrief.week_ending.clone(),
                hours: 0.0,
                activities: Vec::new(),
                students: Vec::new(),
                student_count: 0,
            });
            weeks.len() - 1
        });
        let week = &mut weeks[slot];

        week.hours += debrief.hours_worked;
        if let Some(summary) = debrief.work_summary.as_deref().filter(|s| !s.is_empty()) {
            week.activities.push(WeekActivity {
                student: debrief.student_name.clone(),
                summary: summary.to_string(),
                hours: debrief.hours_worked,
            });
        }
        if !week.students.contains(&debrief.student_name) {
            week.students.push(debrief.student_name.clone());
            week.student_count = week.students.len();
        }
    }

    weeks
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyProgressResponse {
    pub success: bool,
    pub total_hours: f64,
    pub unique_students: usize,
    pub weekly_progress: Vec<WeekRollup>,
    pub summaries: Vec<WeeklySummary>,
    pub recent_activity: Vec<Debrief>,
}

/// GET /api/client-portal/weekly-progress
pub async fn weekly_progress(
    State(state): State<AppState>,
    query: Result<Query<ClientQuery>, QueryRejection>,
) -> ApiResult<Json<WeeklyProgressResponse>> {
    let Query(query) = query?;
    let lookup = match (&query.client_id, &query.client_name) {
        (None, None) => None,
        _ => query.lookup(),
    }
    .ok_or_else(|| ApiError::BadRequest("Client name or ID required".to_string()))?;
    let client = find_client(&state.db, lookup).await?;

    let recent_activity = debriefs::for_client(&state.db, &client.id).await?;
    let summaries =
        summaries::recent_for_client(&state.db, &client.id, &client.name, SUMMARY_LIMIT).await?;

    let total_hours = recent_activity.iter().map(|d| d.hours_worked).sum();
    let unique_students = recent_activity
        .iter()
        .map(|d| d.student_name.as_str())
        .collect::<HashSet<_>>()
        .len();

    Ok(Json(WeeklyProgressResponse {
        success: true,
        total_hours,
        unique_students,
        weekly_progress: weekly_rollup(&recent_activity),
        summaries,
        recent_activity,
    }))
}

#[derive(Debug, Serialize)]
pub struct Deliverable {
    #[serde(flatten)]
    pub document: Document,
    pub evaluations: Vec<Evaluation>,
    pub reviews: Vec<DocumentReview>,
}

#[derive(Debug, Serialize)]
pub struct DeliverablesResponse {
    pub success: bool,
    pub deliverables: Vec<Deliverable>,
}

/// GET /api/client-portal/deliverables
pub async fn deliverables(
    State(state): State<AppState>,
    query: Result<Query<ClientQuery>, QueryRejection>,
) -> ApiResult<Json<DeliverablesResponse>> {
    let Query(query) = query?;
    let client_id = match (query.client_id.clone(), query.client_name.as_deref()) {
        (Some(id), _) => id,
        (None, Some(name)) => find_client(&state.db, ClientLookup::Name(name)).await?.id,
        (None, None) => {
            return Err(ApiError::BadRequest("Client ID or name required".to_string()));
        }
    };

    let documents = client_portal::documents_for_client(&state.db, &client_id).await?;
    let mut deliverables = Vec::with_capacity(documents.len());
    for document in documents {
        let evaluations = evaluations_for(&state.db, &document.id).await?;
        let reviews = client_portal::reviews_for(&state.db, &document.id).await?;
        deliverables.push(Deliverable {
            document,
            evaluations,
            reviews,
        });
    }

    Ok(Json(DeliverablesResponse {
        success: true,
        deliverables,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentQuery {
    pub client_id: Option<String>,
    pub uploaded_by_email: Option<String>,
}

/// GET /api/client-portal/documents
pub async fn list_documents(
    State(state): State<AppState>,
    query: Result<Query<DocumentQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<ClientDocument>>> {
    let Query(query) = query?;
    let documents = client_portal::list_client_documents(
        &state.db,
        query.client_id.as_deref(),
        query.uploaded_by_email.as_deref(),
    )
    .await?;
    Ok(Json(documents))
}

#[derive(Debug, Deserialize)]
pub struct DocumentBody {
    pub client_id: Option<String>,
    pub file_name: Option<String>,
    pub file_url: Option<String>,
    pub file_type: Option<String>,
    pub description: Option<String>,
    pub uploaded_by_name: Option<String>,
    pub uploaded_by_email: Option<String>,
}

/// POST /api/client-portal/documents
pub async fn create_document(
    State(state): State<AppState>,
    body: Result<Json<DocumentBody>, JsonRejection>,
) -> ApiResult<Json<ClientDocument>> {
    let Json(body) = body?;
    let document = NewClientDocument {
        client_id: body.client_id,
        file_name: required(body.file_name, "file_name")?,
        file_url: required(body.file_url, "file_url")?,
        file_type: body.file_type,
        description: body.description,
        uploaded_by_name: body.uploaded_by_name,
        uploaded_by_email: body.uploaded_by_email,
    };
    let document = client_portal::insert_client_document(&state.db, &document).await?;
    Ok(Json(document))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageQuery {
    pub client_id: Option<String>,
}

/// GET /api/client-portal/messages
pub async fn list_messages(
    State(state): State<AppState>,
    query: Result<Query<MessageQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<ClientMessage>>> {
    let Query(query) = query?;
    let messages = client_portal::list_messages(&state.db, query.client_id.as_deref()).await?;
    Ok(Json(messages))
}

#[derive(Debug, Deserialize)]
pub struct MessageBody {
    pub client_id: Option<String>,
    pub subject: Option<String>,
    pub message: Option<String>,
    pub sender_name: Option<String>,
    pub sender_email: Option<String>,
    pub sender_type: Option<String>,
}

/// POST /api/client-portal/messages
pub async fn create_message(
    State(state): State<AppState>,
    body: Result<Json<MessageBody>, JsonRejection>,
) -> ApiResult<Json<ClientMessage>> {
    let Json(body) = body?;
    let message = NewClientMessage {
        client_id: body.client_id,
        subject: body.subject,
        message: required(body.message, "message")?,
        sender_name: body.sender_name,
        sender_email: body.sender_email,
        sender_type: body.sender_type,
    };
    let message = client_portal::insert_message(&state.db, &message).await?;
    Ok(Json(message))
}
