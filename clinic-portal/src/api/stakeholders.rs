//! Stakeholder cards: one student, client or director with its relations

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use sqlx::SqlitePool;

use crate::db::people::{self, ClientLookup, NamedRef, PrimaryLink, TeamMember};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct StudentCard {
    pub id: String,
    pub full_name: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub clinic: Option<String>,
    pub client_team: Option<String>,
    pub is_team_leader: bool,
    pub academic_level: Option<String>,
    pub education: Option<String>,
    pub linkedin_profile: Option<String>,
    pub business_experience: Option<String>,
    pub semester: Option<String>,
    pub status: String,
    pub clients: Vec<NamedRef>,
    pub directors: Vec<NamedRef>,
}

#[derive(Debug, Serialize)]
pub struct ClientCard {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub contact_name: Option<String>,
    pub website: Option<String>,
    pub project_type: Option<String>,
    pub status: String,
    pub semester: Option<String>,
    pub alumni_mentor: Option<String>,
    pub directors: Vec<PrimaryLink>,
    pub team_members: Vec<TeamMember>,
}

#[derive(Debug, Serialize)]
pub struct DirectorCard {
    pub id: String,
    pub full_name: String,
    pub email: Option<String>,
    pub clinic: Option<String>,
    pub job_title: Option<String>,
    pub role: Option<String>,
    pub semester: Option<String>,
    pub clients: Vec<PrimaryLink>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum StakeholderCard {
    Student(StudentCard),
    Client(ClientCard),
    Director(DirectorCard),
}

#[derive(Debug, Serialize)]
pub struct StakeholderResponse {
    pub success: bool,
    pub data: StakeholderCard,
}

async fn student_card(pool: &SqlitePool, id: &str) -> ApiResult<StudentCard> {
    let student = people::find_student(pool, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Student not found".to_string()))?;

    let clients = people::student_clients(pool, &student.id).await?;
    let directors = match people::student_clinic_name(pool, &student).await? {
        Some(clinic) => people::directors_of_clinic(pool, &clinic).await?,
        None => Vec::new(),
    };

    Ok(StudentCard {
        id: student.id,
        full_name: student.full_name,
        first_name: student.first_name,
        last_name: student.last_name,
        email: student.email,
        clinic: student.clinic,
        client_team: student.client_team,
        is_team_leader: student.is_team_leader,
        academic_level: student.academic_level,
        education: student.education,
        linkedin_profile: student.linkedin_profile,
        business_experience: student.business_experience,
        semester: student.semester,
        status: student.status,
        clients,
        directors,
    })
}

async fn client_card(pool: &SqlitePool, id: &str) -> ApiResult<ClientCard> {
    let client = people::find_client(pool, ClientLookup::Id(id))
        .await?
        .ok_or_else(|| ApiError::NotFound("Client not found".to_string()))?;

    let directors = people::client_directors(pool, &client.id).await?;
    let team_members = people::client_team(pool, &client.id).await?;

    Ok(ClientCard {
        id: client.id,
        name: client.name,
        email: client.email,
        contact_name: client.contact_name,
        website: client.website,
        project_type: client.project_type,
        status: client.status,
        semester: client.semester,
        alumni_mentor: client.alumni_mentor,
        directors,
        team_members,
    })
}

async fn director_card(pool: &SqlitePool, id: &str) -> ApiResult<DirectorCard> {
    let director = people::find_director(pool, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Director not found".to_string()))?;

    let clients = people::director_clients(pool, &director.id).await?;

    Ok(DirectorCard {
        id: director.id,
        full_name: director.full_name,
        email: director.email,
        clinic: director.clinic,
        job_title: director.job_title,
        role: director.role,
        semester: director.semester,
        clients,
    })
}

/// GET /api/stakeholders/:kind/:id
pub async fn get_stakeholder(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
) -> ApiResult<Json<StakeholderResponse>> {
    let data = match kind.as_str() {
        "student" => StakeholderCard::Student(student_card(&state.db, &id).await?),
        "client" => StakeholderCard::Client(client_card(&state.db, &id).await?),
        "director" => StakeholderCard::Director(director_card(&state.db, &id).await?),
        other => {
            return Err(ApiError::BadRequest(format!("Unknown stakeholder type: {}", other)));
        }
    };

    Ok(Json(StakeholderResponse { success: true, data }))
}
