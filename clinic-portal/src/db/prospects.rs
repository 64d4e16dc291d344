//! Prospect and interview queries

use clinic_common::db::models::{Prospect, ProspectInterview};
use clinic_common::retry::retry_on_lock;
use clinic_common::Result;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use super::{new_id, PartialUpdate};

/// Optional filters for listing prospects
#[derive(Debug, Clone, Default)]
pub struct ProspectFilter<'a> {
    /// Matches the interviewer or the director in charge
    pub director_id: Option<&'a str>,
    pub status: Option<&'a str>,
    /// Case-insensitive substring of the clinic of interest or suggested clinic
    pub clinic: Option<&'a str>,
    pub semester_id: Option<&'a str>,
}

#[derive(Debug, Clone, Default)]
pub struct NewProspect {
    pub name: String,
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

#[derive(Debug, Clone)]
pub struct NewInterview {
    pub prospect_id: String,
    pub interviewer_id: Option<String>,
    pub interview_date: Option<String>,
    pub interview_status: Option<String>,
    pub rating: Option<i64>,
    pub notes: Option<String>,
}

/// Prospects ordered by name
pub async fn list(pool: &SqlitePool, filter: &ProspectFilter<'_>) -> Result<Vec<Prospect>> {
    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT * FROM prospects WHERE 1 = 1");
    if let Some(director_id) = filter.director_id {
        qb.push(" AND (interviewer_id = ");
        qb.push_bind(director_id);
        qb.push(" OR director_in_charge_id = ");
        qb.push_bind(director_id);
        qb.push(")");
    }
    if let Some(status) = filter.status {
        qb.push(" AND acceptance_status = ");
        qb.push_bind(status);
    }
    if let Some(clinic) = filter.clinic {
        let pattern = format!("%{}%", clinic.to_lowercase());
        qb.push(" AND (LOWER(COALESCE(clinic_of_interest, '')) LIKE ");
        qb.push_bind(pattern.clone());
        qb.push(" OR LOWER(COALESCE(suggested_clinic, '')) LIKE ");
        qb.push_bind(pattern);
        qb.push(")");
    }
    if let Some(semester_id) = filter.semester_id {
        qb.push(" AND target_semester_id = ");
        qb.push_bind(semester_id);
    }
    qb.push(" ORDER BY name");

    Ok(qb.build_query_as().fetch_all(pool).await?)
}

pub async fn find(pool: &SqlitePool, id: &str) -> Result<Option<Prospect>> {
    Ok(sqlx::query_as("SELECT * FROM prospects WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?)
}

pub async fn insert(pool: &SqlitePool, prospect: &NewProspect) -> Result<Prospect> {
    let id = new_id();
    let status = prospect
        .acceptance_status
        .clone()
        .unwrap_or_else(|| "pending".to_string());

    retry_on_lock("insert_prospect", || async {
        let row: Prospect = sqlx::query_as(
            r#"
            INSERT INTO prospects (
                id, name, email, phone, business_name, clinic_of_interest,
                suggested_clinic, interviewer_id, director_in_charge_id,
                acceptance_status, target_semester_id, notes
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(&prospect.name)
        .bind(&prospect.email)
        .bind(&prospect.phone)
        .bind(&prospect.business_name)
        .bind(&prospect.clinic_of_interest)
        .bind(&prospect.suggested_clinic)
        .bind(&prospect.interviewer_id)
        .bind(&prospect.director_in_charge_id)
        .bind(&status)
        .bind(&prospect.target_semester_id)
        .bind(&prospect.notes)
        .fetch_one(pool)
        .await?;

        Ok(row)
    })
    .await
}

/// Apply a partial update and return the refreshed prospect (`None` = unknown id)
pub async fn update(pool: &SqlitePool, id: &str, update: &PartialUpdate) -> Result<Option<Prospect>> {
    if update.execute(pool, id).await? == 0 {
        return Ok(None);
    }
    find(pool, id).await
}

/// Interviews, most recent date first, undated last
pub async fn list_interviews(
    pool: &SqlitePool,
    prospect_id: Option<&str>,
    interviewer_id: Option<&str>,
    status: Option<&str>,
) -> Result<Vec<ProspectInterview>> {
    let mut qb: QueryBuilder<Sqlite> =
        QueryBuilder::new("SELECT * FROM prospect_interviews WHERE 1 = 1");
    if let Some(prospect_id) = prospect_id {
        qb.push(" AND prospect_id = ");
        qb.push_bind(prospect_id);
    }
    if let Some(interviewer_id) = interviewer_id {
        qb.push(" AND interviewer_id = ");
        qb.push_bind(interviewer_id);
    }
    if let Some(status) = status {
        qb.push(" AND interview_status = ");
        qb.push_bind(status);
    }
    qb.push(" ORDER BY interview_date IS NULL, interview_date DESC");

    Ok(qb.build_query_as().fetch_all(pool).await?)
}

pub async fn insert_interview(pool: &SqlitePool, interview: &NewInterview) -> Result<ProspectInterview> {
    let id = new_id();
    let status = interview
        .interview_status
        .clone()
        .unwrap_or_else(|| "scheduled".to_string());

    retry_on_lock("insert_prospect_interview", || async {
        let row: ProspectInterview = sqlx::query_as(
            r#"
            INSERT INTO prospect_interviews (
                id, prospect_id, interviewer_id, interview_date, interview_status, rating, notes
            )
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(&interview.prospect_id)
        .bind(&interview.interviewer_id)
        .bind(&interview.interview_date)
        .bind(&status)
        .bind(interview.rating)
        .bind(&interview.notes)
        .fetch_one(pool)
        .await?;

        Ok(row)
    })
    .await
}
