//! Debrief queries

use clinic_common::db::models::Debrief;
use clinic_common::retry::retry_on_lock;
use clinic_common::Result;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use super::new_id;

/// A debrief ready to be stored
#[derive(Debug, Clone)]
pub struct NewDebrief {
    pub student_id: Option<String>,
    pub student_name: String,
    pub client_id: Option<String>,
    pub client_name: String,
    pub clinic: Option<String>,
    pub hours_worked: f64,
    pub work_summary: Option<String>,
    pub questions: Option<String>,
    pub action_items: Option<String>,
    pub debrief_date: String,
    pub week_ending: String,
    pub semester: Option<String>,
}

/// Debriefs filtered by student and/or client, newest first
pub async fn list(
    pool: &SqlitePool,
    student_id: Option<&str>,
    client_id: Option<&str>,
) -> Result<Vec<Debrief>> {
    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT * FROM debriefs WHERE 1 = 1");
    if let Some(student_id) = student_id {
        qb.push(" AND student_id = ");
        qb.push_bind(student_id);
    }
    if let Some(client_id) = client_id {
        qb.push(" AND client_id = ");
        qb.push_bind(client_id);
    }
    qb.push(" ORDER BY debrief_date DESC, created_at DESC");

    Ok(qb.build_query_as().fetch_all(pool).await?)
}

/// The most recent debriefs logged against a client name
pub async fn recent_for_client_name(
    pool: &SqlitePool,
    client_name: &str,
    limit: i64,
) -> Result<Vec<Debrief>> {
    Ok(sqlx::query_as(
        "SELECT * FROM debriefs WHERE client_name = ? ORDER BY week_ending DESC, debrief_date DESC LIMIT ?",
    )
    .bind(client_name)
    .bind(limit)
    .fetch_all(pool)
    .await?)
}

/// All debriefs for a client, newest week first
pub async fn for_client(pool: &SqlitePool, client_id: &str) -> Result<Vec<Debrief>> {
    Ok(sqlx::query_as(
        "SELECT * FROM debriefs WHERE client_id = ? ORDER BY week_ending DESC, debrief_date DESC",
    )
    .bind(client_id)
    .fetch_all(pool)
    .await?)
}

/// Number of debriefs a student has submitted
pub async fn count_for_student(pool: &SqlitePool, student_id: &str) -> Result<i64> {
    Ok(sqlx::query_scalar("SELECT COUNT(*) FROM debriefs WHERE student_id = ?")
        .bind(student_id)
        .fetch_one(pool)
        .await?)
}

pub async fn insert(pool: &SqlitePool, debrief: &NewDebrief) -> Result<Debrief> {
    let id = new_id();

    retry_on_lock("insert_debrief", || async {
        let row: Debrief = sqlx::query_as(
            r#"
            INSERT INTO debriefs (
                id, student_id, student_name, client_id, client_name, clinic,
                hours_worked, work_summary, questions, action_items,
                debrief_date, week_ending, semester
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(&debrief.student_id)
        .bind(&debrief.student_name)
        .bind(&debrief.client_id)
        .bind(&debrief.client_name)
        .bind(&debrief.clinic)
        .bind(debrief.hours_worked)
        .bind(&debrief.work_summary)
        .bind(&debrief.questions)
        .bind(&debrief.action_items)
        .bind(&debrief.debrief_date)
        .bind(&debrief.week_ending)
        .bind(&debrief.semester)
        .fetch_one(pool)
        .await?;

        Ok(row)
    })
    .await
}
