//! Clinics, students, directors and clients, with their relations

use clinic_common::db::models::{Client, Clinic, Director, MappingRow, Student};
use clinic_common::Result;
use serde::Serialize;
use sqlx::SqlitePool;

use super::PartialUpdate;

/// `{id, name}` reference to a related row
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct NamedRef {
    pub id: String,
    pub name: String,
}

/// Client/director link, flagged when the director is the client's primary
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PrimaryLink {
    pub id: String,
    pub name: String,
    pub is_primary: bool,
}

/// Student assigned to a client team
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TeamMember {
    pub id: String,
    pub name: String,
    pub clinic: Option<String>,
    pub role: Option<String>,
    pub is_team_leader: bool,
}

/// How a client record is located
#[derive(Debug, Clone, Copy)]
pub enum ClientLookup<'a> {
    Id(&'a str),
    AuthUserId(&'a str),
    Email(&'a str),
    Name(&'a str),
}

pub async fn list_clinics(pool: &SqlitePool) -> Result<Vec<Clinic>> {
    Ok(sqlx::query_as("SELECT * FROM clinics ORDER BY name")
        .fetch_all(pool)
        .await?)
}

pub async fn list_directors(pool: &SqlitePool) -> Result<Vec<Director>> {
    Ok(sqlx::query_as("SELECT * FROM directors ORDER BY full_name")
        .fetch_all(pool)
        .await?)
}

pub async fn find_student(pool: &SqlitePool, id: &str) -> Result<Option<Student>> {
    Ok(sqlx::query_as("SELECT * FROM students WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?)
}

pub async fn find_director(pool: &SqlitePool, id: &str) -> Result<Option<Director>> {
    Ok(sqlx::query_as("SELECT * FROM directors WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?)
}

pub async fn find_client(pool: &SqlitePool, lookup: ClientLookup<'_>) -> Result<Option<Client>> {
    let (sql, value) = match lookup {
        ClientLookup::Id(v) => ("SELECT * FROM clients WHERE id = ?", v),
        ClientLookup::AuthUserId(v) => ("SELECT * FROM clients WHERE auth_user_id = ? LIMIT 1", v),
        ClientLookup::Email(v) => ("SELECT * FROM clients WHERE email = ? LIMIT 1", v),
        ClientLookup::Name(v) => ("SELECT * FROM clients WHERE name = ? LIMIT 1", v),
    };

    Ok(sqlx::query_as(sql).bind(value).fetch_optional(pool).await?)
}

/// Name of the clinic a student belongs to
pub async fn student_clinic_name(pool: &SqlitePool, student: &Student) -> Result<Option<String>> {
    let Some(clinic_id) = student.clinic_id.as_deref() else {
        return Ok(student.clinic.clone());
    };
    Ok(sqlx::query_scalar("SELECT name FROM clinics WHERE id = ?")
        .bind(clinic_id)
        .fetch_optional(pool)
        .await?)
}

/// First clinic a director leads
pub async fn director_clinic_name(pool: &SqlitePool, director_id: &str) -> Result<Option<String>> {
    Ok(sqlx::query_scalar(
        r#"
        SELECT c.name FROM clinic_directors cd
        JOIN clinics c ON c.id = cd.clinic_id
        WHERE cd.director_id = ?
        ORDER BY c.name
        LIMIT 1
        "#,
    )
    .bind(director_id)
    .fetch_optional(pool)
    .await?)
}

/// Table holding profiles for a user type
pub fn profile_table(user_type: &str) -> Option<&'static str> {
    match user_type {
        "student" => Some("students"),
        "director" => Some("directors"),
        _ => None,
    }
}

/// Update the self-editable profile fields; returns rows changed
pub async fn update_profile(
    pool: &SqlitePool,
    table: &'static str,
    id: &str,
    full_name: Option<String>,
    phone: Option<String>,
    bio: Option<String>,
) -> Result<u64> {
    let mut update = PartialUpdate::new(table);
    update
        .set("full_name", full_name)
        .set("phone", phone)
        .set("bio", bio);
    update.execute(pool, id).await
}

/// Number of students assigned to a client
pub async fn team_size(pool: &SqlitePool, client_id: &str) -> Result<i64> {
    Ok(sqlx::query_scalar("SELECT COUNT(*) FROM client_assignments WHERE client_id = ?")
        .bind(client_id)
        .fetch_one(pool)
        .await?)
}

/// Clients a student is assigned to
pub async fn student_clients(pool: &SqlitePool, student_id: &str) -> Result<Vec<NamedRef>> {
    Ok(sqlx::query_as(
        r#"
        SELECT c.id, c.name FROM client_assignments ca
        JOIN clients c ON c.id = ca.client_id
        WHERE ca.student_id = ?
        ORDER BY c.name
        "#,
    )
    .bind(student_id)
    .fetch_all(pool)
    .await?)
}

/// Directors of the named clinic
pub async fn directors_of_clinic(pool: &SqlitePool, clinic: &str) -> Result<Vec<NamedRef>> {
    Ok(sqlx::query_as(
        r#"
        SELECT d.id, d.full_name AS name FROM directors d
        WHERE d.clinic = ?
        UNION
        SELECT d.id, d.full_name AS name FROM directors d
        JOIN clinic_directors cd ON cd.director_id = d.id
        JOIN clinics c ON c.id = cd.clinic_id
        WHERE c.name = ?
        ORDER BY name
        "#,
    )
    .bind(clinic)
    .bind(clinic)
    .fetch_all(pool)
    .await?)
}

/// Directors assigned to a client
pub async fn client_directors(pool: &SqlitePool, client_id: &str) -> Result<Vec<PrimaryLink>> {
    Ok(sqlx::query_as(
        r#"
        SELECT d.id, d.full_name AS name, cd.is_primary FROM client_directors cd
        JOIN directors d ON d.id = cd.director_id
        WHERE cd.client_id = ?
        ORDER BY cd.is_primary DESC, d.full_name
        "#,
    )
    .bind(client_id)
    .fetch_all(pool)
    .await?)
}

/// Clients a director is assigned to
pub async fn director_clients(pool: &SqlitePool, director_id: &str) -> Result<Vec<PrimaryLink>> {
    Ok(sqlx::query_as(
        r#"
        SELECT c.id, c.name, cd.is_primary FROM client_directors cd
        JOIN clients c ON c.id = cd.client_id
        WHERE cd.director_id = ?
        ORDER BY c.name
        "#,
    )
    .bind(director_id)
    .fetch_all(pool)
    .await?)
}

/// Students on a client team
pub async fn client_team(pool: &SqlitePool, client_id: &str) -> Result<Vec<TeamMember>> {
    Ok(sqlx::query_as(
        r#"
        SELECT s.id, s.full_name AS name, s.clinic, ca.role, s.is_team_leader
        FROM client_assignments ca
        JOIN students s ON s.id = ca.student_id
        WHERE ca.client_id = ?
        ORDER BY s.is_team_leader DESC, s.full_name
        "#,
    )
    .bind(client_id)
    .fetch_all(pool)
    .await?)
}

/// Rows of `v_complete_mapping` for a client, optionally for one semester
pub async fn mapping_for_client(
    pool: &SqlitePool,
    client_id: &str,
    semester: Option<&str>,
) -> Result<Vec<MappingRow>> {
    Ok(sqlx::query_as(
        r#"
        SELECT * FROM v_complete_mapping
        WHERE client_id = ? AND (? IS NULL OR semester = ?)
        ORDER BY student_name
        "#,
    )
    .bind(client_id)
    .bind(semester)
    .bind(semester)
    .fetch_all(pool)
    .await?)
}

/// First mapping row linking a student to a client
pub async fn mapping_for_pair(
    pool: &SqlitePool,
    student_id: &str,
    client_id: &str,
) -> Result<Option<MappingRow>> {
    Ok(sqlx::query_as(
        "SELECT * FROM v_complete_mapping WHERE student_id = ? AND client_id = ? LIMIT 1",
    )
    .bind(student_id)
    .bind(client_id)
    .fetch_optional(pool)
    .await?)
}
