//! Student deliverables and the directors' evaluations of them
//!
//! One evaluation per `(document_id, director_name)`; evaluating again
//! replaces the ratings and notes.

use clinic_common::db::models::{Document, Evaluation};
use clinic_common::retry::retry_on_lock;
use clinic_common::time::now_rfc3339;
use clinic_common::Result;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use super::{new_id, PartialUpdate};

/// A document record ready to be stored
#[derive(Debug, Clone, Default)]
pub struct NewDocument {
    pub client_id: Option<String>,
    pub client_name: Option<String>,
    pub student_id: Option<String>,
    pub student_name: Option<String>,
    pub clinic: Option<String>,
    pub clinic_id: Option<String>,
    pub clinic_director_id: Option<String>,
    pub client_director_id: Option<String>,
    pub file_name: String,
    pub file_url: String,
    pub file_type: Option<String>,
    pub file_size: Option<i64>,
    pub submission_type: Option<String>,
    pub semester_id: Option<String>,
    pub description: Option<String>,
}

/// Ratings (1-5) and notes for the five rubric questions
#[derive(Debug, Clone, Default)]
pub struct EvaluationInput {
    pub document_id: String,
    pub director_name: String,
    pub ratings: [Option<i64>; 5],
    pub notes: [Option<String>; 5],
    pub additional_comments: Option<String>,
}

/// Documents newest first, optionally for one client name
pub async fn list_documents(pool: &SqlitePool, client_name: Option<&str>) -> Result<Vec<Document>> {
    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT * FROM documents WHERE 1 = 1");
    if let Some(name) = client_name {
        qb.push(" AND client_name = ");
        qb.push_bind(name);
    }
    qb.push(" ORDER BY uploaded_at DESC");

    Ok(qb.build_query_as().fetch_all(pool).await?)
}

pub async fn find_document(pool: &SqlitePool, id: &str) -> Result<Option<Document>> {
    Ok(sqlx::query_as("SELECT * FROM documents WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?)
}

pub async fn insert_document(pool: &SqlitePool, document: &NewDocument) -> Result<Document> {
    let id = new_id();
    let uploaded_at = now_rfc3339();

    retry_on_lock("insert_document", || async {
        let row: Document = sqlx::query_as(
            r#"
            INSERT INTO documents (
                id, client_id, client_name, student_id, student_name,
                clinic, clinic_id, clinic_director_id, client_director_id,
                file_name, file_url, file_type, file_size, submission_type,
                semester_id, description, uploaded_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(&document.client_id)
        .bind(&document.client_name)
        .bind(&document.student_id)
        .bind(&document.student_name)
        .bind(&document.clinic)
        .bind(&document.clinic_id)
        .bind(&document.clinic_director_id)
        .bind(&document.client_director_id)
        .bind(&document.file_name)
        .bind(&document.file_url)
        .bind(&document.file_type)
        .bind(document.file_size)
        .bind(&document.submission_type)
        .bind(&document.semester_id)
        .bind(&document.description)
        .bind(&uploaded_at)
        .fetch_one(pool)
        .await?;

        Ok(row)
    })
    .await
}

/// Apply a partial update and return the refreshed document (`None` = unknown id)
pub async fn update_document(
    pool: &SqlitePool,
    id: &str,
    update: &PartialUpdate,
) -> Result<Option<Document>> {
    if update.execute(pool, id).await? == 0 {
        return Ok(None);
    }
    find_document(pool, id).await
}

/// Delete a document; its evaluations and reviews go with it
pub async fn delete_document(pool: &SqlitePool, id: &str) -> Result<u64> {
    retry_on_lock("delete_document", || async {
        let result = sqlx::query("DELETE FROM documents WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    })
    .await
}

/// Evaluations of a document, newest first
pub async fn evaluations_for(pool: &SqlitePool, document_id: &str) -> Result<Vec<Evaluation>> {
    Ok(sqlx::query_as("SELECT * FROM evaluations WHERE document_id = ? ORDER BY created_at DESC")
        .bind(document_id)
        .fetch_all(pool)
        .await?)
}

/// Record a director's evaluation, replacing their earlier one
pub async fn upsert_evaluation(pool: &SqlitePool, input: &EvaluationInput) -> Result<Evaluation> {
    let id = new_id();
    let now = now_rfc3339();

    retry_on_lock("upsert_evaluation", || async {
        let row: Evaluation = sqlx::query_as(
            r#"
            INSERT INTO evaluations (
                id, document_id, director_name,
                question_1_rating, question_2_rating, question_3_rating,
                question_4_rating, question_5_rating,
                question_1_notes, question_2_notes, question_3_notes,
                question_4_notes, question_5_notes,
                additional_comments, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (document_id, director_name) DO UPDATE SET
                question_1_rating = excluded.question_1_rating,
                question_2_rating = excluded.question_2_rating,
                question_3_rating = excluded.question_3_rating,
                question_4_rating = excluded.question_4_rating,
                question_5_rating = excluded.question_5_rating,
                question_1_notes = excluded.question_1_notes,
                question_2_notes = excluded.question_2_notes,
                question_3_notes = excluded.question_3_notes,
                question_4_notes = excluded.question_4_notes,
                question_5_notes = excluded.question_5_notes,
                additional_comments = excluded.additional_comments,
                updated_at = excluded.updated_at
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(&input.document_id)
        .bind(&input.director_name)
        .bind(input.ratings[0])
        .bind(input.ratings[1])
        .bind(input.ratings[2])
        .bind(input.ratings[3])
        .bind(input.ratings[4])
        .bind(&input.notes[0])
        .bind(&input.notes[1])
        .bind(&input.notes[2])
        .bind(&input.notes[3])
        .bind(&input.notes[4])
        .bind(&input.additional_comments)
        .bind(&now)
        .bind(&now)
        .fetch_one(pool)
        .await?;

        Ok(row)
    })
    .await
}
