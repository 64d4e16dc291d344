//! Client question queries

use clinic_common::db::models::ClientQuestion;
use clinic_common::retry::retry_on_lock;
use clinic_common::Result;
use sqlx::SqlitePool;

use super::{new_id, PartialUpdate};

#[derive(Debug, Clone)]
pub struct NewQuestion {
    pub client_id: String,
    pub question: String,
    pub asked_by: String,
    pub asked_by_email: String,
    pub category: String,
}

pub async fn list_for_client(pool: &SqlitePool, client_id: &str) -> Result<Vec<ClientQuestion>> {
    Ok(sqlx::query_as("SELECT * FROM client_questions WHERE client_id = ? ORDER BY created_at DESC")
        .bind(client_id)
        .fetch_all(pool)
        .await?)
}

pub async fn find(pool: &SqlitePool, id: &str) -> Result<Option<ClientQuestion>> {
    Ok(sqlx::query_as("SELECT * FROM client_questions WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?)
}

pub async fn insert(pool: &SqlitePool, question: &NewQuestion) -> Result<ClientQuestion> {
    let id = new_id();

    retry_on_lock("insert_client_question", || async {
        let row: ClientQuestion = sqlx::query_as(
            r#"
            INSERT INTO client_questions (id, client_id, question, asked_by, asked_by_email, category)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(&question.client_id)
        .bind(&question.question)
        .bind(&question.asked_by)
        .bind(&question.asked_by_email)
        .bind(&question.category)
        .fetch_one(pool)
        .await?;

        Ok(row)
    })
    .await
}

/// Apply a partial update and return the refreshed question (`None` = unknown id)
pub async fn update(
    pool: &SqlitePool,
    id: &str,
    update: &PartialUpdate,
) -> Result<Option<ClientQuestion>> {
    if update.execute(pool, id).await? == 0 {
        return Ok(None);
    }
    find(pool, id).await
}
