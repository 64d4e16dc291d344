//! Client-facing records: deliverables with their reviews, client-uploaded
//! documents and messages

use clinic_common::db::models::{ClientDocument, ClientMessage, Document, DocumentReview};
use clinic_common::retry::retry_on_lock;
use clinic_common::Result;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use super::new_id;

#[derive(Debug, Clone)]
pub struct NewClientDocument {
    pub client_id: Option<String>,
    pub file_name: String,
    pub file_url: String,
    pub file_type: Option<String>,
    pub description: Option<String>,
    pub uploaded_by_name: Option<String>,
    pub uploaded_by_email: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewClientMessage {
    pub client_id: Option<String>,
    pub subject: Option<String>,
    pub message: String,
    pub sender_name: Option<String>,
    pub sender_email: Option<String>,
    pub sender_type: Option<String>,
}

/// Deliverables uploaded for a client, newest first
pub async fn documents_for_client(pool: &SqlitePool, client_id: &str) -> Result<Vec<Document>> {
    Ok(sqlx::query_as("SELECT * FROM documents WHERE client_id = ? ORDER BY uploaded_at DESC")
        .bind(client_id)
        .fetch_all(pool)
        .await?)
}

pub async fn reviews_for(pool: &SqlitePool, document_id: &str) -> Result<Vec<DocumentReview>> {
    Ok(sqlx::query_as("SELECT * FROM document_reviews WHERE document_id = ? ORDER BY created_at")
        .bind(document_id)
        .fetch_all(pool)
        .await?)
}

/// Client-uploaded documents, optionally narrowed to a client or uploader
pub async fn list_client_documents(
    pool: &SqlitePool,
    client_id: Option<&str>,
    uploaded_by_email: Option<&str>,
) -> Result<Vec<ClientDocument>> {
    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT * FROM client_documents WHERE 1 = 1");
    if let Some(client_id) = client_id {
        qb.push(" AND client_id = ");
        qb.push_bind(client_id);
    }
    if let Some(email) = uploaded_by_email {
        qb.push(" AND uploaded_by_email = ");
        qb.push_bind(email);
    }
    qb.push(" ORDER BY uploaded_at DESC");

    Ok(qb.build_query_as().fetch_all(pool).await?)
}

pub async fn insert_client_document(
    pool: &SqlitePool,
    document: &NewClientDocument,
) -> Result<ClientDocument> {
    let id = new_id();

    retry_on_lock("insert_client_document", || async {
        let row: ClientDocument = sqlx::query_as(
            r#"
            INSERT INTO client_documents (
                id, client_id, file_name, file_url, file_type, description,
                uploaded_by_name, uploaded_by_email
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(&document.client_id)
        .bind(&document.file_name)
        .bind(&document.file_url)
        .bind(&document.file_type)
        .bind(&document.description)
        .bind(&document.uploaded_by_name)
        .bind(&document.uploaded_by_email)
        .fetch_one(pool)
        .await?;

        Ok(row)
    })
    .await
}

/// Messages, newest first, optionally for one client
pub async fn list_messages(pool: &SqlitePool, client_id: Option<&str>) -> Result<Vec<ClientMessage>> {
    Ok(sqlx::query_as(
        "SELECT * FROM client_messages WHERE ? IS NULL OR client_id = ? ORDER BY created_at DESC",
    )
    .bind(client_id)
    .bind(client_id)
    .fetch_all(pool)
    .await?)
}

pub async fn insert_message(pool: &SqlitePool, message: &NewClientMessage) -> Result<ClientMessage> {
    let id = new_id();

    retry_on_lock("insert_client_message", || async {
        let row: ClientMessage = sqlx::query_as(
            r#"
            INSERT INTO client_messages (
                id, client_id, subject, message, sender_name, sender_email, sender_type
            )
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(&message.client_id)
        .bind(&message.subject)
        .bind(&message.message)
        .bind(&message.sender_name)
        .bind(&message.sender_email)
        .bind(&message.sender_type)
        .fetch_one(pool)
        .await?;

        Ok(row)
    })
    .await
}
