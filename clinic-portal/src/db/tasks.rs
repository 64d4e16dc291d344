//! Client task board queries

use clinic_common::db::models::{ClientTask, ClientTaskComment};
use clinic_common::retry::retry_on_lock;
use clinic_common::Result;
use sqlx::SqlitePool;

use super::{new_id, PartialUpdate};

#[derive(Debug, Clone)]
pub struct NewTask {
    pub client_id: String,
    pub title: String,
    pub description: String,
    pub priority: String,
    pub due_date: Option<String>,
    pub assigned_to: Option<String>,
    pub assigned_to_id: Option<String>,
    pub created_by: String,
    pub created_by_type: String,
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub task_id: String,
    pub client_id: Option<String>,
    pub comment_text: String,
    pub author_name: String,
    pub author_email: String,
    pub author_type: String,
}

pub async fn list_for_client(pool: &SqlitePool, client_id: &str) -> Result<Vec<ClientTask>> {
    Ok(sqlx::query_as("SELECT * FROM client_tasks WHERE client_id = ? ORDER BY created_at DESC")
        .bind(client_id)
        .fetch_all(pool)
        .await?)
}

pub async fn find(pool: &SqlitePool, id: &str) -> Result<Option<ClientTask>> {
    Ok(sqlx::query_as("SELECT * FROM client_tasks WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?)
}

pub async fn insert(pool: &SqlitePool, task: &NewTask) -> Result<ClientTask> {
    let id = new_id();

    retry_on_lock("insert_client_task", || async {
        let row: ClientTask = sqlx::query_as(
            r#"
            INSERT INTO client_tasks (
                id, client_id, title, description, priority, due_date,
                assigned_to, assigned_to_id, created_by, created_by_type
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(&task.client_id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(&task.priority)
        .bind(&task.due_date)
        .bind(&task.assigned_to)
        .bind(&task.assigned_to_id)
        .bind(&task.created_by)
        .bind(&task.created_by_type)
        .fetch_one(pool)
        .await?;

        Ok(row)
    })
    .await
}

/// Apply a partial update and return the refreshed task (`None` = unknown id)
pub async fn update(pool: &SqlitePool, id: &str, update: &PartialUpdate) -> Result<Option<ClientTask>> {
    if update.execute(pool, id).await? == 0 {
        return Ok(None);
    }
    find(pool, id).await
}

/// Comments on a task, oldest first
pub async fn comments_for(pool: &SqlitePool, task_id: &str) -> Result<Vec<ClientTaskComment>> {
    Ok(sqlx::query_as("SELECT * FROM client_task_comments WHERE task_id = ? ORDER BY created_at")
        .bind(task_id)
        .fetch_all(pool)
        .await?)
}

pub async fn insert_comment(pool: &SqlitePool, comment: &NewComment) -> Result<ClientTaskComment> {
    let id = new_id();

    retry_on_lock("insert_task_comment", || async {
        let row: ClientTaskComment = sqlx::query_as(
            r#"
            INSERT INTO client_task_comments (
                id, task_id, client_id, comment_text, author_name, author_email, author_type
            )
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(&comment.task_id)
        .bind(&comment.client_id)
        .bind(&comment.comment_text)
        .bind(&comment.author_name)
        .bind(&comment.author_email)
        .bind(&comment.author_type)
        .fetch_one(pool)
        .await?;

        Ok(row)
    })
    .await
}
