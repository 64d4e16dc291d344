//! Client task board and task comments

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    Json,
};
use clinic_common::db::models::{ClientTask, ClientTaskComment};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::db::tasks::{self, NewComment, NewTask};
use crate::db::PartialUpdate;
use crate::error::{required, ApiError, ApiResult};
use crate::AppState;

const PRIORITIES: [&str; 4] = ["low", "medium", "high", "urgent"];

fn missing_fields() -> ApiError {
    ApiError::BadRequest("Missing required fields".to_string())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn check_priority(priority: Option<&str>) -> ApiResult<()> {
    match priority {
        Some(p) if !PRIORITIES.contains(&p) => {
            Err(ApiError::BadRequest(format!("Unknown priority: {}", p)))
        }
        _ => Ok(()),
    }
}

#[derive(Debug, Serialize)]
pub struct TaskWithComments {
    #[serde(flatten)]
    pub task: ClientTask,
    pub comments: Vec<ClientTaskComment>,
}

#[derive(Debug, Serialize)]
pub struct TaskList {
    pub success: bool,
    pub tasks: Vec<TaskWithComments>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskQuery {
    pub client_id: Option<String>,
}

/// GET /api/client-portal/tasks
pub async fn list_tasks(
    State(state): State<AppState>,
    query: Result<Query<TaskQuery>, QueryRejection>,
) -> ApiResult<Json<TaskList>> {
    let Query(query) = query?;
    let client_id = required(query.client_id, "clientId")?;

    let rows = tasks::list_for_client(&state.db, &client_id).await?;
    let mut list = Vec::with_capacity(rows.len());
    for task in rows {
        let comments = tasks::comments_for(&state.db, &task.id).await?;
        list.push(TaskWithComments { task, comments });
    }

    Ok(Json(TaskList {
        success: true,
        tasks: list,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTask {
    pub client_id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub due_date: Option<String>,
    pub assigned_to: Option<String>,
    pub assigned_to_id: Option<String>,
    pub created_by: Option<String>,
    pub created_by_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TaskResponse {
    pub success: bool,
    pub task: ClientTask,
}

/// POST /api/client-portal/tasks
pub async fn create_task(
    State(state): State<AppState>,
    body: Result<Json<CreateTask>, JsonRejection>,
) -> ApiResult<Json<TaskResponse>> {
    let Json(body) = body?;
    let (Some(client_id), Some(title), Some(created_by)) = (
        non_blank(body.client_id),
        non_blank(body.title),
        non_blank(body.created_by),
    ) else {
        return Err(missing_fields());
    };
    let priority = non_blank(body.priority);
    check_priority(priority.as_deref())?;

    let task = NewTask {
        client_id,
        title,
        description: body.description.unwrap_or_default(),
        priority: priority.unwrap_or_else(|| "medium".to_string()),
        due_date: non_blank(body.due_date),
        assigned_to: non_blank(body.assigned_to),
        assigned_to_id: non_blank(body.assigned_to_id),
        created_by,
        created_by_type: non_blank(body.created_by_type).unwrap_or_else(|| "admin".to_string()),
    };
    let task = tasks::insert(&state.db, &task).await?;
    info!("Created task {} for client {}", task.id, task.client_id);

    Ok(Json(TaskResponse { success: true, task }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTask {
    pub task_id: Option<String>,
    pub status: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub due_date: Option<String>,
    /// Name recorded on the status-change comment
    pub updated_by: Option<String>,
    pub updated_by_type: Option<String>,
}

/// PATCH /api/client-portal/tasks
///
/// A status change made with `updatedBy` also leaves a comment on the task.
pub async fn update_task(
    State(state): State<AppState>,
    body: Result<Json<UpdateTask>, JsonRejection>,
) -> ApiResult<Json<TaskResponse>> {
    let Json(body) = body?;
    let task_id = non_blank(body.task_id)
        .ok_or_else(|| ApiError::BadRequest("Task ID required".to_string()))?;
    let status = non_blank(body.status);
    let priority = non_blank(body.priority);
    check_priority(priority.as_deref())?;

    let mut update = PartialUpdate::new("client_tasks");
    update
        .set("status", status.clone())
        .set("title", non_blank(body.title))
        .set("description", body.description)
        .set("priority", priority)
        .set("due_date", body.due_date);

    let task = tasks::update(&state.db, &task_id, &update)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    if let (Some(status), Some(updated_by)) = (status, non_blank(body.updated_by)) {
        let comment = NewComment {
            task_id: task.id.clone(),
            client_id: Some(task.client_id.clone()),
            comment_text: format!("Status changed to \"{}\" by {}", status, updated_by),
            author_name: updated_by,
            author_email: String::new(),
            author_type: non_blank(body.updated_by_type).unwrap_or_else(|| "system".to_string()),
        };
        tasks::insert_comment(&state.db, &comment).await?;
    }

    Ok(Json(TaskResponse { success: true, task }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentQuery {
    pub task_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CommentList {
    pub success: bool,
    pub comments: Vec<ClientTaskComment>,
}

/// GET /api/client-portal/tasks/comments
pub async fn list_comments(
    State(state): State<AppState>,
    query: Result<Query<CommentQuery>, QueryRejection>,
) -> ApiResult<Json<CommentList>> {
    let Query(query) = query?;
    let task_id = non_blank(query.task_id)
        .ok_or_else(|| ApiError::BadRequest("Task ID required".to_string()))?;

    let comments = tasks::comments_for(&state.db, &task_id).await?;
    Ok(Json(CommentList {
        success: true,
        comments,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateComment {
    pub task_id: Option<String>,
    pub client_id: Option<String>,
    pub comment_text: Option<String>,
    pub author_name: Option<String>,
    pub author_email: Option<String>,
    pub author_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CommentResponse {
    pub success: bool,
    pub comment: ClientTaskComment,
}

/// POST /api/client-portal/tasks/comments
pub async fn add_comment(
    State(state): State<AppState>,
    body: Result<Json<CreateComment>, JsonRejection>,
) -> ApiResult<Json<CommentResponse>> {
    let Json(body) = body?;
    let (Some(task_id), Some(comment_text), Some(author_name), Some(author_email)) = (
        non_blank(body.task_id),
        non_blank(body.comment_text),
        non_blank(body.author_name),
        non_blank(body.author_email),
    ) else {
        return Err(missing_fields());
    };

    let task = tasks::find(&state.db, &task_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    let comment = NewComment {
        task_id,
        client_id: non_blank(body.client_id).or(Some(task.client_id)),
        comment_text,
        author_name,
        author_email,
        author_type: non_blank(body.author_type).unwrap_or_else(|| "client".to_string()),
    };
    let comment = tasks::insert_comment(&state.db, &comment).await?;

    Ok(Json(CommentResponse {
        success: true,
        comment,
    }))
}
