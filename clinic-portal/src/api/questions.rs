//! Client questions for the team and their answers

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    Json,
};
use clinic_common::db::models::ClientQuestion;
use clinic_common::time::now_rfc3339;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::db::questions::{self, NewQuestion};
use crate::db::PartialUpdate;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionQuery {
    pub client_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct QuestionList {
    pub success: bool,
    pub questions: Vec<ClientQuestion>,
}

/// GET /api/client-portal/questions
pub async fn list_questions(
    State(state): State<AppState>,
    query: Result<Query<QuestionQuery>, QueryRejection>,
) -> ApiResult<Json<QuestionList>> {
    let Query(query) = query?;
    let client_id = non_blank(query.client_id)
        .ok_or_else(|| ApiError::BadRequest("Client ID required".to_string()))?;

    let questions = questions::list_for_client(&state.db, &client_id).await?;
    Ok(Json(QuestionList {
        success: true,
        questions,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AskQuestion {
    pub client_id: Option<String>,
    pub question: Option<String>,
    pub asked_by: Option<String>,
    pub asked_by_email: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct QuestionResponse {
    pub success: bool,
    pub question: ClientQuestion,
}

/// POST /api/client-portal/questions
pub async fn ask_question(
    State(state): State<AppState>,
    body: Result<Json<AskQuestion>, JsonRejection>,
) -> ApiResult<Json<QuestionResponse>> {
    let Json(body) = body?;
    let (Some(client_id), Some(question), Some(asked_by), Some(asked_by_email)) = (
        non_blank(body.client_id),
        non_blank(body.question),
        non_blank(body.asked_by),
        non_blank(body.asked_by_email),
    ) else {
        return Err(ApiError::BadRequest("Missing required fields".to_string()));
    };

    let question = NewQuestion {
        client_id,
        question,
        asked_by,
        asked_by_email,
        category: non_blank(body.category).unwrap_or_else(|| "general".to_string()),
    };
    let question = questions::insert(&state.db, &question).await?;
    info!("Question {} asked by {}", question.id, question.asked_by);

    Ok(Json(QuestionResponse {
        success: true,
        question,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateQuestion {
    pub question_id: Option<String>,
    pub answer: Option<String>,
    pub answered_by: Option<String>,
    pub status: Option<String>,
}

/// PATCH /api/client-portal/questions
///
/// Supplying an answer stamps `answered_at` and marks the question answered
/// unless an explicit status is given.
pub async fn update_question(
    State(state): State<AppState>,
    body: Result<Json<UpdateQuestion>, JsonRejection>,
) -> ApiResult<Json<QuestionResponse>> {
    let Json(body) = body?;
    let question_id = non_blank(body.question_id)
        .ok_or_else(|| ApiError::BadRequest("Question ID required".to_string()))?;

    let answer = non_blank(body.answer);
    let status = non_blank(body.status)
        .or_else(|| answer.as_ref().map(|_| "answered".to_string()));
    let answered_at = answer.as_ref().map(|_| now_rfc3339());

    let mut update = PartialUpdate::new("client_questions");
    update
        .set("answer", answer)
        .set("answered_by", non_blank(body.answered_by))
        .set("answered_at", answered_at)
        .set("status", status);

    let question = questions::update(&state.db, &question_id, &update)
        .await?
        .ok_or_else(|| ApiError::NotFound("Question not found".to_string()))?;

    Ok(Json(QuestionResponse {
        success: true,
        question,
    }))
}
