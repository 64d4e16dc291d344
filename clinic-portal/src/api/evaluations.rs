//! Director evaluations of student deliverables

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    Json,
};
use clinic_common::db::models::Evaluation;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::db::deliverables::{self, EvaluationInput};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

const MAX_DIRECTOR_NAME: usize = 255;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationQuery {
    pub document_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EvaluationList {
    pub evaluations: Vec<Evaluation>,
}

/// GET /api/evaluations
pub async fn list_evaluations(
    State(state): State<AppState>,
    query: Result<Query<EvaluationQuery>, QueryRejection>,
) -> ApiResult<Json<EvaluationList>> {
    let Query(query) = query?;
    let document_id = query
        .document_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Document ID is required".to_string()))?;

    let evaluations = deliverables::evaluations_for(&state.db, &document_id).await?;
    Ok(Json(EvaluationList { evaluations }))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitEvaluation {
    pub document_id: Option<String>,
    pub director_name: Option<String>,
    pub question1_rating: Option<i64>,
    pub question2_rating: Option<i64>,
    pub question3_rating: Option<i64>,
    pub question4_rating: Option<i64>,
    pub question5_rating: Option<i64>,
    pub question1_notes: Option<String>,
    pub question2_notes: Option<String>,
    pub question3_notes: Option<String>,
    pub question4_notes: Option<String>,
    pub question5_notes: Option<String>,
    pub additional_comments: Option<String>,
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl SubmitEvaluation {
    /// Check the submission and shape it for storage
    fn into_input(self) -> ApiResult<EvaluationInput> {
        let (Some(document_id), Some(director_name)) =
            (trimmed(self.document_id), trimmed(self.director_name))
        else {
            return Err(ApiError::BadRequest(
                "Document ID and director name are required".to_string(),
            ));
        };
        if director_name.chars().count() > MAX_DIRECTOR_NAME {
            return Err(ApiError::BadRequest("Invalid director name".to_string()));
        }

        let ratings = [
            self.question1_rating,
            self.question2_rating,
            self.question3_rating,
            self.question4_rating,
            self.question5_rating,
        ];
        if ratings.iter().flatten().any(|r| !(1..=5).contains(r)) {
            return Err(ApiError::BadRequest(
                "Ratings must be between 1 and 5".to_string(),
            ));
        }

        Ok(EvaluationInput {
            document_id,
            director_name,
            ratings,
            notes: [
                trimmed(self.question1_notes),
                trimmed(self.question2_notes),
                trimmed(self.question3_notes),
                trimmed(self.question4_notes),
                trimmed(self.question5_notes),
            ],
            additional_comments: trimmed(self.additional_comments),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct EvaluationResponse {
    pub evaluation: Evaluation,
}

/// POST /api/evaluations
///
/// A director evaluating the same document again replaces their earlier
/// evaluation.
pub async fn submit_evaluation(
    State(state): State<AppState>,
    body: Result<Json<SubmitEvaluation>, JsonRejection>,
) -> ApiResult<Json<EvaluationResponse>> {
    let Json(body) = body?;
    let input = body.into_input()?;

    if deliverables::find_document(&state.db, &input.document_id)
        .await?
        .is_none()
    {
        return Err(ApiError::NotFound("Document not found".to_string()));
    }

    let evaluation = deliverables::upsert_evaluation(&state.db, &input).await?;
    info!(
        "Evaluation of {} by {} saved",
        evaluation.document_id, evaluation.director_name
    );

    Ok(Json(EvaluationResponse { evaluation }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submission() -> SubmitEvaluation {
        SubmitEvaluation {
            document_id: Some("doc-1".to_string()),
            director_name: Some("  Dana Director ".to_string()),
            question1_rating: Some(4),
            question3_notes: Some("   ".to_string()),
            question5_notes: Some(" Clear plan ".to_string()),
            ..SubmitEvaluation::default()
        }
    }

    #[test]
    fn test_into_input_trims_and_keeps_ratings() {
        let input = submission().into_input().unwrap();
        assert_eq!(input.director_name, "Dana Director");
        assert_eq!(input.ratings, [Some(4), None, None, None, None]);
        assert_eq!(input.notes[2], None);
        assert_eq!(input.notes[4].as_deref(), Some("Clear plan"));
    }

    #[test]
    fn test_into_input_rejects_out_of_range_ratings() {
        for bad in [0, 6, -1] {
            let mut body = submission();
            body.question2_rating = Some(bad);
            assert!(matches!(body.into_input(), Err(ApiError::BadRequest(_))));
        }
    }

    #[test]
    fn test_into_input_requires_ids_and_bounded_name() {
        let mut body = submission();
        body.director_name = Some(" ".to_string());
        assert!(matches!(body.into_input(), Err(ApiError::BadRequest(_))));

        let mut body = submission();
        body.director_name = Some("x".repeat(256));
        match body.into_input() {
            Err(ApiError::BadRequest(msg)) => assert_eq!(msg, "Invalid director name"),
            other => panic!("expected bad request, got {:?}", other.map(|i| i.director_name)),
        }
    }
}
