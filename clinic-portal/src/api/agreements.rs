//! Onboarding agreements

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    Json,
};
use clinic_common::db::models::SignedAgreement;
use clinic_common::time::now_rfc3339;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::db::agreements::{self, NewAgreement};
use crate::error::{required, ApiResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgreementQuery {
    pub user_email: Option<String>,
    pub user_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AgreementList {
    pub agreements: Vec<SignedAgreement>,
}

/// GET /api/agreements
pub async fn list_agreements(
    State(state): State<AppState>,
    query: Result<Query<AgreementQuery>, QueryRejection>,
) -> ApiResult<Json<AgreementList>> {
    let Query(query) = query?;
    let agreements = agreements::list(
        &state.db,
        query.user_email.as_deref().filter(|s| !s.is_empty()),
        query.user_type.as_deref().filter(|s| !s.is_empty()),
    )
    .await?;

    Ok(Json(AgreementList { agreements }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignAgreement {
    pub agreement_type: Option<String>,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
    pub user_type: Option<String>,
    pub signature: Option<String>,
    pub signed_at: Option<String>,
    pub program_name: Option<String>,
    pub client_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AgreementResponse {
    pub success: bool,
    pub agreement: SignedAgreement,
}

/// POST /api/agreements
///
/// Signing the same agreement type twice replaces the earlier signature.
pub async fn sign_agreement(
    State(state): State<AppState>,
    body: Result<Json<SignAgreement>, JsonRejection>,
) -> ApiResult<Json<AgreementResponse>> {
    let Json(body) = body?;

    let agreement = NewAgreement {
        agreement_type: required(body.agreement_type, "agreementType")?,
        user_email: required(body.user_email, "userEmail")?,
        signature: required(body.signature, "signature")?,
        user_name: body.user_name,
        user_type: body.user_type,
        signed_at: body
            .signed_at
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(now_rfc3339),
        program_name: body.program_name,
        client_name: body.client_name,
    };
    let agreement = agreements::sign(&state.db, &agreement).await?;
    info!(
        "{} signed the {} agreement",
        agreement.user_email, agreement.agreement_type
    );

    Ok(Json(AgreementResponse {
        success: true,
        agreement,
    }))
}
