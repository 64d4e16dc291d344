//! Student deliverable submissions and the shared document list
//!
//! Uploads land under `<uploads>/deliverables/<client>/<submission type>/`
//! and carry the clinic and director ids of the student's assignment, so the
//! right directors see them in their review queue.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Multipart, Path, Query, State,
    },
    Json,
};
use clinic_common::db::models::Document;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use super::materials::{sanitize_file_name, stored_path};
use crate::db::deliverables::{self, NewDocument};
use crate::db::people::{self, ClientLookup};
use crate::db::{schedule, PartialUpdate};
use crate::error::{ApiError, ApiResult};
use crate::{AppState, FILES_PREFIX};

const DELIVERABLES_DIR: &str = "deliverables";

#[derive(Debug, Default)]
struct DeliverableForm {
    file: Option<(String, Option<String>, Vec<u8>)>,
    student_id: Option<String>,
    student_name: Option<String>,
    client_id: Option<String>,
    client_name: Option<String>,
    submission_type: Option<String>,
}

async fn read_form(mut multipart: Multipart) -> ApiResult<DeliverableForm> {
    let mut form = DeliverableForm::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        if name == "file" {
            let file_name = field.file_name().unwrap_or("upload").to_string();
            let content_type = field.content_type().map(str::to_string);
            let bytes = field.bytes().await?;
            form.file = Some((file_name, content_type, bytes.to_vec()));
            continue;
        }

        let value = field.text().await?;
        let value = Some(value.trim().to_string()).filter(|v| !v.is_empty());
        match name.as_str() {
            "studentId" => form.student_id = value,
            "studentName" => form.student_name = value,
            "clientId" => form.client_id = value,
            "clientName" => form.client_name = value,
            "submissionType" => form.submission_type = value,
            _ => {}
        }
    }

    Ok(form)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub success: bool,
    pub url: String,
    pub file_name: String,
    pub file_size: i64,
    pub document_id: String,
    pub clinic: Option<String>,
    pub clinic_director_id: Option<String>,
    pub client_director_id: Option<String>,
}

/// POST /api/upload-deliverable (multipart)
pub async fn upload_deliverable(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    let form = read_form(multipart).await?;

    let (Some((file_name, content_type, bytes)), Some(student_id), Some(client_id), Some(submission_type)) =
        (form.file, form.student_id, form.client_id, form.submission_type)
    else {
        return Err(ApiError::BadRequest("Missing required fields".to_string()));
    };

    if people::find_client(&state.db, ClientLookup::Id(&client_id))
        .await?
        .is_none()
    {
        return Err(ApiError::NotFound("Client not found".to_string()));
    }
    let mapping = people::mapping_for_pair(&state.db, &student_id, &client_id).await?;
    if mapping.is_none() {
        warn!(
            "[upload-deliverable] No assignment links student {} to client {}",
            student_id, client_id
        );
    }
    let semester_id = schedule::find_semester(&state.db, &state.config.default_semester)
        .await?
        .map(|s| s.id);

    let subdir = format!(
        "{}/{}/{}",
        DELIVERABLES_DIR,
        sanitize_file_name(&client_id),
        sanitize_file_name(&submission_type)
    );
    let stored_name = format!(
        "{}_{}",
        chrono::Utc::now().timestamp_millis(),
        sanitize_file_name(&file_name)
    );
    let dir = state.config.uploads_dir.join(&subdir);
    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|e| ApiError::Internal(format!("Upload failed: {}", e)))?;
    let path = dir.join(&stored_name);
    tokio::fs::write(&path, &bytes)
        .await
        .map_err(|e| ApiError::Internal(format!("Upload failed: {}", e)))?;

    let url = format!("{}/{}/{}", FILES_PREFIX, subdir, stored_name);
    let document = NewDocument {
        client_id: Some(client_id),
        client_name: form.client_name,
        student_id: Some(student_id),
        student_name: form.student_name,
        clinic: mapping.as_ref().and_then(|m| m.student_clinic_name.clone()),
        clinic_id: mapping.as_ref().and_then(|m| m.student_clinic_id.clone()),
        clinic_director_id: mapping.as_ref().and_then(|m| m.clinic_director_id.clone()),
        client_director_id: mapping.as_ref().and_then(|m| m.client_director_id.clone()),
        file_name,
        file_url: url.clone(),
        file_type: content_type,
        file_size: Some(bytes.len() as i64),
        submission_type: Some(submission_type),
        semester_id,
        description: None,
    };

    match deliverables::insert_document(&state.db, &document).await {
        Ok(row) => {
            info!("Stored deliverable {} at {}", row.id, path.display());
            Ok(Json(UploadResponse {
                success: true,
                url,
                file_name: row.file_name,
                file_size: row.file_size.unwrap_or_default(),
                document_id: row.id,
                clinic: row.clinic,
                clinic_director_id: row.clinic_director_id,
                client_director_id: row.client_director_id,
            }))
        }
        Err(e) => {
            error!("[upload-deliverable] Insert failed, removing {}: {}", path.display(), e);
            if let Err(rm) = tokio::fs::remove_file(&path).await {
                warn!("Could not remove {}: {}", path.display(), rm);
            }
            Err(e.into())
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DocumentQuery {
    pub client: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DocumentList {
    pub documents: Vec<Document>,
}

/// GET /api/documents
///
/// `client=all` (or no client) lists every document.
pub async fn list_documents(
    State(state): State<AppState>,
    query: Result<Query<DocumentQuery>, QueryRejection>,
) -> ApiResult<Json<DocumentList>> {
    let Query(query) = query?;
    let client = query.client.as_deref().filter(|c| *c != "all" && !c.is_empty());
    let documents = deliverables::list_documents(&state.db, client).await?;
    Ok(Json(DocumentList { documents }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDocument {
    pub student_name: Option<String>,
    pub client_name: Option<String>,
    pub file_url: Option<String>,
    pub file_name: Option<String>,
    pub description: Option<String>,
    pub clinic: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DocumentResponse {
    pub document: Document,
}

/// POST /api/documents
///
/// Records a document already hosted elsewhere.
pub async fn create_document(
    State(state): State<AppState>,
    body: Result<Json<CreateDocument>, JsonRejection>,
) -> ApiResult<Json<DocumentResponse>> {
    let Json(body) = body?;
    let present = |v: Option<String>| v.filter(|s| !s.trim().is_empty());

    let (Some(student_name), Some(client_name), Some(file_url), Some(file_name)) = (
        present(body.student_name),
        present(body.client_name),
        present(body.file_url),
        present(body.file_name),
    ) else {
        return Err(ApiError::BadRequest("Missing required fields".to_string()));
    };

    let document = NewDocument {
        student_name: Some(student_name),
        client_name: Some(client_name),
        file_url,
        file_name,
        description: body.description,
        clinic: body.clinic,
        ..NewDocument::default()
    };
    let document = deliverables::insert_document(&state.db, &document).await?;
    info!("Recorded document {} ({})", document.id, document.file_name);

    Ok(Json(DocumentResponse { document }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDocument {
    pub file_name: Option<String>,
    pub submission_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DocumentUpdated {
    pub success: bool,
    pub data: Document,
}

/// PATCH /api/documents/:id
pub async fn update_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<UpdateDocument>, JsonRejection>,
) -> ApiResult<Json<DocumentUpdated>> {
    let Json(body) = body?;

    let mut update = PartialUpdate::without_timestamp("documents");
    update
        .set("file_name", body.file_name.filter(|n| !n.trim().is_empty()))
        .set("submission_type", body.submission_type);

    let document = if update.is_empty() {
        deliverables::find_document(&state.db, &id).await?
    } else {
        deliverables::update_document(&state.db, &id, &update).await?
    };
    let data = document.ok_or_else(|| ApiError::NotFound("Document not found".to_string()))?;

    Ok(Json(DocumentUpdated { success: true, data }))
}

#[derive(Debug, Serialize)]
pub struct Deleted {
    pub success: bool,
}

/// DELETE /api/documents/:id
///
/// Removes the row, then the stored file when it lives in our uploads.
pub async fn delete_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Deleted>> {
    let existing = deliverables::find_document(&state.db, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Document not found".to_string()))?;
    deliverables::delete_document(&state.db, &id).await?;

    if let Some(path) = stored_path(&state.config.uploads_dir, &existing.file_url) {
        if let Err(e) = tokio::fs::remove_file(&path).await {
            warn!("Could not remove {}: {}", path.display(), e);
        }
    }
    info!("Deleted document {}", id);

    Ok(Json(Deleted { success: true }))
}
