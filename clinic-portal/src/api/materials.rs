//! Course material uploads
//!
//! Files are written under `<uploads>/course-materials/` and served from
//! `/files/course-materials/...`; the row stores that public URL.

use std::path::{Component, Path, PathBuf};

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Multipart, Query, State,
    },
    Json,
};
use clinic_common::db::models::CourseMaterial;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::db::materials::{self, NewMaterial};
use crate::error::{required, ApiError, ApiResult};
use crate::{AppState, FILES_PREFIX};

/// Largest accepted upload body
pub const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

const MATERIALS_DIR: &str = "course-materials";

#[derive(Debug, Deserialize)]
pub struct MaterialQuery {
    pub clinic: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MaterialList {
    pub materials: Vec<CourseMaterial>,
}

/// GET /api/course-materials
pub async fn list_materials(
    State(state): State<AppState>,
    query: Result<Query<MaterialQuery>, QueryRejection>,
) -> ApiResult<Json<MaterialList>> {
    let Query(query) = query?;
    let materials =
        materials::list(&state.db, query.clinic.as_deref(), query.category.as_deref()).await?;
    Ok(Json(MaterialList { materials }))
}

/// Reduce a client-supplied file name to one safe path segment
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Map a `/files/...` URL back to a path inside the uploads directory.
///
/// URLs outside the prefix, or that would climb out of it, map to nothing.
pub fn stored_path(uploads_dir: &Path, file_url: &str) -> Option<PathBuf> {
    let relative = file_url.strip_prefix(FILES_PREFIX)?.strip_prefix('/')?;
    let relative = Path::new(relative);
    if relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_)))
    {
        return None;
    }
    Some(uploads_dir.join(relative))
}

#[derive(Debug, Default)]
struct UploadForm {
    file: Option<(String, Option<String>, Vec<u8>)>,
    title: Option<String>,
    description: Option<String>,
    target_clinic: Option<String>,
    category: Option<String>,
    uploaded_by_name: Option<String>,
    uploaded_by_email: Option<String>,
}

async fn read_form(mut multipart: Multipart) -> ApiResult<UploadForm> {
    let mut form = UploadForm::default();

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
        let value = Some(value).filter(|v| !v.trim().is_empty());
        match name.as_str() {
            "title" => form.title = value,
            "description" => form.description = value,
            "targetClinic" => form.target_clinic = value,
            "category" => form.category = value,
            "uploadedByName" => form.uploaded_by_name = value,
            "uploadedByEmail" => form.uploaded_by_email = value,
            _ => {}
        }
    }

    Ok(form)
}

#[derive(Debug, Serialize)]
pub struct MaterialResponse {
    pub material: CourseMaterial,
}

/// POST /api/course-materials (multipart)
pub async fn upload_material(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<Json<MaterialResponse>> {
    let form = read_form(multipart).await?;

    let (file_name, content_type, bytes) = form
        .file
        .ok_or_else(|| ApiError::BadRequest("No file provided".to_string()))?;
    let title = form
        .title
        .ok_or_else(|| ApiError::BadRequest("Title is required".to_string()))?;

    let stored_name = format!(
        "{}-{}",
        chrono::Utc::now().timestamp_millis(),
        sanitize_file_name(&file_name)
    );
    let dir = state.config.uploads_dir.join(MATERIALS_DIR);
    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|e| ApiError::Internal(format!("Upload failed: {}", e)))?;
    let path = dir.join(&stored_name);
    tokio::fs::write(&path, &bytes)
        .await
        .map_err(|e| ApiError::Internal(format!("Upload failed: {}", e)))?;

    let material = NewMaterial {
        title,
        description: form.description,
        file_name,
        file_url: format!("{}/{}/{}", FILES_PREFIX, MATERIALS_DIR, stored_name),
        file_type: content_type,
        file_size: bytes.len() as i64,
        target_clinic: form.target_clinic.unwrap_or_else(|| "all".to_string()),
        category: form.category.unwrap_or_else(|| "resource".to_string()),
        uploaded_by_name: form.uploaded_by_name,
        uploaded_by_email: form.uploaded_by_email,
    };

    match materials::insert(&state.db, &material).await {
        Ok(material) => {
            info!("Stored course material {} at {}", material.id, path.display());
            Ok(Json(MaterialResponse { material }))
        }
        Err(e) => {
            error!("[course-materials] Insert failed, removing {}: {}", path.display(), e);
            if let Err(rm) = tokio::fs::remove_file(&path).await {
                warn!("Could not remove {}: {}", path.display(), rm);
            }
            Err(e.into())
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteMaterial {
    pub id: Option<String>,
    pub file_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Deleted {
    pub success: bool,
}

/// DELETE /api/course-materials
///
/// Removes the row, then the stored file (the one named by `fileUrl`, or the
/// row's own URL).
pub async fn delete_material(
    State(state): State<AppState>,
    body: Result<Json<DeleteMaterial>, JsonRejection>,
) -> ApiResult<Json<Deleted>> {
    let Json(body) = body?;
    let id = required(body.id, "Material ID")?;

    let existing = materials::find(&state.db, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Material not found".to_string()))?;
    materials::delete(&state.db, &id).await?;

    let file_url = body.file_url.unwrap_or(existing.file_url);
    if let Some(path) = stored_path(&state.config.uploads_dir, &file_url) {
        if let Err(e) = tokio::fs::remove_file(&path).await {
            warn!("Could not remove {}: {}", path.display(), e);
        }
    }
    info!("Deleted course material {}", id);

    Ok(Json(Deleted { success: true }))
}
