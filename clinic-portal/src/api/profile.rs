//! Self-service profile settings for students and directors

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    Json,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::db::people;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct Profile {
    pub id: String,
    pub full_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub bio: Option<String>,
    pub profile_picture_url: Option<String>,
    pub clinic_name: Option<String>,
    pub role: String,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub profile: Profile,
}

fn missing_identity() -> ApiError {
    ApiError::BadRequest("Missing userId or userType".to_string())
}

async fn load_profile(pool: &SqlitePool, user_id: &str, user_type: &str) -> ApiResult<Profile> {
    match user_type {
        "student" => {
            let student = people::find_student(pool, user_id)
                .await?
                .ok_or_else(|| ApiError::NotFound("Student not found".to_string()))?;
            let clinic_name = people::student_clinic_name(pool, &student).await?;
            Ok(Profile {
                id: student.id,
                full_name: student.full_name,
                email: student.email,
                phone: student.phone,
                bio: student.bio,
                profile_picture_url: student.profile_picture_url,
                clinic_name,
                role: "student".to_string(),
            })
        }
        "director" => {
            let director = people::find_director(pool, user_id)
                .await?
                .ok_or_else(|| ApiError::NotFound("Director not found".to_string()))?;
            let clinic_name = people::director_clinic_name(pool, &director.id)
                .await?
                .or(director.clinic);
            Ok(Profile {
                id: director.id,
                full_name: director.full_name,
                email: director.email,
                phone: director.phone,
                bio: director.bio,
                profile_picture_url: director.profile_picture_url,
                clinic_name,
                role: "director".to_string(),
            })
        }
        other => Err(ApiError::BadRequest(format!("Unknown userType: {}", other))),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileQuery {
    pub user_id: Option<String>,
    pub user_type: Option<String>,
}

/// GET /api/settings/profile
pub async fn get_profile(
    State(state): State<AppState>,
    query: Result<Query<ProfileQuery>, QueryRejection>,
) -> ApiResult<Json<ProfileResponse>> {
    let Query(query) = query?;
    let (Some(user_id), Some(user_type)) = (query.user_id, query.user_type) else {
        return Err(missing_identity());
    };

    let profile = load_profile(&state.db, &user_id, &user_type).await?;
    Ok(Json(ProfileResponse { profile }))
}

#[derive(Debug, Deserialize)]
pub struct ProfileUpdate {
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
    #[serde(rename = "userType")]
    pub user_type: Option<String>,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub bio: Option<String>,
}

/// PUT /api/settings/profile
pub async fn update_profile(
    State(state): State<AppState>,
    body: Result<Json<ProfileUpdate>, JsonRejection>,
) -> ApiResult<Json<ProfileResponse>> {
    let Json(body) = body?;
    let (Some(user_id), Some(user_type)) = (body.user_id, body.user_type) else {
        return Err(missing_identity());
    };
    let table = people::profile_table(&user_type)
        .ok_or_else(|| ApiError::BadRequest(format!("Unknown userType: {}", user_type)))?;

    if let Some(name) = body.full_name.as_deref() {
        if name.trim().is_empty() {
            return Err(ApiError::BadRequest("full_name cannot be blank".to_string()));
        }
    }

    let changed =
        people::update_profile(&state.db, table, &user_id, body.full_name, body.phone, body.bio).await?;
    if changed == 0 {
        return Err(ApiError::NotFound("Profile not found".to_string()));
    }

    let profile = load_profile(&state.db, &user_id, &user_type).await?;
    Ok(Json(ProfileResponse { profile }))
}
