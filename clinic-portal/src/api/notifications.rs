//! Director triage inbox, student notifications and announcements

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};
use clinic_common::db::models::Notification;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::db::notifications::{self, NewNotification, ANNOUNCEMENT, STUDENTS};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

const DEFAULT_POSTER: &str = "Program Director";
const IMPORTANT_PREFIX: &str = "[Important] ";

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[derive(Debug, Deserialize)]
pub struct NotificationQuery {
    pub clinic: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct NotificationList {
    pub notifications: Vec<Notification>,
}

/// GET /api/notifications
pub async fn list_notifications(
    State(state): State<AppState>,
    query: Result<Query<NotificationQuery>, QueryRejection>,
) -> ApiResult<Json<NotificationList>> {
    let Query(query) = query?;
    let clinic = query.clinic.as_deref().filter(|c| *c != "all" && !c.is_empty());
    let notifications = notifications::list(&state.db, clinic).await?;
    Ok(Json(NotificationList { notifications }))
}

#[derive(Debug, Deserialize)]
pub struct MarkRead {
    pub is_read: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct Updated {
    pub success: bool,
}

/// PATCH /api/notifications/:id
pub async fn mark_read(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<MarkRead>, JsonRejection>,
) -> ApiResult<Json<Updated>> {
    let Json(body) = body?;
    let is_read = body
        .is_read
        .ok_or_else(|| ApiError::BadRequest("is_read is required".to_string()))?;

    if notifications::set_read(&state.db, &id, is_read).await? == 0 {
        return Err(ApiError::NotFound("Notification not found".to_string()));
    }
    Ok(Json(Updated { success: true }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentFeedQuery {
    pub student_id: Option<String>,
    pub clinic_id: Option<String>,
}

/// GET /api/student-notifications
pub async fn student_notifications(
    State(state): State<AppState>,
    query: Result<Query<StudentFeedQuery>, QueryRejection>,
) -> ApiResult<Json<NotificationList>> {
    let Query(query) = query?;
    let student_id = present(query.student_id);
    let clinic_id = present(query.clinic_id);

    let notifications =
        notifications::for_students(&state.db, student_id.as_deref(), clinic_id.as_deref())
            .await?;
    Ok(Json(NotificationList { notifications }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotifyStudents {
    pub student_id: Option<String>,
    pub clinic_id: Option<String>,
    pub title: Option<String>,
    pub message: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub created_by: Option<String>,
    pub created_by_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct NotificationCreated {
    pub success: bool,
    pub notification: Notification,
}

/// POST /api/student-notifications
///
/// No student id addresses the whole clinic (or everyone, without a clinic).
pub async fn notify_students(
    State(state): State<AppState>,
    body: Result<Json<NotifyStudents>, JsonRejection>,
) -> ApiResult<Json<NotificationCreated>> {
    let Json(body) = body?;
    let (Some(title), Some(message)) = (present(body.title), present(body.message)) else {
        return Err(ApiError::BadRequest("Title and message are required".to_string()));
    };

    let notification = NewNotification {
        kind: present(body.kind).unwrap_or_else(|| ANNOUNCEMENT.to_string()),
        title,
        message,
        clinic: None,
        clinic_id: present(body.clinic_id),
        student_id: present(body.student_id),
        target_audience: STUDENTS.to_string(),
        created_by: present(body.created_by),
        created_by_id: present(body.created_by_id),
    };
    let notification = notifications::insert(&state.db, &notification).await?;
    info!(
        "Student notification {} ({}) posted",
        notification.id, notification.kind
    );

    Ok(Json(NotificationCreated {
        success: true,
        notification,
    }))
}

/// An announcement as the student dashboard shows it
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Announcement {
    pub id: String,
    pub title: String,
    pub content: String,
    pub posted_by: String,
    pub posted_at: String,
    pub priority: String,
    pub clinic_id: Option<String>,
    pub clinic_name: Option<String>,
}

/// `high` when the title flags the announcement as important
fn priority_of(title: &str) -> &'static str {
    if title.to_lowercase().contains("important") {
        "high"
    } else {
        "normal"
    }
}

#[derive(Debug, Serialize)]
pub struct AnnouncementList {
    pub announcements: Vec<Announcement>,
}

/// GET /api/announcements
pub async fn list_announcements(
    State(state): State<AppState>,
) -> ApiResult<Json<AnnouncementList>> {
    let rows = notifications::announcements(&state.db).await?;

    let mut clinic_ids: Vec<&str> = rows.iter().filter_map(|n| n.clinic_id.as_deref()).collect();
    clinic_ids.sort_unstable();
    clinic_ids.dedup();
    let names = notifications::clinic_names(&state.db, &clinic_ids).await?;
    let name_of = |id: &str| {
        names
            .iter()
            .find(|(clinic_id, _)| clinic_id == id)
            .map(|(_, name)| name.clone())
    };

    let announcements = rows
        .iter()
        .map(|n| Announcement {
            id: n.id.clone(),
            title: n.title.clone(),
            content: n.message.clone(),
            posted_by: n.created_by.clone().unwrap_or_else(|| DEFAULT_POSTER.to_string()),
            posted_at: n.created_at.clone(),
            priority: priority_of(&n.title).to_string(),
            clinic_id: n.clinic_id.clone(),
            clinic_name: n.clinic_id.as_deref().and_then(name_of),
        })
        .collect();

    Ok(Json(AnnouncementList { announcements }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostAnnouncement {
    pub title: Option<String>,
    pub content: Option<String>,
    pub clinic_id: Option<String>,
    pub priority: Option<String>,
    pub posted_by: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AnnouncementCreated {
    pub success: bool,
    pub announcement: Announcement,
}

/// POST /api/announcements
///
/// High priority is stored as an `[Important]` title prefix.
pub async fn post_announcement(
    State(state): State<AppState>,
    body: Result<Json<PostAnnouncement>, JsonRejection>,
) -> ApiResult<Json<AnnouncementCreated>> {
    let Json(body) = body?;
    let (Some(title), Some(content)) = (present(body.title), present(body.content)) else {
        return Err(ApiError::BadRequest("Title and content are required".to_string()));
    };

    let priority = present(body.priority).unwrap_or_else(|| "normal".to_string());
    let stored_title = if priority == "high" {
        format!("{}{}", IMPORTANT_PREFIX, title)
    } else {
        title.clone()
    };

    let clinic_id = present(body.clinic_id);
    let clinic_name = match clinic_id.as_deref() {
        Some(id) => notifications::clinic_names(&state.db, &[id])
            .await?
            .into_iter()
            .next()
            .map(|(_, name)| name),
        None => None,
    };
    let posted_by = present(body.posted_by).unwrap_or_else(|| DEFAULT_POSTER.to_string());

    let row = notifications::insert(
        &state.db,
        &NewNotification {
            kind: ANNOUNCEMENT.to_string(),
            title: stored_title,
            message: content,
            clinic: clinic_name.clone(),
            clinic_id: clinic_id.clone(),
            student_id: None,
            target_audience: STUDENTS.to_string(),
            created_by: Some(posted_by.clone()),
            created_by_id: None,
        },
    )
    .await?;
    info!("Announcement {} posted by {}", row.id, posted_by);

    Ok(Json(AnnouncementCreated {
        success: true,
        announcement: Announcement {
            id: row.id,
            title,
            content: row.message,
            posted_by,
            posted_at: row.created_at,
            priority,
            clinic_id,
            clinic_name,
        },
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_from_title() {
        assert_eq!(priority_of("[Important] Room change"), "high");
        assert_eq!(priority_of("IMPORTANT: deadline moved"), "high");
        assert_eq!(priority_of("Pizza Friday"), "normal");
    }
}
