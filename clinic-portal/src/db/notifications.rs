//! Triage inbox queries
//!
//! Directors read the whole feed; students see rows targeted at `students`
//! that are addressed to them, to their clinic, or to everyone.

use clinic_common::db::models::Notification;
use clinic_common::retry::retry_on_lock;
use clinic_common::time::now_rfc3339;
use clinic_common::Result;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use super::{new_id, PartialUpdate};

/// Audience value for student-facing rows
pub const STUDENTS: &str = "students";
/// Kind of a program-wide announcement
pub const ANNOUNCEMENT: &str = "announcement";

const FEED_LIMIT: i64 = 50;
const STUDENT_FEED_LIMIT: i64 = 20;

#[derive(Debug, Clone)]
pub struct NewNotification {
    pub kind: String,
    pub title: String,
    pub message: String,
    pub clinic: Option<String>,
    pub clinic_id: Option<String>,
    pub student_id: Option<String>,
    pub target_audience: String,
    pub created_by: Option<String>,
    pub created_by_id: Option<String>,
}

/// Latest notifications, optionally for one clinic
pub async fn list(pool: &SqlitePool, clinic: Option<&str>) -> Result<Vec<Notification>> {
    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT * FROM notifications WHERE 1 = 1");
    if let Some(clinic) = clinic {
        qb.push(" AND clinic = ");
        qb.push_bind(clinic);
    }
    qb.push(" ORDER BY created_at DESC, rowid DESC LIMIT ");
    qb.push_bind(FEED_LIMIT);

    Ok(qb.build_query_as().fetch_all(pool).await?)
}

/// Student-targeted notifications visible to a student and/or clinic
pub async fn for_students(
    pool: &SqlitePool,
    student_id: Option<&str>,
    clinic_id: Option<&str>,
) -> Result<Vec<Notification>> {
    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT * FROM notifications WHERE target_audience = ");
    qb.push_bind(STUDENTS);

    match (student_id, clinic_id) {
        (Some(student_id), Some(clinic_id)) => {
            qb.push(" AND (student_id = ");
            qb.push_bind(student_id);
            qb.push(" OR student_id IS NULL OR clinic_id = ");
            qb.push_bind(clinic_id);
            qb.push(")");
        }
        (Some(student_id), None) => {
            qb.push(" AND (student_id = ");
            qb.push_bind(student_id);
            qb.push(" OR student_id IS NULL)");
        }
        (None, Some(clinic_id)) => {
            qb.push(" AND (clinic_id = ");
            qb.push_bind(clinic_id);
            qb.push(" OR clinic_id IS NULL)");
        }
        (None, None) => {}
    }
    qb.push(" ORDER BY created_at DESC, rowid DESC LIMIT ");
    qb.push_bind(STUDENT_FEED_LIMIT);

    Ok(qb.build_query_as().fetch_all(pool).await?)
}

/// Announcements posted to students, newest first
pub async fn announcements(pool: &SqlitePool) -> Result<Vec<Notification>> {
    Ok(sqlx::query_as(
        r#"
        SELECT * FROM notifications
        WHERE type = ? AND target_audience = ?
        ORDER BY created_at DESC, rowid DESC
        LIMIT ?
        "#,
    )
    .bind(ANNOUNCEMENT)
    .bind(STUDENTS)
    .bind(FEED_LIMIT)
    .fetch_all(pool)
    .await?)
}

pub async fn insert(pool: &SqlitePool, notification: &NewNotification) -> Result<Notification> {
    let id = new_id();
    let created_at = now_rfc3339();

    retry_on_lock("insert_notification", || async {
        let row: Notification = sqlx::query_as(
            r#"
            INSERT INTO notifications (
                id, type, title, message, clinic, clinic_id, student_id,
                target_audience, created_by, created_by_id, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(&notification.kind)
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(&notification.clinic)
        .bind(&notification.clinic_id)
        .bind(&notification.student_id)
        .bind(&notification.target_audience)
        .bind(&notification.created_by)
        .bind(&notification.created_by_id)
        .bind(&created_at)
        .fetch_one(pool)
        .await?;

        Ok(row)
    })
    .await
}

/// Mark a notification read or unread; returns rows changed (0 = unknown id)
pub async fn set_read(pool: &SqlitePool, id: &str, is_read: bool) -> Result<u64> {
    let mut update = PartialUpdate::without_timestamp("notifications");
    update.set("is_read", Some(is_read));
    update.execute(pool, id).await
}

/// Clinic names keyed by id, for the ids given
pub async fn clinic_names(pool: &SqlitePool, ids: &[&str]) -> Result<Vec<(String, String)>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT id, name FROM clinics WHERE id IN (");
    let mut separated = qb.separated(", ");
    for id in ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(")");

    Ok(qb.build_query_as().fetch_all(pool).await?)
}
