//! Semester configuration and week-by-week schedule queries

use clinic_common::agenda::TimeBlock;
use clinic_common::db::models::{Assignment, ScheduleWeek, SemesterConfig};
use clinic_common::retry::retry_on_lock;
use clinic_common::time::now_rfc3339;
use clinic_common::Result;
use sqlx::SqlitePool;

use super::{new_id, PartialUpdate};

/// A schedule week ready to be stored
#[derive(Debug, Clone)]
pub struct NewWeek {
    pub semester_id: Option<String>,
    pub week_number: i64,
    pub week_label: String,
    pub week_start: String,
    pub week_end: String,
    pub session_focus: Option<String>,
    pub activities: Vec<TimeBlock>,
    pub assignments: Vec<Assignment>,
    pub notes: Option<String>,
    pub class_time_minutes: i64,
    pub clinic_time_minutes: i64,
    pub is_break: bool,
    pub room_assignment: Option<String>,
    pub zoom_link: Option<String>,
}

pub async fn find_semester(pool: &SqlitePool, label: &str) -> Result<Option<SemesterConfig>> {
    Ok(sqlx::query_as("SELECT * FROM semester_config WHERE semester = ?")
        .bind(label)
        .fetch_optional(pool)
        .await?)
}

pub async fn active_semester(pool: &SqlitePool) -> Result<Option<SemesterConfig>> {
    Ok(sqlx::query_as(
        "SELECT * FROM semester_config WHERE is_active = 1 ORDER BY created_at DESC LIMIT 1",
    )
    .fetch_optional(pool)
    .await?)
}

/// Semester row for a label, created (inactive) when missing
pub async fn ensure_semester(pool: &SqlitePool, label: &str) -> Result<SemesterConfig> {
    let id = new_id();

    retry_on_lock("ensure_semester", || async {
        sqlx::query("INSERT INTO semester_config (id, semester) VALUES (?, ?) ON CONFLICT (semester) DO NOTHING")
            .bind(&id)
            .bind(label)
            .execute(pool)
            .await?;

        let row: SemesterConfig = sqlx::query_as("SELECT * FROM semester_config WHERE semester = ?")
            .bind(label)
            .fetch_one(pool)
            .await?;
        Ok(row)
    })
    .await
}

/// Weeks ordered by number; `None` lists every semester
pub async fn list_weeks(pool: &SqlitePool, semester_id: Option<&str>) -> Result<Vec<ScheduleWeek>> {
    Ok(sqlx::query_as(
        r#"
        SELECT * FROM semester_schedule
        WHERE ? IS NULL OR semester_id = ?
        ORDER BY week_number, week_start
        "#,
    )
    .bind(semester_id)
    .bind(semester_id)
    .fetch_all(pool)
    .await?)
}

pub async fn find_week(pool: &SqlitePool, id: &str) -> Result<Option<ScheduleWeek>> {
    Ok(sqlx::query_as("SELECT * FROM semester_schedule WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?)
}

pub async fn insert_week(pool: &SqlitePool, week: &NewWeek) -> Result<ScheduleWeek> {
    let id = new_id();
    let activities = serde_json::to_string(&week.activities)?;
    let assignments = serde_json::to_string(&week.assignments)?;

    retry_on_lock("insert_schedule_week", || async {
        let row: ScheduleWeek = sqlx::query_as(
            r#"
            INSERT INTO semester_schedule (
                id, semester_id, week_number, week_label, week_start, week_end,
                session_focus, activities, assignments, notes,
                class_time_minutes, clinic_time_minutes, is_break,
                room_assignment, zoom_link
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(&week.semester_id)
        .bind(week.week_number)
        .bind(&week.week_label)
        .bind(&week.week_start)
        .bind(&week.week_end)
        .bind(&week.session_focus)
        .bind(&activities)
        .bind(&assignments)
        .bind(&week.notes)
        .bind(week.class_time_minutes)
        .bind(week.clinic_time_minutes)
        .bind(week.is_break)
        .bind(&week.room_assignment)
        .bind(&week.zoom_link)
        .fetch_one(pool)
        .await?;

        Ok(row)
    })
    .await
}

/// Apply a partial update and return the refreshed week (`None` = unknown id)
pub async fn update_week(
    pool: &SqlitePool,
    id: &str,
    update: &PartialUpdate,
) -> Result<Option<ScheduleWeek>> {
    if update.execute(pool, id).await? == 0 {
        return Ok(None);
    }
    find_week(pool, id).await
}

/// Replace a week's agenda blocks
pub async fn save_activities(pool: &SqlitePool, id: &str, blocks: &[TimeBlock]) -> Result<u64> {
    let activities = serde_json::to_string(blocks)?;
    let updated_at = now_rfc3339();

    retry_on_lock("save_schedule_activities", || async {
        let result = sqlx::query("UPDATE semester_schedule SET activities = ?, updated_at = ? WHERE id = ?")
            .bind(&activities)
            .bind(&updated_at)
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    })
    .await
}

pub async fn delete_week(pool: &SqlitePool, id: &str) -> Result<u64> {
    retry_on_lock("delete_schedule_week", || async {
        let result = sqlx::query("DELETE FROM semester_schedule WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    })
    .await
}
