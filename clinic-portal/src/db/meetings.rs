//! Scheduled client meeting queries

use clinic_common::db::models::ScheduledClientMeeting;
use clinic_common::retry::retry_on_lock;
use clinic_common::Result;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use super::{new_id, PartialUpdate};

/// Optional filters for listing meetings
#[derive(Debug, Clone, Default)]
pub struct MeetingFilter<'a> {
    pub semester_id: Option<&'a str>,
    pub week_number: Option<i64>,
    pub client_id: Option<&'a str>,
    pub director_id: Option<&'a str>,
}

#[derive(Debug, Clone)]
pub struct NewMeeting {
    pub semester_schedule_id: Option<String>,
    pub semester_id: Option<String>,
    pub week_number: i64,
    pub week_label: Option<String>,
    pub week_start: Option<String>,
    pub week_end: Option<String>,
    pub client_name: String,
    pub client_id: Option<String>,
    pub primary_director_id: Option<String>,
    pub start_time: String,
    pub end_time: Option<String>,
    pub minutes: i64,
    pub room_assignment: Option<String>,
    pub zoom_link: Option<String>,
    pub notes: Option<String>,
}

/// Meetings ordered by week then start time
pub async fn list(pool: &SqlitePool, filter: &MeetingFilter<'_>) -> Result<Vec<ScheduledClientMeeting>> {
    let mut qb: QueryBuilder<Sqlite> =
        QueryBuilder::new("SELECT * FROM scheduled_client_meetings WHERE 1 = 1");
    if let Some(semester_id) = filter.semester_id {
        qb.push(" AND semester_id = ");
        qb.push_bind(semester_id);
    }
    if let Some(week_number) = filter.week_number {
        qb.push(" AND week_number = ");
        qb.push_bind(week_number);
    }
    if let Some(client_id) = filter.client_id {
        qb.push(" AND client_id = ");
        qb.push_bind(client_id);
    }
    if let Some(director_id) = filter.director_id {
        qb.push(" AND primary_director_id = ");
        qb.push_bind(director_id);
    }
    qb.push(" ORDER BY week_number, start_time");

    Ok(qb.build_query_as().fetch_all(pool).await?)
}

pub async fn find(pool: &SqlitePool, id: &str) -> Result<Option<ScheduledClientMeeting>> {
    Ok(sqlx::query_as("SELECT * FROM scheduled_client_meetings WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?)
}

/// Other meetings in the same semester week (candidates for a clash)
pub async fn same_week(
    pool: &SqlitePool,
    meeting: &ScheduledClientMeeting,
) -> Result<Vec<ScheduledClientMeeting>> {
    Ok(sqlx::query_as(
        r#"
        SELECT * FROM scheduled_client_meetings
        WHERE week_number = ?
          AND semester_id IS ?
          AND id != ?
        ORDER BY start_time
        "#,
    )
    .bind(meeting.week_number)
    .bind(&meeting.semester_id)
    .bind(&meeting.id)
    .fetch_all(pool)
    .await?)
}

pub async fn insert(pool: &SqlitePool, meeting: &NewMeeting) -> Result<ScheduledClientMeeting> {
    let id = new_id();

    retry_on_lock("insert_client_meeting", || async {
        let row: ScheduledClientMeeting = sqlx::query_as(
            r#"
            INSERT INTO scheduled_client_meetings (
                id, semester_schedule_id, semester_id, week_number, week_label,
                week_start, week_end, client_name, client_id, primary_director_id,
                start_time, end_time, minutes, room_assignment, zoom_link, notes
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(&meeting.semester_schedule_id)
        .bind(&meeting.semester_id)
        .bind(meeting.week_number)
        .bind(&meeting.week_label)
        .bind(&meeting.week_start)
        .bind(&meeting.week_end)
        .bind(&meeting.client_name)
        .bind(&meeting.client_id)
        .bind(&meeting.primary_director_id)
        .bind(&meeting.start_time)
        .bind(&meeting.end_time)
        .bind(meeting.minutes)
        .bind(&meeting.room_assignment)
        .bind(&meeting.zoom_link)
        .bind(&meeting.notes)
        .fetch_one(pool)
        .await?;

        Ok(row)
    })
    .await
}

/// Apply a partial update and return the refreshed meeting (`None` = unknown id)
pub async fn update(
    pool: &SqlitePool,
    id: &str,
    update: &PartialUpdate,
) -> Result<Option<ScheduledClientMeeting>> {
    if update.execute(pool, id).await? == 0 {
        return Ok(None);
    }
    find(pool, id).await
}

pub async fn delete(pool: &SqlitePool, id: &str) -> Result<u64> {
    retry_on_lock("delete_client_meeting", || async {
        let result = sqlx::query("DELETE FROM scheduled_client_meetings WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    })
    .await
}
