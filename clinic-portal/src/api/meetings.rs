//! Scheduled client meetings
//!
//! Create and update report (but do not reject) other meetings in the same
//! semester week that share a room or the primary director and overlap in
//! time.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    Json,
};
use clinic_common::agenda::{parse_time, ranges_overlap, MINUTES_PER_DAY};
use clinic_common::db::models::ScheduledClientMeeting;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::db::meetings::{self, MeetingFilter, NewMeeting};
use crate::db::PartialUpdate;
use crate::error::{required, ApiError, ApiResult};
use crate::AppState;

/// What two clashing meetings have in common
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SharedResource {
    Room,
    Director,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingConflict {
    pub id: String,
    pub client_name: String,
    pub start_time: String,
    pub shared: SharedResource,
}

/// Start minute and length of a meeting; `None` when the start is unreadable
fn span(meeting: &ScheduledClientMeeting) -> Option<(u32, u32)> {
    let start = parse_time(&meeting.start_time).ok()?;
    let minutes = if meeting.minutes > 0 {
        u32::try_from(meeting.minutes).ok()?
    } else {
        let end = parse_time(meeting.end_time.as_deref()?).ok()?;
        end.checked_sub(start)?
    };
    Some((start, minutes))
}

fn same_room(a: &ScheduledClientMeeting, b: &ScheduledClientMeeting) -> bool {
    match (a.room_assignment.as_deref(), b.room_assignment.as_deref()) {
        (Some(x), Some(y)) => !x.trim().is_empty() && x.trim().eq_ignore_ascii_case(y.trim()),
        _ => false,
    }
}

fn same_director(a: &ScheduledClientMeeting, b: &ScheduledClientMeeting) -> bool {
    matches!(
        (a.primary_director_id.as_deref(), b.primary_director_id.as_deref()),
        (Some(x), Some(y)) if !x.is_empty() && x == y
    )
}

/// Meetings among `others` that clash with `meeting`
pub fn find_meeting_conflicts(
    meeting: &ScheduledClientMeeting,
    others: &[ScheduledClientMeeting],
) -> Vec<MeetingConflict> {
    let Some((start, minutes)) = span(meeting) else {
        return Vec::new();
    };

    others
        .iter()
        .filter(|other| other.id != meeting.id && other.week_number == meeting.week_number)
        .filter_map(|other| {
            let shared = if same_room(meeting, other) {
                SharedResource::Room
            } else if same_director(meeting, other) {
                SharedResource::Director
            } else {
                return None;
            };
            let (other_start, other_minutes) = span(other)?;
            ranges_overlap(start, minutes, other_start, other_minutes).then(|| MeetingConflict {
                id: other.id.clone(),
                client_name: other.client_name.clone(),
                start_time: other.start_time.clone(),
                shared,
            })
        })
        .collect()
}

async fn conflicts_for(pool: &SqlitePool, meeting: &ScheduledClientMeeting) -> ApiResult<Vec<MeetingConflict>> {
    let others = meetings::same_week(pool, meeting).await?;
    let conflicts = find_meeting_conflicts(meeting, &others);
    if !conflicts.is_empty() {
        warn!(
            "Meeting {} ({} week {}) overlaps {} other meeting(s)",
            meeting.id,
            meeting.client_name,
            meeting.week_number,
            conflicts.len()
        );
    }
    Ok(conflicts)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingQuery {
    pub semester_id: Option<String>,
    pub week_number: Option<i64>,
    pub client_id: Option<String>,
    pub director_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MeetingList {
    pub meetings: Vec<ScheduledClientMeeting>,
}

/// GET /api/scheduled-client-meetings
pub async fn list_meetings(
    State(state): State<AppState>,
    query: Result<Query<MeetingQuery>, QueryRejection>,
) -> ApiResult<Json<MeetingList>> {
    let Query(query) = query?;
    let filter = MeetingFilter {
        semester_id: query.semester_id.as_deref(),
        week_number: query.week_number,
        client_id: query.client_id.as_deref(),
        director_id: query.director_id.as_deref(),
    };
    let meetings = meetings::list(&state.db, &filter).await?;
    Ok(Json(MeetingList { meetings }))
}

#[derive(Debug, Deserialize)]
pub struct MeetingBody {
    pub id: Option<String>,
    pub semester_schedule_id: Option<String>,
    pub semester_id: Option<String>,
    pub week_number: Option<i64>,
    pub week_label: Option<String>,
    pub week_start: Option<String>,
    pub week_end: Option<String>,
    pub client_name: Option<String>,
    pub client_id: Option<String>,
    pub primary_director_id: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub minutes: Option<i64>,
    pub room_assignment: Option<String>,
    pub zoom_link: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MeetingResponse {
    pub meeting: ScheduledClientMeeting,
    pub conflicts: Vec<MeetingConflict>,
}

fn check_times(start_time: Option<&str>, end_time: Option<&str>, minutes: Option<i64>) -> ApiResult<()> {
    if let Some(start) = start_time {
        parse_time(start)?;
    }
    if let Some(end) = end_time {
        parse_time(end)?;
    }
    if minutes.is_some_and(|m| !(1..=i64::from(MINUTES_PER_DAY)).contains(&m)) {
        return Err(ApiError::BadRequest(format!(
            "minutes must be between 1 and {}",
            MINUTES_PER_DAY
        )));
    }
    Ok(())
}

/// POST /api/scheduled-client-meetings
pub async fn create_meeting(
    State(state): State<AppState>,
    body: Result<Json<MeetingBody>, JsonRejection>,
) -> ApiResult<Json<MeetingResponse>> {
    let Json(body) = body?;

    let week_number = body
        .week_number
        .ok_or_else(|| ApiError::BadRequest("week_number is required".to_string()))?;
    let client_name = required(body.client_name, "client_name")?;
    let start_time = required(body.start_time, "start_time")?;
    check_times(Some(&start_time), body.end_time.as_deref(), body.minutes)?;

    let minutes = match (body.minutes, body.end_time.as_deref()) {
        (Some(m), _) => m,
        (None, Some(end)) => {
            let span = i64::from(parse_time(end)?) - i64::from(parse_time(&start_time)?);
            if span > 0 {
                span
            } else {
                30
            }
        }
        (None, None) => 30,
    };

    let new_meeting = NewMeeting {
        semester_schedule_id: body.semester_schedule_id,
        semester_id: body.semester_id,
        week_number,
        week_label: body.week_label,
        week_start: body.week_start,
        week_end: body.week_end,
        client_name,
        client_id: body.client_id,
        primary_director_id: body.primary_director_id,
        start_time,
        end_time: body.end_time,
        minutes,
        room_assignment: body.room_assignment,
        zoom_link: body.zoom_link,
        notes: body.notes,
    };
    let meeting = meetings::insert(&state.db, &new_meeting).await?;
    info!("Scheduled {} for week {} at {}", meeting.client_name, meeting.week_number, meeting.start_time);

    let conflicts = conflicts_for(&state.db, &meeting).await?;
    Ok(Json(MeetingResponse { meeting, conflicts }))
}

/// PATCH /api/scheduled-client-meetings
pub async fn update_meeting(
    State(state): State<AppState>,
    body: Result<Json<MeetingBody>, JsonRejection>,
) -> ApiResult<Json<MeetingResponse>> {
    let Json(body) = body?;
    let id = required(body.id, "id")?;
    check_times(body.start_time.as_deref(), body.end_time.as_deref(), body.minutes)?;

    let mut update = PartialUpdate::new("scheduled_client_meetings");
    update
        .set("semester_schedule_id", body.semester_schedule_id)
        .set("semester_id", body.semester_id)
        .set("week_number", body.week_number)
        .set("week_label", body.week_label)
        .set("week_start", body.week_start)
        .set("week_end", body.week_end)
        .set("client_name", body.client_name)
        .set("client_id", body.client_id)
        .set("primary_director_id", body.primary_director_id)
        .set("start_time", body.start_time)
        .set("end_time", body.end_time)
        .set("minutes", body.minutes)
        .set("room_assignment", body.room_assignment)
        .set("zoom_link", body.zoom_link)
        .set("notes", body.notes);

    let meeting = meetings::update(&state.db, &id, &update)
        .await?
        .ok_or_else(|| ApiError::NotFound("Meeting not found".to_string()))?;

    let conflicts = conflicts_for(&state.db, &meeting).await?;
    Ok(Json(MeetingResponse { meeting, conflicts }))
}

#[derive(Debug, Deserialize)]
pub struct IdQuery {
    pub id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Deleted {
    pub success: bool,
}

/// DELETE /api/scheduled-client-meetings?id=
pub async fn delete_meeting(
    State(state): State<AppState>,
    query: Result<Query<IdQuery>, QueryRejection>,
) -> ApiResult<Json<Deleted>> {
    let Query(query) = query?;
    let id = required(query.id, "id")?;

    if meetings::delete(&state.db, &id).await? == 0 {
        return Err(ApiError::NotFound("Meeting not found".to_string()));
    }
    Ok(Json(Deleted { success: true }))
}
