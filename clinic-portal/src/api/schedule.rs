//! Semester schedule weeks and their weekly agenda
//!
//! A week row carries its agenda as a JSON list of time blocks. The block
//! routes load that list, edit it with the `clinic_common::agenda` helpers
//! and write it back whole.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    Json,
};
use chrono::NaiveDate;
use clinic_common::agenda::{self, AgendaSession, TimeBlock};
use clinic_common::db::models::{Assignment, ScheduleWeek, SemesterConfig};
use clinic_common::semester::{self, SemesterWeek};
use clinic_common::time::today;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::db::schedule::{self, NewWeek};
use crate::db::{new_id, PartialUpdate};
use crate::error::{required, ApiError, ApiResult};
use crate::AppState;

fn parse_iso(value: &str, field: &str) -> ApiResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| ApiError::BadRequest(format!("{} must be YYYY-MM-DD", field)))
}

/// Calendar view of schedule rows; rows with unreadable dates are skipped
pub fn calendar(weeks: &[ScheduleWeek]) -> Vec<SemesterWeek> {
    weeks
        .iter()
        .filter_map(|w| {
            let week_start = NaiveDate::parse_from_str(&w.week_start, "%Y-%m-%d").ok()?;
            let week_end = NaiveDate::parse_from_str(&w.week_end, "%Y-%m-%d").ok()?;
            Some(SemesterWeek {
                id: w.id.clone(),
                week_number: w.week_number,
                week_start,
                week_end,
                is_break: w.is_break,
            })
        })
        .collect()
}

pub async fn load_calendar(pool: &SqlitePool, semester_id: Option<&str>) -> ApiResult<Vec<SemesterWeek>> {
    let weeks = schedule::list_weeks(pool, semester_id).await?;
    Ok(calendar(&weeks))
}

/// Semester named by `label`, else the active one, else the configured default
pub async fn semester_for(state: &AppState, label: Option<&str>) -> ApiResult<Option<SemesterConfig>> {
    if let Some(label) = label.filter(|l| !l.trim().is_empty()) {
        if let Some(found) = schedule::find_semester(&state.db, label).await? {
            return Ok(Some(found));
        }
    }
    if let Some(active) = schedule::active_semester(&state.db).await? {
        return Ok(Some(active));
    }
    Ok(schedule::find_semester(&state.db, &state.config.default_semester).await?)
}

async fn load_week(pool: &SqlitePool, id: &str) -> ApiResult<ScheduleWeek> {
    schedule::find_week(pool, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Schedule week not found".to_string()))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleQuery {
    pub semester: Option<String>,
    pub semester_id: Option<String>,
    #[serde(default)]
    pub include_all: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleMetadata {
    pub total_weeks: usize,
    pub total_class_weeks: i64,
    pub elapsed_class_weeks: i64,
    pub current_week_number: Option<i64>,
    pub current_week_id: Option<String>,
}

impl ScheduleMetadata {
    pub fn of(weeks: &[ScheduleWeek], today: NaiveDate) -> Self {
        let calendar = calendar(weeks);
        let current = semester::current_week(&calendar, today);

        Self {
            total_weeks: weeks.len(),
            total_class_weeks: weeks.iter().filter(|w| !w.is_break).count() as i64,
            elapsed_class_weeks: semester::elapsed_class_count(&calendar, today),
            current_week_number: current.map(|w| w.week_number),
            current_week_id: current.map(|w| w.id.clone()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ScheduleList {
    pub schedules: Vec<ScheduleWeek>,
    pub metadata: ScheduleMetadata,
}

/// GET /api/semester-schedule
///
/// `semesterId` wins over `semester`; without either the active semester is
/// used, and `includeAll=true` lists every semester.
pub async fn get_schedule(
    State(state): State<AppState>,
    query: Result<Query<ScheduleQuery>, QueryRejection>,
) -> ApiResult<Json<ScheduleList>> {
    let Query(query) = query?;

    let schedules = if let Some(id) = query.semester_id.as_deref() {
        schedule::list_weeks(&state.db, Some(id)).await?
    } else if query.include_all {
        schedule::list_weeks(&state.db, None).await?
    } else if let Some(label) = query.semester.as_deref() {
        match schedule::find_semester(&state.db, label).await? {
            Some(config) => schedule::list_weeks(&state.db, Some(&config.id)).await?,
            None => Vec::new(),
        }
    } else {
        let active = schedule::active_semester(&state.db).await?;
        schedule::list_weeks(&state.db, active.as_ref().map(|s| s.id.as_str())).await?
    };

    let metadata = ScheduleMetadata::of(&schedules, today());
    Ok(Json(ScheduleList { schedules, metadata }))
}

#[derive(Debug, Deserialize)]
pub struct CreateWeek {
    pub week_number: Option<i64>,
    pub week_label: Option<String>,
    pub week_start: Option<String>,
    pub week_end: Option<String>,
    pub session_focus: Option<String>,
    pub activities: Option<Vec<TimeBlock>>,
    pub assignments: Option<Vec<Assignment>>,
    pub notes: Option<String>,
    pub class_time_minutes: Option<i64>,
    pub clinic_time_minutes: Option<i64>,
    pub is_break: Option<bool>,
    pub room_assignment: Option<String>,
    pub zoom_link: Option<String>,
    pub semester: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct WeekResponse {
    pub schedule: ScheduleWeek,
}

/// POST /api/semester-schedule
pub async fn create_week(
    State(state): State<AppState>,
    body: Result<Json<CreateWeek>, JsonRejection>,
) -> ApiResult<Json<WeekResponse>> {
    let Json(body) = body?;

    let week_number = body
        .week_number
        .ok_or_else(|| ApiError::BadRequest("week_number is required".to_string()))?;
    let week_start = required(body.week_start, "week_start")?;
    let week_end = required(body.week_end, "week_end")?;
    if parse_iso(&week_start, "week_start")? > parse_iso(&week_end, "week_end")? {
        return Err(ApiError::BadRequest("week_start must not be after week_end".to_string()));
    }

    let activities = match body.activities {
        Some(blocks) if !blocks.is_empty() => {
            validate_blocks(&blocks)?;
            blocks
        }
        _ => agenda::default_time_blocks(),
    };

    let label = body
        .semester
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| state.config.default_semester.clone());
    let semester = schedule::ensure_semester(&state.db, &label).await?;

    let week = NewWeek {
        semester_id: Some(semester.id),
        week_number,
        week_label: body
            .week_label
            .filter(|l| !l.trim().is_empty())
            .unwrap_or_else(|| format!("Week {}", week_number)),
        week_start,
        week_end,
        session_focus: body.session_focus,
        activities,
        assignments: body.assignments.unwrap_or_default(),
        notes: body.notes,
        class_time_minutes: body.class_time_minutes.filter(|m| *m > 0).unwrap_or(90),
        clinic_time_minutes: body.clinic_time_minutes.filter(|m| *m > 0).unwrap_or(90),
        is_break: body.is_break.unwrap_or(false),
        room_assignment: body.room_assignment,
        zoom_link: body.zoom_link,
    };
    let schedule = schedule::insert_week(&state.db, &week).await?;
    info!("Created {} ({}) for {}", schedule.week_label, schedule.id, label);

    Ok(Json(WeekResponse { schedule }))
}

#[derive(Debug, Deserialize)]
pub struct UpdateWeek {
    pub id: Option<String>,
    pub week_number: Option<i64>,
    pub week_label: Option<String>,
    pub week_start: Option<String>,
    pub week_end: Option<String>,
    pub session_focus: Option<String>,
    pub activities: Option<Vec<TimeBlock>>,
    pub assignments: Option<Vec<Assignment>>,
    pub notes: Option<String>,
    pub class_time_minutes: Option<i64>,
    pub clinic_time_minutes: Option<i64>,
    pub is_break: Option<bool>,
    pub room_assignment: Option<String>,
    pub zoom_link: Option<String>,
}

/// PATCH /api/semester-schedule
pub async fn update_week(
    State(state): State<AppState>,
    body: Result<Json<UpdateWeek>, JsonRejection>,
) -> ApiResult<Json<WeekResponse>> {
    let Json(body) = body?;
    let id = required(body.id, "id")?;

    if let Some(start) = body.week_start.as_deref() {
        parse_iso(start, "week_start")?;
    }
    if let Some(end) = body.week_end.as_deref() {
        parse_iso(end, "week_end")?;
    }
    if let Some(blocks) = body.activities.as_deref() {
        validate_blocks(blocks)?;
    }
    let activities = body
        .activities
        .map(|mut blocks| {
            agenda::sort_blocks(&mut blocks);
            serde_json::to_string(&blocks)
        })
        .transpose()
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    let assignments = body
        .assignments
        .map(|a| serde_json::to_string(&a))
        .transpose()
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    let mut update = PartialUpdate::new("semester_schedule");
    update
        .set("week_number", body.week_number)
        .set("week_label", body.week_label)
        .set("week_start", body.week_start)
        .set("week_end", body.week_end)
        .set("session_focus", body.session_focus)
        .set("activities", activities)
        .set("assignments", assignments)
        .set("notes", body.notes)
        .set("class_time_minutes", body.class_time_minutes)
        .set("clinic_time_minutes", body.clinic_time_minutes)
        .set("is_break", body.is_break)
        .set("room_assignment", body.room_assignment)
        .set("zoom_link", body.zoom_link);

    let schedule = schedule::update_week(&state.db, &id, &update)
        .await?
        .ok_or_else(|| ApiError::NotFound("Schedule week not found".to_string()))?;

    Ok(Json(WeekResponse { schedule }))
}

#[derive(Debug, Deserialize)]
pub struct IdQuery {
    pub id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Deleted {
    pub success: bool,
}

/// DELETE /api/semester-schedule?id=
pub async fn delete_week(
    State(state): State<AppState>,
    query: Result<Query<IdQuery>, QueryRejection>,
) -> ApiResult<Json<Deleted>> {
    let Query(query) = query?;
    let id = required(query.id, "id")?;

    if schedule::delete_week(&state.db, &id).await? == 0 {
        return Err(ApiError::NotFound("Schedule week not found".to_string()));
    }
    info!("Deleted schedule week {}", id);
    Ok(Json(Deleted { success: true }))
}

/// Every block needs a parseable start time and a duration within one day
fn validate_blocks(blocks: &[TimeBlock]) -> ApiResult<()> {
    for block in blocks {
        block.validate()?;
    }
    Ok(())
}

fn block_duration(duration: Option<u32>) -> ApiResult<u32> {
    let duration = duration.ok_or_else(|| ApiError::BadRequest("duration is required".to_string()))?;
    agenda::validate_duration(duration)?;
    Ok(duration)
}

/// Overlapping pair of blocks in a week's agenda
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockConflict {
    pub first: String,
    pub second: String,
}

#[derive(Debug, Serialize)]
pub struct AgendaResponse {
    pub schedule: ScheduleWeek,
    pub conflicts: Vec<BlockConflict>,
}

/// Store a week's new agenda and report any overlaps left in it
async fn save_agenda(pool: &SqlitePool, week_id: &str, blocks: &[TimeBlock]) -> ApiResult<AgendaResponse> {
    let conflicts: Vec<BlockConflict> = agenda::find_conflicts(blocks)?
        .into_iter()
        .map(|(first, second)| BlockConflict { first, second })
        .collect();
    if !conflicts.is_empty() {
        warn!("Week {} agenda has {} overlapping block pair(s)", week_id, conflicts.len());
    }

    if schedule::save_activities(pool, week_id, blocks).await? == 0 {
        return Err(ApiError::NotFound("Schedule week not found".to_string()));
    }
    let schedule = load_week(pool, week_id).await?;

    Ok(AgendaResponse { schedule, conflicts })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddBlock {
    pub week_id: Option<String>,
    pub id: Option<String>,
    pub time: Option<String>,
    pub activity: Option<String>,
    pub duration: Option<u32>,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub sessions: Vec<AgendaSession>,
}

/// POST /api/semester-schedule/blocks
pub async fn add_time_block(
    State(state): State<AppState>,
    body: Result<Json<AddBlock>, JsonRejection>,
) -> ApiResult<Json<AgendaResponse>> {
    let Json(body) = body?;
    let week_id = required(body.week_id, "weekId")?;
    let time = required(body.time, "time")?;
    let activity = required(body.activity, "activity")?;
    let duration = block_duration(body.duration)?;

    let week = load_week(&state.db, &week_id).await?;
    let block = TimeBlock {
        id: body.id.filter(|id| !id.is_empty()).unwrap_or_else(new_id),
        time,
        activity,
        duration,
        color: body.color,
        sessions: body.sessions,
    };
    let blocks = agenda::add_block(&week.activities, block)?;

    Ok(Json(save_agenda(&state.db, &week_id, &blocks).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeDuration {
    pub week_id: Option<String>,
    pub block_id: Option<String>,
    pub duration: Option<u32>,
}

/// PATCH /api/semester-schedule/blocks/duration
///
/// Blocks after the changed one move by the same number of minutes.
pub async fn change_block_duration(
    State(state): State<AppState>,
    body: Result<Json<ChangeDuration>, JsonRejection>,
) -> ApiResult<Json<AgendaResponse>> {
    let Json(body) = body?;
    let week_id = required(body.week_id, "weekId")?;
    let block_id = required(body.block_id, "blockId")?;
    let duration = block_duration(body.duration)?;

    let week = load_week(&state.db, &week_id).await?;
    let blocks = agenda::cascade_duration_change(&week.activities, &block_id, duration)?;

    Ok(Json(save_agenda(&state.db, &week_id, &blocks).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveSession {
    pub week_id: Option<String>,
    pub block_id: Option<String>,
    pub session_id: Option<String>,
}

/// DELETE /api/semester-schedule/blocks/session
///
/// Removing a block's last session removes the block.
pub async fn remove_block_session(
    State(state): State<AppState>,
    query: Result<Query<RemoveSession>, QueryRejection>,
) -> ApiResult<Json<AgendaResponse>> {
    let Query(query) = query?;
    let week_id = required(query.week_id, "weekId")?;
    let block_id = required(query.block_id, "blockId")?;
    let session_id = required(query.session_id, "sessionId")?;

    let week = load_week(&state.db, &week_id).await?;
    let known = week
        .activities
        .iter()
        .any(|b| b.id == block_id && b.sessions.iter().any(|s| s.id == session_id));
    if !known {
        return Err(ApiError::NotFound("Session not found".to_string()));
    }

    let blocks = agenda::remove_session(&week.activities, &block_id, &session_id);
    Ok(Json(save_agenda(&state.db, &week_id, &blocks).await?))
}
