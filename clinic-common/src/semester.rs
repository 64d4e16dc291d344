//! Semester progress calculations over the week-by-week schedule

use chrono::NaiveDate;
use serde::Serialize;

/// The calendar facts of one schedule week needed for progress math
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SemesterWeek {
    pub id: String,
    pub week_number: i64,
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub is_break: bool,
}

/// Completion ratio, rounded to a whole percent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CompletionRate {
    pub submitted: i64,
    pub total: i64,
    pub rate: i64,
}

/// Week whose `[week_start, week_end]` contains `today`
pub fn current_week(schedule: &[SemesterWeek], today: NaiveDate) -> Option<&SemesterWeek> {
    schedule
        .iter()
        .find(|w| w.week_start <= today && today <= w.week_end)
}

/// Current week number; 0 before the semester, the last week after it ends
pub fn current_week_number(schedule: &[SemesterWeek], today: NaiveDate) -> i64 {
    if let Some(week) = current_week(schedule, today) {
        return week.week_number;
    }

    let first = schedule.iter().min_by_key(|w| w.week_number);
    let last = schedule.iter().max_by_key(|w| w.week_number);
    match (first, last) {
        (Some(first), _) if today < first.week_start => 0,
        (_, Some(last)) if today > last.week_end => last.week_number,
        _ => 0,
    }
}

/// Class weeks (non-break) whose class day has come by `today`.
///
/// Class meets on the first day of the week, so a week counts from
/// `week_start` on.
pub fn elapsed_class_count(schedule: &[SemesterWeek], today: NaiveDate) -> i64 {
    schedule
        .iter()
        .filter(|w| !w.is_break && w.week_start <= today)
        .count() as i64
}

/// Class weeks in the semester, breaks excluded
pub fn total_class_count(schedule: &[SemesterWeek]) -> i64 {
    schedule.iter().filter(|w| !w.is_break).count() as i64
}

/// Debriefs are expected for every ended week, breaks included
pub fn expected_debrief_count(schedule: &[SemesterWeek], today: NaiveDate) -> i64 {
    schedule.iter().filter(|w| w.week_end <= today).count() as i64
}

/// Submitted debriefs against the weeks that have ended so far
pub fn debrief_rate(submitted: i64, schedule: &[SemesterWeek], today: NaiveDate) -> CompletionRate {
    let total = expected_debrief_count(schedule, today);
    let rate = if total > 0 {
        ((submitted as f64 / total as f64) * 100.0).round() as i64
    } else {
        0
    };
    CompletionRate { submitted, total, rate }
}
