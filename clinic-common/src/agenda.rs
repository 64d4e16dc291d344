//! Weekly agenda time arithmetic
//!
//! A week's agenda is an ordered list of [`TimeBlock`]s ("5:00 PM", 15 minutes,
//! "All Hands"), each holding the parallel [`AgendaSession`]s that run in it.
//! Times are handled as minute-of-day integers (0..=1439) and rendered back to
//! the 12-hour "h:mm AM" form the schedule rows store.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Minutes in one day
pub const MINUTES_PER_DAY: u32 = 24 * 60;

/// One parallel session inside a time block (a team, a room, a director)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgendaSession {
    pub id: String,
    pub activity: String,
    #[serde(default)]
    pub team: String,
    #[serde(default)]
    pub director_initials: String,
    #[serde(default)]
    pub room: String,
    #[serde(default)]
    pub room_number: String,
    #[serde(default)]
    pub notes: String,
}

/// A slot of the weekly agenda
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeBlock {
    pub id: String,
    /// Start time as displayed, e.g. "5:15 PM"
    pub time: String,
    pub activity: String,
    /// Length in minutes
    pub duration: u32,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub sessions: Vec<AgendaSession>,
}

impl TimeBlock {
    /// Start of the block as minute of day
    pub fn start_minutes(&self) -> Result<u32> {
        parse_time(&self.time)
    }

    /// End of the block as minute of day
    pub fn end_minutes(&self) -> Result<u32> {
        Ok(end_time(self.start_minutes()?, self.duration))
    }

    /// Check the start time parses and the duration fits in a day
    pub fn validate(&self) -> Result<()> {
        self.start_minutes()?;
        validate_duration(self.duration)
    }
}

/// Durations are whole minutes in `1..=MINUTES_PER_DAY`
pub fn validate_duration(duration: u32) -> Result<()> {
    if (1..=MINUTES_PER_DAY).contains(&duration) {
        Ok(())
    } else {
        Err(Error::InvalidInput(format!(
            "Duration must be between 1 and {} minutes",
            MINUTES_PER_DAY
        )))
    }
}

/// Parse "5:00 PM", "5:00pm" or 24-hour "17:00" into minute of day.
///
/// Malformed strings are rejected rather than mis-parsed.
pub fn parse_time(input: &str) -> Result<u32> {
    let trimmed = input.trim();
    let upper = trimmed.to_ascii_uppercase();

    let (clock, meridiem) = if let Some(rest) = upper.strip_suffix("AM") {
        (rest.trim_end(), Some(false))
    } else if let Some(rest) = upper.strip_suffix("PM") {
        (rest.trim_end(), Some(true))
    } else {
        (upper.as_str(), None)
    };

    let invalid = || Error::InvalidInput(format!("Invalid time: {:?}", input));

    let (hour_str, minute_str) = clock.split_once(':').ok_or_else(invalid)?;
    let digits = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());
    if !digits(hour_str) || minute_str.len() != 2 || !digits(minute_str) {
        return Err(invalid());
    }
    let hour: u32 = hour_str.parse().map_err(|_| invalid())?;
    let minute: u32 = minute_str.parse().map_err(|_| invalid())?;
    if minute > 59 {
        return Err(invalid());
    }

    let hour24 = match meridiem {
        Some(is_pm) => {
            if !(1..=12).contains(&hour) {
                return Err(invalid());
            }
            match (hour, is_pm) {
                (12, false) => 0,
                (12, true) => 12,
                (h, false) => h,
                (h, true) => h + 12,
            }
        }
        None => {
            if hour > 23 {
                return Err(invalid());
            }
            hour
        }
    };

    Ok(hour24 * 60 + minute)
}

/// Render a minute of day as "h:mm AM|PM" (values wrap at midnight)
pub fn format_time(minutes: u32) -> String {
    let minutes = minutes % MINUTES_PER_DAY;
    let hour24 = minutes / 60;
    let minute = minutes % 60;
    let meridiem = if hour24 < 12 { "AM" } else { "PM" };
    let hour12 = match hour24 % 12 {
        0 => 12,
        h => h,
    };
    format!("{}:{:02} {}", hour12, minute, meridiem)
}

/// End minute of a block starting at `start` lasting `duration` minutes
pub fn end_time(start: u32, duration: u32) -> u32 {
    start.saturating_add(duration) % MINUTES_PER_DAY
}

/// True iff `other_start` falls within `[start, start + duration)`
pub fn check_time_overlap(start: u32, duration: u32, other_start: u32) -> bool {
    other_start >= start && other_start < start.saturating_add(duration)
}

/// True iff the half-open ranges `[a, a + a_len)` and `[b, b + b_len)` intersect
pub fn ranges_overlap(a_start: u32, a_duration: u32, b_start: u32, b_duration: u32) -> bool {
    check_time_overlap(a_start, a_duration, b_start) || check_time_overlap(b_start, b_duration, a_start)
}

/// True iff two blocks occupy a common minute
pub fn blocks_overlap(a: &TimeBlock, b: &TimeBlock) -> Result<bool> {
    Ok(ranges_overlap(a.start_minutes()?, a.duration, b.start_minutes()?, b.duration))
}

/// Sort blocks by start time; blocks with unparseable times go last in input order
pub fn sort_blocks(blocks: &mut [TimeBlock]) {
    blocks.sort_by_key(|b| b.start_minutes().unwrap_or(u32::MAX));
}

/// Change one block's duration and shift every later block by the same delta.
///
/// "Later" means starting at or after the changed block's old end time, so
/// blocks that already overlapped it stay put. Returns the week re-sorted.
pub fn cascade_duration_change(
    blocks: &[TimeBlock],
    block_id: &str,
    new_duration: u32,
) -> Result<Vec<TimeBlock>> {
    let target = blocks
        .iter()
        .find(|b| b.id == block_id)
        .ok_or_else(|| Error::NotFound(format!("Time block {}", block_id)))?;

    validate_duration(new_duration)?;
    let target_start = target.start_minutes()?;
    let old_end = target_start.saturating_add(target.duration);
    let delta = i64::from(new_duration) - i64::from(target.duration);

    let mut updated = Vec::with_capacity(blocks.len());
    for block in blocks {
        let mut block = block.clone();
        if block.id == block_id {
            block.duration = new_duration;
        } else if delta != 0 {
            let start = block.start_minutes()?;
            if start >= old_end {
                let shifted = i64::from(start) + delta;
                if !(0..i64::from(MINUTES_PER_DAY)).contains(&shifted) {
                    return Err(Error::InvalidInput(format!(
                        "Moving {:?} by {} minutes leaves the day",
                        block.activity, delta
                    )));
                }
                block.time = format_time(shifted as u32);
            }
        }
        updated.push(block);
    }

    sort_blocks(&mut updated);
    Ok(updated)
}

/// Insert a block and keep the week ordered by start time
pub fn add_block(blocks: &[TimeBlock], block: TimeBlock) -> Result<Vec<TimeBlock>> {
    block.validate()?;
    let mut updated = blocks.to_vec();
    updated.push(block);
    sort_blocks(&mut updated);
    Ok(updated)
}

/// Remove one session; a block left without sessions is removed as well
pub fn remove_session(blocks: &[TimeBlock], block_id: &str, session_id: &str) -> Vec<TimeBlock> {
    blocks
        .iter()
        .cloned()
        .filter_map(|mut block| {
            if block.id != block_id {
                return Some(block);
            }
            block.sessions.retain(|s| s.id != session_id);
            (!block.sessions.is_empty()).then_some(block)
        })
        .collect()
}

/// Pairs of block ids whose time ranges intersect
pub fn find_conflicts(blocks: &[TimeBlock]) -> Result<Vec<(String, String)>> {
    let mut spans = Vec::with_capacity(blocks.len());
    for block in blocks {
        spans.push((block.id.as_str(), block.start_minutes()?, block.duration));
    }

    let mut conflicts = Vec::new();
    for (i, (a_id, a_start, a_len)) in spans.iter().enumerate() {
        for (b_id, b_start, b_len) in &spans[i + 1..] {
            if ranges_overlap(*a_start, *a_len, *b_start, *b_len) {
                conflicts.push((a_id.to_string(), b_id.to_string()));
            }
        }
    }
    Ok(conflicts)
}

fn session(id: &str, activity: &str, team: &str, initials: &str, room: &str, number: &str, notes: &str) -> AgendaSession {
    AgendaSession {
        id: id.to_string(),
        activity: activity.to_string(),
        team: team.to_string(),
        director_initials: initials.to_string(),
        room: room.to_string(),
        room_number: number.to_string(),
        notes: notes.to_string(),
    }
}

fn block(id: &str, time: &str, activity: &str, duration: u32, color: &str, sessions: Vec<AgendaSession>) -> TimeBlock {
    TimeBlock {
        id: id.to_string(),
        time: time.to_string(),
        activity: activity.to_string(),
        duration,
        color: color.to_string(),
        sessions,
    }
}

/// Standard Monday evening agenda used for new weeks
pub fn default_time_blocks() -> Vec<TimeBlock> {
    vec![
        block(
            "1",
            "5:00 PM",
            "All Hands",
            15,
            "blue",
            vec![session("1-1", "All Hands", "All Teams", "NV", "Main", "101", "Announcements")],
        ),
        block(
            "2",
            "5:15 PM",
            "Clinic Sessions",
            45,
            "teal",
            vec![
                session("2-1", "Clinic Sessions", "Accounting Clinic", "KM", "Room", "201", "Tax review"),
                session("2-2", "Clinic Sessions", "Marketing Clinic", "CH", "Room", "202", ""),
                session("2-3", "Clinic Sessions", "Consulting Clinic", "NV", "Room", "203", ""),
                session("2-4", "Clinic Sessions", "Funding Clinic", "MD", "Room", "204", ""),
            ],
        ),
        block(
            "3",
            "6:00 PM",
            "Client Work Time",
            90,
            "amber",
            vec![session("3-1", "Client Work Time", "All Teams", "All", "Various", "", "Work with clients")],
        ),
        block(
            "4",
            "7:30 PM",
            "Wrap Up",
            15,
            "slate",
            vec![session("4-1", "Wrap Up", "All Teams", "NV", "Main", "101", "Weekly summary & next steps")],
        ),
    ]
}
