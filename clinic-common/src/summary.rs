//! Weekly summary aggregation
//!
//! Student debriefs are rolled up into one summary per
//! `(week_ending, clinic, client_name)`: hours are summed, students counted
//! once each, and the individual work notes concatenated.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::weeks::{map_clinic_name, parse_us_date, week_ending};

/// One debrief as it appears in an import file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebriefRow {
    /// `M/D/YYYY` or ISO date the work was logged
    pub date: String,
    pub clinic: String,
    pub client: String,
    pub hours: f64,
    #[serde(default)]
    pub summary: String,
    pub student: String,
    #[serde(default)]
    pub questions: String,
    #[serde(default)]
    pub action_items: String,
}

/// Identity of a weekly summary
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SummaryKey {
    pub week_ending: String,
    pub clinic: String,
    pub client_name: String,
}

impl std::fmt::Display for SummaryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}|{}|{}", self.week_ending, self.clinic, self.client_name)
    }
}

/// Aggregated weekly summary ready to be stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryDraft {
    #[serde(flatten)]
    pub key: SummaryKey,
    pub total_hours: f64,
    pub student_count: i64,
    pub activity_count: i64,
    pub summary: String,
}

/// Result of grouping a batch of debrief rows
#[derive(Debug, Clone, Default)]
pub struct Aggregation {
    /// One draft per key, in the order keys were first seen
    pub drafts: Vec<SummaryDraft>,
    /// Rows that could not be grouped, with the reason
    pub rejected: Vec<String>,
}

/// Group debrief rows by week/clinic/client and roll them up
pub fn aggregate_debriefs(rows: &[DebriefRow]) -> Aggregation {
    let mut order: Vec<SummaryKey> = Vec::new();
    let mut groups: HashMap<SummaryKey, Vec<&DebriefRow>> = HashMap::new();
    let mut rejected = Vec::new();

    for (index, row) in rows.iter().enumerate() {
        let date = match parse_us_date(&row.date) {
            Ok(date) => date,
            Err(e) => {
                rejected.push(format!("Row {} ({}): {}", index + 1, row.student, e));
                continue;
            }
        };
        if !row.hours.is_finite() || row.hours < 0.0 {
            rejected.push(format!("Row {} ({}): invalid hours {}", index + 1, row.student, row.hours));
            continue;
        }

        let key = SummaryKey {
            week_ending: week_ending(date).format("%Y-%m-%d").to_string(),
            clinic: map_clinic_name(&row.clinic),
            client_name: row.client.trim().to_string(),
        };

        groups
            .entry(key.clone())
            .or_insert_with(|| {
                order.push(key);
                Vec::new()
            })
            .push(row);
    }

    let drafts = order
        .into_iter()
        .map(|key| {
            let members = &groups[&key];
            let students: HashSet<&str> = members.iter().map(|d| d.student.trim()).collect();
            let summary = members
                .iter()
                .map(|d| format!("{}: {}", d.student.trim(), d.summary.trim()))
                .collect::<Vec<_>>()
                .join("\n\n");

            SummaryDraft {
                total_hours: members.iter().map(|d| d.hours).sum(),
                student_count: students.len() as i64,
                activity_count: members.len() as i64,
                summary,
                key,
            }
        })
        .collect();

    Aggregation { drafts, rejected }
}
