//! clinic-import - operator tool for loading debrief exports into the portal
//!
//! Reads a JSON array of debrief rows, previews the weekly summaries they
//! roll up into, and submits them to a running clinic-portal.

use std::path::Path;

use clinic_common::summary::{aggregate_debriefs, DebriefRow, SummaryDraft};
use serde::Serialize;
use thiserror::Error;

pub mod client;

pub use client::{ClientError, ImportClient};

#[derive(Debug, Error)]
pub enum RowsError {
    #[error("Cannot read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid rows in {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Load debrief rows from a JSON file holding an array of rows
pub fn load_rows(path: &Path) -> Result<Vec<DebriefRow>, RowsError> {
    let content = std::fs::read_to_string(path).map_err(|source| RowsError::Read {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| RowsError::Parse {
        path: path.display().to_string(),
        source,
    })
}

/// What an import would store, computed locally
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Preview {
    pub total_records: usize,
    pub summaries: Vec<SummaryDraft>,
    pub rejected: Vec<String>,
}

pub fn preview(rows: &[DebriefRow]) -> Preview {
    let aggregation = aggregate_debriefs(rows);
    Preview {
        total_records: rows.len(),
        summaries: aggregation.drafts,
        rejected: aggregation.rejected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_rows_and_preview() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[
                {{"date": "12/1/2025", "clinic": "Funding", "client": "Acme", "hours": 3, "student": "Sam"}},
                {{"date": "12/4/2025", "clinic": "Resource Acquisition", "client": "Acme", "hours": 5, "student": "Riley"}},
                {{"date": "someday", "clinic": "Consulting", "client": "Birch", "hours": 1, "student": "Jo"}}
            ]"#
        )
        .unwrap();

        let rows = load_rows(file.path()).unwrap();
        let preview = preview(&rows);

        assert_eq!(preview.total_records, 3);
        assert_eq!(preview.summaries.len(), 1);
        assert_eq!(preview.summaries[0].key.clinic, "Resource Acquisition");
        assert_eq!(preview.summaries[0].total_hours, 8.0);
        assert_eq!(preview.summaries[0].student_count, 2);
        assert_eq!(preview.rejected.len(), 1);
    }

    #[test]
    fn test_load_rows_reports_bad_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{\"rows\": 3}}").unwrap();

        let err = load_rows(file.path()).unwrap_err();
        assert!(matches!(err, RowsError::Parse { .. }));
    }
}
