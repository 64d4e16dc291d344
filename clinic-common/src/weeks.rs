//! Week-ending derivation and clinic name normalization for debriefs

use chrono::{Datelike, Duration, NaiveDate};

use crate::{Error, Result};

/// Canonical clinic (track) names
pub const CLINICS: [&str; 4] = ["Accounting", "Consulting", "Marketing", "Resource Acquisition"];

/// Parse a debrief date in `M/D/YYYY` form (as exported from the intake
/// spreadsheets) or ISO `YYYY-MM-DD`.
pub fn parse_us_date(input: &str) -> Result<NaiveDate> {
    let trimmed = input.trim();
    NaiveDate::parse_from_str(trimmed, "%m/%d/%Y")
        .or_else(|_| NaiveDate::parse_from_str(trimmed, "%Y-%m-%d"))
        .map_err(|_| Error::InvalidInput(format!("Invalid date: {:?}", input)))
}

/// The Sunday that closes the week containing `date` (a Sunday is its own week ending)
pub fn week_ending(date: NaiveDate) -> NaiveDate {
    let days_from_sunday = date.weekday().num_days_from_sunday();
    let days_until_sunday = if days_from_sunday == 0 { 0 } else { 7 - days_from_sunday };
    date + Duration::days(i64::from(days_until_sunday))
}

/// Week ending of a debrief date string, as ISO `YYYY-MM-DD`
pub fn week_ending_str(input: &str) -> Result<String> {
    Ok(week_ending(parse_us_date(input)?).format("%Y-%m-%d").to_string())
}

/// Map legacy clinic labels onto the canonical names.
///
/// "Funding" was renamed "Resource Acquisition"; unknown names pass through.
pub fn map_clinic_name(clinic: &str) -> String {
    match clinic.trim() {
        "Funding" | "Resource Acquisition" => "Resource Acquisition".to_string(),
        "Accounting" => "Accounting".to_string(),
        "Consulting" => "Consulting".to_string(),
        "Marketing" => "Marketing".to_string(),
        other => other.to_string(),
    }
}
