//! Timestamp utilities

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Current UTC timestamp in the RFC 3339 form stored in `*_at` columns
pub fn now_rfc3339() -> String {
    now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Today's calendar date (UTC)
pub fn today() -> NaiveDate {
    now().date_naive()
}
