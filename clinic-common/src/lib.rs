//! # Clinic Common Library
//!
//! Shared code for the clinic portal service and its tooling:
//! - Error type shared by all crates
//! - Configuration resolution (CLI > env > TOML > defaults)
//! - Database schema initialization and row models
//! - Weekly agenda time arithmetic
//! - Week-ending and weekly-summary aggregation
//! - Semester progress calculations
//! - Retry with backoff for rate limits and database locks

pub mod agenda;
pub mod config;
pub mod db;
pub mod error;
pub mod retry;
pub mod semester;
pub mod summary;
pub mod time;
pub mod weeks;

pub use error::{Error, Result};
