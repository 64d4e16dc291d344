//! HTTP API handlers for clinic-portal

pub mod agreements;
pub mod auth;
pub mod client_portal;
pub mod debriefs;
pub mod deliverables;
pub mod directory;
pub mod evaluations;
pub mod health;
pub mod import;
pub mod materials;
pub mod meetings;
pub mod notifications;
pub mod profile;
pub mod prospects;
pub mod questions;
pub mod schedule;
pub mod stakeholders;
pub mod summaries;
pub mod tasks;

pub use auth::auth_middleware;
pub use health::health_routes;
