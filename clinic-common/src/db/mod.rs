//! Database schema and row models shared by the portal and its tools

pub mod init;
pub mod models;

pub use init::{create_schema, init_database, init_memory_database};
