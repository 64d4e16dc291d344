//! Per-table query modules
//!
//! Reads go straight to the pool. Writes run through
//! [`clinic_common::retry::retry_on_lock`] so a busy database is retried
//! before the request fails.

use clinic_common::retry::retry_on_lock;
use clinic_common::time::now_rfc3339;
use clinic_common::Result;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

pub mod agreements;
pub mod client_portal;
pub mod debriefs;
pub mod deliverables;
pub mod materials;
pub mod meetings;
pub mod notifications;
pub mod people;
pub mod prospects;
pub mod questions;
pub mod schedule;
pub mod summaries;
pub mod tasks;

/// Fresh primary key
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// A value bound into a dynamically built statement
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Text(String),
    Int(i64),
    Real(f64),
    Bool(bool),
    Null,
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Int(value)
    }
}

impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        SqlValue::Real(value)
    }
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        SqlValue::Bool(value)
    }
}

fn push_value(qb: &mut QueryBuilder<'_, Sqlite>, value: &SqlValue) {
    match value {
        SqlValue::Text(v) => qb.push_bind(v.clone()),
        SqlValue::Int(v) => qb.push_bind(*v),
        SqlValue::Real(v) => qb.push_bind(*v),
        SqlValue::Bool(v) => qb.push_bind(*v),
        SqlValue::Null => qb.push("NULL"),
    };
}

/// Column assignments for a partial `UPDATE ... WHERE id = ?`.
///
/// Only columns given a value are written; `updated_at` is always refreshed
/// when `touch` is set.
#[derive(Debug, Clone)]
pub struct PartialUpdate {
    table: &'static str,
    touch: bool,
    sets: Vec<(&'static str, SqlValue)>,
}

impl PartialUpdate {
    /// Update that also stamps `updated_at`
    pub fn new(table: &'static str) -> Self {
        Self {
            table,
            touch: true,
            sets: Vec::new(),
        }
    }

    /// Update for tables without an `updated_at` column
    pub fn without_timestamp(table: &'static str) -> Self {
        Self {
            table,
            touch: false,
            sets: Vec::new(),
        }
    }

    /// Set `column` when `value` is present
    pub fn set<V: Into<SqlValue>>(&mut self, column: &'static str, value: Option<V>) -> &mut Self {
        if let Some(value) = value {
            self.sets.push((column, value.into()));
        }
        self
    }

    /// True when no column besides the timestamp would change
    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    fn build(&self, id: &str) -> QueryBuilder<'static, Sqlite> {
        let mut qb = QueryBuilder::new(format!("UPDATE {} SET ", self.table));
        let mut first = true;
        if self.touch {
            qb.push("updated_at = ");
            qb.push_bind(now_rfc3339());
            first = false;
        }
        for (column, value) in &self.sets {
            if !first {
                qb.push(", ");
            }
            first = false;
            qb.push(*column);
            qb.push(" = ");
            push_value(&mut qb, value);
        }
        qb.push(" WHERE id = ");
        qb.push_bind(id.to_string());
        qb
    }

    /// Run the update; returns the number of rows changed (0 = unknown id)
    pub async fn execute(&self, pool: &SqlitePool, id: &str) -> Result<u64> {
        retry_on_lock(&format!("update_{}", self.table), || async {
            let mut qb = self.build(id);
            let result = qb.build().execute(pool).await?;
            Ok(result.rows_affected())
        })
        .await
    }
}
