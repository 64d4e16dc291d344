//! Weekly summary queries
//!
//! A summary is keyed by `(week_ending, clinic, client_name)`; the key is a
//! UNIQUE constraint, so concurrent imports cannot create twins.

use clinic_common::db::models::WeeklySummary;
use clinic_common::retry::retry_on_lock;
use clinic_common::summary::SummaryDraft;
use clinic_common::time::now_rfc3339;
use clinic_common::Result;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use super::new_id;

/// Summaries for one week, optionally narrowed to one client
pub async fn for_week(
    pool: &SqlitePool,
    week_ending: &str,
    client_name: Option<&str>,
) -> Result<Vec<WeeklySummary>> {
    let mut qb: QueryBuilder<Sqlite> =
        QueryBuilder::new("SELECT * FROM weekly_summaries WHERE week_ending = ");
    qb.push_bind(week_ending);
    if let Some(client_name) = client_name {
        qb.push(" AND client_name = ");
        qb.push_bind(client_name);
    }
    qb.push(" ORDER BY client_name");

    Ok(qb.build_query_as().fetch_all(pool).await?)
}

/// Every summary, newest week first
pub async fn list_all(pool: &SqlitePool) -> Result<Vec<WeeklySummary>> {
    Ok(sqlx::query_as(
        "SELECT * FROM weekly_summaries ORDER BY week_ending DESC, clinic, client_name",
    )
    .fetch_all(pool)
    .await?)
}

/// Latest summaries for a client, by id or (for rows imported before the
/// client existed) by name
pub async fn recent_for_client(
    pool: &SqlitePool,
    client_id: &str,
    client_name: &str,
    limit: i64,
) -> Result<Vec<WeeklySummary>> {
    Ok(sqlx::query_as(
        r#"
        SELECT * FROM weekly_summaries
        WHERE client_id = ? OR (client_id IS NULL AND client_name = ?)
        ORDER BY week_ending DESC
        LIMIT ?
        "#,
    )
    .bind(client_id)
    .bind(client_name)
    .bind(limit)
    .fetch_all(pool)
    .await?)
}

pub async fn count(pool: &SqlitePool) -> Result<i64> {
    Ok(sqlx::query_scalar("SELECT COUNT(*) FROM weekly_summaries")
        .fetch_one(pool)
        .await?)
}

/// Insert a draft unless its key already exists.
///
/// Returns the stored row, or `None` when the key was taken.
pub async fn insert_if_absent(
    pool: &SqlitePool,
    draft: &SummaryDraft,
    semester: &str,
) -> Result<Option<WeeklySummary>> {
    let id = new_id();

    retry_on_lock("insert_weekly_summary", || async {
        let inserted: Option<WeeklySummary> = sqlx::query_as(
            r#"
            INSERT INTO weekly_summaries (
                id, week_ending, clinic, client_name, client_id,
                total_hours, student_count, activity_count, summary, semester
            )
            VALUES (?, ?, ?, ?, (SELECT id FROM clients WHERE name = ? LIMIT 1), ?, ?, ?, ?, ?)
            ON CONFLICT (week_ending, clinic, client_name) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(&draft.key.week_ending)
        .bind(&draft.key.clinic)
        .bind(&draft.key.client_name)
        .bind(&draft.key.client_name)
        .bind(draft.total_hours)
        .bind(draft.student_count)
        .bind(draft.activity_count)
        .bind(&draft.summary)
        .bind(semester)
        .fetch_optional(pool)
        .await?;

        Ok(inserted)
    })
    .await
}

/// Insert or replace the summary stored under the draft's key
pub async fn upsert(pool: &SqlitePool, draft: &SummaryDraft) -> Result<WeeklySummary> {
    let id = new_id();
    let updated_at = now_rfc3339();

    retry_on_lock("upsert_weekly_summary", || async {
        let row: WeeklySummary = sqlx::query_as(
            r#"
            INSERT INTO weekly_summaries (
                id, week_ending, clinic, client_name, client_id,
                total_hours, student_count, activity_count, summary
            )
            VALUES (?, ?, ?, ?, (SELECT id FROM clients WHERE name = ? LIMIT 1), ?, ?, ?, ?)
            ON CONFLICT (week_ending, clinic, client_name) DO UPDATE SET
                total_hours = excluded.total_hours,
                student_count = excluded.student_count,
                activity_count = excluded.activity_count,
                summary = excluded.summary,
                updated_at = ?
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(&draft.key.week_ending)
        .bind(&draft.key.clinic)
        .bind(&draft.key.client_name)
        .bind(&draft.key.client_name)
        .bind(draft.total_hours)
        .bind(draft.student_count)
        .bind(draft.activity_count)
        .bind(&draft.summary)
        .bind(&updated_at)
        .fetch_one(pool)
        .await?;

        Ok(row)
    })
    .await
}
