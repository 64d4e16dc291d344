//! Course material queries

use clinic_common::db::models::CourseMaterial;
use clinic_common::retry::retry_on_lock;
use clinic_common::Result;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use super::new_id;

/// Metadata of an uploaded material
#[derive(Debug, Clone)]
pub struct NewMaterial {
    pub title: String,
    pub description: Option<String>,
    pub file_name: String,
    pub file_url: String,
    pub file_type: Option<String>,
    pub file_size: i64,
    pub target_clinic: String,
    pub category: String,
    pub uploaded_by_name: Option<String>,
    pub uploaded_by_email: Option<String>,
}

/// Materials, newest first.
///
/// A clinic filter also returns materials targeted at `all`; `all` as a
/// filter value means no filter.
pub async fn list(
    pool: &SqlitePool,
    clinic: Option<&str>,
    category: Option<&str>,
) -> Result<Vec<CourseMaterial>> {
    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT * FROM course_materials WHERE 1 = 1");
    if let Some(clinic) = clinic.filter(|c| *c != "all") {
        qb.push(" AND (target_clinic = ");
        qb.push_bind(clinic);
        qb.push(" OR target_clinic = 'all')");
    }
    if let Some(category) = category.filter(|c| *c != "all") {
        qb.push(" AND category = ");
        qb.push_bind(category);
    }
    qb.push(" ORDER BY created_at DESC");

    Ok(qb.build_query_as().fetch_all(pool).await?)
}

pub async fn find(pool: &SqlitePool, id: &str) -> Result<Option<CourseMaterial>> {
    Ok(sqlx::query_as("SELECT * FROM course_materials WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?)
}

pub async fn insert(pool: &SqlitePool, material: &NewMaterial) -> Result<CourseMaterial> {
    let id = new_id();

    retry_on_lock("insert_course_material", || async {
        let row: CourseMaterial = sqlx::query_as(
            r#"
            INSERT INTO course_materials (
                id, title, description, file_name, file_url, file_type, file_size,
                target_clinic, category, uploaded_by_name, uploaded_by_email
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(&material.title)
        .bind(&material.description)
        .bind(&material.file_name)
        .bind(&material.file_url)
        .bind(&material.file_type)
        .bind(material.file_size)
        .bind(&material.target_clinic)
        .bind(&material.category)
        .bind(&material.uploaded_by_name)
        .bind(&material.uploaded_by_email)
        .fetch_one(pool)
        .await?;

        Ok(row)
    })
    .await
}

pub async fn delete(pool: &SqlitePool, id: &str) -> Result<u64> {
    retry_on_lock("delete_course_material", || async {
        let result = sqlx::query("DELETE FROM course_materials WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    })
    .await
}
