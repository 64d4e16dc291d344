//! Signed onboarding agreement queries
//!
//! One agreement per `(user_email, agreement_type)`; signing again replaces
//! the signature and timestamp.

use clinic_common::db::models::SignedAgreement;
use clinic_common::retry::retry_on_lock;
use clinic_common::Result;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use super::new_id;

#[derive(Debug, Clone)]
pub struct NewAgreement {
    pub agreement_type: String,
    pub user_name: Option<String>,
    pub user_email: String,
    pub user_type: Option<String>,
    pub signature: String,
    pub signed_at: String,
    pub program_name: Option<String>,
    pub client_name: Option<String>,
}

/// Agreements, most recently signed first
pub async fn list(
    pool: &SqlitePool,
    user_email: Option<&str>,
    user_type: Option<&str>,
) -> Result<Vec<SignedAgreement>> {
    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT * FROM signed_agreements WHERE 1 = 1");
    if let Some(email) = user_email {
        qb.push(" AND user_email = ");
        qb.push_bind(email);
    }
    if let Some(user_type) = user_type {
        qb.push(" AND user_type = ");
        qb.push_bind(user_type);
    }
    qb.push(" ORDER BY signed_at DESC");

    Ok(qb.build_query_as().fetch_all(pool).await?)
}

/// Record a signature, replacing an earlier one for the same user and type
pub async fn sign(pool: &SqlitePool, agreement: &NewAgreement) -> Result<SignedAgreement> {
    let id = new_id();

    retry_on_lock("sign_agreement", || async {
        let row: SignedAgreement = sqlx::query_as(
            r#"
            INSERT INTO signed_agreements (
                id, agreement_type, user_name, user_email, user_type,
                signature, signed_at, program_name, client_name
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (user_email, agreement_type) DO UPDATE SET
                user_name = excluded.user_name,
                user_type = excluded.user_type,
                signature = excluded.signature,
                signed_at = excluded.signed_at,
                program_name = excluded.program_name,
                client_name = excluded.client_name
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(&agreement.agreement_type)
        .bind(&agreement.user_name)
        .bind(&agreement.user_email)
        .bind(&agreement.user_type)
        .bind(&agreement.signature)
        .bind(&agreement.signed_at)
        .bind(&agreement.program_name)
        .bind(&agreement.client_name)
        .fetch_one(pool)
        .await?;

        Ok(row)
    })
    .await
}
