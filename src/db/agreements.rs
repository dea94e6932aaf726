use sqlx::PgPool;
use uuid::Uuid;

use crate::approval::change::AgreementChange;
use crate::models::{Agreement, AgreementStatus};

pub struct AgreementFilter<'a> {
    pub keyword: Option<&'a str>,
    pub status: Option<AgreementStatus>,
    pub customer_id: Option<Uuid>,
}

pub async fn insert<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    a: &AgreementChange,
    agreement_number: &str,
) -> Result<Agreement, sqlx::Error> {
    sqlx::query_as::<_, Agreement>(
        "INSERT INTO agreements
            (customer_id, agreement_number, start_date, end_date, fee_type, amount, status)
         VALUES ($1, $2, $3, $4, $5, COALESCE($6, 0), COALESCE($7, 'active'::agreement_status))
         RETURNING *",
    )
    .bind(a.customer_id)
    .bind(agreement_number)
    .bind(a.start_date)
    .bind(a.end_date)
    .bind(&a.fee_type)
    .bind(a.amount)
    .bind(a.status)
    .fetch_one(executor)
    .await
}

pub async fn update<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    id: Uuid,
    a: &AgreementChange,
) -> Result<Option<Agreement>, sqlx::Error> {
    sqlx::query_as::<_, Agreement>(
        "UPDATE agreements SET
            customer_id = COALESCE($2, customer_id),
            agreement_number = COALESCE(NULLIF($3, ''), agreement_number),
            start_date = COALESCE($4, start_date),
            end_date = COALESCE($5, end_date),
            fee_type = COALESCE($6, fee_type),
            amount = COALESCE($7, amount),
            status = COALESCE($8, status),
            updated_at = now()
         WHERE id = $1
         RETURNING *",
    )
    .bind(id)
    .bind(a.customer_id)
    .bind(&a.agreement_number)
    .bind(a.start_date)
    .bind(a.end_date)
    .bind(&a.fee_type)
    .bind(a.amount)
    .bind(a.status)
    .fetch_optional(executor)
    .await
}

pub async fn delete<'e, E: sqlx::PgExecutor<'e>>(executor: E, id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM agreements WHERE id = $1")
        .bind(id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}

pub async fn find_by_id<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    id: Uuid,
) -> Result<Option<Agreement>, sqlx::Error> {
    sqlx::query_as::<_, Agreement>("SELECT * FROM agreements WHERE id = $1")
        .bind(id)
        .fetch_optional(executor)
        .await
}

/// Highest number issued so far under `prefix`.
pub async fn last_number_with_prefix<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    prefix: &str,
) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        "SELECT agreement_number FROM agreements
         WHERE agreement_number LIKE $1 || '%'
         ORDER BY agreement_number DESC LIMIT 1",
    )
    .bind(prefix)
    .fetch_optional(executor)
    .await
}

pub async fn list(
    pool: &PgPool,
    filter: &AgreementFilter<'_>,
    limit: i64,
    offset: i64,
) -> Result<Vec<Agreement>, sqlx::Error> {
    sqlx::query_as::<_, Agreement>(
        "SELECT * FROM agreements
         WHERE ($1::text IS NULL OR agreement_number ILIKE '%' || $1 || '%')
           AND ($2::agreement_status IS NULL OR status = $2)
           AND ($3::uuid IS NULL OR customer_id = $3)
         ORDER BY created_at DESC LIMIT $4 OFFSET $5",
    )
    .bind(filter.keyword)
    .bind(filter.status)
    .bind(filter.customer_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

pub async fn count(pool: &PgPool, filter: &AgreementFilter<'_>) -> Result<i64, sqlx::Error> {
    let row: (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM agreements
         WHERE ($1::text IS NULL OR agreement_number ILIKE '%' || $1 || '%')
           AND ($2::agreement_status IS NULL OR status = $2)
           AND ($3::uuid IS NULL OR customer_id = $3)",
    )
    .bind(filter.keyword)
    .bind(filter.status)
    .bind(filter.customer_id)
    .fetch_one(pool)
    .await?;
    Ok(row.0)
}
