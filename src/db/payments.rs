use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use crate::approval::change::PaymentChange;
use crate::models::Payment;

pub struct PaymentFilter {
    pub customer_id: Option<Uuid>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

pub async fn insert<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    p: &PaymentChange,
) -> Result<Payment, sqlx::Error> {
    sqlx::query_as::<_, Payment>(
        "INSERT INTO payments
            (customer_id, agreement_id, amount, payment_date, payment_method, period, remark)
         VALUES ($1, $2, $3, $4, $5, $6, $7)
         RETURNING *",
    )
    .bind(p.customer_id)
    .bind(p.agreement_id)
    .bind(p.amount)
    .bind(p.payment_date)
    .bind(&p.payment_method)
    .bind(&p.period)
    .bind(&p.remark)
    .fetch_one(executor)
    .await
}

pub async fn update<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    id: Uuid,
    p: &PaymentChange,
) -> Result<Option<Payment>, sqlx::Error> {
    sqlx::query_as::<_, Payment>(
        "UPDATE payments SET
            customer_id = COALESCE($2, customer_id),
            agreement_id = COALESCE($3, agreement_id),
            amount = COALESCE($4, amount),
            payment_date = COALESCE($5, payment_date),
            payment_method = COALESCE($6, payment_method),
            period = COALESCE($7, period),
            remark = COALESCE($8, remark),
            updated_at = now()
         WHERE id = $1
         RETURNING *",
    )
    .bind(id)
    .bind(p.customer_id)
    .bind(p.agreement_id)
    .bind(p.amount)
    .bind(p.payment_date)
    .bind(&p.payment_method)
    .bind(&p.period)
    .bind(&p.remark)
    .fetch_optional(executor)
    .await
}

pub async fn delete<'e, E: sqlx::PgExecutor<'e>>(executor: E, id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM payments WHERE id = $1")
        .bind(id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}

pub async fn find_by_id<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    id: Uuid,
) -> Result<Option<Payment>, sqlx::Error> {
    sqlx::query_as::<_, Payment>("SELECT * FROM payments WHERE id = $1")
        .bind(id)
        .fetch_optional(executor)
        .await
}

pub async fn list(
    pool: &PgPool,
    filter: &PaymentFilter,
    limit: i64,
    offset: i64,
) -> Result<Vec<Payment>, sqlx::Error> {
    sqlx::query_as::<_, Payment>(
        "SELECT * FROM payments
         WHERE ($1::uuid IS NULL OR customer_id = $1)
           AND ($2::date IS NULL OR payment_date >= $2)
           AND ($3::date IS NULL OR payment_date <= $3)
         ORDER BY payment_date DESC, created_at DESC
         LIMIT $4 OFFSET $5",
    )
    .bind(filter.customer_id)
    .bind(filter.start_date)
    .bind(filter.end_date)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

pub async fn count(pool: &PgPool, filter: &PaymentFilter) -> Result<i64, sqlx::Error> {
    let row: (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM payments
         WHERE ($1::uuid IS NULL OR customer_id = $1)
           AND ($2::date IS NULL OR payment_date >= $2)
           AND ($3::date IS NULL OR payment_date <= $3)",
    )
    .bind(filter.customer_id)
    .bind(filter.start_date)
    .bind(filter.end_date)
    .fetch_one(pool)
    .await?;
    Ok(row.0)
}
